use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Client;
use sha2::{Digest, Sha256};
use url::Url;

use crate::config::ObjectStorageSettings;

type HmacSha256 = Hmac<Sha256>;

const AWS_URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

/// S3-compatible client for the insights bucket. Requests are signed
/// with AWS Signature V4 directly, no SDK.
#[derive(Clone, Debug)]
pub struct ObjectStorageClient {
    bucket: String,
    region: String,
    endpoint: Url,
    access_key: String,
    secret_key: String,
    prefix: String,
    client: Client,
}

struct SignedRequest {
    authorization: String,
    amz_date: String,
    payload_hash: String,
}

impl ObjectStorageClient {
    pub fn new(settings: ObjectStorageSettings) -> Result<Self> {
        let endpoint = settings
            .endpoint
            .unwrap_or_else(|| "https://s3.amazonaws.com".to_string());

        let endpoint = Url::parse(&endpoint).context("Invalid object storage endpoint URL")?;
        if endpoint.host_str().is_none() {
            bail!("Object storage endpoint must include a host");
        }

        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "prod".to_string());
        if app_env == "prod" && endpoint.scheme() != "https" {
            bail!(
                "Object storage endpoint must use HTTPS in production mode. Got: {}",
                endpoint.scheme()
            );
        }
        if endpoint.scheme() != "https" && endpoint.scheme() != "http" {
            bail!(
                "Invalid endpoint scheme: {}. Must be http or https.",
                endpoint.scheme()
            );
        }

        Ok(Self {
            bucket: settings.bucket,
            region: settings.region,
            access_key: settings.access_key,
            secret_key: settings.secret_key,
            endpoint,
            prefix: sanitize_prefix(&settings.folder),
            client: Client::new(),
        })
    }

    /// Storage key for a day's insights archive, relative to the
    /// configured folder: `{dd-mm-YYYY}/insights.zip`.
    pub fn build_report_key(&self, date: NaiveDate) -> String {
        format!("{}/insights.zip", date.format("%d-%m-%Y"))
    }

    pub async fn upload_bytes(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let object_key = self.full_key(key);
        let payload_hash = hex::encode(Sha256::digest(&bytes));
        let signed = self.sign_request("PUT", &object_key, payload_hash, Utc::now())?;

        self.client
            .put(self.object_url(&object_key))
            .header("Authorization", signed.authorization)
            .header("x-amz-date", signed.amz_date)
            .header("x-amz-content-sha256", signed.payload_hash)
            .header("content-type", content_type)
            .body(bytes)
            .send()
            .await
            .with_context(|| format!("Failed to upload object {}", object_key))?
            .error_for_status()
            .context("Object storage upload returned error status")?;

        Ok(())
    }

    pub async fn download_bytes(&self, key: &str) -> Result<Vec<u8>> {
        let object_key = self.full_key(key);
        let payload_hash = hex::encode(Sha256::digest(b""));
        let signed = self.sign_request("GET", &object_key, payload_hash, Utc::now())?;

        let bytes = self
            .client
            .get(self.object_url(&object_key))
            .header("Authorization", signed.authorization)
            .header("x-amz-date", signed.amz_date)
            .header("x-amz-content-sha256", signed.payload_hash)
            .send()
            .await
            .with_context(|| format!("Failed to download object {}", object_key))?
            .error_for_status()
            .context("Object storage download returned error status")?
            .bytes()
            .await
            .context("Failed to read object body")?;

        Ok(bytes.to_vec())
    }

    /// Canonical-request signing shared by PUT and GET. Both sign the
    /// same three headers; only the method and payload hash differ.
    fn sign_request(
        &self,
        method: &str,
        object_key: &str,
        payload_hash: String,
        now: DateTime<Utc>,
    ) -> Result<SignedRequest> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();
        let scope = format!("{}/{}/s3/aws4_request", date_stamp, self.region);

        let host = self
            .endpoint
            .host_str()
            .ok_or_else(|| anyhow!("Object storage endpoint missing host"))?
            .to_lowercase();

        let canonical_headers = format!(
            "host:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n",
            host, payload_hash, amz_date
        );
        let canonical_request = format!(
            "{}\n{}\n\n{}\n{}\n{}",
            method,
            self.canonical_uri(object_key),
            canonical_headers,
            SIGNED_HEADERS,
            payload_hash
        );

        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signing_key = derive_signing_key(&self.secret_key, &date_stamp, &self.region, "s3");
        let signature = hex::encode(hmac_sign(&signing_key, string_to_sign.as_bytes()));

        Ok(SignedRequest {
            authorization: format!(
                "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
                self.access_key, scope, SIGNED_HEADERS, signature
            ),
            amz_date,
            payload_hash,
        })
    }

    fn object_url(&self, object_key: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.set_path(&format!("{}/{}", self.bucket, encode_key(object_key)));
        url
    }

    fn full_key(&self, key: &str) -> String {
        let cleaned = key.trim_matches('/');
        if self.prefix.is_empty() {
            cleaned.to_string()
        } else if cleaned.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}/{}", self.prefix, cleaned)
        }
    }

    fn canonical_uri(&self, object_key: &str) -> String {
        format!("/{}/{}", self.bucket, encode_key(object_key))
    }
}

fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| utf8_percent_encode(segment, AWS_URI_ENCODE_SET).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn sanitize_prefix(prefix: &str) -> String {
    prefix
        .trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn derive_signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let mut key = format!("AWS4{}", secret).into_bytes();
    key = hmac_sign(&key, date);
    key = hmac_sign(&key, region);
    key = hmac_sign(&key, service);
    hmac_sign(&key, b"aws4_request")
}

fn hmac_sign(key: &[u8], message: impl AsRef<[u8]>) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message.as_ref());
    mac.finalize().into_bytes().to_vec()
}
