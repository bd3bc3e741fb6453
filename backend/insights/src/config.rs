use serde::Deserialize;
use std::env;

use config::ConfigError;

/// Process-wide configuration, loaded once at startup and passed by
/// reference into the collaborators. Optional groups stay `None` when
/// their variables are absent; each worker decides which groups it
/// cannot run without.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub spreadsheet_url: String,
    pub date_format: String,
    pub dump_results: bool,
    pub storage: Option<ObjectStorageSettings>,
    pub email: Option<EmailSettings>,
    pub presentation: Option<PresentationSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStorageSettings {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
    pub folder: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub recipient: String,
    #[serde(default)]
    pub use_tls: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PresentationSettings {
    pub examination_name: String,
    pub examination_code: Option<String>,
    pub emailer_name: String,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(
                config::File::with_name(&format!("config/{}", app_env)).required(false),
            )
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let spreadsheet_url = lookup(&settings, "source.spreadsheet_url", "SPREADSHEET_URL")
            .ok_or_else(|| ConfigError::NotFound("SPREADSHEET_URL".into()))?;

        let date_format = lookup(
            &settings,
            "source.date_format",
            "DATE_ATTEMPTED_COLUMN_VALUE_FORMAT",
        )
        .unwrap_or_else(|| "%d/%m/%Y".to_string());

        let dump_results = lookup(&settings, "source.dump_results", "DUMP_RESULTS")
            .map(|value| truthy(&value))
            .unwrap_or(false);

        let storage = load_storage(&settings)?;
        let email = load_email(&settings)?;
        let presentation = load_presentation(&settings)?;

        Ok(Config {
            spreadsheet_url,
            date_format,
            dump_results,
            storage,
            email,
            presentation,
        })
    }
}

fn load_storage(settings: &config::Config) -> Result<Option<ObjectStorageSettings>, ConfigError> {
    let bucket = match lookup(settings, "storage.bucket", "S3_BUCKET_NAME") {
        Some(bucket) => bucket,
        None => return Ok(None),
    };

    let access_key = lookup(settings, "storage.access_key", "AWS_ACCESS_KEY_ID")
        .ok_or_else(|| ConfigError::NotFound("AWS_ACCESS_KEY_ID".into()))?;
    let secret_key = lookup(settings, "storage.secret_key", "AWS_SECRET_ACCESS_KEY")
        .ok_or_else(|| ConfigError::NotFound("AWS_SECRET_ACCESS_KEY".into()))?;

    Ok(Some(ObjectStorageSettings {
        bucket,
        region: lookup(settings, "storage.region", "AWS_REGION")
            .unwrap_or_else(|| "us-east-1".to_string()),
        endpoint: lookup(settings, "storage.endpoint", "S3_ENDPOINT"),
        access_key,
        secret_key,
        folder: lookup(settings, "storage.folder", "S3_BUCKET_FOLDER").unwrap_or_default(),
    }))
}

fn load_email(settings: &config::Config) -> Result<Option<EmailSettings>, ConfigError> {
    let username = match lookup(settings, "email.username", "EMAIL_USERNAME") {
        Some(username) => username,
        None => return Ok(None),
    };

    let password = lookup(settings, "email.password", "EMAIL_PASSWORD")
        .ok_or_else(|| ConfigError::NotFound("EMAIL_PASSWORD".into()))?;
    let recipient = lookup(
        settings,
        "email.recipient",
        "EMAIL_RECIPIENT_EMAIL_ADDRESS",
    )
    .ok_or_else(|| ConfigError::NotFound("EMAIL_RECIPIENT_EMAIL_ADDRESS".into()))?;

    let port = lookup(settings, "email.port", "SMTP_PORT")
        .map(|value| {
            value
                .parse::<u16>()
                .map_err(|_| ConfigError::Message(format!("Invalid SMTP_PORT '{}'", value)))
        })
        .transpose()?
        .unwrap_or(465);

    Ok(Some(EmailSettings {
        server: lookup(settings, "email.server", "SMTP_SERVER")
            .unwrap_or_else(|| "smtp.gmail.com".to_string()),
        port,
        username,
        password,
        recipient,
        use_tls: lookup(settings, "email.use_tls", "EMAIL_USE_TLS")
            .map(|value| truthy(&value))
            .unwrap_or(true),
    }))
}

fn load_presentation(
    settings: &config::Config,
) -> Result<Option<PresentationSettings>, ConfigError> {
    let examination_name = match lookup(settings, "presentation.examination_name", "EXAMINATION_NAME")
    {
        Some(name) => name,
        None => return Ok(None),
    };

    let emailer_name = lookup(settings, "presentation.emailer_name", "EMAILER_NAME")
        .ok_or_else(|| ConfigError::NotFound("EMAILER_NAME".into()))?;

    Ok(Some(PresentationSettings {
        examination_name,
        examination_code: lookup(settings, "presentation.examination_code", "EXAMINATION_CODE"),
        emailer_name,
    }))
}

fn lookup(settings: &config::Config, key: &str, env_key: &str) -> Option<String> {
    settings
        .get_string(key)
        .or_else(|_| env::var(env_key))
        .ok()
        .filter(|value| !value.is_empty())
}

/// Boolean-like flags the way the original deployment passed them:
/// anything other than an explicit true form counts as false.
fn truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
