use anyhow::{Context, Result};
use tracing::info;

use crate::{
    config::PresentationSettings,
    models::{DailyReport, EnrichedReport},
    services::{archive, email_service::EmailService, object_storage::ObjectStorageClient},
    utils,
};

/// Delivery side of the pipeline: pull the day's archive from object
/// storage, unpack it, enrich the report with presentation metadata,
/// and email the result with the chart attached.
pub struct InsightsSender {
    storage: ObjectStorageClient,
    email: EmailService,
    presentation: PresentationSettings,
}

impl InsightsSender {
    pub fn new(
        storage: ObjectStorageClient,
        email: EmailService,
        presentation: PresentationSettings,
    ) -> Self {
        Self {
            storage,
            email,
            presentation,
        }
    }

    pub async fn deliver(&self, key: &str) -> Result<()> {
        info!(key = %key, "Fetching insights archive");
        let archive_bytes = self.storage.download_bytes(key).await?;
        let (report_json, chart_png) = archive::unbundle(&archive_bytes)?;

        let report: DailyReport = serde_json::from_slice(&report_json)
            .context("Failed to deserialize insights report from archive")?;
        let enriched = self.enrich(report);

        self.email.send_insights_email(&enriched, chart_png).await?;
        info!("Insights email sent");
        Ok(())
    }

    fn enrich(&self, report: DailyReport) -> EnrichedReport {
        EnrichedReport {
            report,
            examination_name: self.presentation.examination_name.clone(),
            examination_code: self.presentation.examination_code.clone(),
            current_date: utils::time::display_date(),
            emailer_name: self.presentation.emailer_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmailSettings, ObjectStorageSettings};

    fn sender_with_unreachable_storage() -> InsightsSender {
        let storage = ObjectStorageClient::new(ObjectStorageSettings {
            bucket: "exam-insights".into(),
            region: "us-east-1".into(),
            // Nothing listens here, so the download stage must fail.
            endpoint: Some("http://127.0.0.1:1".into()),
            access_key: "key".into(),
            secret_key: "secret".into(),
            folder: "daily".into(),
        })
        .unwrap();

        let email = EmailService::new(EmailSettings {
            server: "smtp.example.com".into(),
            port: 465,
            username: "analyst@example.com".into(),
            password: "app-password".into(),
            recipient: "student@example.com".into(),
            use_tls: true,
        });

        let presentation = PresentationSettings {
            examination_name: "Network Fundamentals".into(),
            examination_code: None,
            emailer_name: "Daily Analyst".into(),
        };

        InsightsSender::new(storage, email, presentation)
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn delivery_fails_loudly_regardless_of_ambient_environment() {
        std::env::set_var("APP_ENV", "dev");
        // A stray ambient variable must not turn a failed delivery
        // into a silent success.
        std::env::set_var("EMAIL_SEND_DISABLED", "1");

        let sender = sender_with_unreachable_storage();
        let result = sender.deliver("21-08-2026/insights.zip").await;
        assert!(result.is_err());

        std::env::remove_var("EMAIL_SEND_DISABLED");
        std::env::remove_var("APP_ENV");
    }

    #[test]
    #[serial_test::serial]
    fn enrich_copies_presentation_metadata() {
        let sender = {
            // Storage construction needs a scheme check; keep it off prod.
            std::env::set_var("APP_ENV", "dev");
            let sender = sender_with_unreachable_storage();
            std::env::remove_var("APP_ENV");
            sender
        };

        let enriched = sender.enrich(DailyReport {
            questions_attempted: 0,
            insights: None,
        });
        assert_eq!(enriched.examination_name, "Network Fundamentals");
        assert_eq!(enriched.emailer_name, "Daily Analyst");
        assert!(enriched.examination_code.is_none());
    }
}
