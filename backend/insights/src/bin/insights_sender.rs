use tracing_subscriber::fmt::init;

use exam_insights::{
    config::Config,
    services::{
        email_service::EmailService, object_storage::ObjectStorageClient,
        sender_worker::InsightsSender,
    },
    utils,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();

    let config = Config::load().expect("Failed to load configuration");

    let storage_settings = config
        .storage
        .clone()
        .expect("Object storage must be configured for the insights sender");
    let storage =
        ObjectStorageClient::new(storage_settings).expect("Invalid object storage configuration");

    let email_settings = config
        .email
        .clone()
        .expect("Email settings must be configured for the insights sender");
    let presentation = config
        .presentation
        .clone()
        .expect("Presentation settings must be configured for the insights sender");

    // Stand-in for the bucket-event trigger: the key arrives via the
    // environment, defaulting to today's archive.
    let key = std::env::var("INSIGHTS_OBJECT_KEY")
        .unwrap_or_else(|_| storage.build_report_key(utils::time::today()));

    let sender = InsightsSender::new(storage, EmailService::new(email_settings), presentation);
    sender.deliver(&key).await?;

    Ok(())
}
