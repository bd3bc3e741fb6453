use tracing_subscriber::fmt::init;

use exam_insights::{
    config::Config,
    services::{
        analyst_worker::InsightAnalyst, object_storage::ObjectStorageClient,
        table_source::SpreadsheetSource,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();

    let config = Config::load().expect("Failed to load configuration");

    let source = SpreadsheetSource::new(config.spreadsheet_url.clone());

    let storage = config
        .storage
        .clone()
        .map(ObjectStorageClient::new)
        .transpose()
        .expect("Invalid object storage configuration");

    let analyst = InsightAnalyst::new(source, storage, config);
    let report = analyst.run().await?;

    println!("{}", serde_json::to_string(&report)?);

    Ok(())
}
