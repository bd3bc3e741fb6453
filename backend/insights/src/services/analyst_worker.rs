use anyhow::{Context, Result};
use tracing::info;

use crate::{
    config::Config,
    models::DailyReport,
    services::{
        aggregator, archive, chart, object_storage::ObjectStorageClient,
        table_source::SpreadsheetSource,
    },
    utils,
};

/// The daily analysis run: load the attempt log, compute the report,
/// and (when persistence is enabled) render, bundle, and upload the
/// insights archive. Strictly sequential; the first failure aborts the
/// rest of the chain.
pub struct InsightAnalyst {
    source: SpreadsheetSource,
    storage: Option<ObjectStorageClient>,
    config: Config,
}

impl InsightAnalyst {
    pub fn new(
        source: SpreadsheetSource,
        storage: Option<ObjectStorageClient>,
        config: Config,
    ) -> Self {
        Self {
            source,
            storage,
            config,
        }
    }

    pub async fn run(&self) -> Result<DailyReport> {
        let records = self.source.fetch().await?;

        let reference_date = utils::time::reference_date(&self.config.date_format);
        let report = aggregator::compute_report(&records, &reference_date);
        info!(
            reference_date = %reference_date,
            questions_attempted = report.questions_attempted,
            "Daily report computed"
        );

        if !self.config.dump_results {
            return Ok(report);
        }

        if report.insights.is_none() {
            info!("No attempts for the reference date, nothing to persist");
            return Ok(report);
        }

        self.persist(&report).await?;
        Ok(report)
    }

    async fn persist(&self, report: &DailyReport) -> Result<()> {
        let storage = self
            .storage
            .as_ref()
            .context("Object storage must be configured when DUMP_RESULTS is enabled")?;

        let chart_png = chart::render_png(&aggregator::chart_data(report))?;
        let report_json =
            serde_json::to_vec(report).context("Failed to serialize daily report")?;
        let bundle = archive::bundle(&report_json, &chart_png)?;

        let key = storage.build_report_key(utils::time::today());
        storage
            .upload_bytes(&key, bundle, "application/zip")
            .await?;

        info!(key = %key, "Insights archive uploaded");
        Ok(())
    }
}
