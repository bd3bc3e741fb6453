use serde::{Deserialize, Serialize};

/// One row of the attempt log spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub date_attempted: String,
    pub attempted: bool,
    pub correctness: bool,
    pub failure_reason: Option<String>,
}

/// Aggregated statistics for a single reference date.
///
/// `insights` is `null` when no attempted rows matched the date; the
/// downstream consumers rely on that exact shape, so absent values are
/// serialized as explicit nulls rather than skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    pub questions_attempted: u64,
    pub insights: Option<InsightsBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsBreakdown {
    pub correct: CorrectAnswers,
    pub incorrect: IncorrectAnswers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectAnswers {
    pub number: u64,
    pub percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncorrectAnswers {
    pub number: u64,
    pub percentage: Option<f64>,
    pub detailed_insights: Option<Vec<CauseInsight>>,
}

/// Per-cause breakdown of incorrect attempts. Percentages are relative
/// to the incorrect total, not to all attempted questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CauseInsight {
    pub cause: String,
    pub number: u64,
    pub percentage: f64,
}

/// Parallel label/size sequences feeding the pie chart renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub sizes: Vec<u64>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// The report as it goes into the email template: the daily numbers
/// plus the externally configured presentation metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedReport {
    #[serde(flatten)]
    pub report: DailyReport,
    pub examination_name: String,
    pub examination_code: Option<String>,
    pub current_date: String,
    pub emailer_name: String,
}
