pub mod insights;

pub use insights::{
    AttemptRecord, CauseInsight, ChartData, CorrectAnswers, DailyReport, EnrichedReport,
    IncorrectAnswers, InsightsBreakdown,
};
