use crate::models::{
    AttemptRecord, CauseInsight, ChartData, CorrectAnswers, DailyReport, IncorrectAnswers,
    InsightsBreakdown,
};

/// Sentinel category for incorrect attempts with no recorded reason.
pub const NOT_SPECIFIED: &str = "Not specified";

const CORRECT_LABEL: &str = "Correct Answers";

/// Rounds to 2 decimals with ties away from zero (`f64::round`), so an
/// exact .005 share rounds up rather than to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Share of `count` in `total`, as a percentage rounded to 2 decimals.
/// `total` must be non-zero; every caller has already early-exited on
/// the empty case.
fn share(count: u64, total: u64) -> f64 {
    round2(count as f64 / total as f64 * 100.0)
}

/// Counts occurrences per key, preserving first-seen key order so the
/// breakdown (and the chart slices derived from it) is deterministic.
fn group_counts<I>(keys: I) -> Vec<(String, u64)>
where
    I: IntoIterator<Item = String>,
{
    let mut groups: Vec<(String, u64)> = Vec::new();
    for key in keys {
        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, count)) => *count += 1,
            None => groups.push((key, 1)),
        }
    }
    groups
}

/// Computes the daily report for `reference_date`.
///
/// Rows count only when their `date_attempted` equals the reference
/// date exactly and the attempted flag is set. An empty filtered set
/// is the valid "no attempts today" outcome, not an error.
pub fn compute_report(records: &[AttemptRecord], reference_date: &str) -> DailyReport {
    let attempted: Vec<&AttemptRecord> = records
        .iter()
        .filter(|row| row.attempted && row.date_attempted == reference_date)
        .collect();

    if attempted.is_empty() {
        return DailyReport {
            questions_attempted: 0,
            insights: None,
        };
    }

    let questions_attempted = attempted.len() as u64;
    let correct_count = attempted.iter().filter(|row| row.correctness).count() as u64;

    let correct = CorrectAnswers {
        number: correct_count,
        percentage: (correct_count > 0).then(|| share(correct_count, questions_attempted)),
    };

    let incorrect_rows: Vec<&AttemptRecord> = attempted
        .iter()
        .filter(|row| !row.correctness)
        .copied()
        .collect();
    let incorrect = incorrect_insights(&incorrect_rows, questions_attempted);

    DailyReport {
        questions_attempted,
        insights: Some(InsightsBreakdown { correct, incorrect }),
    }
}

fn incorrect_insights(incorrect_rows: &[&AttemptRecord], questions_attempted: u64) -> IncorrectAnswers {
    let number = incorrect_rows.len() as u64;

    if number == 0 {
        return IncorrectAnswers {
            number,
            percentage: None,
            detailed_insights: None,
        };
    }

    let groups = group_counts(incorrect_rows.iter().map(|row| {
        row.failure_reason
            .clone()
            .unwrap_or_else(|| NOT_SPECIFIED.to_string())
    }));

    // Unreachable once number > 0, but kept as a guard against the
    // breakdown ever disagreeing with the row count.
    let detailed_insights = if groups.is_empty() {
        None
    } else {
        Some(
            groups
                .into_iter()
                .map(|(cause, count)| CauseInsight {
                    cause,
                    number: count,
                    percentage: share(count, number),
                })
                .collect(),
        )
    };

    IncorrectAnswers {
        number,
        percentage: Some(share(number, questions_attempted)),
        detailed_insights,
    }
}

/// Projects the report into the label/size pairs the chart renderer
/// consumes: the correct slice first (only when non-zero), then one
/// slice per failure cause in breakdown order.
pub fn chart_data(report: &DailyReport) -> ChartData {
    let mut labels = Vec::new();
    let mut sizes = Vec::new();

    if let Some(insights) = &report.insights {
        if insights.correct.number > 0 {
            labels.push(CORRECT_LABEL.to_string());
            sizes.push(insights.correct.number);
        }

        if let Some(detailed) = &insights.incorrect.detailed_insights {
            for cause_insight in detailed {
                labels.push(cause_insight.cause.clone());
                sizes.push(cause_insight.number);
            }
        }
    }

    ChartData { labels, sizes }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TODAY: &str = "21/08/2026";

    fn row(date: &str, attempted: bool, correct: bool, reason: Option<&str>) -> AttemptRecord {
        AttemptRecord {
            date_attempted: date.to_string(),
            attempted,
            correctness: correct,
            failure_reason: reason.map(str::to_string),
        }
    }

    fn mixed_day() -> Vec<AttemptRecord> {
        vec![
            row(TODAY, true, true, None),
            row(TODAY, true, true, None),
            row(TODAY, true, true, None),
            row(TODAY, true, true, None),
            row(TODAY, true, false, Some("timeout")),
            row(TODAY, true, false, Some("timeout")),
            row(TODAY, true, false, None),
            // Not attempted today, or attempted on another day.
            row(TODAY, false, false, None),
            row("20/08/2026", true, true, None),
            row("20/08/2026", true, false, Some("misread")),
        ]
    }

    #[test]
    fn empty_day_short_circuits() {
        let report = compute_report(&mixed_day(), "22/08/2026");
        assert_eq!(report.questions_attempted, 0);
        assert!(report.insights.is_none());
    }

    #[test]
    fn mixed_day_breakdown() {
        let report = compute_report(&mixed_day(), TODAY);
        assert_eq!(report.questions_attempted, 7);

        let insights = report.insights.expect("attempted rows present");
        assert_eq!(insights.correct.number, 4);
        assert_eq!(insights.correct.percentage, Some(57.14));
        assert_eq!(insights.incorrect.number, 3);
        assert_eq!(insights.incorrect.percentage, Some(42.86));

        let detailed = insights.incorrect.detailed_insights.expect("causes present");
        assert_eq!(detailed.len(), 2);
        assert_eq!(detailed[0].cause, "timeout");
        assert_eq!(detailed[0].number, 2);
        assert_eq!(detailed[0].percentage, 66.67);
        assert_eq!(detailed[1].cause, NOT_SPECIFIED);
        assert_eq!(detailed[1].number, 1);
        assert_eq!(detailed[1].percentage, 33.33);
    }

    #[test]
    fn counts_partition_attempted_total() {
        let report = compute_report(&mixed_day(), TODAY);
        let insights = report.insights.unwrap();
        assert_eq!(
            insights.correct.number + insights.incorrect.number,
            report.questions_attempted
        );

        let cause_total: u64 = insights
            .incorrect
            .detailed_insights
            .unwrap()
            .iter()
            .map(|cause| cause.number)
            .sum();
        assert_eq!(cause_total, insights.incorrect.number);
    }

    #[test]
    fn all_correct_day_has_null_incorrect_branch() {
        let records = vec![
            row(TODAY, true, true, None),
            row(TODAY, true, true, None),
        ];
        let report = compute_report(&records, TODAY);
        let insights = report.insights.unwrap();

        assert_eq!(insights.correct.number, 2);
        assert_eq!(insights.correct.percentage, Some(100.0));
        assert_eq!(insights.incorrect.number, 0);
        assert_eq!(insights.incorrect.percentage, None);
        assert!(insights.incorrect.detailed_insights.is_none());
    }

    #[test]
    fn all_incorrect_day_has_null_correct_percentage() {
        let records = vec![row(TODAY, true, false, Some("misread"))];
        let report = compute_report(&records, TODAY);
        let insights = report.insights.unwrap();

        assert_eq!(insights.correct.number, 0);
        assert_eq!(insights.correct.percentage, None);
        assert_eq!(insights.incorrect.percentage, Some(100.0));
    }

    #[test]
    fn missing_reasons_merge_into_sentinel_group() {
        let records = vec![
            row(TODAY, true, false, None),
            row(TODAY, true, false, None),
            row(TODAY, true, false, Some("timeout")),
        ];
        let report = compute_report(&records, TODAY);
        let detailed = report
            .insights
            .unwrap()
            .incorrect
            .detailed_insights
            .unwrap();

        assert_eq!(detailed.len(), 2);
        assert_eq!(detailed[0].cause, NOT_SPECIFIED);
        assert_eq!(detailed[0].number, 2);
        assert_eq!(detailed[1].cause, "timeout");
    }

    #[test]
    fn tied_shares_round_away_from_zero() {
        // 1/32 is exactly 3.125%; the tie rounds up to 3.13.
        assert_eq!(share(1, 32), 3.13);
        assert_eq!(share(31, 32), 96.88);
    }

    #[test]
    fn report_serialization_is_idempotent() {
        let records = mixed_day();
        let first = serde_json::to_vec(&compute_report(&records, TODAY)).unwrap();
        let second = serde_json::to_vec(&compute_report(&records, TODAY)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_report_wire_shape() {
        let report = compute_report(&[], TODAY);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "questions_attempted": 0, "insights": null })
        );
    }

    #[test]
    fn chart_slices_follow_breakdown_order() {
        let data = chart_data(&compute_report(&mixed_day(), TODAY));
        assert_eq!(data.labels, vec!["Correct Answers", "timeout", NOT_SPECIFIED]);
        assert_eq!(data.sizes, vec![4, 2, 1]);
    }

    #[test]
    fn chart_omits_zero_correct_slice() {
        let records = vec![row(TODAY, true, false, Some("timeout"))];
        let data = chart_data(&compute_report(&records, TODAY));
        assert_eq!(data.labels, vec!["timeout"]);
        assert_eq!(data.sizes, vec![1]);
    }

    #[test]
    fn chart_is_empty_without_insights() {
        let data = chart_data(&compute_report(&[], TODAY));
        assert!(data.is_empty());
    }
}
