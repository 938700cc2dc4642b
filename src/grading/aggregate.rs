use crate::grading::types::{CategorySummary, ClassSummary, GradeReport, ValueStats};
use crate::grading::utility::{mean, min_max, stddev};
use chrono::Utc;

fn value_stats(values: &[f64]) -> ValueStats {
    let avg = mean(values);
    let (min, max) = min_max(values);
    ValueStats {
        mean: avg,
        stddev: stddev(values, avg),
        min,
        max,
    }
}

/// Summarizes a [`GradeReport`] across the class.
///
/// Computes mean, population standard deviation, minimum and maximum of the
/// total and of every category contribution.
pub fn summarize(report: &GradeReport) -> ClassSummary {
    let totals: Vec<f64> = report.rows.iter().map(|r| r.total).collect();

    let categories = report
        .categories
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let series: Vec<f64> = report.rows.iter().map(|r| r.categories[i]).collect();
            CategorySummary {
                name: name.clone(),
                stats: value_stats(&series),
            }
        })
        .collect();

    let attendance = report.has_attendance.then(|| {
        let series: Vec<f64> = report
            .rows
            .iter()
            .map(|r| r.attendance.unwrap_or(0.0))
            .collect();
        value_stats(&series)
    });

    ClassSummary {
        schema_version: 1,
        generated_at: Utc::now(),
        student_count: report.rows.len(),
        total: value_stats(&totals),
        categories,
        attendance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::types::{FinalScoreRow, StudentKey};

    fn row(id: &str, categories: Vec<f64>, attendance: Option<f64>) -> FinalScoreRow {
        let total = categories.iter().sum::<f64>() + attendance.unwrap_or(0.0);
        FinalScoreRow {
            key: StudentKey::parse(id).unwrap(),
            name: None,
            categories,
            attendance,
            assignments: vec![],
            total,
        }
    }

    #[test]
    fn test_summarize() {
        let report = GradeReport {
            categories: vec!["Quiz".into(), "Homework".into()],
            assignment_labels: vec![],
            has_attendance: true,
            rows: vec![
                row("1", vec![17.0, 30.0], Some(5.0)),
                row("2", vec![15.0, 40.0], Some(3.0)),
            ],
        };

        let summary = summarize(&report);
        assert_eq!(summary.student_count, 2);
        assert_eq!(summary.total.mean, 55.0);
        assert_eq!(summary.total.min, 52.0);
        assert_eq!(summary.total.max, 58.0);
        assert_eq!(summary.total.stddev, 3.0);
        assert_eq!(summary.categories[0].name, "Quiz");
        assert_eq!(summary.categories[0].stats.mean, 16.0);
        assert_eq!(summary.attendance.unwrap().mean, 4.0);
    }

    #[test]
    fn test_summarize_empty_report() {
        let summary = summarize(&GradeReport::default());
        assert_eq!(summary.student_count, 0);
        assert_eq!(summary.total, ValueStats::default());
        assert!(summary.categories.is_empty());
        assert!(summary.attendance.is_none());
    }
}
