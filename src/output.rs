//! Output formatting and persistence for final grades.
//!
//! Supports the final scores CSV, a JSON class summary, and pretty-printing.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::grading::types::{ClassSummary, GradeReport};
use crate::parser::{SIS_ID_COLUMN, STUDENT_COLUMN};
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;

pub const TOTAL_COLUMN: &str = "Total";
pub const ATTENDANCE_COLUMN: &str = "Attendance";
pub const SCALED_ATTENDANCE_COLUMN: &str = "Scaled Attendance";

/// Logs the class summary using Rust's debug pretty-print format.
pub fn print_pretty(summary: &ClassSummary) {
    debug!("{:#?}", summary);
}

/// Header row of the final scores file.
///
/// The display name comes first, then the identifier, the per-category
/// contributions, attendance and the total. With `detailed`, every scaled
/// assignment column is written ahead of the category columns.
pub fn final_score_headers(report: &GradeReport, detailed: bool) -> Vec<String> {
    let mut headers = vec![STUDENT_COLUMN.to_string(), SIS_ID_COLUMN.to_string()];
    if detailed {
        headers.extend(report.assignment_labels.iter().cloned());
        if report.has_attendance {
            headers.push(SCALED_ATTENDANCE_COLUMN.to_string());
        }
    }
    headers.extend(report.categories.iter().cloned());
    if report.has_attendance {
        headers.push(ATTENDANCE_COLUMN.to_string());
    }
    headers.push(TOTAL_COLUMN.to_string());
    headers
}

/// Writes the final scores as CSV to any writer.
pub fn write_final_scores_to<W: Write>(writer: W, report: &GradeReport, detailed: bool) -> Result<()> {
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record(final_score_headers(report, detailed))?;

    for row in &report.rows {
        let mut record = vec![row.name.clone().unwrap_or_default(), row.key.to_string()];
        let attendance = row.attendance.map(|a| a.to_string()).unwrap_or_default();
        if detailed {
            record.extend(row.assignments.iter().map(f64::to_string));
            if report.has_attendance {
                record.push(attendance.clone());
            }
        }
        record.extend(row.categories.iter().map(f64::to_string));
        if report.has_attendance {
            record.push(attendance);
        }
        record.push(row.total.to_string());
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes the final scores CSV to `path`, replacing any existing file.
pub fn write_final_scores(path: &str, report: &GradeReport, detailed: bool) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create output '{path}'"))?;
    write_final_scores_to(file, report, detailed)
        .with_context(|| format!("failed to write final scores to '{path}'"))?;
    info!(path, rows = report.rows.len(), "Final scores written");
    Ok(())
}

/// Writes the class summary as pretty-printed JSON.
pub fn write_summary(path: &str, summary: &ClassSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json).with_context(|| format!("failed to write summary '{path}'"))?;
    info!(path, "Class summary written");
    Ok(())
}
