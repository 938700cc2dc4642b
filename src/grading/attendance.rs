//! Attendance counts turned into a capped, scaled contribution.

use std::collections::HashSet;

use crate::config::AttendanceConfig;
use crate::error::GradeError;
use crate::grading::scale::scale;
use crate::grading::types::StudentKey;

/// One row of the attendance file.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRecord {
    pub key: StudentKey,
    pub count: f64,
}

/// Contribution of a single attendance count.
///
/// With an active cap the count is clamped to it and the cap becomes the
/// divisor; otherwise the count is scaled against `required`, so counts
/// above `required` earn more than full credit.
pub fn attendance_score(count: f64, required: f64, cap: Option<f64>, percentage: f64) -> f64 {
    match cap {
        Some(cap) => scale(count.min(cap), cap, percentage),
        None => scale(count, required, percentage),
    }
}

/// Scores every record, preserving record order.
///
/// # Errors
///
/// - [`GradeError::InvalidConfiguration`] for an unknown cap name.
/// - [`GradeError::DuplicateStudent`] when a student appears twice.
pub fn attendance_scores(
    records: &[AttendanceRecord],
    config: &AttendanceConfig,
) -> Result<Vec<(StudentKey, f64)>, GradeError> {
    let cap = config.cap_value()?;
    let mut seen = HashSet::with_capacity(records.len());

    records
        .iter()
        .map(|record| {
            if !seen.insert(&record.key) {
                return Err(GradeError::DuplicateStudent {
                    key: record.key.to_string(),
                    origin: "the attendance file".to_string(),
                });
            }
            let score = attendance_score(record.count, config.required, cap, config.percentage);
            Ok((record.key.clone(), score))
        })
        .collect()
}
