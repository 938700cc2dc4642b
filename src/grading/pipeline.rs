use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::config::GradingConfig;
use crate::error::GradeError;
use crate::grading::attendance::{AttendanceRecord, attendance_scores};
use crate::grading::drops::drop_and_sum;
use crate::grading::labels::{select_assignment_columns, validate_categories};
use crate::grading::scale::{percentage_per, scale_category};
use crate::grading::types::{
    AssignmentColumn, CategoryMatch, ColumnState, FinalScoreRow, GradeReport, RawScoreTable,
    WorkingColumn, WorkingTable,
};

/// Builds the numeric working table from the selected columns.
///
/// Empty cells count as zero.
///
/// # Errors
///
/// Returns [`GradeError::InvalidScore`] for a non-empty cell that is not a
/// number, and [`GradeError::DuplicateStudent`] when a key repeats.
pub fn build_working_table(
    raw: &RawScoreTable,
    selected: &[AssignmentColumn],
) -> Result<WorkingTable, GradeError> {
    let mut seen = HashSet::with_capacity(raw.students.len());
    for student in &raw.students {
        if !seen.insert(&student.key) {
            return Err(GradeError::DuplicateStudent {
                key: student.key.to_string(),
                origin: "the score export".to_string(),
            });
        }
    }

    let columns = selected
        .iter()
        .map(|col| {
            let values = raw
                .students
                .iter()
                .map(|student| {
                    let cell = student.cells.get(col.position).map_or("", |c| c.trim());
                    if cell.is_empty() {
                        return Ok(0.0);
                    }
                    cell.parse::<f64>().map_err(|_| GradeError::InvalidScore {
                        student: student.key.to_string(),
                        column: col.header.clone(),
                        value: cell.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(WorkingColumn {
                key: col.key.clone(),
                header: col.header.clone(),
                points_possible: col.points_possible,
                state: ColumnState::Raw,
                values,
            })
        })
        .collect::<Result<Vec<_>, GradeError>>()?;

    Ok(WorkingTable {
        keys: raw.students.iter().map(|s| s.key.clone()).collect(),
        columns,
    })
}

fn check_config(config: &GradingConfig) {
    let total = config.total_weight();
    if (total - 100.0).abs() > 1e-9 {
        warn!(total_weight = total, "Configured weights do not sum to 100");
    }
    for (name, category) in config.categories() {
        if category.drops > category.number {
            warn!(
                category = %name,
                number = category.number,
                drops = category.drops,
                "Category drops more assignments than it has"
            );
        }
    }
}

/// Runs the whole grading pipeline over already-parsed inputs.
///
/// Every configured category is scaled, each student's lowest scores are
/// dropped per category, and the surviving contributions (plus attendance,
/// when configured) are summed into a total. Attendance is outer-joined:
/// students missing from the attendance records get zero, and students
/// only present there are appended with zero category scores and no name.
///
/// # Errors
///
/// Any [`GradeError`] aborts the run; no partial report is produced.
#[tracing::instrument(skip_all, fields(students = raw.students.len(), categories = config.categories().len()))]
pub fn grade(
    raw: &RawScoreTable,
    config: &GradingConfig,
    attendance: &[AttendanceRecord],
) -> Result<GradeReport, GradeError> {
    check_config(config);

    let names: Vec<&str> = config.category_names().collect();
    validate_categories(names.iter().copied())?;

    let selected = select_assignment_columns(raw, &names)?;
    info!(columns = selected.len(), "Assignment columns selected");

    let mut table = build_working_table(raw, &selected)?;

    for (name, category) in config.categories() {
        scale_category(&mut table, name, category.number, percentage_per(category))?;
    }

    let attendance_by_key: Option<HashMap<_, _>> = match config.attendance() {
        Some(policy) => {
            let scores = attendance_scores(attendance, policy)?;
            debug!(records = scores.len(), "Attendance scored");
            Some(scores.into_iter().collect())
        }
        None => {
            if !attendance.is_empty() {
                debug!("Attendance records given but no attendance policy configured, ignoring");
            }
            None
        }
    };

    let assignment_labels: Vec<String> = table.scaled_columns().map(|c| c.label()).collect();

    let mut rows: Vec<FinalScoreRow> = raw
        .students
        .iter()
        .enumerate()
        .map(|(i, student)| {
            let attendance = attendance_by_key
                .as_ref()
                .map(|scores| scores.get(&student.key).copied().unwrap_or(0.0));
            let totals = drop_and_sum(&table, i, config, attendance);
            FinalScoreRow {
                key: student.key.clone(),
                name: Some(student.name.clone()),
                categories: totals.categories,
                attendance,
                assignments: table.scaled_columns().map(|c| c.values[i]).collect(),
                total: totals.total,
            }
        })
        .collect();

    if let Some(scores) = &attendance_by_key {
        let graded: HashSet<_> = table.keys().iter().collect();
        let extra: Vec<_> = attendance
            .iter()
            .filter(|r| !graded.contains(&r.key))
            .collect();
        if !extra.is_empty() {
            warn!(count = extra.len(), "Students in attendance file missing from score export");
        }
        for record in extra {
            let contribution = scores.get(&record.key).copied().unwrap_or(0.0);
            rows.push(FinalScoreRow {
                key: record.key.clone(),
                name: None,
                categories: vec![0.0; config.categories().len()],
                attendance: Some(contribution),
                assignments: vec![0.0; assignment_labels.len()],
                total: contribution,
            });
        }
    }

    info!(rows = rows.len(), "Final scores computed");

    Ok(GradeReport {
        categories: names.iter().map(|n| n.to_string()).collect(),
        assignment_labels,
        has_attendance: attendance_by_key.is_some(),
        rows,
    })
}

/// Matches the export's columns against the configuration without grading.
///
/// # Errors
///
/// The same matching and points-possible errors as [`grade`].
pub fn inspect(raw: &RawScoreTable, config: &GradingConfig) -> Result<Vec<CategoryMatch>, GradeError> {
    let names: Vec<&str> = config.category_names().collect();
    validate_categories(names.iter().copied())?;
    let selected = select_assignment_columns(raw, &names)?;

    Ok(config
        .categories()
        .iter()
        .map(|(name, category)| {
            let columns: Vec<_> = selected.iter().filter(|c| &c.key.category == name).collect();
            CategoryMatch {
                category: name.clone(),
                columns: columns.iter().map(|c| c.header.clone()).collect(),
                points_possible: columns.iter().map(|c| c.points_possible).collect(),
                percentage_per: percentage_per(category),
            }
        })
        .collect())
}
