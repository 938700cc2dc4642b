//! Data types used by the grading pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Integer-backed student identifier, rendered as a plain decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StudentKey(String);

impl StudentKey {
    /// Normalizes a raw identifier cell.
    ///
    /// Exports write ids either as integers or as floats (`"12345.0"`), so
    /// both collapse to `"12345"`. Anything that is not an integral number
    /// yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(id) = raw.parse::<i64>() {
            return Some(Self(id.to_string()));
        }
        let value = raw.parse::<f64>().ok()?;
        if !value.is_finite() || value.fract() != 0.0 {
            return None;
        }
        if value.abs() >= i64::MAX as f64 {
            return None;
        }
        Some(Self((value as i64).to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One student row of the score export, cells still as raw text.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRow {
    pub key: StudentKey,
    pub name: String,
    /// Aligned with [`RawScoreTable::headers`].
    pub cells: Vec<String>,
}

/// The score export after ingestion, identity columns split out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawScoreTable {
    pub headers: Vec<String>,
    /// The points-possible row, aligned with `headers`.
    pub points_possible: Vec<String>,
    pub students: Vec<StudentRow>,
}

impl RawScoreTable {
    pub fn points_possible_for(&self, column: usize) -> Option<&str> {
        self.points_possible.get(column).map(String::as_str)
    }
}

/// Structured assignment label: `"Homework 3"` is `{ "Homework", Some(3) }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    pub category: String,
    pub index: Option<u32>,
}

impl ColumnKey {
    pub fn new(category: &str, index: Option<u32>) -> Self {
        Self {
            category: category.to_string(),
            index,
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{} {}", self.category, i),
            None => f.write_str(&self.category),
        }
    }
}

/// A selected assignment column with its points-possible value.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentColumn {
    pub key: ColumnKey,
    pub header: String,
    /// Position in [`RawScoreTable::headers`].
    pub position: usize,
    pub points_possible: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnState {
    Raw,
    Scaled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkingColumn {
    pub key: ColumnKey,
    pub header: String,
    pub points_possible: f64,
    pub state: ColumnState,
    /// One value per student, aligned with [`WorkingTable::keys`].
    pub values: Vec<f64>,
}

impl WorkingColumn {
    /// The column label as it appears in output: the export header while
    /// raw, `"Scaled <key>"` once scaled.
    pub fn label(&self) -> String {
        match self.state {
            ColumnState::Raw => self.header.clone(),
            ColumnState::Scaled => format!("Scaled {}", self.key),
        }
    }

    pub fn is_scaled(&self) -> bool {
        self.state == ColumnState::Scaled
    }
}

/// Numeric assignment scores per student, scaled category by category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkingTable {
    pub(crate) keys: Vec<StudentKey>,
    pub(crate) columns: Vec<WorkingColumn>,
}

impl WorkingTable {
    pub fn keys(&self) -> &[StudentKey] {
        &self.keys
    }

    pub fn columns(&self) -> &[WorkingColumn] {
        &self.columns
    }

    pub fn column(&self, label: &str) -> Option<&WorkingColumn> {
        self.columns.iter().find(|c| c.label() == label)
    }

    /// Whether any column of `category` has already been scaled.
    pub fn is_scaled(&self, category: &str) -> bool {
        self.columns
            .iter()
            .any(|c| c.is_scaled() && c.key.category == category)
    }

    /// Scaled values of `category` for one student, in sub-index order.
    pub fn scaled_values(&self, student: usize, category: &str) -> Vec<f64> {
        let mut cols: Vec<_> = self
            .columns
            .iter()
            .filter(|c| c.is_scaled() && c.key.category == category)
            .collect();
        cols.sort_by_key(|c| c.key.index);
        cols.iter().map(|c| c.values[student]).collect()
    }

    pub fn scaled_columns(&self) -> impl Iterator<Item = &WorkingColumn> {
        self.columns.iter().filter(|c| c.is_scaled())
    }
}

/// Final result for one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalScoreRow {
    pub key: StudentKey,
    /// Display name from the roster; `None` for attendance-only students.
    pub name: Option<String>,
    /// Post-drop contribution per category, in configuration order.
    pub categories: Vec<f64>,
    pub attendance: Option<f64>,
    /// Scaled per-assignment values, aligned with [`GradeReport::assignment_labels`].
    pub assignments: Vec<f64>,
    pub total: f64,
}

/// Everything produced by a grading run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradeReport {
    pub categories: Vec<String>,
    pub assignment_labels: Vec<String>,
    pub has_attendance: bool,
    pub rows: Vec<FinalScoreRow>,
}

impl GradeReport {
    pub fn row(&self, key: &str) -> Option<&FinalScoreRow> {
        self.rows.iter().find(|r| r.key.as_str() == key)
    }
}

/// Matched columns of one category, as reported by `inspect`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMatch {
    pub category: String,
    pub columns: Vec<String>,
    pub points_possible: Vec<f64>,
    pub percentage_per: f64,
}

/// Distribution of a single value across students.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValueStats {
    pub mean: f64,
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub stats: ValueStats,
}

/// Class-wide summary of a grading run, written as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSummary {
    pub schema_version: u8,
    pub generated_at: DateTime<Utc>,
    pub student_count: usize,
    pub total: ValueStats,
    pub categories: Vec<CategorySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance: Option<ValueStats>,
}
