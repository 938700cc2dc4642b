//! Grading policy: category weights, drop counts and the attendance rule.
//!
//! Stored as a JSON object keyed by category name, in the order categories
//! should appear in the output:
//! ```json
//! {
//!   "Homework": { "percentage": 30, "number": 8, "drops": 1 },
//!   "Final Exam": { "percentage": 65, "number": 0 },
//!   "Attendance": { "percentage": 5, "required": 10, "cap": "late_cap", "late_cap": 8 }
//! }
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;

use crate::error::GradeError;

/// Name of the special entry that configures the attendance contribution.
pub const ATTENDANCE_CATEGORY: &str = "Attendance";

/// Weighting policy for one category of assignments.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryConfig {
    /// Weight of the category in the final total, on a 0–100 scale.
    pub percentage: f64,
    /// Number of assignments in the category; 0 means a single ungrouped assignment.
    pub number: u32,
    /// Lowest-scoring assignments to discard.
    #[serde(default)]
    pub drops: u32,
}

impl CategoryConfig {
    pub fn new(percentage: f64, number: u32, drops: u32) -> Self {
        Self {
            percentage,
            number,
            drops,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttendanceConfig {
    pub percentage: f64,
    /// Sessions needed for full credit when no cap is active.
    pub required: f64,
    /// `"none"` or the name of a sibling entry holding the capped count.
    #[serde(default)]
    pub cap: Option<String>,
    #[serde(flatten)]
    pub cap_table: HashMap<String, f64>,
}

impl AttendanceConfig {
    pub fn new(percentage: f64, required: f64) -> Self {
        Self {
            percentage,
            required,
            cap: None,
            cap_table: HashMap::new(),
        }
    }

    /// Activates the cap stored under `name`.
    pub fn with_cap(mut self, name: &str, value: f64) -> Self {
        self.cap = Some(name.to_string());
        self.cap_table.insert(name.to_string(), value);
        self
    }

    /// Resolves the active cap, if any.
    ///
    /// # Errors
    ///
    /// Returns [`GradeError::InvalidConfiguration`] if `cap` names an entry
    /// that is not present.
    pub fn cap_value(&self) -> Result<Option<f64>, GradeError> {
        match self.cap.as_deref() {
            None | Some("none") => Ok(None),
            Some(name) => self.cap_table.get(name).copied().map(Some).ok_or_else(|| {
                GradeError::InvalidConfiguration {
                    category: ATTENDANCE_CATEGORY.to_string(),
                    reason: format!("cap '{name}' has no matching entry"),
                }
            }),
        }
    }
}

/// The full grading policy, categories kept in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradingConfig {
    categories: Vec<(String, CategoryConfig)>,
    attendance: Option<AttendanceConfig>,
}

impl GradingConfig {
    pub fn new(
        categories: Vec<(String, CategoryConfig)>,
        attendance: Option<AttendanceConfig>,
    ) -> Self {
        Self {
            categories,
            attendance,
        }
    }

    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read grading config '{path}'"))?;
        Self::from_json_str(&content).with_context(|| format!("invalid grading config '{path}'"))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let entries: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)?;

        let mut categories = Vec::with_capacity(entries.len());
        let mut attendance = None;

        for (name, value) in entries {
            if name == ATTENDANCE_CATEGORY {
                let parsed: AttendanceConfig = serde_json::from_value(value)
                    .context("invalid settings for the attendance entry")?;
                attendance = Some(parsed);
            } else {
                let parsed: CategoryConfig = serde_json::from_value(value)
                    .with_context(|| format!("invalid settings for category '{name}'"))?;
                categories.push((name, parsed));
            }
        }

        Ok(Self {
            categories,
            attendance,
        })
    }

    pub fn categories(&self) -> &[(String, CategoryConfig)] {
        &self.categories
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    pub fn attendance(&self) -> Option<&AttendanceConfig> {
        self.attendance.as_ref()
    }

    /// Sum of every configured weight, attendance included.
    pub fn total_weight(&self) -> f64 {
        let categories: f64 = self.categories.iter().map(|(_, c)| c.percentage).sum();
        categories + self.attendance.as_ref().map_or(0.0, |a| a.percentage)
    }
}
