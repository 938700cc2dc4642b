//! Errors raised while turning score exports into final grades.
//!
//! Every variant aborts the run. Each carries the category, column label or
//! student identifier needed to find the offending cell without re-running
//! with tracing enabled.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradeError {
    /// A selected assignment column has no numeric value in the points-possible row.
    #[error("assignment '{column}' (category '{category}') has no points-possible value")]
    MissingPointsPossible { category: String, column: String },

    /// The configuration expects an assignment column the export does not contain.
    #[error("category '{category}' expects an assignment labelled '{label}', but no such column exists")]
    AssignmentNotFound { category: String, label: String },

    /// Two category names overlap as column-label prefixes.
    #[error("categories '{first}' and '{second}' overlap{}", .label.as_deref().map(|l| format!(" on column '{l}'")).unwrap_or_default())]
    ConfigurationConflict {
        first: String,
        second: String,
        label: Option<String>,
    },

    /// A student identifier is not an integer-backed value.
    #[error("student identifier '{value}' in {context} is not an integer")]
    IdentifierFormat { value: String, context: String },

    #[error("columns '{first}' and '{second}' both map to assignment '{label}'")]
    DuplicateAssignment {
        label: String,
        first: String,
        second: String,
    },

    #[error("student '{key}' appears more than once in {origin}")]
    DuplicateStudent { key: String, origin: String },

    #[error("score '{value}' for student '{student}' in column '{column}' is not a number")]
    InvalidScore {
        student: String,
        column: String,
        value: String,
    },

    #[error("invalid settings for category '{category}': {reason}")]
    InvalidConfiguration { category: String, reason: String },

    #[error("score export is missing the required '{column}' column")]
    MissingColumn { column: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message_with_and_without_label() {
        let err = GradeError::ConfigurationConflict {
            first: "Quiz".into(),
            second: "Quiz Bonus".into(),
            label: None,
        };
        assert_eq!(err.to_string(), "categories 'Quiz' and 'Quiz Bonus' overlap");

        let err = GradeError::ConfigurationConflict {
            first: "Quiz".into(),
            second: "Quiz Bonus".into(),
            label: Some("Quiz Bonus 1".into()),
        };
        assert_eq!(
            err.to_string(),
            "categories 'Quiz' and 'Quiz Bonus' overlap on column 'Quiz Bonus 1'"
        );
    }

    #[test]
    fn test_messages_name_the_offending_cell() {
        let err = GradeError::InvalidScore {
            student: "1001".into(),
            column: "Homework 2".into(),
            value: "EX".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("1001"));
        assert!(msg.contains("Homework 2"));
        assert!(msg.contains("EX"));
    }
}
