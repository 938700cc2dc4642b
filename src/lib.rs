pub mod config;
pub mod error;
pub mod grading;
pub mod output;
pub mod parser;

pub use config::{AttendanceConfig, CategoryConfig, GradingConfig};
pub use error::GradeError;
pub use grading::pipeline::{grade, inspect};
