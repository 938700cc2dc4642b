//! Score aggregation and final grade computation.
//!
//! This module matches export columns to grading categories, scales raw
//! points into weighted percentages, drops each student's lowest scores per
//! category, folds in attendance, and sums everything into a final total.

pub mod aggregate;
pub mod attendance;
pub mod drops;
pub mod labels;
pub mod pipeline;
pub mod scale;
pub mod types;
pub mod utility;
