//! CLI entry point for the Canvas grader.
//!
//! Provides subcommands for computing final grades from a gradebook export
//! and for checking how the export's columns match a grading config.

use anyhow::{Context, Result};
use canvas_grader::GradingConfig;
use canvas_grader::grading::aggregate::summarize;
use canvas_grader::grading::pipeline::{grade, inspect};
use canvas_grader::output::{print_pretty, write_final_scores, write_summary};
use canvas_grader::parser::{read_attendance, read_score_export};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "canvas_grader")]
#[command(about = "Compute final grades from Canvas gradebook exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute final scores and write them as CSV
    Grade {
        /// Canvas exported scores file
        #[arg(short, long, default_value = "scores.csv")]
        scores: String,

        /// Grading config (JSON)
        #[arg(short, long, env = "GRADING_CONFIG", default_value = "grading_config.json")]
        config: String,

        /// Output path for the final scores CSV
        #[arg(short, long, default_value = "final_scores.csv")]
        output: String,

        /// Attendance counts, read only when the config has an Attendance entry
        #[arg(short, long, default_value = "attendance.csv")]
        attendance: String,

        /// Also write every scaled assignment column
        #[arg(long, default_value_t = false)]
        detailed: bool,

        /// Optional: write a JSON class summary to this path
        #[arg(long)]
        summary: Option<String>,
    },
    /// Show which export columns each category matches, without grading
    Inspect {
        /// Canvas exported scores file
        #[arg(short, long, default_value = "scores.csv")]
        scores: String,

        /// Grading config (JSON)
        #[arg(short, long, env = "GRADING_CONFIG", default_value = "grading_config.json")]
        config: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/canvas_grader.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("canvas_grader.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Grade {
            scores,
            config,
            output,
            attendance,
            detailed,
            summary,
        } => {
            run_grade(&scores, &config, &output, &attendance, detailed, summary.as_deref())?;
        }
        Commands::Inspect { scores, config } => {
            run_inspect(&scores, &config)?;
        }
    }

    Ok(())
}

/// Loads inputs, grades every student and writes the results.
#[tracing::instrument(skip(summary_path, detailed))]
fn run_grade(
    scores_path: &str,
    config_path: &str,
    output_path: &str,
    attendance_path: &str,
    detailed: bool,
    summary_path: Option<&str>,
) -> Result<()> {
    let config = GradingConfig::load(config_path)?;
    let raw = read_score_export(scores_path)?;
    info!(
        students = raw.students.len(),
        columns = raw.headers.len(),
        "Score export loaded"
    );

    let attendance = if config.attendance().is_some() {
        let records = read_attendance(attendance_path)?;
        info!(records = records.len(), "Attendance loaded");
        records
    } else {
        Vec::new()
    };

    let report = grade(&raw, &config, &attendance).context("grading failed")?;
    write_final_scores(output_path, &report, detailed)?;

    let class_summary = summarize(&report);
    print_pretty(&class_summary);
    info!(
        students = class_summary.student_count,
        mean_total = class_summary.total.mean,
        stddev_total = class_summary.total.stddev,
        "Grading complete"
    );

    if let Some(path) = summary_path {
        write_summary(path, &class_summary)?;
    }

    Ok(())
}

/// Logs, per category, the matched columns and the weight each one carries.
#[tracing::instrument]
fn run_inspect(scores_path: &str, config_path: &str) -> Result<()> {
    let config = GradingConfig::load(config_path)?;
    let raw = read_score_export(scores_path)?;

    let matches = inspect(&raw, &config).context("column matching failed")?;

    for m in &matches {
        info!(
            category = %m.category,
            columns = ?m.columns,
            points_possible = ?m.points_possible,
            percentage_per = m.percentage_per,
            "Category"
        );
        if m.columns.is_empty() {
            warn!(category = %m.category, "No columns match this category");
        }
    }

    if let Some(attendance) = config.attendance() {
        let cap = attendance.cap_value()?;
        info!(
            percentage = attendance.percentage,
            required = attendance.required,
            cap = ?cap,
            "Attendance"
        );
    }

    info!(
        categories = matches.len(),
        matched_columns = matches.iter().map(|m| m.columns.len()).sum::<usize>(),
        total_weight = config.total_weight(),
        "Inspection summary"
    );

    Ok(())
}
