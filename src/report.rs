//! Output formatting for evaluation results.

use std::fmt::Write;

use serde::Serialize;

use crate::aggregate::Evaluation;
use crate::error::Result;
use crate::model::{CoverageSample, Diagnostics};
use crate::session::SessionKey;

/// Snapshot of an [`Evaluation`], ready to be formatted.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    /// Present when the run was identified from a test-case directory.
    pub key: Option<SessionKey>,
    pub annotation_files: usize,
    /// Distinct branch keys with at least one visit.
    pub branches: usize,
    pub branch_visits: u64,
    pub function_records: usize,
    pub average_switches: f64,
    /// Cumulative coverage after each replay step, in replay order.
    pub samples: Vec<CoverageSample>,
    pub total_coverage: u64,
    pub diagnostics: Diagnostics,
}

impl EvaluationReport {
    pub fn new(eval: &Evaluation, key: Option<SessionKey>) -> Self {
        Self {
            key,
            annotation_files: eval.annotation_files(),
            branches: eval.branch_visits().len(),
            branch_visits: eval.branch_visits().total_visits(),
            function_records: eval.functions().len(),
            average_switches: eval.average_switches(),
            samples: eval.samples().to_vec(),
            total_coverage: eval.total_coverage(),
            diagnostics: eval.diagnostics(),
        }
    }

    /// Format using a specific formatter.
    pub fn format(&self, formatter: &dyn ReportFormatter) -> Result<String> {
        formatter.format(self)
    }
}

/// Trait for formatting evaluation reports.
pub trait ReportFormatter {
    fn format(&self, report: &EvaluationReport) -> Result<String>;
}

/// Plain text formatter.
pub struct TextFormatter;

impl ReportFormatter for TextFormatter {
    fn format(&self, report: &EvaluationReport) -> Result<String> {
        let mut out = String::new();

        if let Some(key) = &report.key {
            let repetition = if key.repetition.is_empty() {
                "-"
            } else {
                key.repetition.trim_start_matches('_')
            };
            writeln!(
                out,
                "Tool: {}  Program: {}  Repetition: {}",
                key.tool, key.program, repetition
            )
            .unwrap();
        }

        if report.annotation_files > 0 || report.branches > 0 {
            writeln!(out, "Annotation files:  {}", report.annotation_files).unwrap();
            writeln!(
                out,
                "Branches visited:  {} ({} visits)",
                report.branches, report.branch_visits
            )
            .unwrap();
            writeln!(out, "Function records:  {}", report.function_records).unwrap();
            writeln!(out, "Taken switches:    {:.2} per file", report.average_switches).unwrap();
        }

        if !report.samples.is_empty() {
            writeln!(out, "{:>6} {:>10} {:>10} {:>8}", "STEP", "COVERED", "TOTAL", "RATE").unwrap();
            writeln!(out, "{}", "-".repeat(37)).unwrap();
            for (step, sample) in report.samples.iter().enumerate() {
                writeln!(
                    out,
                    "{:>6} {:>10} {:>10} {:>7.1}%",
                    step + 1,
                    sample.covered,
                    sample.total,
                    sample.percentage()
                )
                .unwrap();
            }
            writeln!(out, "Total coverage:    {} branches", report.total_coverage).unwrap();
        }

        let d = &report.diagnostics;
        if !d.is_clean() {
            writeln!(
                out,
                "Skipped: {} malformed, {} invalid numeric, {} unexecuted lines, {} missing inputs",
                d.malformed_lines, d.invalid_numeric, d.unexecuted_lines, d.missing_inputs
            )
            .unwrap();
        }

        if out.is_empty() {
            out.push_str("No coverage data found.\n");
        }
        Ok(out)
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &EvaluationReport) -> Result<String> {
        let mut json = serde_json::to_string_pretty(report)?;
        json.push('\n');
        Ok(json)
    }
}
