//! Command handler functions for the replaycov CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use log::info;

use crate::aggregate::Evaluation;
use crate::config::Config;
use crate::discover;
use crate::report::{EvaluationReport, JsonFormatter, ReportFormatter, TextFormatter};
use crate::session::SessionKey;
use crate::store::{self, ResultRow};

/// Output style for command results.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum Style {
    #[default]
    Text,
    Json,
}

impl Style {
    fn formatter(self) -> &'static dyn ReportFormatter {
        match self {
            Style::Text => &TextFormatter,
            Style::Json => &JsonFormatter,
        }
    }
}

/// Aggregate every annotation file found under `roots`.
pub fn cmd_branches(roots: &[PathBuf], style: Style) -> Result<String> {
    let mut eval = Evaluation::new();
    for root in roots {
        add_annotations(&mut eval, root)?;
    }
    Ok(EvaluationReport::new(&eval, None).format(style.formatter())?)
}

/// Compute cumulative coverage for summary reports given in replay order.
pub fn cmd_coverage(summaries: &[PathBuf], style: Style) -> Result<String> {
    let mut eval = Evaluation::new();
    for summary in summaries {
        eval.add_summary_file(summary);
    }
    Ok(EvaluationReport::new(&eval, None).format(style.formatter())?)
}

/// Inputs of a full evaluation.
#[derive(Debug, Clone)]
pub struct EvaluateArgs {
    /// Test-case directory of the run; names the tool, program and repetition.
    pub src_dir: String,
    pub gcov_num: u32,
    pub config: PathBuf,
    pub tool: Option<String>,
    /// Summary reports, one per replay step, in replay order.
    pub summaries: Vec<PathBuf>,
    pub annotation_root: Option<PathBuf>,
    pub out: PathBuf,
}

/// Run a full evaluation and persist its tables.
pub fn cmd_evaluate(args: &EvaluateArgs, style: Style) -> Result<String> {
    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;
    let (program, settings) = config.program_for(&args.src_dir)?;
    let key = SessionKey::infer(&args.src_dir, program, args.tool.as_deref());
    info!("evaluating {} for {}", key.stem(), program);

    let mut eval = Evaluation::new();
    for (step, summary) in args.summaries.iter().enumerate() {
        let sample = eval.add_summary_file(summary);
        info!("replay step {}: {} covered branches", step + 1, sample.covered);
    }

    let root = args
        .annotation_root
        .clone()
        .unwrap_or_else(|| settings.annotation_root(args.gcov_num));
    add_annotations(&mut eval, &root)?;

    let branch_path = key.branch_table_path(&args.out);
    let function_path = key.function_table_path(&args.out);
    let results_path = key.results_path(&args.out);

    store::write_branch_table(&branch_path, eval.branch_visits())
        .with_context(|| format!("Failed to write {}", branch_path.display()))?;
    store::write_function_table(&function_path, eval.functions())
        .with_context(|| format!("Failed to write {}", function_path.display()))?;
    store::upsert_result(
        &results_path,
        &ResultRow {
            tool: key.tool.clone(),
            program: key.program.clone(),
            repetition: key.repetition.clone(),
            total_coverage: eval.total_coverage(),
            average_switch: (eval.average_switches() * 100.0).round() / 100.0,
        },
    )
    .with_context(|| format!("Failed to update {}", results_path.display()))?;
    info!("coverage result updated in {}", results_path.display());

    let mut out = EvaluationReport::new(&eval, Some(key)).format(style.formatter())?;
    if let Style::Text = style {
        for path in [&branch_path, &function_path, &results_path] {
            writeln!(out, "Wrote {}", path.display()).unwrap();
        }
    }
    Ok(out)
}

fn add_annotations(eval: &mut Evaluation, root: &Path) -> Result<()> {
    let files = discover::annotation_files(root)
        .with_context(|| format!("Failed to scan {}", root.display()))?;
    info!("found {} annotation files under {}", files.len(), root.display());
    for file in &files {
        eval.add_annotation_file(file);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANNOTATION: &str = "\
        -:    0:Source:/src/grep.c
function main called 2 returned 100% blocks executed 90%
        2:   10:  if (argc > 1)
branch  0 taken 50%
branch  1 taken 50%
        2:   11:  switch (mode) {
branch  0 taken 100%
branch  1 taken 0%
        2:   12:  }
";

    #[test]
    fn test_cmd_branches() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/grep.c.gcov"), ANNOTATION).unwrap();

        let out = cmd_branches(&[dir.path().to_path_buf()], Style::Text).unwrap();
        assert!(out.contains("Annotation files:  1"));
        assert!(out.contains("Branches visited:  3 (4 visits)"));
        assert!(out.contains("Function records:  1"));
        assert!(out.contains("Taken switches:    1.00 per file"));
    }

    #[test]
    fn test_cmd_coverage_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("cov_result.1");
        let second = dir.path().join("cov_result.2");
        std::fs::write(&first, "Taken at least once:10.00% of 50\n").unwrap();
        std::fs::write(&second, "Taken at least once:80.00% of 50\n").unwrap();

        let out = cmd_coverage(&[first, second], Style::Text).unwrap();
        assert!(out.contains("10.0%"));
        assert!(out.contains("80.0%"));
        assert!(out.contains("Total coverage:    40 branches"));
    }

    #[test]
    fn test_cmd_coverage_missing_summary() {
        let out = cmd_coverage(&[PathBuf::from("/no/such/cov_result")], Style::Text).unwrap();
        assert!(out.contains("Total coverage:    0 branches"));
        assert!(out.contains("1 missing inputs"));
    }

    #[test]
    fn test_cmd_evaluate() {
        let dir = tempfile::tempdir().unwrap();
        let build = dir.path().join("grep-3.6/obj-gcov1/src");
        std::fs::create_dir_all(&build).unwrap();
        std::fs::write(build.join("grep.c.gcov"), ANNOTATION).unwrap();

        let config = dir.path().join("config.json");
        let gcov_dir = dir.path().join("grep-3.6/obj-gcov<gcov_num>/src");
        std::fs::write(
            &config,
            serde_json::json!({ "grep": { "gcov_dir": gcov_dir } }).to_string(),
        )
        .unwrap();

        let summary = dir.path().join("cov_result");
        std::fs::write(&summary, "Taken at least once:50.00% of 8\n").unwrap();

        let args = EvaluateArgs {
            src_dir: "/klee_out/homi_grep_rep1".to_string(),
            gcov_num: 1,
            config,
            tool: None,
            summaries: vec![summary],
            annotation_root: None,
            out: dir.path().join("results"),
        };
        let out = cmd_evaluate(&args, Style::Text).unwrap();
        assert!(out.contains("Tool: homi  Program: grep  Repetition: rep1"));
        assert!(out.contains("Total coverage:    4 branches"));

        let branches = store::read_branch_table(
            &dir.path().join("results/grep/branch_visit_count/homi_grep_rep1_branch_visit_count.csv"),
        )
        .unwrap();
        assert_eq!(
            branches,
            vec![
                ("grep.c 10 0".to_string(), 1),
                ("grep.c 10 1".to_string(), 1),
                ("grep.c 11 0".to_string(), 2),
            ]
        );

        let (_, rows) =
            store::read_results(&dir.path().join("results/cov_results/homi_grep_cov_result.csv"))
                .unwrap();
        assert_eq!(
            rows[0].iter().collect::<Vec<_>>(),
            vec!["homi", "grep", "_rep1", "4", "1.00"]
        );
    }

    #[test]
    fn test_cmd_evaluate_unknown_program() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.json");
        std::fs::write(&config, r#"{"sed": {"gcov_dir": "/x"}}"#).unwrap();
        let args = EvaluateArgs {
            src_dir: "/klee_out/homi_grep".to_string(),
            gcov_num: 1,
            config,
            tool: None,
            summaries: vec![],
            annotation_root: None,
            out: dir.path().to_path_buf(),
        };
        assert!(cmd_evaluate(&args, Style::Text).is_err());
    }
}
