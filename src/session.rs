//! Identification of an evaluation run from its test-case directory name,
//! e.g. `/out/featmaker_grep_switch_rep3`, and the table paths derived from it.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Tools recognised in test-case directory names, in priority order.
pub const KNOWN_TOOLS: &[&str] = &["homi", "featmaker", "symtuner", "klee-aaqc"];

const UNKNOWN_TOOL: &str = "unknown";

fn human_args_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)humanArgs").expect("valid regex"))
}

fn regex_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)regex").expect("valid regex"))
}

fn rep_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)rep\d+").expect("valid regex"))
}

/// (tool, program, repetition) plus the naming variants of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionKey {
    pub tool: String,
    pub program: String,
    /// `_repN`, or empty when the run is not a repetition.
    pub repetition: String,
    switch_suffix: String,
    regex_suffix: String,
    human_args_suffix: String,
}

impl SessionKey {
    /// Infer the key from a test-case directory path. `tool` overrides the
    /// tool inferred from the path (e.g. `human` for hand-written suites).
    pub fn infer(src_dir: &str, program: &str, tool: Option<&str>) -> Self {
        let lower = src_dir.to_lowercase();

        let tool = match tool {
            Some(tool) => tool.to_string(),
            None => infer_tool(&lower).to_string(),
        };
        let suffix = |re: &Regex| {
            re.find(src_dir)
                .map(|m| format!("_{}", m.as_str()))
                .unwrap_or_default()
        };
        let switch_suffix = if lower.contains("switch") {
            "_switch".to_string()
        } else {
            String::new()
        };

        Self {
            tool,
            program: program.to_string(),
            repetition: suffix(rep_re()),
            switch_suffix,
            regex_suffix: suffix(regex_re()),
            human_args_suffix: suffix(human_args_re()),
        }
    }

    /// Name shared by every table of this run, repetition excluded.
    fn family(&self) -> String {
        format!(
            "{}_{}{}{}{}",
            self.tool, self.program, self.switch_suffix, self.regex_suffix, self.human_args_suffix
        )
    }

    pub fn stem(&self) -> String {
        format!("{}{}", self.family(), self.repetition)
    }

    pub fn branch_table_path(&self, out: &Path) -> PathBuf {
        out.join(&self.program)
            .join("branch_visit_count")
            .join(format!("{}_branch_visit_count.csv", self.stem()))
    }

    pub fn function_table_path(&self, out: &Path) -> PathBuf {
        out.join(&self.program)
            .join("function_coverage")
            .join(format!("{}_function_coverage.csv", self.stem()))
    }

    /// Results table shared by all repetitions of the run.
    pub fn results_path(&self, out: &Path) -> PathBuf {
        out.join("cov_results")
            .join(format!("{}_cov_result.csv", self.family()))
    }
}

fn infer_tool(lower: &str) -> &'static str {
    let tool = KNOWN_TOOLS
        .iter()
        .copied()
        .find(|t| lower.contains(t))
        .unwrap_or(UNKNOWN_TOOL);
    // FeatMaker's depth-first baseline is plain KLEE.
    if tool == "featmaker" && lower.contains("depth") {
        "klee"
    } else {
        tool
    }
}
