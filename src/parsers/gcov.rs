/// Parser for gcov's annotated source output (`<file>.gcov`, `gcov -b`).
///
/// Relevant records:
///   `        -:    0:Source:src/grep.c`          source header
///   `       12:  140:    if (x > 0)`            executed line: count, line number, text
///   `    #####:  141:      y = 1;`              line never executed
///   `branch  0 taken 75%`                      branch of the preceding line
///   `branch  1 never executed`
///   `function main called 3 returned 100% blocks executed 80%`
///
/// A branch record always belongs to the most recent executed line. The
/// parser keeps that pairing explicit in [`LineContext`] instead of relying on
/// whatever count happened to be parsed last.
use std::io::{self, BufRead};
use std::sync::OnceLock;

use log::{debug, warn};
use regex::Regex;

use super::switch::SwitchCounter;
use super::{for_each_line, ReportParser};
use crate::model::{BranchKey, BranchVisit, Diagnostics, FileAnalysis, FunctionRecord};

const UNEXECUTED: &[&str] = &["#####", "====="];
/// A count line carrying this marker anywhere is skipped, source text included.
const UNEXECUTED_MARKER: &str = "#####";
const NEVER_EXECUTED: &str = "never executed";

fn source_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*-:\s*0:Source:(.*)$").expect("valid source regex"))
}

fn count_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(\d+\*?|#####|=====)\s*:\s*([^:]*):").expect("valid count-line regex")
    })
}

/// Which executed line, if any, the next branch record refers to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineContext {
    /// No executed line seen yet in this file.
    #[default]
    AwaitingCount,
    /// Branch records that follow belong to this line.
    HaveCount { visits: u64, line_number: u32 },
}

impl LineContext {
    fn visits(&self) -> u64 {
        match *self {
            LineContext::AwaitingCount => 0,
            LineContext::HaveCount { visits, .. } => visits,
        }
    }

    fn line_number(&self) -> u32 {
        match *self {
            LineContext::AwaitingCount => 0,
            LineContext::HaveCount { line_number, .. } => line_number,
        }
    }
}

/// Running branch counters for the function block being scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenFunction {
    name: String,
    taken: u64,
    total: u64,
}

impl OpenFunction {
    fn new(name: String) -> Self {
        Self {
            name,
            taken: 0,
            total: 0,
        }
    }

    fn close(self, source_file: &str) -> FunctionRecord {
        let coverage = if self.total > 0 {
            self.taken as f64 * 100.0 / self.total as f64
        } else {
            0.0
        };
        FunctionRecord {
            source_file: source_file.to_string(),
            name: self.name,
            coverage,
            branches_taken: self.taken,
            branches_total: self.total,
        }
    }
}

/// Per-file scanning state. Created fresh for every annotation file.
#[derive(Debug, Clone, Default)]
pub struct ParseState {
    source_file: String,
    context: LineContext,
    function: Option<OpenFunction>,
}

impl ParseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn context(&self) -> LineContext {
        self.context
    }

    pub fn current_function(&self) -> Option<&str> {
        self.function.as_ref().map(|f| f.name.as_str())
    }

    /// Apply one annotation line.
    pub fn feed(&mut self, line: &str, out: &mut FileAnalysis, diagnostics: &mut Diagnostics) {
        if let Some(caps) = source_re().captures(line) {
            self.source_file = source_name(&caps[1]);
        } else if let Some(caps) = count_line_re().captures(line) {
            self.count_line(line, &caps[1], &caps[2], diagnostics);
        } else if line.trim_start().starts_with("function") && line.contains("called") {
            match line.split_whitespace().nth(1) {
                Some(name) => self.function_line(name, out),
                None => diagnostics.malformed_lines += 1,
            }
        } else if line.contains("branch") && line.contains("taken") {
            self.branch_line(line, out, diagnostics);
        }
    }

    /// Close any open function block. Must run once at end of input.
    pub fn finish(&mut self, out: &mut FileAnalysis) {
        if let Some(function) = self.function.take() {
            out.functions.push(function.close(&self.source_file));
        }
    }

    fn count_line(
        &mut self,
        line: &str,
        count: &str,
        line_number: &str,
        diagnostics: &mut Diagnostics,
    ) {
        if UNEXECUTED.contains(&count) || line.contains(UNEXECUTED_MARKER) {
            diagnostics.unexecuted_lines += 1;
            return;
        }
        let count = count.trim_end_matches('*');
        self.context = match (count.parse::<u64>(), line_number.trim().parse::<u32>()) {
            (Ok(visits), Ok(line_number)) => LineContext::HaveCount {
                visits,
                line_number,
            },
            _ => {
                diagnostics.malformed_lines += 1;
                LineContext::HaveCount {
                    visits: 0,
                    line_number: 0,
                }
            }
        };
    }

    fn function_line(&mut self, name: &str, out: &mut FileAnalysis) {
        if self.current_function() == Some(name) {
            return;
        }
        self.finish(out);
        self.function = Some(OpenFunction::new(name.to_string()));
    }

    fn branch_line(&mut self, line: &str, out: &mut FileAnalysis, diagnostics: &mut Diagnostics) {
        let mut tokens = line.split_whitespace();
        let branch_index = match tokens.nth(1).map(str::parse::<u32>) {
            Some(Ok(index)) => index,
            _ => {
                diagnostics.malformed_lines += 1;
                0
            }
        };
        let taken = match tokens.nth(1).map(|t| t.trim_end_matches('%').parse::<f64>()) {
            Some(Ok(pct)) => pct,
            _ => {
                diagnostics.malformed_lines += 1;
                0.0
            }
        };

        let line_visits = self.context.visits();
        let line_number = self.context.line_number();
        match branch_visits(line_visits, taken) {
            Some(visits) if visits > 0 => out.visits.push(BranchVisit {
                key: BranchKey::new(self.source_file.clone(), line_number, branch_index),
                visits,
            }),
            Some(_) => {}
            None => {
                warn!(
                    "NaN detected in {} {} {}",
                    self.source_file, line_number, branch_index
                );
                diagnostics.invalid_numeric += 1;
            }
        }

        if let Some(function) = self.function.as_mut() {
            function.total += 1;
            if !line.contains(NEVER_EXECUTED) && taken > 0.0 {
                function.taken += 1;
            }
        }
    }
}

/// Visits attributed to one branch: `floor(line_visits * taken / 100)`.
/// Returns `None` when the result is not a number.
pub fn branch_visits(line_visits: u64, taken: f64) -> Option<u64> {
    let visits = (line_visits as f64 * taken / 100.0).floor();
    if !visits.is_finite() {
        return None;
    }
    if visits <= 0.0 {
        Some(0)
    } else {
        Some(visits as u64)
    }
}

/// Final path component of a `Source:` header value.
fn source_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).trim().to_string()
}

/// Annotation file parser.
pub struct GcovParser;

impl ReportParser for GcovParser {
    type Output = FileAnalysis;

    fn parse_reader(
        &self,
        reader: &mut dyn BufRead,
        diagnostics: &mut Diagnostics,
    ) -> io::Result<FileAnalysis> {
        let mut out = FileAnalysis::default();
        let mut state = ParseState::new();
        let mut switches = SwitchCounter::new();

        for_each_line(reader, |line| {
            state.feed(line, &mut out, diagnostics);
            switches.feed(line);
        })?;
        state.finish(&mut out);

        out.source_file = state.source_file;
        out.switches = switches.total();
        debug!(
            "parsed annotations for '{}': {} branch visits, {} functions, {} switches",
            out.source_file,
            out.visits.len(),
            out.functions.len(),
            out.switches
        );
        Ok(out)
    }
}
