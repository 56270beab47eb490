//! Uniform in-memory representation of replay coverage data. Parsers produce
//! these values; the aggregator and the CSV store consume them.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;

use serde::Serialize;

/// Compute a coverage rate, returning 0.0 when the total is zero.
#[must_use]
pub fn rate(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    }
}

/// Identity of one conditional branch site.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BranchKey {
    pub source_file: String,
    pub line_number: u32,
    pub branch_index: u32,
}

impl BranchKey {
    pub fn new(source_file: impl Into<String>, line_number: u32, branch_index: u32) -> Self {
        Self {
            source_file: source_file.into(),
            line_number,
            branch_index,
        }
    }
}

/// Rendered as `"<file> <line> <branch>"`, the identifier column of the
/// persisted branch table.
impl fmt::Display for BranchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.source_file, self.line_number, self.branch_index)
    }
}

/// A single positive branch contribution observed in one annotation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchVisit {
    pub key: BranchKey,
    pub visits: u64,
}

/// Cumulative visit counts per branch. Counts only ever grow; a key is present
/// only if at least one positive contribution was recorded for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchVisitTable {
    entries: BTreeMap<BranchKey, u64>,
}

impl BranchVisitTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `visits` to `key`. Zero contributions are dropped so the table never
    /// holds zero entries.
    pub fn record(&mut self, key: BranchKey, visits: u64) {
        if visits == 0 {
            return;
        }
        *self.entries.entry(key).or_insert(0) += visits;
    }

    pub fn get(&self, key: &BranchKey) -> Option<u64> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all visit counts.
    pub fn total_visits(&self) -> u64 {
        self.entries.values().sum()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&BranchKey, u64)> {
        self.entries.iter().map(|(k, v)| (k, *v))
    }
}

impl Extend<BranchVisit> for BranchVisitTable {
    fn extend<I: IntoIterator<Item = BranchVisit>>(&mut self, iter: I) {
        for visit in iter {
            self.record(visit.key, visit.visits);
        }
    }
}

impl FromIterator<BranchVisit> for BranchVisitTable {
    fn from_iter<I: IntoIterator<Item = BranchVisit>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

/// Branch coverage of one function block inside one annotation file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionRecord {
    pub source_file: String,
    pub name: String,
    /// Percentage in `[0, 100]`.
    pub coverage: f64,
    pub branches_taken: u64,
    pub branches_total: u64,
}

/// Covered/total branch counts read from one summary report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoverageSample {
    pub covered: u64,
    pub total: u64,
}

impl CoverageSample {
    /// Coverage percentage, 0.0 when the report named no branches.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        rate(self.covered, self.total) * 100.0
    }

    /// `true` when the report contained no "Taken at least" lines.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Non-fatal parse findings, reported next to the data instead of as errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Lines with an unparseable field: count, line number, branch index,
    /// taken percentage, function name or summary figures.
    pub malformed_lines: u64,
    /// Branch contributions dropped because a value was NaN.
    pub invalid_numeric: u64,
    /// Lines skipped because they carried the not-executed sentinel.
    pub unexecuted_lines: u64,
    /// Expected inputs that were absent, unreadable or empty.
    pub missing_inputs: u64,
}

impl Diagnostics {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

impl AddAssign for Diagnostics {
    fn add_assign(&mut self, rhs: Self) {
        self.malformed_lines += rhs.malformed_lines;
        self.invalid_numeric += rhs.invalid_numeric;
        self.unexecuted_lines += rhs.unexecuted_lines;
        self.missing_inputs += rhs.missing_inputs;
    }
}

/// Everything extracted from a single annotation file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileAnalysis {
    /// Source file named by the annotation's `Source:` header.
    pub source_file: String,
    pub visits: Vec<BranchVisit>,
    pub functions: Vec<FunctionRecord>,
    /// Switch blocks with at least one taken branch.
    pub switches: u64,
}
