//! Accumulation of per-file parse results across a whole evaluation.
//!
//! Branch visits are summed per [`BranchKey`](crate::model::BranchKey), so the
//! final table does not depend on the order annotation files are processed in.

use std::path::Path;

use log::debug;

use crate::model::{
    BranchVisit, BranchVisitTable, CoverageSample, Diagnostics, FileAnalysis, FunctionRecord,
};
use crate::parsers::gcov::GcovParser;
use crate::parsers::summary::SummaryParser;
use crate::parsers::{Parsed, ReportParser};

/// Fold `visits` into `table`, summing on duplicate keys.
#[must_use]
pub fn merge_visits<I>(mut table: BranchVisitTable, visits: I) -> BranchVisitTable
where
    I: IntoIterator<Item = BranchVisit>,
{
    table.extend(visits);
    table
}

/// Sum two tables key by key.
#[must_use]
pub fn merge_tables(mut left: BranchVisitTable, right: &BranchVisitTable) -> BranchVisitTable {
    for (key, visits) in right.iter() {
        left.record(key.clone(), visits);
    }
    left
}

/// Running totals for one (tool, program, repetition) evaluation.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    branch_visits: BranchVisitTable,
    functions: Vec<FunctionRecord>,
    switch_counts: Vec<u64>,
    samples: Vec<CoverageSample>,
    diagnostics: Diagnostics,
}

impl Evaluation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in the analysis of one annotation file.
    pub fn add_annotation(&mut self, parsed: Parsed<FileAnalysis>) {
        let Parsed { value, diagnostics } = parsed;
        self.diagnostics += diagnostics;
        if diagnostics.missing_inputs > 0 {
            // Still averaged over: an empty annotation file has no taken switch.
            self.switch_counts.push(0);
            return;
        }
        let table = std::mem::take(&mut self.branch_visits);
        self.branch_visits = merge_visits(table, value.visits);
        self.functions.extend(value.functions);
        self.switch_counts.push(value.switches);
    }

    pub fn add_annotation_file(&mut self, path: &Path) {
        debug!("reading annotations from {}", path.display());
        self.add_annotation(GcovParser.parse_path(path));
    }

    /// Record the summary of the next replay step. Returns the sample so the
    /// caller can report progress.
    pub fn add_summary(&mut self, parsed: Parsed<CoverageSample>) -> CoverageSample {
        self.diagnostics += parsed.diagnostics;
        self.samples.push(parsed.value);
        parsed.value
    }

    pub fn add_summary_file(&mut self, path: &Path) -> CoverageSample {
        self.add_summary(SummaryParser.parse_path(path))
    }

    pub fn branch_visits(&self) -> &BranchVisitTable {
        &self.branch_visits
    }

    pub fn functions(&self) -> &[FunctionRecord] {
        &self.functions
    }

    /// Coverage samples in replay order.
    pub fn samples(&self) -> &[CoverageSample] {
        &self.samples
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    /// Number of annotation files read, empty or unreadable ones included.
    pub fn annotation_files(&self) -> usize {
        self.switch_counts.len()
    }

    /// Covered-branch count after the last replay step, 0 without samples.
    pub fn total_coverage(&self) -> u64 {
        self.samples.last().map(|s| s.covered).unwrap_or(0)
    }

    /// Mean number of taken switch blocks per annotation file.
    pub fn average_switches(&self) -> f64 {
        if self.switch_counts.is_empty() {
            return 0.0;
        }
        self.switch_counts.iter().sum::<u64>() as f64 / self.switch_counts.len() as f64
    }
}
