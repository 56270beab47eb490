/// Parser for the branch summary printed by `gcov -b` after a replay step.
///
/// Only the "Taken at least" lines are used:
///
///   `Branches executed:85.00% of 200`
///   `Taken at least once:80.00% of 50`
///
/// Each such line contributes `floor(percent * total / 100)` covered branches.
use std::io::{self, BufRead};

use log::warn;

use super::{for_each_line, ReportParser};
use crate::model::{CoverageSample, Diagnostics};

const TAKEN_MARKER: &str = "Taken at least";
const SEPARATOR: &str = "% of ";

/// Summary report parser.
pub struct SummaryParser;

impl ReportParser for SummaryParser {
    type Output = CoverageSample;

    fn parse_reader(
        &self,
        reader: &mut dyn BufRead,
        diagnostics: &mut Diagnostics,
    ) -> io::Result<CoverageSample> {
        let mut sample = CoverageSample::default();
        for_each_line(reader, |line| {
            if !line.contains(TAKEN_MARKER) {
                return;
            }
            match parse_taken_line(line) {
                Some((covered, total)) => {
                    sample.covered += covered;
                    sample.total += total;
                }
                None => {
                    warn!("unparseable summary line: {line:?}");
                    diagnostics.malformed_lines += 1;
                }
            }
        })?;
        Ok(sample)
    }
}

/// Parse `"<label>:<percent>% of <total>"` into `(covered, total)`.
fn parse_taken_line(line: &str) -> Option<(u64, u64)> {
    let data = line.split(':').nth(1)?;
    let (percent, total) = data.split_once(SEPARATOR)?;
    let percent: f64 = percent.trim().parse().ok()?;
    let total: f64 = total.trim().parse().ok()?;
    if !percent.is_finite() || !total.is_finite() || percent < 0.0 || total < 0.0 {
        return None;
    }
    let covered = (percent * total / 100.0).floor();
    Some((covered as u64, total as u64))
}

/// Covered-branch count of a summary report; the total is available on the
/// full [`CoverageSample`].
pub fn covered_branches(input: &[u8]) -> u64 {
    SummaryParser.parse(input).value.covered
}
