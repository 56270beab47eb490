/// Counter for `switch` statements that had at least one branch taken.
///
/// A block opens on an executed source line whose text contains the `switch`
/// keyword and closes once its braces balance again:
///
///   `       12:  140:    switch (opt) {`
///   `branch  0 taken 0%`
///   `branch  1 taken 75%`
///   `        9:  141:      case 'a': ...`
///   `       12:  150:    }`
///
/// Only one block is tracked at a time, so a switch nested inside another
/// switch's body is folded into the outer block.
use std::io::{self, BufRead};
use std::sync::OnceLock;

use regex::Regex;

use super::{for_each_line, ReportParser};
use crate::model::Diagnostics;

fn switch_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+:\s+\d+:\s+.*\bswitch\b").expect("valid switch regex"))
}

fn taken_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"branch\s+\d+\s+taken\s+(\d+(?:\.\d+)?)%").expect("valid branch regex")
    })
}

/// State of the switch block currently being scanned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct OpenSwitch {
    depth: i64,
    /// Set once a `{` has been seen; a block never closes before its body starts.
    body_started: bool,
    found_taken: bool,
}

/// Incremental switch counter, fed one annotation line at a time.
#[derive(Debug, Clone, Default)]
pub struct SwitchCounter {
    open: Option<OpenSwitch>,
    total: u64,
}

impl SwitchCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, line: &str) {
        if self.open.is_none() && switch_line_re().is_match(line) {
            self.open = Some(OpenSwitch::default());
        }

        let Some(block) = self.open.as_mut() else {
            return;
        };

        let opens = line.matches('{').count() as i64;
        let closes = line.matches('}').count() as i64;
        if opens > 0 {
            block.body_started = true;
        }
        block.depth += opens - closes;

        if let Some(caps) = taken_re().captures(line) {
            let pct: f64 = caps[1].parse().unwrap_or(0.0);
            if pct != 0.0 {
                block.found_taken = true;
            }
        }

        if block.body_started && block.depth <= 0 {
            if block.found_taken {
                self.total += 1;
            }
            self.open = None;
        }
    }

    /// Number of closed switch blocks that contained a taken branch.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn in_switch(&self) -> bool {
        self.open.is_some()
    }
}

/// Standalone reader that only counts switch blocks.
pub struct SwitchParser;

impl ReportParser for SwitchParser {
    type Output = u64;

    fn parse_reader(
        &self,
        reader: &mut dyn BufRead,
        _diagnostics: &mut Diagnostics,
    ) -> io::Result<u64> {
        let mut counter = SwitchCounter::new();
        for_each_line(reader, |line| counter.feed(line))?;
        Ok(counter.total())
    }
}
