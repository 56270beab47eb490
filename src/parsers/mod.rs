pub mod gcov;
pub mod summary;
pub mod switch;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use log::{debug, warn};

use crate::model::Diagnostics;

/// A parse result together with the non-fatal findings collected while
/// producing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub diagnostics: Diagnostics,
}

/// Every line-oriented report reader implements this trait.
pub trait ReportParser {
    type Output: Default;

    /// Consume the reader line by line. Parse problems are recorded in
    /// `diagnostics`; only I/O failures are returned.
    fn parse_reader(
        &self,
        reader: &mut dyn BufRead,
        diagnostics: &mut Diagnostics,
    ) -> io::Result<Self::Output>;

    /// Parse an in-memory report.
    fn parse(&self, input: &[u8]) -> Parsed<Self::Output> {
        let mut diagnostics = Diagnostics::default();
        let value = self
            .parse_reader(&mut &*input, &mut diagnostics)
            .unwrap_or_default();
        Parsed { value, diagnostics }
    }

    /// Parse a report on disk. A missing, empty or unreadable file contributes
    /// nothing and is counted as a missing input.
    fn parse_path(&self, path: &Path) -> Parsed<Self::Output> {
        let mut diagnostics = Diagnostics::default();
        let missing = |diagnostics: &mut Diagnostics| {
            diagnostics.missing_inputs += 1;
            Parsed {
                value: Self::Output::default(),
                diagnostics: *diagnostics,
            }
        };

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                debug!("skipping {}: {e}", path.display());
                return missing(&mut diagnostics);
            }
        };
        if file.metadata().map(|m| m.len() == 0).unwrap_or(false) {
            debug!("skipping empty report {}", path.display());
            return missing(&mut diagnostics);
        }

        let mut reader = BufReader::new(file);
        match self.parse_reader(&mut reader, &mut diagnostics) {
            Ok(value) => Parsed { value, diagnostics },
            Err(e) => {
                warn!("failed reading {}: {e}", path.display());
                missing(&mut Diagnostics::default())
            }
        }
    }
}

/// Call `f` once per line, without the line terminator. Invalid UTF-8 is
/// replaced rather than rejected; instrumentation output is not always clean.
pub(crate) fn for_each_line(reader: &mut dyn BufRead, mut f: impl FnMut(&str)) -> io::Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            break; // EOF
        }
        let line = String::from_utf8_lossy(&buf);
        f(line.trim_end_matches(|c| c == '\n' || c == '\r'));
    }
    Ok(())
}
