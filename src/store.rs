//! Flat CSV tables written at the end of an evaluation.
//!
//! - branch table: one row per branch key with its cumulative visit count
//! - function table: one row per closed function block
//! - results table: one row per (tool, program, repetition), updated in place

use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Writer};
use log::info;

use crate::error::Result;
use crate::model::{BranchVisitTable, FunctionRecord};

pub const BRANCH_HEADER: [&str; 2] = ["Branch Identifier", "Visit Count"];

pub const FUNCTION_HEADER: [&str; 5] = [
    "Source File",
    "Function",
    "Coverage",
    "Branches Taken",
    "Branches Total",
];

pub const RESULT_HEADER: [&str; 5] = [
    "Tool",
    "Program",
    "Repetition",
    "Total Coverage",
    "Average Taken Switch",
];

/// Columns identifying a results row; a new row replaces any row that agrees
/// on all of them.
const RESULT_KEY: [&str; 3] = ["Tool", "Program", "Repetition"];

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Overwrite `path` with the branch visit table, rows in key order.
pub fn write_branch_table(path: &Path, table: &BranchVisitTable) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = Writer::from_path(path)?;
    writer.write_record(BRANCH_HEADER)?;
    for (key, visits) in table.iter() {
        writer.write_record([key.to_string(), visits.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a branch table back as `(identifier, visits)` rows.
pub fn read_branch_table(path: &Path) -> Result<Vec<(String, u64)>> {
    let mut reader = ReaderBuilder::new().from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: (String, u64) = record?;
        rows.push(row);
    }
    Ok(rows)
}

/// Overwrite `path` with function coverage rows, in emission order.
pub fn write_function_table(path: &Path, records: &[FunctionRecord]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = Writer::from_path(path)?;
    writer.write_record(FUNCTION_HEADER)?;
    for record in records {
        writer.write_record([
            record.source_file.clone(),
            record.name.clone(),
            format!("{:.2}", record.coverage),
            record.branches_taken.to_string(),
            record.branches_total.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// One row of the results table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub tool: String,
    pub program: String,
    pub repetition: String,
    pub total_coverage: u64,
    pub average_switch: f64,
}

impl ResultRow {
    fn value(&self, column: &str) -> Option<String> {
        match column {
            "Tool" => Some(self.tool.clone()),
            "Program" => Some(self.program.clone()),
            "Repetition" => Some(self.repetition.clone()),
            "Total Coverage" => Some(self.total_coverage.to_string()),
            "Average Taken Switch" => Some(format!("{:.2}", self.average_switch)),
            _ => None,
        }
    }
}

/// Insert `row` into the results table at `path`, replacing a row with the
/// same key. Columns missing from an existing table are appended to its
/// header; columns this crate does not know are kept and left blank.
pub fn upsert_result(path: &Path, row: &ResultRow) -> Result<()> {
    let (mut header, records) = if path.exists() {
        read_results(path)?
    } else {
        (StringRecord::new(), Vec::new())
    };

    for column in RESULT_HEADER {
        if !header.iter().any(|h| h == column) {
            if !records.is_empty() || !header.is_empty() {
                info!("adding missing column '{column}' to {}", path.display());
            }
            header.push_field(column);
        }
    }

    let key_columns: Vec<Option<usize>> = RESULT_KEY
        .iter()
        .map(|k| header.iter().position(|h| h == *k))
        .collect();
    let same_key = |record: &StringRecord| {
        RESULT_KEY.iter().zip(&key_columns).all(|(column, idx)| {
            let existing = idx.and_then(|i| record.get(i)).unwrap_or("");
            row.value(column).as_deref() == Some(existing)
        })
    };

    ensure_parent(path)?;
    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::WriterBuilder::new().flexible(true).from_path(&tmp)?;
        writer.write_record(&header)?;
        for record in records.iter().filter(|r| !same_key(r)) {
            let padded: Vec<&str> = (0..header.len())
                .map(|i| record.get(i).unwrap_or(""))
                .collect();
            writer.write_record(padded)?;
        }
        let new_row: Vec<String> = header
            .iter()
            .map(|column| row.value(column).unwrap_or_default())
            .collect();
        writer.write_record(new_row)?;
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Read the results table as its header and raw records.
pub fn read_results(path: &Path) -> Result<(StringRecord, Vec<StringRecord>)> {
    let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
    let header = reader.headers()?.clone();
    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record?);
    }
    Ok((header, records))
}
