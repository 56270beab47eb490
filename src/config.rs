//! Program configuration (`config.json`).
//!
//! ```json
//! {
//!   "grep": { "gcov_dir": "/bench/grep-3.6/obj-gcov<gcov_num>/src" },
//!   "gawk": { "gcov_dir": "/bench/gawk-5.1.0/obj-gcov<gcov_num>",
//!             "annotation_root": "/bench/gawk-5.1.0/obj-gcov<gcov_num>" }
//! }
//! ```
//!
//! Keys used only by the replay driver (commands to run, clean up, invoke
//! gcov) are accepted and ignored.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ReplaycovError, Result};

const GCOV_NUM_PLACEHOLDER: &str = "<gcov_num>";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ProgramSettings {
    /// Directory the instrumented build runs in.
    pub gcov_dir: String,
    /// Directory searched for annotation files. Defaults to the parent of
    /// `gcov_dir`.
    #[serde(default)]
    pub annotation_root: Option<String>,
}

impl ProgramSettings {
    pub fn gcov_dir(&self, gcov_num: u32) -> PathBuf {
        PathBuf::from(substitute(&self.gcov_dir, gcov_num))
    }

    pub fn annotation_root(&self, gcov_num: u32) -> PathBuf {
        match &self.annotation_root {
            Some(root) => PathBuf::from(substitute(root, gcov_num)),
            None => {
                let dir = self.gcov_dir(gcov_num);
                dir.parent().map(Path::to_path_buf).unwrap_or(dir)
            }
        }
    }
}

fn substitute(template: &str, gcov_num: u32) -> String {
    template.replace(GCOV_NUM_PLACEHOLDER, &gcov_num.to_string())
}

/// Settings for every known program, in the order `config.json` lists them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub programs: Vec<(String, ProgramSettings)>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read(path)?;
        Self::from_slice(&content)
    }

    pub fn from_slice(content: &[u8]) -> Result<Self> {
        let entries: serde_json::Map<String, serde_json::Value> =
            serde_json::from_slice(content)?;
        if entries.is_empty() {
            return Err(ReplaycovError::Config("no programs configured".to_string()));
        }
        let programs = entries
            .into_iter()
            .map(|(name, value)| {
                let settings: ProgramSettings = serde_json::from_value(value)?;
                Ok((name, settings))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { programs })
    }

    pub fn program(&self, name: &str) -> Option<&ProgramSettings> {
        self.programs
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, settings)| settings)
    }

    /// First configured program whose name occurs in `path` (case-insensitive).
    pub fn program_for(&self, path: &str) -> Result<(&str, &ProgramSettings)> {
        let lower = path.to_lowercase();
        self.programs
            .iter()
            .find(|(name, _)| lower.contains(name.to_lowercase().as_str()))
            .map(|(name, settings)| (name.as_str(), settings))
            .ok_or_else(|| ReplaycovError::UnknownProgram(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = br#"{
        "grep": {
            "gcov_dir": "/bench/grep-3.6/obj-gcov<gcov_num>/src",
            "replay_cmd": "klee-replay ./grep ",
            "cov_cmd": "gcov -b *.gcda > cov_result"
        },
        "gawk": {
            "gcov_dir": "/bench/gawk-5.1.0/obj-gcov<gcov_num>",
            "annotation_root": "/bench/gawk-5.1.0/obj-gcov<gcov_num>"
        }
    }"#;

    #[test]
    fn test_load_ignores_unknown_keys() {
        let config = Config::from_slice(SAMPLE).unwrap();
        assert_eq!(config.programs.len(), 2);
    }

    #[test]
    fn test_gcov_num_substitution() {
        let config = Config::from_slice(SAMPLE).unwrap();
        let grep = config.program("grep").unwrap();
        assert_eq!(grep.gcov_dir(3), PathBuf::from("/bench/grep-3.6/obj-gcov3/src"));
        assert_eq!(grep.annotation_root(3), PathBuf::from("/bench/grep-3.6/obj-gcov3"));

        let gawk = config.program("gawk").unwrap();
        assert_eq!(gawk.annotation_root(1), PathBuf::from("/bench/gawk-5.1.0/obj-gcov1"));
    }

    #[test]
    fn test_program_for_path() {
        let config = Config::from_slice(SAMPLE).unwrap();
        let (name, _) = config.program_for("/out/HOMI_Grep_rep2").unwrap();
        assert_eq!(name, "grep");
        assert!(config.program_for("/out/featmaker_sed").is_err());
    }

    #[test]
    fn test_program_for_follows_file_order() {
        let config = Config::from_slice(
            br#"{"sed": {"gcov_dir": "/s"}, "unused": {"gcov_dir": "/u"}}"#,
        )
        .unwrap();
        let (name, _) = config.program_for("/out/homi_unused_rep1").unwrap();
        assert_eq!(name, "sed");

        let config = Config::from_slice(
            br#"{"unused": {"gcov_dir": "/u"}, "sed": {"gcov_dir": "/s"}}"#,
        )
        .unwrap();
        let (name, _) = config.program_for("/out/homi_unused_rep1").unwrap();
        assert_eq!(name, "unused");
    }

    #[test]
    fn test_empty_config_rejected() {
        assert!(Config::from_slice(b"{}").is_err());
    }
}
