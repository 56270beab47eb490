#![allow(dead_code)]

use tempfile::TempDir;

pub const GREP_GCOV: &[u8] = include_bytes!("../fixtures/grep.c.gcov");
pub const DFA_GCOV: &[u8] = include_bytes!("../fixtures/dfa.c.gcov");
pub const COV_RESULT: &[u8] = include_bytes!("../fixtures/cov_result");

/// Create a temporary directory holding `files` (relative path, content).
/// The caller must hold onto `TempDir` to keep the directory alive.
pub fn write_tree(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (rel, content) in files {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
    }
    dir
}
