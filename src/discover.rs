/// Discovery of gcov annotation files below a build directory.
///
/// gcov writes one `<source>.gcov` file per instrumented source next to the
/// object files, so the whole tree is walked and matched by extension.
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::error::Result;

const ANNOTATION_EXT: &str = "gcov";

/// Does this path name an annotation file?
pub fn is_annotation_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ANNOTATION_EXT))
}

/// All annotation files below `root`, sorted by path. A missing root yields an
/// empty list.
pub fn annotation_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        debug!("annotation root {} does not exist", root.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() && is_annotation_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    debug!("found {} annotation files under {}", files.len(), root.display());
    Ok(files)
}
