//! Loading of search keys (last names) from a plain-text file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SampleError};

/// Build the path of a names file inside the data directory.
pub fn resolve_names_path(data_dir: impl AsRef<Path>, file_name: &str) -> PathBuf {
    data_dir.as_ref().join(file_name)
}

/// Read one key per line, keeping order and duplicates.
///
/// Lines are not trimmed or validated here; empty keys are rejected when a
/// search is issued with them.
pub fn load_names(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content =
        fs::read_to_string(path).map_err(|e| SampleError::resource_unavailable(path, e))?;
    let names: Vec<String> = content.lines().map(str::to_string).collect();
    tracing::debug!(path = %path.display(), count = names.len(), "loaded search keys");
    Ok(names)
}
