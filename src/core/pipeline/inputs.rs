//! Input discovery

use crate::domain::{PhimaskError, Result};
use std::path::{Path, PathBuf};

/// Documents to process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSet {
    /// Files in processing order
    pub documents: Vec<PathBuf>,
    /// Name of the input directory, when the input was one
    pub folder: Option<String>,
}

/// Resolve an input path into the documents it names
///
/// A file is taken as-is. A directory contributes its direct children whose
/// extension matches `extension` (case-insensitive), sorted by file name.
///
/// # Errors
///
/// Returns [`PhimaskError::Input`] if the path does not exist, is neither a
/// file nor a directory, or is a directory without matching documents.
pub fn collect_inputs(path: &Path, extension: &str) -> Result<InputSet> {
    if path.is_file() {
        return Ok(InputSet {
            documents: vec![path.to_path_buf()],
            folder: None,
        });
    }

    if !path.is_dir() {
        return Err(PhimaskError::Input(format!(
            "{} is not a file or directory",
            path.display()
        )));
    }

    let entries = std::fs::read_dir(path).map_err(|e| {
        PhimaskError::Input(format!("Failed to read directory {}: {e}", path.display()))
    })?;

    let mut documents = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            PhimaskError::Input(format!("Failed to read directory {}: {e}", path.display()))
        })?;
        let candidate = entry.path();
        let matches = candidate
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches && candidate.is_file() {
            documents.push(candidate);
        }
    }

    if documents.is_empty() {
        return Err(PhimaskError::Input(format!(
            "No .{extension} files found in {}",
            path.display()
        )));
    }
    documents.sort();

    let folder = path
        .canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .or_else(|| path.file_name())
        .map(|name| name.to_string_lossy().into_owned());

    tracing::debug!(
        path = %path.display(),
        documents = documents.len(),
        "Collected input documents"
    );

    Ok(InputSet { documents, folder })
}
