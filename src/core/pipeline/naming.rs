//! Output file naming
//!
//! `claim.xml` becomes `claim_deidentified.xml`, and
//! `claim_deidentified.xml` becomes `claim_reidentified.xml`.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

const DEIDENTIFIED_SUFFIX: &str = "_deidentified";
const REIDENTIFIED_SUFFIX: &str = "_reidentified";

/// Processing direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Deidentify,
    Reidentify,
}

/// File name of the de-identified output for `input`
pub fn deidentified_file_name(input: &Path) -> String {
    let (stem, extension) = split_name(input);
    join_name(&format!("{stem}{DEIDENTIFIED_SUFFIX}"), extension.as_deref())
}

/// File name of the re-identified output for `input`
///
/// A trailing `_deidentified` is dropped from the stem first.
pub fn reidentified_file_name(input: &Path) -> String {
    let (stem, extension) = split_name(input);
    let stem = stem.strip_suffix(DEIDENTIFIED_SUFFIX).unwrap_or(stem.as_str());
    join_name(&format!("{stem}{REIDENTIFIED_SUFFIX}"), extension.as_deref())
}

/// Full output path
///
/// Documents discovered through a directory are written to a subdirectory
/// named after it.
pub fn output_path(
    output_dir: &Path,
    input: &Path,
    folder: Option<&str>,
    direction: Direction,
) -> PathBuf {
    let file_name = match direction {
        Direction::Deidentify => deidentified_file_name(input),
        Direction::Reidentify => reidentified_file_name(input),
    };

    match folder {
        Some(folder) => output_dir.join(folder).join(file_name),
        None => output_dir.join(file_name),
    }
}

fn split_name(input: &Path) -> (String, Option<String>) {
    let stem = input
        .file_stem()
        .map(OsStr::to_string_lossy)
        .unwrap_or_default()
        .into_owned();
    let extension = input
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned());
    (stem, extension)
}

fn join_name(stem: &str, extension: Option<&str>) -> String {
    match extension {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem.to_string(),
    }
}
