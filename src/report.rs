//! Output assembly for classified reports.

use std::path::Path;

use crate::error::Result;
use crate::model::{BucketSet, SourceFileReport};
use crate::{classify, loader};

/// Serialize the classified per-file records to a pretty-printed JSON array.
/// Document order is preserved; no sorting is applied.
pub fn to_json(files: &[SourceFileReport]) -> Result<String> {
    Ok(serde_json::to_string_pretty(files)?)
}

/// Run the full pipeline for a report on disk: load, classify, serialize.
/// Per-line diagnostics are printed to stderr as warnings; they never fail
/// the run.
pub fn run(path: &Path, requested: &BucketSet) -> Result<String> {
    let doc = loader::load(path)?;
    let classification = classify::classify(&doc, requested);
    for diagnostic in &classification.diagnostics {
        eprintln!("Warning: {diagnostic}");
    }
    to_json(&classification.files)
}
