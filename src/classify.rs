//! Bucket classification of parsed report trees.
//!
//! Classification is a pure function of the four per-line counters; no state
//! crosses line, file, or package boundaries. Line and branch classification
//! are intentionally two separate rule tables: a line with no instructions
//! gets no line bucket but may still carry branch counters, and vice versa.

use std::fmt;
use std::num::ParseIntError;

use crate::loader::{LineElem, ReportDoc};
use crate::model::{Bucket, BucketSet, SourceFileReport, UNKNOWN_PACKAGE, UNKNOWN_SOURCEFILE};

/// Non-fatal problems found while classifying. The offending line is skipped
/// and processing continues; these never abort the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A `<line>` element whose `nr` attribute is absent or non-numeric.
    MissingLineNumber { sourcefile: String },
    /// A counter attribute that is present but not a non-negative integer.
    InvalidCounters { nr: String, sourcefile: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingLineNumber { sourcefile } => {
                write!(f, "missing line-number attribute for a line in {sourcefile}")
            }
            Diagnostic::InvalidCounters { nr, sourcefile } => {
                write!(f, "invalid numeric attribute(s) in line {nr} of {sourcefile}")
            }
        }
    }
}

/// The outcome of one classification run. Diagnostics are carried as data,
/// on a channel separate from the per-file results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub files: Vec<SourceFileReport>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Classify instruction counters into a line bucket.
///
/// `ci == 0 && mi == 0` means the line holds no instructions at all (blank
/// lines, comments) and gets no bucket.
pub fn line_bucket(ci: u64, mi: u64) -> Option<Bucket> {
    match (ci, mi) {
        (0, 0) => None,
        (0, _) => Some(Bucket::NoCovered),
        (_, 0) => Some(Bucket::FullCovered),
        (_, _) => Some(Bucket::PartiallyCovered),
    }
}

/// Classify branch counters into a branch bucket.
///
/// `mb == 0 && cb == 0` means the line has no branches and gets no bucket.
/// Note the zero/zero row differs in meaning from the line table's, which is
/// why the two tables stay separate functions.
pub fn branch_bucket(mb: u64, cb: u64) -> Option<Bucket> {
    match (mb, cb) {
        (0, 0) => None,
        (0, _) => Some(Bucket::FullCovered),
        (_, 0) => Some(Bucket::NoCovered),
        (_, _) => Some(Bucket::PartiallyCovered),
    }
}

/// Parse one counter attribute. Absence is not an error (counters default to
/// 0); a present but non-numeric or negative value is.
fn parse_counter(raw: Option<&str>) -> std::result::Result<u64, ParseIntError> {
    match raw {
        None => Ok(0),
        Some(value) => value.trim().parse(),
    }
}

/// Walk the document and classify every line, package by package, source
/// file by source file, in document order. Files with nothing classified
/// under any requested bucket are dropped from the result.
pub fn classify(doc: &ReportDoc, requested: &BucketSet) -> Classification {
    let mut result = Classification::default();

    for package in &doc.packages {
        let package_name = package.name.as_deref().unwrap_or(UNKNOWN_PACKAGE);
        for source_file in &package.source_files {
            let sourcefile_name = source_file.name.as_deref().unwrap_or(UNKNOWN_SOURCEFILE);
            let mut report = SourceFileReport::new(package_name, sourcefile_name, requested);

            for line in &source_file.lines {
                classify_line(line, sourcefile_name, &mut report, &mut result.diagnostics);
            }

            if !report.is_empty() {
                result.files.push(report);
            }
        }
    }

    result
}

fn classify_line(
    line: &LineElem,
    sourcefile_name: &str,
    report: &mut SourceFileReport,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let nr = match line.nr.as_deref().map(|raw| raw.trim().parse::<u32>()) {
        Some(Ok(nr)) => nr,
        _ => {
            diagnostics.push(Diagnostic::MissingLineNumber {
                sourcefile: sourcefile_name.to_string(),
            });
            return;
        }
    };

    // One malformed counter invalidates the whole line, not just its own
    // axis: all four parse before either classification runs.
    let ci = parse_counter(line.ci.as_deref());
    let mi = parse_counter(line.mi.as_deref());
    let mb = parse_counter(line.mb.as_deref());
    let cb = parse_counter(line.cb.as_deref());
    let (Ok(ci), Ok(mi), Ok(mb), Ok(cb)) = (ci, mi, mb, cb) else {
        diagnostics.push(Diagnostic::InvalidCounters {
            nr: nr.to_string(),
            sourcefile: sourcefile_name.to_string(),
        });
        return;
    };

    // Line and branch buckets are computed independently; the same line
    // number may land in both structures.
    if let Some(bucket) = line_bucket(ci, mi) {
        report.lines.push(bucket, nr);
    }
    if let Some(bucket) = branch_bucket(mb, cb) {
        report.branch.push(bucket, nr);
    }
}
