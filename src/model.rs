//! Data model for coverage bucket classification: the bucket labels, the
//! requested-bucket set, and the per-file output records that serialize
//! straight into the JSON document.

use serde::Serialize;

use crate::error::JacorsError;

/// Sentinel used when a `<package>` element carries no `name` attribute.
pub const UNKNOWN_PACKAGE: &str = "UnknownPackage";

/// Sentinel used when a `<sourcefile>` element carries no `name` attribute.
pub const UNKNOWN_SOURCEFILE: &str = "UnknownSourcefile";

/// Coverage classification buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    NoCovered,
    PartiallyCovered,
    FullCovered,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [
        Bucket::NoCovered,
        Bucket::PartiallyCovered,
        Bucket::FullCovered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::NoCovered => "nocovered",
            Bucket::PartiallyCovered => "partiallycovered",
            Bucket::FullCovered => "fullcovered",
        }
    }
}

impl std::str::FromStr for Bucket {
    type Err = JacorsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "nocovered" => Ok(Bucket::NoCovered),
            "partiallycovered" => Ok(Bucket::PartiallyCovered),
            "fullcovered" => Ok(Bucket::FullCovered),
            _ => Err(JacorsError::InvalidBucket(s.to_string())),
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The subset of buckets requested for one classification run.
///
/// The classifier honors the set literally — an empty set classifies nothing.
/// Blank *surface* input (CLI flag, env var, tool parameter) is mapped to the
/// full set by [`BucketSet::parse_list`] before the classifier runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketSet {
    nocovered: bool,
    partiallycovered: bool,
    fullcovered: bool,
}

impl Default for BucketSet {
    fn default() -> Self {
        Self::all()
    }
}

impl BucketSet {
    pub fn all() -> Self {
        Self {
            nocovered: true,
            partiallycovered: true,
            fullcovered: true,
        }
    }

    pub fn empty() -> Self {
        Self {
            nocovered: false,
            partiallycovered: false,
            fullcovered: false,
        }
    }

    pub fn contains(&self, bucket: Bucket) -> bool {
        match bucket {
            Bucket::NoCovered => self.nocovered,
            Bucket::PartiallyCovered => self.partiallycovered,
            Bucket::FullCovered => self.fullcovered,
        }
    }

    pub fn insert(&mut self, bucket: Bucket) {
        match bucket {
            Bucket::NoCovered => self.nocovered = true,
            Bucket::PartiallyCovered => self.partiallycovered = true,
            Bucket::FullCovered => self.fullcovered = true,
        }
    }

    /// Parse a comma-separated bucket list as supplied on the CLI, in the
    /// `COVERED_TYPES` environment variable, or as a tool parameter.
    /// Surrounding whitespace and empty segments are ignored; input with no
    /// segments at all selects all three buckets. An unrecognized name is a
    /// fatal configuration error.
    pub fn parse_list(input: &str) -> crate::error::Result<Self> {
        let mut set = Self::empty();
        let mut seen_any = false;
        for name in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            set.insert(name.parse()?);
            seen_any = true;
        }
        if seen_any {
            Ok(set)
        } else {
            Ok(Self::all())
        }
    }
}

/// Per-file mapping from bucket to the ordered list of classified line
/// numbers. Requested buckets are present (possibly as empty lists); buckets
/// outside the requested set are absent from the serialized object entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BucketLists {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nocovered: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partiallycovered: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fullcovered: Option<Vec<u32>>,
}

impl BucketLists {
    /// Pre-create an empty list for every requested bucket, so a requested
    /// bucket with no classified lines still serializes as `[]`.
    pub fn for_requested(requested: &BucketSet) -> Self {
        let mut lists = Self::default();
        for bucket in Bucket::ALL {
            if requested.contains(bucket) {
                *lists.slot_mut(bucket) = Some(Vec::new());
            }
        }
        lists
    }

    fn slot_mut(&mut self, bucket: Bucket) -> &mut Option<Vec<u32>> {
        match bucket {
            Bucket::NoCovered => &mut self.nocovered,
            Bucket::PartiallyCovered => &mut self.partiallycovered,
            Bucket::FullCovered => &mut self.fullcovered,
        }
    }

    /// Append a line number under `bucket`. A bucket outside the requested
    /// set has no list, and the line number is discarded.
    pub fn push(&mut self, bucket: Bucket, line_number: u32) {
        if let Some(list) = self.slot_mut(bucket) {
            list.push(line_number);
        }
    }

    /// True when no list holds any line number.
    pub fn is_empty(&self) -> bool {
        [&self.nocovered, &self.partiallycovered, &self.fullcovered]
            .iter()
            .all(|slot| slot.as_ref().map_or(true, |list| list.is_empty()))
    }
}

/// Classified coverage for a single source file, in output shape. Duplicate
/// (package, sourcefile) pairs in the input produce independent records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFileReport {
    pub sourcefile: String,
    pub package: String,
    pub lines: BucketLists,
    pub branch: BucketLists,
}

impl SourceFileReport {
    pub fn new(package: &str, sourcefile: &str, requested: &BucketSet) -> Self {
        Self {
            sourcefile: sourcefile.to_string(),
            package: package.to_string(),
            lines: BucketLists::for_requested(requested),
            branch: BucketLists::for_requested(requested),
        }
    }

    /// True when nothing was classified under any bucket, for lines or
    /// branches. Such files are dropped from the result.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.branch.is_empty()
    }
}
