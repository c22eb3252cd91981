//! Process-level configuration.
//!
//! The default bucket set comes from the `COVERED_TYPES` environment
//! variable, read once at startup into an explicit value that is passed down
//! to the classification surfaces. The classifier itself never touches the
//! environment.

use crate::error::Result;
use crate::model::BucketSet;

/// Environment variable holding the default comma-separated bucket list.
pub const COVERED_TYPES_ENV: &str = "COVERED_TYPES";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub default_buckets: BucketSet,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_buckets: BucketSet::all(),
        }
    }
}

impl Config {
    /// Build the configuration from the process environment. Unset or blank
    /// `COVERED_TYPES` selects all three buckets; an unrecognized bucket
    /// name is a fatal configuration error.
    pub fn from_env() -> Result<Self> {
        match std::env::var(COVERED_TYPES_ENV) {
            Ok(value) => Ok(Self {
                default_buckets: BucketSet::parse_list(&value)?,
            }),
            Err(_) => Ok(Self::default()),
        }
    }
}
