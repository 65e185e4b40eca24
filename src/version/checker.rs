//! Freshness evaluation for declared module versions

use std::fmt;

use serde::{Serialize, Serializer};

use crate::config::NO_VERSION_SPECIFIED;
use crate::parser::types::ModuleReference;
use crate::version::types::VersionOutcome;

/// Tri-state outdated verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutdatedStatus {
    /// Declared version differs from the latest resolved version
    Outdated,
    /// Declared version equals the latest resolved version
    Current,
    /// No pinned version, or the latest version could not be resolved
    Unknown,
}

impl OutdatedStatus {
    /// Report spelling of the verdict
    pub fn as_str(&self) -> &'static str {
        match self {
            OutdatedStatus::Outdated => "True",
            OutdatedStatus::Current => "False",
            OutdatedStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for OutdatedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OutdatedStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OutdatedStatus::Outdated => serializer.serialize_bool(true),
            OutdatedStatus::Current => serializer.serialize_bool(false),
            OutdatedStatus::Unknown => serializer.serialize_str(self.as_str()),
        }
    }
}

/// Compare a declared version against a resolution outcome
///
/// Comparison is exact string inequality: "v1.0.0" and "1.0.0" differ.
pub fn evaluate_freshness(declared_version: &str, latest: &VersionOutcome) -> OutdatedStatus {
    match latest.version() {
        _ if declared_version == NO_VERSION_SPECIFIED => OutdatedStatus::Unknown,
        None => OutdatedStatus::Unknown,
        Some(version) if version != declared_version => OutdatedStatus::Outdated,
        Some(_) => OutdatedStatus::Current,
    }
}

/// A module reference together with its resolved latest version and verdict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FreshnessRecord {
    #[serde(flatten)]
    pub reference: ModuleReference,
    pub latest_version: VersionOutcome,
    pub is_outdated: OutdatedStatus,
}

impl FreshnessRecord {
    pub fn new(reference: ModuleReference, latest_version: VersionOutcome) -> Self {
        let is_outdated = evaluate_freshness(&reference.declared_version, &latest_version);
        Self {
            reference,
            latest_version,
            is_outdated,
        }
    }
}
