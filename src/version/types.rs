//! Common types for version resolution

use std::fmt;

use serde::{Serialize, Serializer};

/// Kind of module registry backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryKind {
    /// Public, unauthenticated registry (registry.terraform.io)
    Public,
    /// Private, token-gated registry (Terraform Cloud / Enterprise)
    Private,
}

impl RegistryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistryKind::Public => "public",
            RegistryKind::Private => "private",
        }
    }
}

/// Result of resolving the latest version of a module
///
/// Exactly one variant per resolution attempt. Everything except `Resolved`
/// is a sentinel recorded in the report rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VersionOutcome {
    Resolved(String),
    /// Public registry answered without a version field
    NoVersionFound,
    /// Private registry listed no versions
    NoVersionsFound,
    /// Private registry source without a configured token
    TokenMissing,
    /// Private registry source with fewer than three path segments
    InvalidSourceFormat,
    /// Transport failure, bad status or malformed payload
    ApiError,
}

impl VersionOutcome {
    pub fn resolved(version: impl Into<String>) -> Self {
        VersionOutcome::Resolved(version.into())
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, VersionOutcome::Resolved(_))
    }

    /// The resolved version, if any
    pub fn version(&self) -> Option<&str> {
        match self {
            VersionOutcome::Resolved(version) => Some(version),
            _ => None,
        }
    }

    /// Report spelling of the outcome
    pub fn as_str(&self) -> &str {
        match self {
            VersionOutcome::Resolved(version) => version,
            VersionOutcome::NoVersionFound => "No_Version_Found",
            VersionOutcome::NoVersionsFound => "No_Versions_Found",
            VersionOutcome::TokenMissing => "Token_Missing",
            VersionOutcome::InvalidSourceFormat => "Invalid_Source_Format",
            VersionOutcome::ApiError => "API_Error",
        }
    }
}

impl fmt::Display for VersionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for VersionOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
