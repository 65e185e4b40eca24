//! Common types for parsers

use serde::Serialize;

use crate::config::NO_VERSION_SPECIFIED;

/// A `module` block found in a single configuration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDeclaration {
    /// Block label (e.g., "vpc" for `module "vpc" {`)
    pub name: String,
    /// Value of the `source` attribute
    pub source: String,
    /// Value of the `version` attribute, if present
    pub version: Option<String>,
    /// Line of the `module` keyword (1-indexed)
    pub line: usize,
}

/// A module declaration placed in its repository context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleReference {
    /// Repository identifier (e.g., "acme/network-infra")
    pub repository: String,
    /// First directory below the scan root, or "infrastructure"
    pub environment: String,
    pub module_name: String,
    pub module_source: String,
    /// Pinned version or `No_Version_Specified`
    pub declared_version: String,
    /// Path relative to the repository root, `/`-separated
    pub file_path: String,
}

impl ModuleReference {
    pub fn new(
        repository: &str,
        environment: &str,
        file_path: &str,
        declaration: ModuleDeclaration,
    ) -> Self {
        Self {
            repository: repository.to_string(),
            environment: environment.to_string(),
            module_name: declaration.name,
            module_source: declaration.source,
            declared_version: declaration
                .version
                .unwrap_or_else(|| NO_VERSION_SPECIFIED.to_string()),
            file_path: file_path.to_string(),
        }
    }
}
