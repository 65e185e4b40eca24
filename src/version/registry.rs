//! Registry trait for resolving module versions from various backends

#[cfg(test)]
use mockall::automock;

use crate::version::error::RegistryError;
use crate::version::types::{RegistryKind, VersionOutcome};

/// Trait for resolving the latest published version of a module
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// Returns the kind of registry this implementation handles
    fn kind(&self) -> RegistryKind;

    /// Whether this registry is responsible for the given module source
    fn handles(&self, module_source: &str) -> bool;

    /// Resolves the latest version of a module
    ///
    /// # Arguments
    /// * `module_source` - The module's `source` attribute (e.g., "terraform-aws-modules/vpc/aws")
    ///
    /// # Returns
    /// * `Ok(VersionOutcome)` - A resolved version or a non-error sentinel
    /// * `Err(RegistryError)` - If the request failed or the payload was unusable
    async fn resolve_latest(&self, module_source: &str) -> Result<VersionOutcome, RegistryError>;
}

/// Builds the shared HTTP client used by registry and GitHub API calls
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(env!("CARGO_PKG_NAME"))
        .timeout(std::time::Duration::from_secs(
            crate::config::REQUEST_TIMEOUT_SECS,
        ))
        .build()
        .expect("Failed to create HTTP client")
}
