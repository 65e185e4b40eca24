//! Module version resolver
//!
//! Routes each module source to the registry backend responsible for it and
//! collapses every backend failure into the `ApiError` sentinel, so a bad
//! lookup never escapes as an error.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::RegistriesConfig;
use crate::version::registries::{PrivateRegistry, PublicRegistry};
use crate::version::registry::Registry;
use crate::version::types::VersionOutcome;

/// Resolves module sources against an ordered list of registries.
///
/// The first registry whose `handles` accepts a source answers for it, so
/// more specific registries (private host prefixes) go before the public
/// catch-all.
pub struct VersionResolver {
    registries: Vec<Arc<dyn Registry>>,
}

impl VersionResolver {
    /// Create a resolver that consults `registries` in order
    pub fn new(registries: Vec<Arc<dyn Registry>>) -> Self {
        Self { registries }
    }

    /// Create the default private + public resolver from configuration
    pub fn from_config(config: &RegistriesConfig, registry_token: Option<String>) -> Self {
        let private = PrivateRegistry::new(
            &config.private.host,
            &config.private.base_url(),
            registry_token,
        )
        .with_policy(config.private.latest_version);
        let public = PublicRegistry::new(&config.public.base_url);

        Self::new(vec![Arc::new(private), Arc::new(public)])
    }

    /// Resolve the latest version for a module source
    pub async fn resolve(&self, module_source: &str) -> VersionOutcome {
        let Some(registry) = self.registries.iter().find(|r| r.handles(module_source)) else {
            warn!("No registry configured for module source {}", module_source);
            return VersionOutcome::ApiError;
        };

        match registry.resolve_latest(module_source).await {
            Ok(outcome) => {
                debug!(
                    "Resolved {} via {} registry: {}",
                    module_source,
                    registry.kind().as_str(),
                    outcome
                );
                outcome
            }
            Err(e) => {
                warn!(
                    "Failed to resolve {} via {} registry: {}",
                    module_source,
                    registry.kind().as_str(),
                    e
                );
                VersionOutcome::ApiError
            }
        }
    }
}
