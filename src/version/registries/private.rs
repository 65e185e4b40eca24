//! Private registry (Terraform Cloud / Enterprise) API implementation

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::LatestVersionPolicy;
use crate::version::error::RegistryError;
use crate::version::registry::{Registry, http_client};
use crate::version::types::{RegistryKind, VersionOutcome};

/// Response from `GET /api/registry/v1/modules/{org}/{name}/{provider}/versions`
#[derive(Debug, Deserialize)]
struct VersionsResponse {
    #[serde(default)]
    modules: Vec<ModuleVersions>,
}

#[derive(Debug, Deserialize)]
struct ModuleVersions {
    #[serde(default)]
    versions: Vec<VersionEntry>,
}

#[derive(Debug, Deserialize)]
struct VersionEntry {
    version: String,
}

/// Module coordinates addressed by a private registry source
#[derive(Debug, Clone, PartialEq, Eq)]
struct ModuleAddress<'a> {
    organization: &'a str,
    name: &'a str,
    provider: &'a str,
}

/// Registry implementation for a private, token-gated module registry
pub struct PrivateRegistry {
    client: reqwest::Client,
    base_url: String,
    host: String,
    token: Option<String>,
    policy: LatestVersionPolicy,
}

impl PrivateRegistry {
    /// Creates a new PrivateRegistry
    ///
    /// # Arguments
    /// * `host` - Source prefix routed to this registry (e.g., "app.terraform.io")
    /// * `base_url` - API base URL
    /// * `token` - Bearer token; without it every lookup yields `TokenMissing`
    pub fn new(host: &str, base_url: &str, token: Option<String>) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
            host: host.trim_end_matches('/').to_string(),
            token,
            policy: LatestVersionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: LatestVersionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The source with the host prefix removed, if it carries that prefix
    ///
    /// The bare host yields an empty path. A longer hostname that merely
    /// starts with the host (`host.example.com/...`) does not match.
    fn strip_host<'a>(&self, module_source: &'a str) -> Option<&'a str> {
        let prefix = module_source.get(..self.host.len())?;
        if !prefix.eq_ignore_ascii_case(&self.host) {
            return None;
        }
        match &module_source[self.host.len()..] {
            "" => Some(""),
            rest => rest.strip_prefix('/'),
        }
    }

    /// Split `org/name/provider[/...]`; extra segments such as submodule paths are ignored
    fn parse_address(path: &str) -> Option<ModuleAddress<'_>> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        Some(ModuleAddress {
            organization: segments.next()?,
            name: segments.next()?,
            provider: segments.next()?,
        })
    }
}

#[async_trait::async_trait]
impl Registry for PrivateRegistry {
    fn kind(&self) -> RegistryKind {
        RegistryKind::Private
    }

    fn handles(&self, module_source: &str) -> bool {
        self.strip_host(module_source).is_some()
    }

    async fn resolve_latest(&self, module_source: &str) -> Result<VersionOutcome, RegistryError> {
        let Some(token) = self.token.as_deref() else {
            debug!("No private registry token for {}", module_source);
            return Ok(VersionOutcome::TokenMissing);
        };

        let Some(address) = self
            .strip_host(module_source)
            .and_then(Self::parse_address)
        else {
            debug!("Invalid private module source: {}", module_source);
            return Ok(VersionOutcome::InvalidSourceFormat);
        };

        let url = format!(
            "{}/api/registry/v1/modules/{}/{}/{}/versions",
            self.base_url, address.organization, address.name, address.provider
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(module_source.to_string()));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(RegistryError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            warn!("Private registry returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let listing: VersionsResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse private registry response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        let versions: Vec<String> = listing
            .modules
            .into_iter()
            .next()
            .map(|module| module.versions.into_iter().map(|v| v.version).collect())
            .unwrap_or_default();

        Ok(match self.policy.select(&versions) {
            Some(latest) => VersionOutcome::Resolved(latest),
            None => VersionOutcome::NoVersionsFound,
        })
    }
}
