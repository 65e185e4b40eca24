//! Public Terraform Registry API implementation

use serde::Deserialize;
use tracing::warn;

use crate::config::DEFAULT_PUBLIC_REGISTRY_URL;
use crate::version::error::RegistryError;
use crate::version::registry::{Registry, http_client};
use crate::version::types::{RegistryKind, VersionOutcome};

/// Response from `GET /v1/modules/{namespace}/{name}/{provider}`
#[derive(Debug, Deserialize)]
struct ModuleResponse {
    version: Option<String>,
}

/// Registry implementation for the public Terraform Registry
pub struct PublicRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl PublicRegistry {
    /// Creates a new PublicRegistry with a custom base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            client: http_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Registry address of a module source, without any `//subdir` suffix
    fn module_address(module_source: &str) -> &str {
        module_source
            .split_once("//")
            .map_or(module_source, |(address, _)| address)
            .trim_matches('/')
    }
}

impl Default for PublicRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_REGISTRY_URL)
    }
}

#[async_trait::async_trait]
impl Registry for PublicRegistry {
    fn kind(&self) -> RegistryKind {
        RegistryKind::Public
    }

    fn handles(&self, _module_source: &str) -> bool {
        true
    }

    async fn resolve_latest(&self, module_source: &str) -> Result<VersionOutcome, RegistryError> {
        let url = format!(
            "{}/v1/modules/{}",
            self.base_url,
            Self::module_address(module_source)
        );

        let response = self
            .client
            .get(&url)
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
            warn!("Terraform registry returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        let module: ModuleResponse = response.json().await.map_err(|e| {
            warn!("Failed to parse Terraform registry response: {}", e);
            RegistryError::InvalidResponse(e.to_string())
        })?;

        Ok(match module.version {
            Some(version) if !version.is_empty() => VersionOutcome::Resolved(version),
            _ => VersionOutcome::NoVersionFound,
        })
    }
}
