//! Mock module registries backed by mockito

use std::sync::Arc;

use mockito::{Mock, ServerGuard};
use serde_json::json;

use tf_module_audit::app::build_scanner;
use tf_module_audit::config::{AuditConfig, LatestVersionPolicy};
use tf_module_audit::scan::worker::RepositoryScanner;

pub const PRIVATE_HOST: &str = "app.terraform.io";
pub const REGISTRY_TOKEN: &str = "tfe-test-token";

/// Mock `GET /v1/modules/{address}` answering with `version`
pub async fn mock_public_module(server: &mut ServerGuard, address: &str, version: &str) -> Mock {
    server
        .mock("GET", format!("/v1/modules/{}", address).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "id": format!("{}/{}", address, version), "version": version }).to_string())
        .create_async()
        .await
}

/// Mock the private registry version listing for `org/name/provider`
pub async fn mock_private_versions(
    server: &mut ServerGuard,
    address: &str,
    versions: &[&str],
) -> Mock {
    let entries: Vec<_> = versions.iter().map(|v| json!({ "version": v })).collect();
    server
        .mock(
            "GET",
            format!("/api/registry/v1/modules/{}/versions", address).as_str(),
        )
        .match_header("authorization", format!("Bearer {}", REGISTRY_TOKEN).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "modules": [{ "source": address, "versions": entries }] }).to_string())
        .create_async()
        .await
}

/// Audit configuration pointing both registries at mock servers
pub fn test_config(public_url: &str, private_url: &str) -> AuditConfig {
    let mut config = AuditConfig::default();
    config.registries.public.base_url = public_url.to_string();
    config.registries.private.host = PRIVATE_HOST.to_string();
    config.registries.private.base_url = Some(private_url.to_string());
    config.registries.private.latest_version = LatestVersionPolicy::SemanticMax;
    config
}

pub fn test_scanner(config: &AuditConfig, registry_token: Option<&str>) -> Arc<RepositoryScanner> {
    Arc::new(build_scanner(config, registry_token.map(str::to_string)))
}
