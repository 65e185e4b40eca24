//! Wiring between configuration and the scan pipeline

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::config::{AuditConfig, Credentials};
use crate::parser::TerraformParser;
use crate::report::ScanReport;
use crate::scan::fetcher::{GitCloneFetcher, RepositoryFetcher};
use crate::scan::orchestrator::Orchestrator;
use crate::scan::source::{
    GitHubOrganization, RepositoryId, RepositorySource, SourceError, StaticRepositories,
};
use crate::scan::worker::RepositoryScanner;
use crate::version::resolver::VersionResolver;

/// Which repositories an audit covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositorySelection {
    Organization(String),
    Repositories(Vec<RepositoryId>),
    File(PathBuf),
}

impl RepositorySelection {
    /// Build the source for this selection
    pub fn into_source(
        self,
        config: &AuditConfig,
        credentials: &Credentials,
    ) -> Result<Box<dyn RepositorySource>, SourceError> {
        Ok(match self {
            RepositorySelection::Organization(organization) => Box::new(
                GitHubOrganization::new(
                    &config.github.api_url,
                    &organization,
                    &credentials.github_token,
                )
                .with_archived(config.include_archived),
            ),
            RepositorySelection::Repositories(repositories) => {
                Box::new(StaticRepositories::new(repositories))
            }
            RepositorySelection::File(path) => Box::new(StaticRepositories::from_file(&path)?),
        })
    }
}

/// Scanner wired with the Terraform parser and the configured registries
pub fn build_scanner(config: &AuditConfig, registry_token: Option<String>) -> RepositoryScanner {
    let resolver = VersionResolver::from_config(&config.registries, registry_token);
    RepositoryScanner::new(
        Arc::new(TerraformParser::new()),
        Arc::new(resolver),
        config.scan_root.clone(),
    )
}

/// Enumerate, fetch, and scan every selected repository
///
/// Enumeration failure aborts the audit; per-repository failures are recorded
/// in the report.
pub async fn run_audit(
    config: &AuditConfig,
    source: &dyn RepositorySource,
    fetcher: Arc<dyn RepositoryFetcher>,
    scanner: Arc<RepositoryScanner>,
) -> Result<ScanReport, SourceError> {
    let repositories = source.list_repositories().await?;
    info!("Auditing {} repositories", repositories.len());

    let orchestrator = Orchestrator::new(fetcher, scanner, config.workers);
    Ok(orchestrator.run(repositories).await)
}

/// Audit with the default git fetcher and registries
pub async fn run(
    config: &AuditConfig,
    credentials: &Credentials,
    selection: RepositorySelection,
) -> anyhow::Result<ScanReport> {
    let source = selection.into_source(config, credentials)?;
    let fetcher = GitCloneFetcher::new(&config.github.clone_host, &credentials.github_token);
    let scanner = build_scanner(config, credentials.registry_token.clone());

    let report = run_audit(
        config,
        source.as_ref(),
        Arc::new(fetcher),
        Arc::new(scanner),
    )
    .await?;
    Ok(report)
}

/// Scan a local checkout without enumerating or cloning anything
pub async fn scan_directory(
    scanner: &RepositoryScanner,
    path: &Path,
    repository: &str,
) -> ScanReport {
    let records = scanner.scan(repository, path).await;
    ScanReport::new(records, Vec::new())
}

/// Repository label for a local checkout: its directory name
pub fn directory_label(path: &Path) -> String {
    path.canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
