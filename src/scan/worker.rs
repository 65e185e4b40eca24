//! Per-repository scan pipeline
//!
//! Walks the scan root of a working copy, extracts module references from
//! every configuration file, and resolves each module's latest version one at
//! a time. A file that cannot be read is skipped; the rest of the repository
//! still produces records.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::DEFAULT_ENVIRONMENT;
use crate::parser::traits::Parser;
use crate::parser::types::ModuleReference;
use crate::version::checker::FreshnessRecord;
use crate::version::resolver::VersionResolver;

/// Directories never descended into
const SKIPPED_DIRS: &[&str] = &[".terraform", ".git"];

pub struct RepositoryScanner {
    parser: Arc<dyn Parser>,
    resolver: Arc<VersionResolver>,
    scan_root: PathBuf,
}

impl RepositoryScanner {
    pub fn new(
        parser: Arc<dyn Parser>,
        resolver: Arc<VersionResolver>,
        scan_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            parser,
            resolver,
            scan_root: scan_root.into(),
        }
    }

    /// Produce freshness records for every module declared in the working copy
    ///
    /// The directory walk runs on the blocking pool. Version lookups run
    /// sequentially to bound the request rate per worker.
    pub async fn scan(&self, repository: &str, working_copy: &Path) -> Vec<FreshnessRecord> {
        let parser = Arc::clone(&self.parser);
        let scan_root = self.scan_root.clone();
        let owned_repository = repository.to_string();
        let owned_working_copy = working_copy.to_path_buf();
        let extraction = tokio::task::spawn_blocking(move || {
            extract_references(
                parser.as_ref(),
                &scan_root,
                &owned_repository,
                &owned_working_copy,
            )
        });

        let references = match extraction.await {
            Ok(references) => references,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                warn!("Extraction for {} did not complete: {}", repository, e);
                Vec::new()
            }
        };

        let mut records = Vec::with_capacity(references.len());
        for reference in references {
            let latest = self.resolver.resolve(&reference.module_source).await;
            records.push(FreshnessRecord::new(reference, latest));
        }

        info!(
            "Scanned {}: {} module references",
            repository,
            records.len()
        );
        records
    }

    /// Extract module references from every configuration file under the scan root
    ///
    /// Blocks on file system access.
    pub fn extract(&self, repository: &str, working_copy: &Path) -> Vec<ModuleReference> {
        extract_references(
            self.parser.as_ref(),
            &self.scan_root,
            repository,
            working_copy,
        )
    }
}

fn extract_references(
    parser: &dyn Parser,
    scan_root: &Path,
    repository: &str,
    working_copy: &Path,
) -> Vec<ModuleReference> {
    let root = working_copy.join(scan_root);
    if !root.is_dir() {
        info!(
            "{} has no {} directory, nothing to scan",
            repository,
            scan_root.display()
        );
        return Vec::new();
    }

    let mut references = Vec::new();
    for path in config_files(parser, &root) {
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };

        let environment = environment_of(&root, &path);
        let file_path = relative_path(working_copy, &path);
        for declaration in parser.parse(&content) {
            debug!(
                "{}: module {} ({}) at {}:{}",
                repository, declaration.name, declaration.source, file_path, declaration.line
            );
            references.push(ModuleReference::new(
                repository,
                &environment,
                &file_path,
                declaration,
            ));
        }
    }
    references
}

/// Configuration files under `root`, in a stable order
fn config_files(parser: &dyn Parser, root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry))
        .filter_map(|entry| {
            entry
                .inspect_err(|e| warn!("Skipping unreadable entry: {}", e))
                .ok()
        })
        .filter(|entry| entry.file_type().is_file() && parser.can_parse(entry.path()))
        .map(DirEntry::into_path)
        .collect()
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

/// First directory below the scan root, or the default environment for
/// files directly in it
fn environment_of(root: &Path, file: &Path) -> String {
    let Ok(relative) = file.strip_prefix(root) else {
        return DEFAULT_ENVIRONMENT.to_string();
    };
    let mut components = relative.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(dir)), Some(_)) => dir.to_string_lossy().into_owned(),
        _ => DEFAULT_ENVIRONMENT.to_string(),
    }
}

/// `/`-separated path of `file` relative to `base`
fn relative_path(base: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(base).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
