//! Repository fixtures served from temporary directories

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tempfile::TempDir;

use tf_module_audit::scan::fetcher::{FetchError, RepositoryFetcher, WorkingCopy};
use tf_module_audit::scan::source::RepositoryId;

/// Fetcher that materializes in-memory repository trees on disk
///
/// Repositories without a fixture fail acquisition, as a clone of a missing
/// repository would.
#[derive(Default)]
pub struct FixtureFetcher {
    repositories: HashMap<RepositoryId, Vec<(String, String)>>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, repository: &str, path: &str, content: &str) -> Self {
        let id: RepositoryId = repository.parse().unwrap();
        self.repositories
            .entry(id)
            .or_default()
            .push((path.to_string(), content.to_string()));
        self
    }
}

#[async_trait]
impl RepositoryFetcher for FixtureFetcher {
    async fn fetch(&self, repository: &RepositoryId) -> Result<WorkingCopy, FetchError> {
        let Some(files) = self.repositories.get(repository) else {
            return Err(FetchError::Clone {
                repository: repository.to_string(),
                message: "remote: Repository not found.".to_string(),
            });
        };

        let storage = TempDir::new()?;
        let root = storage.path().join(&repository.name);
        std::fs::create_dir_all(&root)?;
        for (path, content) in files {
            write_file(&root, path, content);
        }
        Ok(WorkingCopy::new(storage, root))
    }
}

/// Write `content` to `root/relative`, creating parent directories
pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

pub fn repository_ids(names: &[&str]) -> Vec<RepositoryId> {
    names.iter().map(|name| name.parse().unwrap()).collect()
}
