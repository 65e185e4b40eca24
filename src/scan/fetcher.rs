//! Repository acquisition
//!
//! Every fetched repository lives in its own temporary directory owned by a
//! [`WorkingCopy`]. Dropping the working copy removes the directory, so the
//! storage is released on every exit path of a scan task, unwinding included.

use std::path::{Path, PathBuf};
use std::process::Stdio;

#[cfg(test)]
use mockall::automock;

use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::scan::source::RepositoryId;

const TEMP_PREFIX: &str = "tf-module-audit-";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to clone {repository}: {message}")]
    Clone { repository: String, message: String },
}

/// A checked-out repository backed by temporary storage
#[derive(Debug)]
pub struct WorkingCopy {
    _storage: TempDir,
    path: PathBuf,
}

impl WorkingCopy {
    /// Wrap a checkout at `path`, which must live inside `storage`
    pub fn new(storage: TempDir, path: PathBuf) -> Self {
        Self {
            _storage: storage,
            path,
        }
    }

    /// Root of the checkout
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Trait for acquiring a local copy of a repository
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait RepositoryFetcher: Send + Sync {
    async fn fetch(&self, repository: &RepositoryId) -> Result<WorkingCopy, FetchError>;
}

/// Shallow-clones repositories over HTTPS with `git`
pub struct GitCloneFetcher {
    host: String,
    token: String,
}

impl GitCloneFetcher {
    pub fn new(host: &str, token: &str) -> Self {
        Self {
            host: host.to_string(),
            token: token.to_string(),
        }
    }

    fn clone_url(&self, repository: &RepositoryId) -> String {
        format!(
            "https://x-access-token:{}@{}/{}/{}.git",
            self.token, self.host, repository.owner, repository.name
        )
    }
}

#[async_trait::async_trait]
impl RepositoryFetcher for GitCloneFetcher {
    async fn fetch(&self, repository: &RepositoryId) -> Result<WorkingCopy, FetchError> {
        let storage = tempfile::Builder::new().prefix(TEMP_PREFIX).tempdir()?;
        let target = storage.path().join(&repository.name);

        debug!("Cloning {} into {}", repository, target.display());

        let output = Command::new("git")
            .args(["clone", "--depth", "1", "--quiet"])
            .arg(self.clone_url(repository))
            .arg(&target)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Clone {
                repository: repository.to_string(),
                message: redact(stderr.trim(), &self.token),
            });
        }

        Ok(WorkingCopy::new(storage, target))
    }
}

/// Replace every occurrence of `secret` in `text`
pub fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, "***")
}
