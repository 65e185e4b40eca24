use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// Constants
// =============================================================================

/// Timeout applied to every registry and GitHub API request (10 seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default number of repositories processed in parallel
pub const DEFAULT_WORKERS: usize = 10;

/// Directory inside each repository that holds the Terraform configuration
pub const DEFAULT_SCAN_ROOT: &str = "terraform";

/// Environment assigned to files that sit directly in the scan root
pub const DEFAULT_ENVIRONMENT: &str = "infrastructure";

/// Sentinel for module declarations without a `version` attribute
pub const NO_VERSION_SPECIFIED: &str = "No_Version_Specified";

pub const DEFAULT_OUTPUT: &str = "terraform_modules_report.csv";

pub const DEFAULT_PUBLIC_REGISTRY_URL: &str = "https://registry.terraform.io";

pub const DEFAULT_PRIVATE_REGISTRY_HOST: &str = "app.terraform.io";

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

pub const DEFAULT_CLONE_HOST: &str = "github.com";

/// Environment variable holding the credential used to list and clone repositories
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Environment variable holding the private registry token
pub const REGISTRY_TOKEN_VAR: &str = "TFE_TOKEN";

const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required credential: set {0}")]
    MissingCredential(&'static str),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Invalid {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Audit configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AuditConfig {
    /// GitHub organization whose repositories are scanned
    pub organization: Option<String>,
    /// Path inside each repository to scan for `*.tf` files
    pub scan_root: PathBuf,
    /// Size of the repository worker pool
    pub workers: usize,
    pub output: PathBuf,
    pub format: ReportFormat,
    pub include_archived: bool,
    pub registries: RegistriesConfig,
    pub github: GitHubConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            organization: None,
            scan_root: PathBuf::from(DEFAULT_SCAN_ROOT),
            workers: DEFAULT_WORKERS,
            output: PathBuf::from(DEFAULT_OUTPUT),
            format: ReportFormat::default(),
            include_archived: false,
            registries: RegistriesConfig::default(),
            github: GitHubConfig::default(),
        }
    }
}

impl AuditConfig {
    /// Load configuration from a JSON file, using defaults for missing fields
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

/// Registry-specific configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct RegistriesConfig {
    pub public: PublicRegistryConfig,
    pub private: PrivateRegistryConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PublicRegistryConfig {
    pub base_url: String,
}

impl Default for PublicRegistryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PUBLIC_REGISTRY_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PrivateRegistryConfig {
    /// Host prefix that routes a module source to the private registry
    pub host: String,
    /// API base URL; defaults to `https://<host>`
    pub base_url: Option<String>,
    pub latest_version: LatestVersionPolicy,
}

impl Default for PrivateRegistryConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PRIVATE_REGISTRY_HOST.to_string(),
            base_url: None,
            latest_version: LatestVersionPolicy::default(),
        }
    }
}

impl PrivateRegistryConfig {
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| format!("https://{}", self.host))
    }
}

/// How the private registry's version listing is reduced to a single latest version
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum LatestVersionPolicy {
    /// Semver maximum, falling back to the last listed entry if nothing parses
    #[default]
    SemanticMax,
    /// Last listed entry, trusting the registry to list in ascending publish order
    PublishOrder,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GitHubConfig {
    pub api_url: String,
    pub clone_host: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            clone_host: DEFAULT_CLONE_HOST.to_string(),
        }
    }
}

/// Access tokens for the run
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Token used to list and clone repositories
    pub github_token: String,
    /// Token for the private module registry, if any
    pub registry_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("github_token", &"<redacted>")
            .field(
                "registry_token",
                &self.registry_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let github_token =
            non_blank(GITHUB_TOKEN_VAR).ok_or(ConfigError::MissingCredential(GITHUB_TOKEN_VAR))?;

        Ok(Self {
            github_token,
            registry_token: non_blank(REGISTRY_TOKEN_VAR),
        })
    }
}

/// Private registry token from the environment, for runs without GitHub access
pub fn registry_token_from_env() -> Option<String> {
    std::env::var(REGISTRY_TOKEN_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty())
}

/// Returns the path to the data directory for tf-module-audit.
/// Uses $XDG_DATA_HOME/tf-module-audit if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/tf-module-audit,
/// or ./tf-module-audit if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join(format!("{}.log", APP_NAME))
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn audit_config_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<AuditConfig>(json!({
            "organization": "acme",
            "workers": 4
        }))
        .unwrap();

        assert_eq!(result.organization.as_deref(), Some("acme"));
        assert_eq!(result.workers, 4);
        assert_eq!(result.scan_root, PathBuf::from("terraform"));
        assert_eq!(result.registries, RegistriesConfig::default());
        assert_eq!(result.format, ReportFormat::Csv);
    }

    #[test]
    fn audit_config_from_full_object_parses_all_fields() {
        let result = serde_json::from_value::<AuditConfig>(json!({
            "organization": "acme",
            "scanRoot": "infra/tf",
            "workers": 2,
            "output": "out.json",
            "format": "json",
            "includeArchived": true,
            "registries": {
                "public": { "baseUrl": "http://localhost:1234" },
                "private": {
                    "host": "tfe.acme.internal",
                    "baseUrl": "http://localhost:5678",
                    "latestVersion": "publishOrder"
                }
            },
            "github": {
                "apiUrl": "http://localhost:9999",
                "cloneHost": "git.acme.internal"
            }
        }))
        .unwrap();

        assert_eq!(
            result,
            AuditConfig {
                organization: Some("acme".to_string()),
                scan_root: PathBuf::from("infra/tf"),
                workers: 2,
                output: PathBuf::from("out.json"),
                format: ReportFormat::Json,
                include_archived: true,
                registries: RegistriesConfig {
                    public: PublicRegistryConfig {
                        base_url: "http://localhost:1234".to_string()
                    },
                    private: PrivateRegistryConfig {
                        host: "tfe.acme.internal".to_string(),
                        base_url: Some("http://localhost:5678".to_string()),
                        latest_version: LatestVersionPolicy::PublishOrder,
                    },
                },
                github: GitHubConfig {
                    api_url: "http://localhost:9999".to_string(),
                    clone_host: "git.acme.internal".to_string(),
                },
            }
        );
    }

    #[test]
    fn private_base_url_defaults_to_https_host() {
        let config = PrivateRegistryConfig::default();
        assert_eq!(config.base_url(), "https://app.terraform.io");
    }

    #[test]
    fn from_file_reports_invalid_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("audit.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = AuditConfig::from_file(&path);

        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn credentials_require_github_token() {
        let result = Credentials::from_lookup(lookup_from(&[("TFE_TOKEN", "tfe")]));
        assert!(matches!(
            result,
            Err(ConfigError::MissingCredential("GITHUB_TOKEN"))
        ));
    }

    #[test]
    fn credentials_treat_blank_values_as_unset() {
        let result = Credentials::from_lookup(lookup_from(&[
            ("GITHUB_TOKEN", "ghp_123"),
            ("TFE_TOKEN", "   "),
        ]))
        .unwrap();

        assert_eq!(result.github_token, "ghp_123");
        assert_eq!(result.registry_token, None);
    }

    #[test]
    fn credentials_debug_output_hides_tokens() {
        let credentials = Credentials {
            github_token: "ghp_secret".to_string(),
            registry_token: Some("tfe_secret".to_string()),
        };

        let debug = format!("{:?}", credentials);

        assert!(!debug.contains("secret"));
    }

    #[test]
    fn data_dir_with_env_uses_xdg_data_home_when_set() {
        let path = data_dir_with_env(
            Some("/tmp/test-data".to_string()),
            Some(PathBuf::from("/home/user")),
        );

        assert_eq!(path, PathBuf::from("/tmp/test-data/tf-module-audit"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_home_local_share() {
        let path = data_dir_with_env(None, Some(PathBuf::from("/home/user")));

        assert_eq!(
            path,
            PathBuf::from("/home/user/.local/share/tf-module-audit")
        );
    }

    #[test]
    fn data_dir_with_env_falls_back_to_current_dir_when_no_dirs_available() {
        let path = data_dir_with_env(None, None);
        assert_eq!(path, PathBuf::from("./tf-module-audit"));
    }
}
