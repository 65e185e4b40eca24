use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tf_module_audit::app::{self, RepositorySelection};
use tf_module_audit::config::{
    AuditConfig, Credentials, LatestVersionPolicy, ReportFormat, log_path, registry_token_from_env,
};
use tf_module_audit::logging::{self, LoggingOptions};
use tf_module_audit::report::{self, ScanReport};
use tf_module_audit::scan::source::RepositoryId;

#[derive(Parser)]
#[command(name = "tf-module-audit")]
#[command(
    version,
    about = "Inventory Terraform module usage and report outdated module versions"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    audit: AuditArgs,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum)]
    format: Option<ReportFormat>,

    /// Also write logs to a file (defaults to the data directory)
    #[arg(long, global = true)]
    log_file: Option<Option<PathBuf>>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Directory inside each repository to scan
    #[arg(long, global = true)]
    scan_root: Option<PathBuf>,

    /// How to pick the latest version from the private registry listing
    #[arg(long, global = true, value_enum)]
    latest_version: Option<LatestVersionPolicy>,
}

#[derive(Args)]
struct AuditArgs {
    /// GitHub organization to scan
    #[arg(long, conflicts_with_all = ["repo", "repos_file"])]
    org: Option<String>,

    /// Repository to scan as owner/name (repeatable)
    #[arg(long, conflicts_with = "repos_file")]
    repo: Vec<RepositoryId>,

    /// File with one owner/name per line
    #[arg(long)]
    repos_file: Option<PathBuf>,

    /// Maximum number of repositories scanned at once
    #[arg(long)]
    workers: Option<usize>,

    /// Report file path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Include archived repositories when scanning an organization
    #[arg(long)]
    include_archived: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a local checkout and print its module report
    ScanDir {
        path: PathBuf,

        /// Repository label for the records (defaults to the directory name)
        #[arg(long)]
        repository: Option<String>,
    },
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<AuditConfig> {
        let mut config = match &self.config {
            Some(path) => AuditConfig::from_file(path)?,
            None => AuditConfig::default(),
        };

        if let Some(org) = &self.audit.org {
            config.organization = Some(org.clone());
        }
        if let Some(scan_root) = &self.scan_root {
            config.scan_root = scan_root.clone();
        }
        if let Some(workers) = self.audit.workers {
            config.workers = workers;
        }
        if let Some(output) = &self.audit.output {
            config.output = output.clone();
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(policy) = self.latest_version {
            config.registries.private.latest_version = policy;
        }
        config.include_archived |= self.audit.include_archived;

        Ok(config)
    }
}

impl AuditArgs {
    fn selection(&self, config: &AuditConfig) -> anyhow::Result<RepositorySelection> {
        if !self.repo.is_empty() {
            return Ok(RepositorySelection::Repositories(self.repo.clone()));
        }
        if let Some(path) = &self.repos_file {
            return Ok(RepositorySelection::File(path.clone()));
        }
        config
            .organization
            .clone()
            .map(RepositorySelection::Organization)
            .context("No repositories selected: pass --org, --repo or --repos-file")
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = cli
        .log_file
        .clone()
        .map(|path| path.unwrap_or_else(log_path));
    let _guard = logging::init(LoggingOptions {
        log_file: log_file.as_deref(),
        json: cli.log_json,
    })?;

    let config = cli.load_config()?;

    match &cli.command {
        Some(Command::ScanDir { path, repository }) => {
            let repository = repository
                .clone()
                .unwrap_or_else(|| app::directory_label(path));
            let scanner = app::build_scanner(&config, registry_token_from_env());
            let report = runtime()?.block_on(app::scan_directory(&scanner, path, &repository));
            print_report(&report, config.format)
        }
        None => {
            let credentials = Credentials::from_env()?;
            let selection = cli.audit.selection(&config)?;
            let report = runtime()?.block_on(app::run(&config, &credentials, selection))?;

            report::write_report(&report, &config.output, config.format)?;
            print!("{}", report::render_summary(&report));
            println!("Report written to {}", config.output.display());
            Ok(())
        }
    }
}

fn runtime() -> io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}

fn print_report(report: &ScanReport, format: ReportFormat) -> anyhow::Result<()> {
    let stdout = io::stdout().lock();
    match format {
        ReportFormat::Csv => report::write_csv(report, stdout)?,
        ReportFormat::Json => report::write_json(report, stdout)?,
    }
    Ok(())
}
