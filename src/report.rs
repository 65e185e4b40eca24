//! Report writing for scan results

use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::ReportFormat;
use crate::scan::orchestrator::RepositoryResult;
use crate::version::checker::{FreshnessRecord, OutdatedStatus};

const CSV_HEADER: [&str; 8] = [
    "repository",
    "environment",
    "module_name",
    "module_source",
    "current_version",
    "latest_version",
    "is_outdated",
    "file_path",
];

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report {path}: {source}")]
    Io { path: String, source: io::Error },

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Counts over all freshness records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub total: usize,
    pub outdated: usize,
    /// Records whose latest version could not be resolved
    pub errors: usize,
    pub up_to_date: usize,
}

impl ScanSummary {
    pub fn from_records(records: &[FreshnessRecord]) -> Self {
        let total = records.len();
        let outdated = records
            .iter()
            .filter(|r| r.is_outdated == OutdatedStatus::Outdated)
            .count();
        let errors = records
            .iter()
            .filter(|r| !r.latest_version.is_resolved())
            .count();
        Self {
            total,
            outdated,
            errors,
            up_to_date: total - outdated - errors,
        }
    }
}

/// Aggregate result of one audit run
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub summary: ScanSummary,
    pub repositories: Vec<RepositoryResult>,
    pub records: Vec<FreshnessRecord>,
}

impl ScanReport {
    pub fn new(records: Vec<FreshnessRecord>, repositories: Vec<RepositoryResult>) -> Self {
        Self {
            generated_at: Utc::now(),
            summary: ScanSummary::from_records(&records),
            repositories,
            records,
        }
    }

    /// Records in (repository, file_path, module_name) order
    fn sorted_records(&self) -> Vec<&FreshnessRecord> {
        let mut records: Vec<_> = self.records.iter().collect();
        records.sort_by(|a, b| {
            let a = &a.reference;
            let b = &b.reference;
            (&a.repository, &a.file_path, &a.module_name).cmp(&(
                &b.repository,
                &b.file_path,
                &b.module_name,
            ))
        });
        records
    }
}

/// Write one CSV row per record
pub fn write_csv<W: Write>(report: &ScanReport, mut writer: W) -> io::Result<()> {
    writeln!(writer, "{}", CSV_HEADER.join(","))?;

    for record in report.sorted_records() {
        let reference = &record.reference;
        let fields = [
            reference.repository.as_str(),
            reference.environment.as_str(),
            reference.module_name.as_str(),
            reference.module_source.as_str(),
            reference.declared_version.as_str(),
            record.latest_version.as_str(),
            record.is_outdated.as_str(),
            reference.file_path.as_str(),
        ];
        let row: Vec<_> = fields.iter().map(|f| csv_field(f)).collect();
        writeln!(writer, "{}", row.join(","))?;
    }
    writer.flush()
}

/// Write the full report as pretty-printed JSON
pub fn write_json<W: Write>(report: &ScanReport, mut writer: W) -> Result<(), ReportError> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer).map_err(serde_json::Error::io)?;
    Ok(())
}

/// Write the report to `path` in the requested format
pub fn write_report(
    report: &ScanReport,
    path: &Path,
    format: ReportFormat,
) -> Result<(), ReportError> {
    let io_error = |source| ReportError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }

    let file = std::fs::File::create(path).map_err(io_error)?;
    let writer = io::BufWriter::new(file);
    match format {
        ReportFormat::Csv => write_csv(report, writer).map_err(io_error)?,
        ReportFormat::Json => write_json(report, writer)?,
    }

    info!(
        "Wrote {} records to {}",
        report.records.len(),
        path.display()
    );
    Ok(())
}

/// Console summary: totals, then any repositories that failed
pub fn render_summary(report: &ScanReport) -> String {
    let summary = &report.summary;
    let mut out = String::new();

    let _ = writeln!(out, "Repositories scanned: {}", report.repositories.len());
    let _ = writeln!(out, "Total module references: {}", summary.total);
    let _ = writeln!(out, "Outdated: {}", summary.outdated);
    let _ = writeln!(out, "Unresolved: {}", summary.errors);
    let _ = writeln!(out, "Up to date: {}", summary.up_to_date);

    let failed: Vec<_> = report
        .repositories
        .iter()
        .filter(|r| r.status.is_failure())
        .collect();
    if !failed.is_empty() {
        let _ = writeln!(out, "Failed repositories: {}", failed.len());
        for result in failed {
            let _ = writeln!(out, "  {}: {}", result.repository, failure_reason(result));
        }
    }
    out
}

fn failure_reason(result: &RepositoryResult) -> &str {
    use crate::scan::orchestrator::RepositoryStatus;

    match &result.status {
        RepositoryStatus::AcquisitionFailed { reason } | RepositoryStatus::Faulted { reason } => {
            reason.as_str()
        }
        RepositoryStatus::Scanned { .. } => "",
    }
}

/// Quote a field when it contains a delimiter, quote, or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::types::ModuleReference;
    use crate::scan::orchestrator::RepositoryStatus;
    use crate::scan::source::RepositoryId;
    use crate::version::types::VersionOutcome;
    use rstest::rstest;
    use tempfile::TempDir;

    fn record(
        repository: &str,
        module: &str,
        declared: &str,
        latest: VersionOutcome,
    ) -> FreshnessRecord {
        let reference = ModuleReference {
            repository: repository.to_string(),
            environment: "prod".to_string(),
            module_name: module.to_string(),
            module_source: format!("acme/{}/aws", module),
            declared_version: declared.to_string(),
            file_path: "terraform/prod/main.tf".to_string(),
        };
        FreshnessRecord::new(reference, latest)
    }

    fn sample_report() -> ScanReport {
        ScanReport::new(
            vec![
                record("acme/b", "vpc", "3.2.0", VersionOutcome::resolved("5.0.0")),
                record("acme/a", "dns", "1.0.0", VersionOutcome::resolved("1.0.0")),
                record("acme/a", "net", "No_Version_Specified", VersionOutcome::TokenMissing),
            ],
            vec![
                RepositoryResult {
                    repository: RepositoryId::new("acme", "a"),
                    status: RepositoryStatus::Scanned { modules: 2 },
                },
                RepositoryResult {
                    repository: RepositoryId::new("acme", "b"),
                    status: RepositoryStatus::Scanned { modules: 1 },
                },
                RepositoryResult {
                    repository: RepositoryId::new("acme", "gone"),
                    status: RepositoryStatus::AcquisitionFailed {
                        reason: "repository not found".to_string(),
                    },
                },
            ],
        )
    }

    #[test]
    fn summary_counts_outdated_errors_and_up_to_date() {
        let report = sample_report();

        assert_eq!(
            report.summary,
            ScanSummary {
                total: 3,
                outdated: 1,
                errors: 1,
                up_to_date: 1,
            }
        );
    }

    #[test]
    fn write_csv_writes_sorted_rows_with_header() {
        let report = sample_report();
        let mut out = Vec::new();

        write_csv(&report, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "repository,environment,module_name,module_source,current_version,latest_version,is_outdated,file_path",
                "acme/a,prod,dns,acme/dns/aws,1.0.0,1.0.0,False,terraform/prod/main.tf",
                "acme/a,prod,net,acme/net/aws,No_Version_Specified,Token_Missing,Unknown,terraform/prod/main.tf",
                "acme/b,prod,vpc,acme/vpc/aws,3.2.0,5.0.0,True,terraform/prod/main.tf",
            ]
        );
    }

    #[rstest]
    #[case("plain", "plain")]
    #[case("a,b", "\"a,b\"")]
    #[case("say \"hi\"", "\"say \"\"hi\"\"\"")]
    #[case("two\nlines", "\"two\nlines\"")]
    fn csv_field_quotes_when_needed(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(csv_field(input), expected);
    }

    #[test]
    fn write_json_includes_summary_and_repository_status() {
        let report = sample_report();
        let mut out = Vec::new();

        write_json(&report, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["summary"]["outdated"], 1);
        assert_eq!(value["repositories"][2]["status"], "acquisition_failed");
        assert_eq!(value["records"][2]["latest_version"], "Token_Missing");
        assert_eq!(value["records"][2]["is_outdated"], "Unknown");
        assert!(value["generated_at"].is_string());
    }

    #[test]
    fn write_report_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("reports/modules.csv");

        write_report(&sample_report(), &path, ReportFormat::Csv).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 4);
    }

    #[test]
    fn render_summary_lists_failed_repositories() {
        let summary = render_summary(&sample_report());

        assert!(summary.contains("Total module references: 3"));
        assert!(summary.contains("Outdated: 1"));
        assert!(summary.contains("Failed repositories: 1"));
        assert!(summary.contains("acme/gone: repository not found"));
    }

    #[test]
    fn render_summary_omits_failure_section_when_all_scanned() {
        let report = ScanReport::new(Vec::new(), Vec::new());

        assert!(!render_summary(&report).contains("Failed repositories"));
    }
}
