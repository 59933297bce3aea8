//! API Guardian - Convention conformance checks for HTTP client modules
//!
//! Architecture: Clean Architecture - Library interface serves as the application layer
//! - Pure domain logic separated from infrastructure concerns
//! - Clean boundaries between core business logic and external dependencies
//! - CI gate API provides pass/fail workflows for pipelines

pub mod config;
pub mod domain;
pub mod manifest;
pub mod registry;
pub mod report;
pub mod scanner;

// Re-export main types for convenient access
pub use domain::violations::{
    GuardError, GuardResult, Severity, ValidationReport, ValidationSummary, Violation,
};

pub use config::{ConfigBuilder, GuardConfig, ManifestConfig, ScannerConfig};

pub use manifest::{DependencyEntry, Manifest, ManifestValidator, Section, ValidateOptions};

pub use registry::{NpmRegistry, Registry};

pub use report::{OutputFormat, ReportFormatter, ReportOptions};

pub use scanner::{RuleSet, ScanOptions, Scanner, SourceFile};

use std::path::Path;
use std::time::Duration;

/// Main guardian providing high-level conformance operations
pub struct ApiGuardian {
    config: GuardConfig,
    scanner: Scanner,
    report_formatter: ReportFormatter,
}

/// Options for combined check workflows
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Stop a check at the first failing sample
    pub fail_fast: bool,
    /// Run file checks in parallel
    pub parallel: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self { fail_fast: false, parallel: true }
    }
}

impl ApiGuardian {
    /// Create a guardian with the given configuration
    pub fn new_with_config(config: GuardConfig) -> GuardResult<Self> {
        config.validate()?;
        let scanner = Scanner::new(config.scanner.clone())?;
        let report_formatter = ReportFormatter::default();

        Ok(Self { config, scanner, report_formatter })
    }

    /// Create a guardian with default configuration
    pub fn new() -> GuardResult<Self> {
        Self::new_with_config(GuardConfig::with_defaults())
    }

    /// Create a guardian loading configuration from file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> GuardResult<Self> {
        let config = GuardConfig::load_from_file(path)?;
        Self::new_with_config(config)
    }

    /// Set custom report formatter
    pub fn with_report_formatter(mut self, formatter: ReportFormatter) -> Self {
        self.report_formatter = formatter;
        self
    }

    /// Access the active configuration
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Scan the configured client directory for convention violations
    pub fn check_conventions(&self, options: &ScanOptions) -> GuardResult<ValidationReport> {
        let mut report = self.scanner.scan(options)?;
        report.set_config_fingerprint(self.config.fingerprint());
        Ok(report)
    }

    /// Scan a specific directory for convention violations
    pub fn check_conventions_in<P: AsRef<Path>>(
        &self,
        dir: P,
        options: &ScanOptions,
    ) -> GuardResult<ValidationReport> {
        let mut report = self.scanner.scan_dir(dir, options)?;
        report.set_config_fingerprint(self.config.fingerprint());
        Ok(report)
    }

    /// Check a single client module file
    pub fn check_file<P: AsRef<Path>>(&self, file_path: P) -> GuardResult<ValidationReport> {
        let violations = self.scanner.check_file(file_path)?;

        let mut report = ValidationReport::new();
        for violation in violations {
            report.add_violation(violation);
        }
        report.set_samples_checked(1);
        report.set_config_fingerprint(self.config.fingerprint());

        Ok(report)
    }

    /// Validate the configured dependency manifest against the registry
    pub async fn check_manifest(&self, options: &ValidateOptions) -> GuardResult<ValidationReport> {
        self.check_manifest_at(&self.config.manifest.manifest_path, options).await
    }

    /// Validate a specific dependency manifest against the registry
    pub async fn check_manifest_at<P: AsRef<Path>>(
        &self,
        path: P,
        options: &ValidateOptions,
    ) -> GuardResult<ValidationReport> {
        let registry = NpmRegistry::new(
            self.config.manifest.registry_program.clone(),
            Duration::from_secs(self.config.manifest.timeout_secs),
        );
        let validator = ManifestValidator::new(registry, self.config.manifest.sample_cap)?;

        let manifest = Manifest::load(path)?;
        let mut report = validator.validate(&manifest, options).await?;
        report.set_config_fingerprint(self.config.fingerprint());
        Ok(report)
    }

    /// Run both convention and manifest checks, merging the reports
    pub async fn check_all(&self, options: &CheckOptions) -> GuardResult<ValidationReport> {
        let scan_options = ScanOptions {
            parallel: options.parallel,
            fail_fast: options.fail_fast,
            sample_cap: None,
        };
        let mut report = self.check_conventions(&scan_options)?;

        if options.fail_fast && report.has_violations() {
            report.sort_violations();
            return Ok(report);
        }

        let manifest_options = ValidateOptions { fail_fast: options.fail_fast, sample_cap: None };
        let manifest_report = self.check_manifest(&manifest_options).await?;

        report.merge(manifest_report);
        report.set_config_fingerprint(self.config.fingerprint());
        report.sort_violations();

        Ok(report)
    }

    /// Format a validation report for output
    pub fn format_report(
        &self,
        report: &ValidationReport,
        format: OutputFormat,
    ) -> GuardResult<String> {
        self.report_formatter.format_report(report, format)
    }
}

/// Convenience function to create a guardian with default settings
pub fn create_guardian() -> GuardResult<ApiGuardian> {
    ApiGuardian::new()
}

/// Convenience function to scan a directory with default settings
pub fn check_directory<P: AsRef<Path>>(directory: P) -> GuardResult<ValidationReport> {
    let guardian = ApiGuardian::new()?;
    guardian.check_conventions_in(directory, &ScanOptions::default())
}

/// Convenience function to validate a manifest with default settings
pub async fn check_manifest() -> GuardResult<ValidationReport> {
    let guardian = ApiGuardian::new()?;
    guardian.check_manifest(&ValidateOptions::default()).await
}

/// CI gate utilities
pub mod gate {
    use super::*;

    /// Pre-merge convention gate for CI pipelines
    ///
    /// Scans the given client directory and returns an error if any
    /// blocking violations are found.
    pub fn pre_merge_check<P: AsRef<Path>>(client_dir: P) -> GuardResult<()> {
        let guardian = ApiGuardian::new()?;
        let report = guardian.check_conventions_in(client_dir, &ScanOptions::default())?;

        if report.has_errors() {
            let error_count = report.summary.violations_by_severity.error;
            return Err(GuardError::validation(format!(
                "Pre-merge check failed: {} blocking violation{} found",
                error_count,
                if error_count == 1 { "" } else { "s" }
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CLEAN_MODULE: &str = r#"import { apiClient } from './apiClient';

export async function fetchEmployees(): Promise<Employee[]> {
    const response = await apiClient.get<Employee[]>('/employees');
    return response.data;
}
"#;

    const DIRTY_MODULE: &str = r#"import axios from 'axios';

export async function fetchEmployees(): Promise<Employee[]> {
    const response = await axios.get<Employee[]>('/employees');
    return response.data;
}
"#;

    fn write_module(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_guardian_creation() {
        let guardian = ApiGuardian::new().unwrap();
        assert_eq!(guardian.config().scanner.client_ident, "apiClient");
    }

    #[test]
    fn test_check_file_reports_violations() {
        let temp_dir = TempDir::new().unwrap();
        let dirty = write_module(temp_dir.path(), "employees.api.ts", DIRTY_MODULE);

        let guardian = ApiGuardian::new().unwrap();
        let report = guardian.check_file(&dirty).unwrap();

        assert!(report.has_violations());
        assert_eq!(report.summary.total_samples, 1);
        assert!(report.violations.iter().any(|v| v.rule_id == "centralized-import"));
    }

    #[test]
    fn test_check_file_clean_module() {
        let temp_dir = TempDir::new().unwrap();
        let clean = write_module(temp_dir.path(), "employees.api.ts", CLEAN_MODULE);

        let guardian = ApiGuardian::new().unwrap();
        let report = guardian.check_file(&clean).unwrap();

        assert!(!report.has_violations());
    }

    #[test]
    fn test_directory_check() {
        let temp_dir = TempDir::new().unwrap();
        write_module(temp_dir.path(), "employees.api.ts", CLEAN_MODULE);
        write_module(temp_dir.path(), "payroll.api.ts", DIRTY_MODULE);

        let guardian = ApiGuardian::new().unwrap();
        let report = guardian
            .check_conventions_in(temp_dir.path(), &ScanOptions::default())
            .unwrap();

        assert!(report.has_violations());
        assert_eq!(report.summary.total_samples, 2);
    }

    #[test]
    fn test_report_carries_config_fingerprint() {
        let temp_dir = TempDir::new().unwrap();
        write_module(temp_dir.path(), "employees.api.ts", CLEAN_MODULE);

        let guardian = ApiGuardian::new().unwrap();
        let report = guardian
            .check_conventions_in(temp_dir.path(), &ScanOptions::default())
            .unwrap();

        assert_eq!(report.config_fingerprint, Some(guardian.config().fingerprint()));
    }

    #[test]
    fn test_report_formatting() {
        let temp_dir = TempDir::new().unwrap();
        let dirty = write_module(temp_dir.path(), "employees.api.ts", DIRTY_MODULE);

        let guardian = ApiGuardian::new().unwrap();
        let report = guardian.check_file(&dirty).unwrap();

        let human = guardian.format_report(&report, OutputFormat::Human).unwrap();
        assert!(human.contains("Conformance Violations Found"));

        let json = guardian.format_report(&report, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed["violations"].is_array());
    }

    #[test]
    fn test_gate_pre_merge_check() {
        let clean_dir = TempDir::new().unwrap();
        write_module(clean_dir.path(), "employees.api.ts", CLEAN_MODULE);

        let dirty_dir = TempDir::new().unwrap();
        write_module(dirty_dir.path(), "payroll.api.ts", DIRTY_MODULE);

        assert!(gate::pre_merge_check(clean_dir.path()).is_ok());
        assert!(gate::pre_merge_check(dirty_dir.path()).is_err());
    }

    #[test]
    fn test_convenience_functions() {
        let temp_dir = TempDir::new().unwrap();
        write_module(temp_dir.path(), "employees.api.ts", CLEAN_MODULE);

        let guardian = create_guardian().unwrap();
        assert!(guardian.config().validate().is_ok());

        let report = check_directory(temp_dir.path()).unwrap();
        assert_eq!(report.summary.total_samples, 1);
    }

    #[tokio::test]
    async fn test_check_manifest_at_missing_file_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let guardian = ApiGuardian::new().unwrap();

        let result = guardian
            .check_manifest_at(temp_dir.path().join("package.json"), &ValidateOptions::default())
            .await;

        assert!(matches!(result, Err(GuardError::Manifest { .. })));
    }
}
