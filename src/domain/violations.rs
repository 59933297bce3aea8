//! Core domain models for conformance violations and validation results
//!
//! Architecture: Rich Domain Models - Violations are entities with behavior, not just data
//! - Violations can classify themselves, suggest fixes, and maintain context
//! - ValidationReport acts as an aggregate root managing collections of violations
//! - Both checkers (scanner and manifest validator) report through the same aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity levels for conformance violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational messages and suggestions
    Info,
    /// Warnings that should be addressed but don't block builds
    Warning,
    /// Errors that block commits and fail CI/CD builds
    Error,
}

impl Severity {
    /// Whether this severity level should cause validation to fail
    pub fn is_blocking(self) -> bool {
        matches!(self, Self::Error)
    }

    /// Convert to string for display
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A conformance violation detected during a check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Unique identifier for the rule that detected this violation
    pub rule_id: String,
    /// Severity level of this violation
    pub severity: Severity,
    /// File path where the violation was found (the manifest path for
    /// dependency violations)
    pub file_path: PathBuf,
    /// Line number (1-indexed) where the violation occurs
    pub line_number: Option<u32>,
    /// Column number (1-indexed) where the violation starts
    pub column_number: Option<u32>,
    /// Human-readable description of the violation
    pub message: String,
    /// Source code or manifest context around the violation
    pub context: Option<String>,
    /// Suggested fix for the violation (if available)
    pub suggested_fix: Option<String>,
    /// When this violation was detected
    pub detected_at: DateTime<Utc>,
}

impl Violation {
    /// Create a new violation
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        file_path: PathBuf,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            file_path,
            line_number: None,
            column_number: None,
            message: message.into(),
            context: None,
            suggested_fix: None,
            detected_at: Utc::now(),
        }
    }

    /// Set line and column position
    pub fn with_position(mut self, line: u32, column: u32) -> Self {
        self.line_number = Some(line);
        self.column_number = Some(column);
        self
    }

    /// Add source or manifest context
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a suggested fix
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggested_fix = Some(suggestion.into());
        self
    }

    /// Whether this violation is blocking (prevents commits/builds)
    pub fn is_blocking(&self) -> bool {
        self.severity.is_blocking()
    }
}

/// Summary statistics for a validation report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Total number of samples (files or manifest entries) checked
    pub total_samples: usize,
    /// Number of violations by severity level
    pub violations_by_severity: ViolationCounts,
    /// Total execution time in milliseconds
    pub execution_time_ms: u64,
    /// Timestamp when validation was performed
    pub validated_at: DateTime<Utc>,
}

/// Count of violations by severity level
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ViolationCounts {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl ViolationCounts {
    /// Total number of violations across all severities
    pub fn total(&self) -> usize {
        self.error + self.warning + self.info
    }

    /// Whether there are any blocking violations
    pub fn has_blocking(&self) -> bool {
        self.error > 0
    }

    /// Add a violation to the counts
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
    }
}

/// Complete validation report containing all violations and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// All violations found during validation
    pub violations: Vec<Violation>,
    /// Summary statistics
    pub summary: ValidationSummary,
    /// Configuration used for this validation
    pub config_fingerprint: Option<String>,
}

impl ValidationReport {
    /// Create a new empty validation report
    pub fn new() -> Self {
        Self {
            violations: Vec::new(),
            summary: ValidationSummary { validated_at: Utc::now(), ..Default::default() },
            config_fingerprint: None,
        }
    }

    /// Add a violation to the report
    pub fn add_violation(&mut self, violation: Violation) {
        self.summary.violations_by_severity.add(violation.severity);
        self.violations.push(violation);
    }

    /// Whether the report contains any violations
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Whether the report contains blocking violations (errors)
    pub fn has_errors(&self) -> bool {
        self.summary.violations_by_severity.has_blocking()
    }

    /// Set the number of samples checked
    pub fn set_samples_checked(&mut self, count: usize) {
        self.summary.total_samples = count;
    }

    /// Set the execution time
    pub fn set_execution_time(&mut self, duration_ms: u64) {
        self.summary.execution_time_ms = duration_ms;
    }

    /// Set the configuration fingerprint
    pub fn set_config_fingerprint(&mut self, fingerprint: impl Into<String>) {
        self.config_fingerprint = Some(fingerprint.into());
    }

    /// Merge another report into this one
    pub fn merge(&mut self, other: ValidationReport) {
        for violation in other.violations {
            self.add_violation(violation);
        }
        self.summary.total_samples += other.summary.total_samples;
        self.summary.execution_time_ms += other.summary.execution_time_ms;
    }

    /// Sort violations by file path and line number for consistent output
    pub fn sort_violations(&mut self) {
        self.violations.sort_by(|a, b| {
            a.file_path
                .cmp(&b.file_path)
                .then_with(|| a.line_number.unwrap_or(0).cmp(&b.line_number.unwrap_or(0)))
                .then_with(|| a.severity.cmp(&b.severity))
        });
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Error types that can occur during validation
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// Configuration file could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// File or directory could not be read or accessed (fatal for the run)
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Pattern compilation failed
    #[error("Pattern error: {message}")]
    Pattern { message: String },

    /// Dependency manifest missing or malformed (fatal for the run)
    #[error("Manifest error in {path}: {message}")]
    Manifest { path: String, message: String },

    /// Registry lookup failed, timed out, or returned an unexpected version
    #[error("Registry error for {package}@{version}: {message}")]
    Registry { package: String, version: String, message: String },

    /// Validation operation failed
    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl GuardError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create a pattern error
    pub fn pattern(message: impl Into<String>) -> Self {
        Self::Pattern { message: message.into() }
    }

    /// Create a manifest error
    pub fn manifest(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Manifest { path: path.into(), message: message.into() }
    }

    /// Create a registry error
    pub fn registry(
        package: impl Into<String>,
        version: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Registry {
            package: package.into(),
            version: version.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }
}

/// Result type for Guardian operations
pub type GuardResult<T> = Result<T, GuardError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_violation_creation() {
        let violation = Violation::new(
            "centralized-import",
            Severity::Error,
            PathBuf::from("src/api/employees.api.ts"),
            "Test message",
        );

        assert_eq!(violation.rule_id, "centralized-import");
        assert_eq!(violation.severity, Severity::Error);
        assert_eq!(violation.file_path, Path::new("src/api/employees.api.ts"));
        assert_eq!(violation.message, "Test message");
        assert!(violation.is_blocking());
    }

    #[test]
    fn test_violation_with_position() {
        let violation = Violation::new(
            "blob-escape-hatch",
            Severity::Warning,
            PathBuf::from("src/api/reports.api.ts"),
            "Test message",
        )
        .with_position(42, 15)
        .with_context("responseType: 'blob'");

        assert_eq!(violation.line_number, Some(42));
        assert_eq!(violation.column_number, Some(15));
        assert_eq!(violation.context, Some("responseType: 'blob'".to_string()));
        assert!(!violation.is_blocking());
    }

    #[test]
    fn test_validation_report() {
        let mut report = ValidationReport::new();

        report.add_violation(Violation::new(
            "centralized-usage",
            Severity::Error,
            PathBuf::from("src/api/payroll.api.ts"),
            "Error message",
        ));

        report.add_violation(Violation::new(
            "version-shape",
            Severity::Warning,
            PathBuf::from("package.json"),
            "Warning message",
        ));

        assert!(report.has_violations());
        assert!(report.has_errors());
        assert_eq!(report.summary.violations_by_severity.total(), 2);
        assert_eq!(report.summary.violations_by_severity.error, 1);
        assert_eq!(report.summary.violations_by_severity.warning, 1);
    }

    #[test]
    fn test_report_merge() {
        let mut scan = ValidationReport::new();
        scan.add_violation(Violation::new(
            "centralized-import",
            Severity::Error,
            PathBuf::from("a.api.ts"),
            "missing import",
        ));
        scan.set_samples_checked(3);

        let mut manifest = ValidationReport::new();
        manifest.set_samples_checked(10);

        scan.merge(manifest);
        assert_eq!(scan.summary.total_samples, 13);
        assert_eq!(scan.summary.violations_by_severity.error, 1);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
        assert!(Severity::Error.is_blocking());
        assert!(!Severity::Warning.is_blocking());
    }

    #[test]
    fn test_registry_error_names_package_and_version() {
        let err = GuardError::registry("left-pad", "0.0.0-nonexistent", "lookup failed");
        let text = err.to_string();
        assert!(text.contains("left-pad"));
        assert!(text.contains("0.0.0-nonexistent"));
    }
}
