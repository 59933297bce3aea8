//! Convention scanner for API client modules
//!
//! CDD Principle: Domain Services - Scanner orchestrates the conformance workflow
//! - Coordinates module discovery, rule evaluation, and result aggregation
//! - Each file is an independent sample; one file's violations never abort the rest
//! - Directory or file I/O errors are fatal for the whole scan

pub mod rules;

use crate::config::ScannerConfig;
use crate::domain::violations::{GuardResult, ValidationReport, Violation};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

pub use rules::RuleSet;

/// A discovered client-module source file
///
/// Content is read once per check invocation and immutable thereafter.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
}

impl SourceFile {
    /// Read a source file from disk
    pub fn read<P: AsRef<Path>>(path: P) -> GuardResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Ok(Self { path: path.to_path_buf(), content })
    }
}

/// Options for customizing scan behavior
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Whether to check files in parallel
    pub parallel: bool,
    /// Stop after the first file with violations
    pub fail_fast: bool,
    /// Override for the configured sample cap
    pub sample_cap: Option<usize>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self { parallel: true, fail_fast: false, sample_cap: None }
    }
}

/// Scans a directory of client modules against the conformance rules
pub struct Scanner {
    config: ScannerConfig,
    rules: RuleSet,
}

impl Scanner {
    /// Create a scanner from configuration, compiling the rule set
    pub fn new(config: ScannerConfig) -> GuardResult<Self> {
        let rules = RuleSet::new(&config)?;
        Ok(Self { config, rules })
    }

    /// Access the compiled rule set
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Enumerate client-module files under a directory
    ///
    /// Keeps files whose name ends with the configured module suffix and
    /// whose name contains no test/spec marker. Results are sorted so the
    /// sample cap selects a stable prefix.
    pub fn discover<P: AsRef<Path>>(&self, dir: P) -> GuardResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        // Surface unreadable/missing directory as a fatal IO error
        let metadata = fs::metadata(dir)?;
        if !metadata.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("{} is not a directory", dir.display()),
            )
            .into());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir).follow_links(false) {
            let entry = entry.map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;
            let path = entry.path();
            if path.is_file() && self.is_client_module(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        tracing::debug!("Discovered {} client modules under {}", files.len(), dir.display());
        Ok(files)
    }

    /// Whether a path looks like a client module by naming convention
    pub fn is_client_module(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        name.ends_with(&self.config.module_suffix)
            && !self.config.test_markers.iter().any(|marker| name.contains(marker))
    }

    /// Check a single file against all rules
    pub fn check_file<P: AsRef<Path>>(&self, path: P) -> GuardResult<Vec<Violation>> {
        let file = SourceFile::read(path)?;
        Ok(self.rules.evaluate(&file.path, &file.content))
    }

    /// Scan the configured client directory
    pub fn scan(&self, options: &ScanOptions) -> GuardResult<ValidationReport> {
        self.scan_dir(self.config.client_dir.clone(), options)
    }

    /// Scan a directory of client modules and build a validation report
    pub fn scan_dir<P: AsRef<Path>>(
        &self,
        dir: P,
        options: &ScanOptions,
    ) -> GuardResult<ValidationReport> {
        let start_time = Instant::now();

        let mut files = self.discover(dir)?;
        let cap = options.sample_cap.unwrap_or(self.config.sample_cap);
        files.truncate(cap);

        let (violations, samples) = if options.fail_fast {
            self.check_fail_fast(&files)?
        } else if options.parallel && files.len() > 1 {
            (self.check_parallel(&files)?, files.len())
        } else {
            (self.check_sequential(&files)?, files.len())
        };

        let mut report = ValidationReport::new();
        for violation in violations {
            report.add_violation(violation);
        }
        report.set_samples_checked(samples);
        report.set_execution_time(start_time.elapsed().as_millis() as u64);
        report.sort_violations();

        Ok(report)
    }

    fn check_sequential(&self, files: &[PathBuf]) -> GuardResult<Vec<Violation>> {
        let mut all_violations = Vec::new();
        for path in files {
            all_violations.extend(self.check_file(path)?);
        }
        Ok(all_violations)
    }

    fn check_parallel(&self, files: &[PathBuf]) -> GuardResult<Vec<Violation>> {
        let per_file: Vec<Vec<Violation>> = files
            .par_iter()
            .map(|path| self.check_file(path))
            .collect::<GuardResult<Vec<_>>>()?;
        Ok(per_file.into_iter().flatten().collect())
    }

    /// Sequential scan that stops issuing samples after the first failing file
    fn check_fail_fast(&self, files: &[PathBuf]) -> GuardResult<(Vec<Violation>, usize)> {
        let mut all_violations = Vec::new();
        let mut samples = 0;
        for path in files {
            samples += 1;
            let violations = self.check_file(path)?;
            let failing = !violations.is_empty();
            all_violations.extend(violations);
            if failing {
                tracing::debug!("Fail-fast: stopping scan at {}", path.display());
                break;
            }
        }
        Ok((all_violations, samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::rules::{RULE_CENTRALIZED_IMPORT, RULE_CENTRALIZED_USAGE};
    use std::fs;
    use tempfile::TempDir;

    const CLEAN: &str = "import { apiClient } from '../services/apiClient';\n\
        export const getAll = async (): Promise<Employee[]> => \
        apiClient.get<Employee[]>('/employees');\n";

    const DIRTY: &str = "const res = await axios.get('/employees');\n";

    fn scanner() -> Scanner {
        Scanner::new(ScannerConfig::default()).unwrap()
    }

    #[test]
    fn test_discovery_filters_by_suffix_and_test_markers() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("employees.api.ts"), CLEAN).unwrap();
        fs::write(root.join("payroll.api.ts"), CLEAN).unwrap();
        fs::write(root.join("employees.api.test.ts"), "").unwrap();
        fs::write(root.join("payroll.spec.api.ts"), "").unwrap();
        fs::write(root.join("helpers.ts"), "").unwrap();

        let files = scanner().discover(root).unwrap();
        let names: Vec<_> =
            files.iter().map(|p| p.file_name().unwrap().to_str().unwrap()).collect();
        assert_eq!(names, vec!["employees.api.ts", "payroll.api.ts"]);
    }

    #[test]
    fn test_discovery_missing_directory_is_fatal() {
        let result = scanner().discover("/nonexistent/api/dir");
        assert!(matches!(result, Err(crate::domain::violations::GuardError::Io { .. })));
    }

    #[test]
    fn test_scan_reports_per_file_violations() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("clean.api.ts"), CLEAN).unwrap();
        fs::write(root.join("dirty.api.ts"), DIRTY).unwrap();

        let report = scanner().scan_dir(root, &ScanOptions::default()).unwrap();

        assert_eq!(report.summary.total_samples, 2);
        assert!(report.has_errors());
        // The dirty file fails, the clean one contributes nothing
        assert!(report.violations.iter().all(|v| v.file_path.ends_with("dirty.api.ts")));
        assert!(report.violations.iter().any(|v| v.rule_id == RULE_CENTRALIZED_IMPORT));
        assert!(report.violations.iter().any(|v| v.rule_id == RULE_CENTRALIZED_USAGE));
    }

    #[test]
    fn test_scan_sample_cap() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for i in 0..5 {
            fs::write(root.join(format!("module{i}.api.ts")), CLEAN).unwrap();
        }

        let options = ScanOptions { sample_cap: Some(3), ..Default::default() };
        let report = scanner().scan_dir(root, &options).unwrap();
        assert_eq!(report.summary.total_samples, 3);
    }

    #[test]
    fn test_fail_fast_stops_after_first_failing_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        // Sorted discovery order: a < b < c; b is the first failure
        fs::write(root.join("a.api.ts"), CLEAN).unwrap();
        fs::write(root.join("b.api.ts"), DIRTY).unwrap();
        fs::write(root.join("c.api.ts"), DIRTY).unwrap();

        let options = ScanOptions { fail_fast: true, ..Default::default() };
        let report = scanner().scan_dir(root, &options).unwrap();

        assert_eq!(report.summary.total_samples, 2);
        assert!(report.violations.iter().all(|v| v.file_path.ends_with("b.api.ts")));
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("a.api.ts"), DIRTY).unwrap();
        fs::write(root.join("b.api.ts"), CLEAN).unwrap();
        fs::write(root.join("c.api.ts"), DIRTY).unwrap();

        let parallel = scanner()
            .scan_dir(root, &ScanOptions { parallel: true, ..Default::default() })
            .unwrap();
        let sequential = scanner()
            .scan_dir(root, &ScanOptions { parallel: false, ..Default::default() })
            .unwrap();

        let ids = |r: &ValidationReport| {
            r.violations
                .iter()
                .map(|v| (v.file_path.clone(), v.rule_id.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&parallel), ids(&sequential));
    }

    #[test]
    fn test_rescan_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("dirty.api.ts"), DIRTY).unwrap();

        let s = scanner();
        let first = s.scan_dir(root, &ScanOptions::default()).unwrap();
        let second = s.scan_dir(root, &ScanOptions::default()).unwrap();

        assert_eq!(first.violations.len(), second.violations.len());
        assert_eq!(
            first.summary.violations_by_severity.error,
            second.summary.violations_by_severity.error
        );
    }
}
