//! Dependency manifest parsing and validation
//!
//! CDD Principle: Domain Services - ManifestValidator orchestrates per-entry checks
//! - Parses the manifest into production and development dependency sections
//! - Shape rules are pure lexical predicates over name/version strings
//! - Registry lookups are per-sample: one failing entry never masks the rest

use crate::domain::violations::{GuardError, GuardResult, Severity, ValidationReport, Violation};
use crate::registry::Registry;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub const RULE_PACKAGE_NAME_SHAPE: &str = "package-name-shape";
pub const RULE_VERSION_SHAPE: &str = "version-shape";
pub const RULE_VERSION_FORBIDDEN_CHARS: &str = "version-forbidden-characters";
pub const RULE_RANGE_PREFIX: &str = "version-range-prefix";
pub const RULE_EXACT_RESOLUTION: &str = "registry-exact-resolution";
pub const RULE_LATEST_RESOLUTION: &str = "registry-latest-resolution";

/// Manifest section a dependency was declared in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Production,
    Development,
}

impl Section {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Production => "dependencies",
            Self::Development => "devDependencies",
        }
    }
}

/// A single declared dependency: package name plus raw version-range string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEntry {
    pub name: String,
    pub raw_version: String,
    pub section: Section,
}

impl DependencyEntry {
    /// Declared version with any single leading range indicator stripped
    pub fn cleaned_version(&self) -> &str {
        clean_version(&self.raw_version)
    }

    /// Whether the entry pins no specific version (checked via latest lookup)
    pub fn is_wildcard(&self) -> bool {
        matches!(self.raw_version.as_str(), "*" | "latest")
    }
}

/// Strip exactly one leading `^` or `~` range indicator, if present
pub fn clean_version(raw: &str) -> &str {
    raw.strip_prefix(['^', '~']).unwrap_or(raw)
}

/// Wire format of the manifest file
#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, String>,
}

/// A parsed dependency manifest, partitioned into production and development sections
#[derive(Debug, Clone)]
pub struct Manifest {
    pub path: PathBuf,
    pub production: BTreeMap<String, String>,
    pub development: BTreeMap<String, String>,
}

impl Manifest {
    /// Load and parse a manifest file; missing or malformed files are fatal
    pub fn load<P: AsRef<Path>>(path: P) -> GuardResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            GuardError::manifest(path.display().to_string(), format!("failed to read: {e}"))
        })?;

        Self::parse(path, &contents)
    }

    /// Parse manifest content (split out for testing)
    pub fn parse(path: &Path, contents: &str) -> GuardResult<Self> {
        let raw: RawManifest = serde_json::from_str(contents).map_err(|e| {
            GuardError::manifest(path.display().to_string(), format!("failed to parse: {e}"))
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            production: raw.dependencies,
            development: raw.dev_dependencies,
        })
    }

    /// All declared entries, production first, each section in name order
    pub fn entries(&self) -> Vec<DependencyEntry> {
        let section = |map: &BTreeMap<String, String>, section: Section| {
            map.iter()
                .map(|(name, raw_version)| DependencyEntry {
                    name: name.clone(),
                    raw_version: raw_version.clone(),
                    section,
                })
                .collect::<Vec<_>>()
        };

        let mut entries = section(&self.production, Section::Production);
        entries.extend(section(&self.development, Section::Development));
        entries
    }
}

/// Compiled shape rules for package names and version strings
#[derive(Debug)]
pub struct ShapeRules {
    name_re: Regex,
    semver_re: Regex,
}

impl ShapeRules {
    pub fn new() -> GuardResult<Self> {
        Ok(Self {
            // Registry naming grammar, plain or scoped (@scope/name)
            name_re: compile(r"^(?:@[a-z0-9][a-z0-9\-_.]*/)?[a-z0-9\-_.]+$")?,
            // major.minor.patch with optional pre-release/build suffix
            semver_re: compile(r"^\d+\.\d+\.\d+(?:-[0-9A-Za-z.\-]+)?(?:\+[0-9A-Za-z.\-]+)?$")?,
        })
    }

    /// Whether a cleaned version string has semantic-version shape
    pub fn is_semver(&self, version: &str) -> bool {
        self.semver_re.is_match(version)
    }

    /// Check one entry's name and version grammar
    pub fn validate(&self, entry: &DependencyEntry, manifest_path: &Path) -> Vec<Violation> {
        let mut violations = Vec::new();
        let context = format!("{}: \"{}\": \"{}\"", entry.section.as_str(), entry.name, entry.raw_version);

        if !self.name_re.is_match(&entry.name) {
            violations.push(
                Violation::new(
                    RULE_PACKAGE_NAME_SHAPE,
                    Severity::Error,
                    manifest_path.to_path_buf(),
                    format!("Package name '{}' violates the registry naming grammar", entry.name),
                )
                .with_context(context.clone()),
            );
        }

        let raw = entry.raw_version.as_str();

        if raw.contains(['<', '>', '=']) || raw.contains(char::is_whitespace) {
            violations.push(
                Violation::new(
                    RULE_VERSION_FORBIDDEN_CHARS,
                    Severity::Error,
                    manifest_path.to_path_buf(),
                    format!(
                        "Version '{}' for '{}' contains comparison operators or whitespace",
                        raw, entry.name
                    ),
                )
                .with_context(context.clone()),
            );
            return violations;
        }

        if entry.is_wildcard() {
            return violations;
        }

        // A single ^ or ~ is the only permitted range indicator
        if raw.starts_with(['^', '~']) && raw[1..].starts_with(['^', '~']) {
            violations.push(
                Violation::new(
                    RULE_RANGE_PREFIX,
                    Severity::Error,
                    manifest_path.to_path_buf(),
                    format!("Version '{}' for '{}' stacks range indicators", raw, entry.name),
                )
                .with_context(context.clone()),
            );
            return violations;
        }

        let cleaned = entry.cleaned_version();
        if !self.is_semver(cleaned) {
            violations.push(
                Violation::new(
                    RULE_VERSION_SHAPE,
                    Severity::Error,
                    manifest_path.to_path_buf(),
                    format!(
                        "Version '{}' for '{}' is not a semantic version",
                        cleaned, entry.name
                    ),
                )
                .with_context(context),
            );
        }

        violations
    }
}

fn compile(pattern: &str) -> GuardResult<Regex> {
    Regex::new(pattern)
        .map_err(|e| GuardError::pattern(format!("Invalid shape pattern '{pattern}': {e}")))
}

/// Options for customizing manifest validation
#[derive(Debug, Clone, Default)]
pub struct ValidateOptions {
    /// Stop after the first entry with violations
    pub fail_fast: bool,
    /// Override for the configured entry sample cap
    pub sample_cap: Option<usize>,
}

/// Validates manifest entries against shape rules and a package registry
pub struct ManifestValidator<R: Registry> {
    registry: R,
    shapes: ShapeRules,
    /// Maximum entries checked per run
    sample_cap: usize,
}

impl<R: Registry> ManifestValidator<R> {
    pub fn new(registry: R, sample_cap: usize) -> GuardResult<Self> {
        Ok(Self { registry, shapes: ShapeRules::new()?, sample_cap })
    }

    /// Validate every sampled entry of a parsed manifest
    ///
    /// Shape violations and registry failures are reported per entry; only
    /// manifest-level problems (handled in `Manifest::load`) are fatal.
    pub async fn validate(
        &self,
        manifest: &Manifest,
        options: &ValidateOptions,
    ) -> GuardResult<ValidationReport> {
        let start_time = Instant::now();
        let mut report = ValidationReport::new();

        let mut entries = manifest.entries();
        let cap = options.sample_cap.unwrap_or(self.sample_cap);
        entries.truncate(cap);

        let mut samples = 0;
        for entry in &entries {
            samples += 1;
            let violations = self.check_entry(entry, &manifest.path).await;
            let failing = !violations.is_empty();
            for violation in violations {
                report.add_violation(violation);
            }
            if failing && options.fail_fast {
                tracing::debug!("Fail-fast: stopping manifest check at '{}'", entry.name);
                break;
            }
        }

        report.set_samples_checked(samples);
        report.set_execution_time(start_time.elapsed().as_millis() as u64);
        report.sort_violations();

        Ok(report)
    }

    /// Check one dependency entry: shape first, then registry resolution
    ///
    /// Entries with malformed versions skip the registry call; the lookup
    /// could only echo the malformation back.
    pub async fn check_entry(&self, entry: &DependencyEntry, manifest_path: &Path) -> Vec<Violation> {
        let mut violations = self.shapes.validate(entry, manifest_path);
        if !violations.is_empty() {
            return violations;
        }

        if entry.is_wildcard() {
            match self.registry.resolve(&entry.name, None).await {
                Ok(resolved) if self.shapes.is_semver(&resolved) => {}
                Ok(resolved) => violations.push(
                    Violation::new(
                        RULE_LATEST_RESOLUTION,
                        Severity::Error,
                        manifest_path.to_path_buf(),
                        format!(
                            "Latest lookup for '{}' returned non-semver '{}'",
                            entry.name, resolved
                        ),
                    )
                    .with_context(format!("{}: {}", entry.name, entry.raw_version)),
                ),
                Err(e) => violations.push(
                    Violation::new(
                        RULE_LATEST_RESOLUTION,
                        Severity::Error,
                        manifest_path.to_path_buf(),
                        format!("Latest lookup for '{}' failed: {e}", entry.name),
                    )
                    .with_context(format!("{}: {}", entry.name, entry.raw_version)),
                ),
            }
            return violations;
        }

        let cleaned = entry.cleaned_version();
        match self.registry.resolve(&entry.name, Some(cleaned)).await {
            // No implicit range resolution: the exact version must exist
            Ok(resolved) if resolved == cleaned => {}
            Ok(resolved) => violations.push(
                Violation::new(
                    RULE_EXACT_RESOLUTION,
                    Severity::Error,
                    manifest_path.to_path_buf(),
                    format!(
                        "Lookup of '{}@{}' resolved to '{}' instead of the declared version",
                        entry.name, cleaned, resolved
                    ),
                )
                .with_context(format!("{}: {}", entry.name, entry.raw_version)),
            ),
            Err(e) => violations.push(
                Violation::new(
                    RULE_EXACT_RESOLUTION,
                    Severity::Error,
                    manifest_path.to_path_buf(),
                    format!("Lookup of '{}@{}' failed: {e}", entry.name, cleaned),
                )
                .with_context(format!("{}: {}", entry.name, entry.raw_version)),
            ),
        }

        violations
    }
}
