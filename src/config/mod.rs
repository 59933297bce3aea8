//! Configuration loading and management for API Guardian
//!
//! Architecture: Anti-Corruption Layer - Configuration translates external YAML formats
//! - Raw YAML structures are converted to clean domain objects
//! - Default conventions are embedded in the domain, not infrastructure
//! - Configuration acts as a repository for scanner identifiers and manifest policy

use crate::domain::violations::{GuardError, GuardResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure for API Guardian
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Configuration format version
    pub version: String,
    /// Convention scanner configuration
    pub scanner: ScannerConfig,
    /// Manifest validator configuration
    pub manifest: ManifestConfig,
}

/// Convention scanner configuration: where the client modules live and
/// which identifiers the conventions are expressed in terms of
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Directory containing the API client modules
    #[serde(default = "default_client_dir")]
    pub client_dir: PathBuf,
    /// File-name suffix that marks a client module
    #[serde(default = "default_module_suffix")]
    pub module_suffix: String,
    /// File-name substrings that mark a file as a test/spec (excluded)
    #[serde(default = "default_test_markers")]
    pub test_markers: Vec<String>,
    /// Identifier of the centralized client wrapper
    #[serde(default = "default_client_ident")]
    pub client_ident: String,
    /// Identifier of the raw transport library
    #[serde(default = "default_transport_ident")]
    pub transport_ident: String,
    /// Accessor function returning the shared transport instance
    #[serde(default = "default_accessor_fn")]
    pub accessor_fn: String,
    /// Permitted relative module names for the centralized-client import
    #[serde(default = "default_import_modules")]
    pub import_modules: Vec<String>,
    /// HTTP verb method names the conventions apply to
    #[serde(default = "default_http_verbs")]
    pub http_verbs: Vec<String>,
    /// Maximum number of files checked per run
    #[serde(default = "default_file_sample_cap")]
    pub sample_cap: usize,
}

/// Manifest validator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Path to the dependency manifest
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,
    /// Registry lookup program invoked per entry
    #[serde(default = "default_registry_program")]
    pub registry_program: String,
    /// Hard timeout per registry lookup, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum number of manifest entries checked per run
    #[serde(default = "default_entry_sample_cap")]
    pub sample_cap: usize,
}

fn default_client_dir() -> PathBuf {
    PathBuf::from("src/api")
}

fn default_module_suffix() -> String {
    ".api.ts".to_string()
}

fn default_test_markers() -> Vec<String> {
    vec![".test.".to_string(), ".spec.".to_string()]
}

fn default_client_ident() -> String {
    "apiClient".to_string()
}

fn default_transport_ident() -> String {
    "axios".to_string()
}

fn default_accessor_fn() -> String {
    "getAxiosInstance".to_string()
}

fn default_import_modules() -> Vec<String> {
    vec!["./apiClient".to_string(), "../services/apiClient".to_string()]
}

fn default_http_verbs() -> Vec<String> {
    ["get", "post", "put", "patch", "delete"].iter().map(|v| v.to_string()).collect()
}

fn default_file_sample_cap() -> usize {
    20
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("package.json")
}

fn default_registry_program() -> String {
    "npm".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_entry_sample_cap() -> usize {
    100
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            client_dir: default_client_dir(),
            module_suffix: default_module_suffix(),
            test_markers: default_test_markers(),
            client_ident: default_client_ident(),
            transport_ident: default_transport_ident(),
            accessor_fn: default_accessor_fn(),
            import_modules: default_import_modules(),
            http_verbs: default_http_verbs(),
            sample_cap: default_file_sample_cap(),
        }
    }
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            manifest_path: default_manifest_path(),
            registry_program: default_registry_program(),
            timeout_secs: default_timeout_secs(),
            sample_cap: default_entry_sample_cap(),
        }
    }
}

impl GuardConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> GuardResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            GuardError::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            GuardError::config(format!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> GuardResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| GuardError::config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Get default configuration with the built-in conventions
    pub fn with_defaults() -> Self {
        Self {
            version: "1.0".to_string(),
            scanner: ScannerConfig::default(),
            manifest: ManifestConfig::default(),
        }
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> GuardResult<()> {
        if !["1.0"].contains(&self.version.as_str()) {
            return Err(GuardError::config(format!(
                "Unsupported configuration version: {}. Supported versions: 1.0",
                self.version
            )));
        }

        if self.scanner.module_suffix.is_empty() {
            return Err(GuardError::config("Scanner module suffix must not be empty"));
        }

        for ident in [
            &self.scanner.client_ident,
            &self.scanner.transport_ident,
            &self.scanner.accessor_fn,
        ] {
            if ident.is_empty() || !ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
            {
                return Err(GuardError::config(format!(
                    "Scanner identifier '{ident}' is not a valid identifier"
                )));
            }
        }

        if self.scanner.import_modules.is_empty() {
            return Err(GuardError::config("At least one permitted import module is required"));
        }

        if self.scanner.http_verbs.is_empty() {
            return Err(GuardError::config("At least one HTTP verb is required"));
        }

        if self.scanner.sample_cap == 0 || self.manifest.sample_cap == 0 {
            return Err(GuardError::config("Sample caps must be greater than zero"));
        }

        if self.manifest.timeout_secs == 0 {
            return Err(GuardError::config("Registry timeout must be greater than zero"));
        }

        Ok(())
    }

    /// Convert to JSON for serialization
    pub fn to_json(&self) -> GuardResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GuardError::config(format!("Failed to serialize config: {e}")))
    }

    /// Create a fingerprint of the configuration for reproducibility checks
    pub fn fingerprint(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();

        self.version.hash(&mut hasher);

        self.scanner.client_dir.hash(&mut hasher);
        self.scanner.module_suffix.hash(&mut hasher);
        self.scanner.test_markers.hash(&mut hasher);
        self.scanner.client_ident.hash(&mut hasher);
        self.scanner.transport_ident.hash(&mut hasher);
        self.scanner.accessor_fn.hash(&mut hasher);
        self.scanner.import_modules.hash(&mut hasher);
        self.scanner.http_verbs.hash(&mut hasher);
        self.scanner.sample_cap.hash(&mut hasher);

        self.manifest.manifest_path.hash(&mut hasher);
        self.manifest.registry_program.hash(&mut hasher);
        self.manifest.timeout_secs.hash(&mut hasher);
        self.manifest.sample_cap.hash(&mut hasher);

        format!("{:x}", hasher.finish())
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: GuardConfig,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self { config: GuardConfig::default() }
    }

    /// Set the client module directory
    pub fn client_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scanner.client_dir = dir.into();
        self
    }

    /// Set the client module file-name suffix
    pub fn module_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.scanner.module_suffix = suffix.into();
        self
    }

    /// Set the manifest path
    pub fn manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.manifest.manifest_path = path.into();
        self
    }

    /// Set the registry lookup program
    pub fn registry_program(mut self, program: impl Into<String>) -> Self {
        self.config.manifest.registry_program = program.into();
        self
    }

    /// Set the per-lookup registry timeout in seconds
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.manifest.timeout_secs = secs;
        self
    }

    /// Set the file sample cap
    pub fn file_sample_cap(mut self, cap: usize) -> Self {
        self.config.scanner.sample_cap = cap;
        self
    }

    /// Set the manifest entry sample cap
    pub fn entry_sample_cap(mut self, cap: usize) -> Self {
        self.config.manifest.sample_cap = cap;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> GuardResult<GuardConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GuardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scanner.module_suffix, ".api.ts");
        assert_eq!(config.scanner.sample_cap, 20);
        assert_eq!(config.manifest.sample_cap, 100);
        assert_eq!(config.manifest.timeout_secs, 10);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let config = GuardConfig::default();
        assert_eq!(config.fingerprint(), config.fingerprint());
    }

    #[test]
    fn test_fingerprint_tracks_changes() {
        let a = GuardConfig::default();
        let b = ConfigBuilder::new().module_suffix(".client.ts").build().unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_load_from_str() {
        let yaml = r#"
version: "1.0"
scanner:
  client_dir: "web/src/api"
  module_suffix: ".api.ts"
manifest:
  manifest_path: "web/package.json"
  timeout_secs: 5
"#;
        let config = GuardConfig::load_from_str(yaml).unwrap();
        assert_eq!(config.scanner.client_dir, PathBuf::from("web/src/api"));
        assert_eq!(config.manifest.timeout_secs, 5);
        // Omitted fields fall back to defaults
        assert_eq!(config.scanner.client_ident, "apiClient");
        assert_eq!(config.manifest.registry_program, "npm");
    }

    #[test]
    fn test_rejects_unknown_version() {
        let yaml = r#"
version: "2.0"
scanner: {}
manifest: {}
"#;
        assert!(GuardConfig::load_from_str(yaml).is_err());
    }

    #[test]
    fn test_rejects_bad_identifier() {
        let mut config = GuardConfig::default();
        config.scanner.client_ident = "api client".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut config = GuardConfig::default();
        config.manifest.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serialization_round_trip() {
        let config = GuardConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let rehydrated = GuardConfig::load_from_str(&yaml).unwrap();
        assert_eq!(config.fingerprint(), rehydrated.fingerprint());
    }
}
