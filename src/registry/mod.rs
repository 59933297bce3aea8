//! External package registry lookups
//!
//! Architecture: Anti-Corruption Layer - Registry wraps an external command interface
//! - The registry is an external collaborator; its only contract is
//!   `(name, optional version)` in, version string on stdout out
//! - Every lookup is a single bounded round-trip: a timeout is a failure,
//!   never retried (this is a fail-closed conformance gate, not a client)

use crate::domain::violations::{GuardError, GuardResult};
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// A package registry that can resolve versions for named packages
///
/// `resolve` with a version performs a single-version lookup; without one it
/// returns the latest published version. Implementations must be pure per
/// call: no caching, no shared mutable state between lookups.
pub trait Registry {
    fn resolve(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> impl Future<Output = GuardResult<String>> + Send;
}

/// Registry backed by the npm command-line interface
///
/// Shells out to `<program> view <name>[@version] version` and reads the
/// resolved version from stdout.
#[derive(Debug, Clone)]
pub struct NpmRegistry {
    program: String,
    timeout: Duration,
}

impl NpmRegistry {
    /// Create a registry client invoking the given program with a per-call timeout
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self { program: program.into(), timeout }
    }

    fn spec(name: &str, version: Option<&str>) -> String {
        match version {
            Some(v) => format!("{name}@{v}"),
            None => name.to_string(),
        }
    }
}

impl Default for NpmRegistry {
    fn default() -> Self {
        Self::new("npm", Duration::from_secs(10))
    }
}

impl Registry for NpmRegistry {
    async fn resolve(&self, name: &str, version: Option<&str>) -> GuardResult<String> {
        let spec = Self::spec(name, version);
        let declared = version.unwrap_or("latest");

        tracing::debug!("Registry lookup: {} view {} version", self.program, spec);

        let mut command = Command::new(&self.program);
        command
            .arg("view")
            .arg(&spec)
            .arg("version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                GuardError::registry(
                    name,
                    declared,
                    format!("registry lookup timed out after {}s", self.timeout.as_secs()),
                )
            })?
            .map_err(|e| {
                GuardError::registry(name, declared, format!("failed to invoke registry: {e}"))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GuardError::registry(
                name,
                declared,
                format!("registry lookup failed: {}", stderr.trim()),
            ));
        }

        let resolved = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if resolved.is_empty() {
            return Err(GuardError::registry(name, declared, "registry returned no version"));
        }

        Ok(resolved)
    }
}
