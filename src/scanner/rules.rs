//! Conformance rules for API client modules
//!
//! Architectural Principle: Service Layer - RuleSet orchestrates pattern evaluation
//! - All rules are lexical pattern matches over file content; no syntax tree is built
//! - Rules value precision-by-convention over full static analysis, trading false
//!   negatives for simplicity and zero build-time cost
//! - Rule results are translated to domain violations at the boundary

use crate::config::ScannerConfig;
use crate::domain::violations::{GuardError, GuardResult, Severity, Violation};
use regex::Regex;
use std::path::Path;

/// Rule identifiers, stable across runs for reporting and filtering
pub const RULE_CENTRALIZED_IMPORT: &str = "centralized-import";
pub const RULE_CENTRALIZED_USAGE: &str = "centralized-usage";
pub const RULE_RAW_TRANSPORT_GATING: &str = "raw-transport-gating";
pub const RULE_BLOB_ESCAPE_HATCH: &str = "blob-escape-hatch";
pub const RULE_EMPTY_TYPE_ARGUMENT: &str = "empty-type-argument";
pub const RULE_EMPTY_RESULT_ANNOTATION: &str = "empty-result-annotation";

/// Compiled conformance rules for one scanner configuration
///
/// All patterns are compiled once; evaluation is a pure function of file
/// content, so re-running over an unchanged file yields identical results.
#[derive(Debug)]
pub struct RuleSet {
    /// Import statement binding the client identifier from a permitted module
    import_re: Regex,
    /// HTTP-verb call on any receiver
    any_verb_re: Regex,
    /// HTTP-verb call on the centralized client
    client_verb_re: Regex,
    /// HTTP-verb call directly on the raw transport
    transport_verb_re: Regex,
    /// Call to the accessor returning the shared transport instance
    accessor_re: Regex,
    /// Blob response-type declaration
    blob_re: Regex,
    /// Centralized-client verb call with an empty type argument list
    empty_type_args_re: Regex,
    /// Result-wrapper return annotation with an empty inner type
    empty_result_re: Regex,
}

impl RuleSet {
    /// Compile the rule set from scanner configuration
    pub fn new(config: &ScannerConfig) -> GuardResult<Self> {
        let client = regex::escape(&config.client_ident);
        let transport = regex::escape(&config.transport_ident);
        let accessor = regex::escape(&config.accessor_fn);
        let verbs = config
            .http_verbs
            .iter()
            .map(|v| regex::escape(v))
            .collect::<Vec<_>>()
            .join("|");
        let modules = config
            .import_modules
            .iter()
            .map(|m| regex::escape(m))
            .collect::<Vec<_>>()
            .join("|");

        // Both named-brace and default-import forms bind the client identifier
        let import = format!(
            r#"import\s+(?:\{{[^}}]*\b{client}\b[^}}]*\}}|{client})\s+from\s+['"](?:{modules})['"]"#
        );

        Ok(Self {
            import_re: compile(&import)?,
            any_verb_re: compile(&format!(r"\.(?:{verbs})\s*[<(]"))?,
            client_verb_re: compile(&format!(r"\b{client}\.(?:{verbs})\s*[<(]"))?,
            transport_verb_re: compile(&format!(r"\b{transport}\.(?:{verbs})\s*[<(]"))?,
            accessor_re: compile(&format!(r"\b{accessor}\s*\("))?,
            blob_re: compile(r#"responseType\s*:\s*['"]blob['"]"#)?,
            empty_type_args_re: compile(&format!(r"\b{client}\.(?:{verbs})\s*<\s*>"))?,
            empty_result_re: compile(r":\s*Promise\s*<\s*>")?,
        })
    }

    /// Whether the file imports the centralized client from a permitted module
    pub fn has_centralized_import(&self, content: &str) -> bool {
        self.import_re.is_match(content)
    }

    /// Whether every HTTP-verb usage in the file is reachable through the
    /// centralized client or the accessor function
    ///
    /// Co-occurrence is checked at file level, not per call site. A raw
    /// transport call anywhere in the file passes as long as the accessor
    /// call also appears somewhere in the same file. This coarseness is a
    /// documented property of the convention, not an oversight.
    pub fn uses_centralized_client(&self, content: &str) -> bool {
        if !self.any_verb_re.is_match(content) {
            return true;
        }
        if !self.client_verb_re.is_match(content) && !self.accessor_re.is_match(content) {
            return false;
        }
        if self.transport_verb_re.is_match(content) && !self.accessor_re.is_match(content) {
            return false;
        }
        true
    }

    /// Whether every blob response declaration is accompanied by the accessor
    /// call (the one sanctioned escape hatch for non-JSON binary responses)
    pub fn blob_responses_gated(&self, content: &str) -> bool {
        !self.blob_re.is_match(content) || self.accessor_re.is_match(content)
    }

    /// Evaluate all rules against a file's content
    pub fn evaluate(&self, file_path: &Path, content: &str) -> Vec<Violation> {
        let mut violations = Vec::new();

        if !self.has_centralized_import(content) {
            tracing::debug!("{}: missing centralized import", file_path.display());
            violations.push(
                Violation::new(
                    RULE_CENTRALIZED_IMPORT,
                    Severity::Error,
                    file_path.to_path_buf(),
                    "Module does not import the centralized API client",
                )
                .with_position(1, 1)
                .with_suggestion("Import the shared client from its services module"),
            );
        }

        if self.any_verb_re.is_match(content) {
            if !self.client_verb_re.is_match(content) && !self.accessor_re.is_match(content) {
                let (line, col, context) = first_match_location(&self.any_verb_re, content);
                violations.push(
                    Violation::new(
                        RULE_CENTRALIZED_USAGE,
                        Severity::Error,
                        file_path.to_path_buf(),
                        "HTTP verb call does not go through the centralized client",
                    )
                    .with_position(line, col)
                    .with_context(context)
                    .with_suggestion("Route the request through the centralized client wrapper"),
                );
            }

            if self.transport_verb_re.is_match(content) && !self.accessor_re.is_match(content) {
                let (line, col, context) = first_match_location(&self.transport_verb_re, content);
                violations.push(
                    Violation::new(
                        RULE_RAW_TRANSPORT_GATING,
                        Severity::Error,
                        file_path.to_path_buf(),
                        "Raw transport call is not gated by the shared-instance accessor",
                    )
                    .with_position(line, col)
                    .with_context(context)
                    .with_suggestion("Obtain the transport through the shared-instance accessor"),
                );
            }
        }

        if !self.blob_responses_gated(content) {
            let (line, col, context) = first_match_location(&self.blob_re, content);
            violations.push(
                Violation::new(
                    RULE_BLOB_ESCAPE_HATCH,
                    Severity::Error,
                    file_path.to_path_buf(),
                    "Blob response declared without the sanctioned escape-hatch accessor",
                )
                .with_position(line, col)
                .with_context(context)
                .with_suggestion("Fetch binary responses through the shared-instance accessor"),
            );
        }

        for m in self.empty_type_args_re.find_iter(content) {
            let (line, col, context) = match_location(content, m.start());
            violations.push(
                Violation::new(
                    RULE_EMPTY_TYPE_ARGUMENT,
                    Severity::Error,
                    file_path.to_path_buf(),
                    format!("Client call '{}' has an empty type argument list", m.as_str().trim()),
                )
                .with_position(line, col)
                .with_context(context)
                .with_suggestion("Name the response type in the call's type argument"),
            );
        }

        for m in self.empty_result_re.find_iter(content) {
            let (line, col, context) = match_location(content, m.start());
            violations.push(
                Violation::new(
                    RULE_EMPTY_RESULT_ANNOTATION,
                    Severity::Error,
                    file_path.to_path_buf(),
                    "Result-wrapper return annotation has an empty inner type",
                )
                .with_position(line, col)
                .with_context(context)
                .with_suggestion("Name the resolved type inside the Promise annotation"),
            );
        }

        violations
    }
}

fn compile(pattern: &str) -> GuardResult<Regex> {
    Regex::new(pattern)
        .map_err(|e| GuardError::pattern(format!("Invalid rule pattern '{pattern}': {e}")))
}

/// Line, column, and trimmed context line for the first match of a pattern
fn first_match_location(re: &Regex, content: &str) -> (u32, u32, String) {
    match re.find(content) {
        Some(m) => match_location(content, m.start()),
        None => (1, 1, String::new()),
    }
}

/// Convert a byte offset to a 1-indexed line/column plus the containing line
fn match_location(content: &str, byte_offset: usize) -> (u32, u32, String) {
    let mut line = 1;
    let mut col = 1;
    let mut line_start = 0;

    for (i, ch) in content.char_indices() {
        if i >= byte_offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
            line_start = i + 1;
        } else {
            col += 1;
        }
    }

    let line_end =
        content[line_start..].find('\n').map(|pos| line_start + pos).unwrap_or(content.len());

    let context = content[line_start..line_end].trim().to_string();

    (line, col, context)
}
