//! API Guardian CLI - Command-line interface for convention conformance
//!
//! CDD Principle: Application Layer - CLI coordinates user interactions with domain services
//! - Translates user commands to domain operations
//! - Handles external concerns like file I/O, process exit codes, and terminal output
//! - Provides clean separation between user interface and business logic

use api_guardian::{
    ApiGuardian, CheckOptions, GuardConfig, GuardResult, OutputFormat, ReportOptions, ScanOptions,
    Severity, ValidateOptions,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;

/// API Guardian - Convention conformance for HTTP client modules
#[derive(Parser)]
#[command(name = "api-guardian")]
#[command(version = "0.1.0")]
#[command(about = "Checks API client modules and dependency manifests for convention conformance")]
#[command(
    long_about = "API Guardian scans HTTP API client modules for centralized-client conventions and validates dependency manifests against a package registry. Designed for CI/CD integration."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan client modules for convention violations
    Scan {
        /// Directory containing the client modules (defaults to the configured client dir)
        dir: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,

        /// Minimum severity level to report
        #[arg(short, long, value_enum)]
        severity: Option<SeverityArg>,

        /// Maximum number of violations to report
        #[arg(long)]
        max_violations: Option<usize>,

        /// Override the configured file sample cap
        #[arg(long)]
        sample_cap: Option<usize>,

        /// Disable parallel processing
        #[arg(long)]
        no_parallel: bool,

        /// Stop at the first file with violations
        #[arg(long)]
        fail_fast: bool,
    },

    /// Validate a dependency manifest against the registry
    Manifest {
        /// Manifest path (defaults to the configured manifest path)
        manifest: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,

        /// Minimum severity level to report
        #[arg(short, long, value_enum)]
        severity: Option<SeverityArg>,

        /// Override the configured entry sample cap
        #[arg(long)]
        sample_cap: Option<usize>,

        /// Stop at the first entry with violations
        #[arg(long)]
        fail_fast: bool,
    },

    /// Run both convention and manifest checks
    Check {
        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,

        /// Minimum severity level to report
        #[arg(short, long, value_enum)]
        severity: Option<SeverityArg>,

        /// Stop at the first failing sample
        #[arg(long)]
        fail_fast: bool,
    },

    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },

    /// Explain what a specific rule does
    Explain {
        /// Rule ID to explain
        rule_id: String,
    },

    /// List available rules
    Rules,
}

#[derive(Copy, Clone, ValueEnum, PartialEq)]
enum OutputFormatArg {
    Human,
    Json,
    Junit,
    Github,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Junit => OutputFormat::Junit,
            OutputFormatArg::Github => OutputFormat::GitHub,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum SeverityArg {
    Info,
    Warning,
    Error,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Info => Severity::Info,
            SeverityArg::Warning => Severity::Warning,
            SeverityArg::Error => Severity::Error,
        }
    }
}

/// Rule catalog shown by `rules` and `explain`
const RULE_CATALOG: &[(&str, &str, &str)] = &[
    (
        api_guardian::scanner::rules::RULE_CENTRALIZED_IMPORT,
        "error",
        "Client modules must import the centralized API client wrapper",
    ),
    (
        api_guardian::scanner::rules::RULE_CENTRALIZED_USAGE,
        "error",
        "HTTP verb calls must go through the centralized client",
    ),
    (
        api_guardian::scanner::rules::RULE_RAW_TRANSPORT_GATING,
        "error",
        "Raw transport calls require the shared-instance accessor in the same file",
    ),
    (
        api_guardian::scanner::rules::RULE_BLOB_ESCAPE_HATCH,
        "error",
        "Blob response downloads must use the shared-instance accessor",
    ),
    (
        api_guardian::scanner::rules::RULE_EMPTY_TYPE_ARGUMENT,
        "error",
        "Client calls must not pass empty generic type arguments",
    ),
    (
        api_guardian::scanner::rules::RULE_EMPTY_RESULT_ANNOTATION,
        "error",
        "Exported functions must not declare empty Promise result types",
    ),
    (
        api_guardian::manifest::RULE_PACKAGE_NAME_SHAPE,
        "error",
        "Dependency names must follow the package name grammar",
    ),
    (
        api_guardian::manifest::RULE_VERSION_SHAPE,
        "error",
        "Declared versions must be semver after prefix cleaning",
    ),
    (
        api_guardian::manifest::RULE_VERSION_FORBIDDEN_CHARS,
        "error",
        "Declared versions must not contain comparators or whitespace",
    ),
    (
        api_guardian::manifest::RULE_RANGE_PREFIX,
        "error",
        "Declared versions must carry at most one range prefix character",
    ),
    (
        api_guardian::manifest::RULE_EXACT_RESOLUTION,
        "error",
        "The declared version must exist exactly in the registry",
    ),
    (
        api_guardian::manifest::RULE_LATEST_RESOLUTION,
        "error",
        "Wildcard versions must resolve to a published semver release",
    ),
];

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = run_command(cli).await;

    match result {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    }
}

async fn run_command(cli: Cli) -> GuardResult<i32> {
    match cli.command {
        Commands::Scan { dir, format, severity, max_violations, sample_cap, no_parallel, fail_fast } => {
            run_scan(
                cli.config,
                dir,
                format,
                severity,
                max_violations,
                sample_cap,
                no_parallel,
                fail_fast,
                !cli.no_color,
            )
        }
        Commands::Manifest { manifest, format, severity, sample_cap, fail_fast } => {
            run_manifest(cli.config, manifest, format, severity, sample_cap, fail_fast, !cli.no_color)
                .await
        }
        Commands::Check { format, severity, fail_fast } => {
            run_check(cli.config, format, severity, fail_fast, !cli.no_color).await
        }
        Commands::ValidateConfig { config_file } => run_validate_config(config_file.or(cli.config)),
        Commands::Explain { rule_id } => run_explain(&rule_id),
        Commands::Rules => run_list_rules(),
    }
}

/// Load configuration from an explicit path, a conventional file name, or defaults
fn load_config(config_path: Option<PathBuf>) -> GuardResult<GuardConfig> {
    if let Some(config_path) = config_path {
        return GuardConfig::load_from_file(config_path);
    }

    let default_configs = ["api_guardian.yaml", "api_guardian.yml", ".api_guardian.yaml"];
    for config_name in &default_configs {
        if Path::new(config_name).exists() {
            return GuardConfig::load_from_file(config_name);
        }
    }

    Ok(GuardConfig::with_defaults())
}

fn build_guardian(
    config_path: Option<PathBuf>,
    severity: Option<SeverityArg>,
    max_violations: Option<usize>,
    use_colors: bool,
) -> GuardResult<ApiGuardian> {
    let config = load_config(config_path)?;
    let formatter = api_guardian::ReportFormatter::new(ReportOptions {
        use_colors,
        max_violations,
        min_severity: severity.map(|s| s.into()),
        ..Default::default()
    });
    Ok(ApiGuardian::new_with_config(config)?.with_report_formatter(formatter))
}

fn run_scan(
    config_path: Option<PathBuf>,
    dir: Option<PathBuf>,
    format: OutputFormatArg,
    severity: Option<SeverityArg>,
    max_violations: Option<usize>,
    sample_cap: Option<usize>,
    no_parallel: bool,
    fail_fast: bool,
    use_colors: bool,
) -> GuardResult<i32> {
    let guardian = build_guardian(config_path, severity, max_violations, use_colors)?;

    let options = ScanOptions { parallel: !no_parallel, fail_fast, sample_cap };
    let report = match dir {
        Some(dir) => guardian.check_conventions_in(dir, &options)?,
        None => guardian.check_conventions(&options)?,
    };

    let formatted = guardian.format_report(&report, format.into())?;
    println!("{}", formatted);

    Ok(if report.has_errors() { 1 } else { 0 })
}

async fn run_manifest(
    config_path: Option<PathBuf>,
    manifest: Option<PathBuf>,
    format: OutputFormatArg,
    severity: Option<SeverityArg>,
    sample_cap: Option<usize>,
    fail_fast: bool,
    use_colors: bool,
) -> GuardResult<i32> {
    let guardian = build_guardian(config_path, severity, None, use_colors)?;

    let options = ValidateOptions { fail_fast, sample_cap };
    let report = match manifest {
        Some(path) => guardian.check_manifest_at(path, &options).await?,
        None => guardian.check_manifest(&options).await?,
    };

    let formatted = guardian.format_report(&report, format.into())?;
    println!("{}", formatted);

    Ok(if report.has_errors() { 1 } else { 0 })
}

async fn run_check(
    config_path: Option<PathBuf>,
    format: OutputFormatArg,
    severity: Option<SeverityArg>,
    fail_fast: bool,
    use_colors: bool,
) -> GuardResult<i32> {
    let guardian = build_guardian(config_path, severity, None, use_colors)?;

    let options = CheckOptions { fail_fast, ..Default::default() };
    let report = guardian.check_all(&options).await?;

    let formatted = guardian.format_report(&report, format.into())?;
    println!("{}", formatted);

    Ok(if report.has_errors() { 1 } else { 0 })
}

fn run_validate_config(config_path: Option<PathBuf>) -> GuardResult<i32> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from("api_guardian.yaml"));

    println!("Validating configuration: {}", config_path.display());

    match GuardConfig::load_from_file(&config_path) {
        Ok(config) => {
            println!("Configuration is valid");
            println!("Configuration summary:");
            println!("  Client dir: {}", config.scanner.client_dir.display());
            println!("  Module suffix: {}", config.scanner.module_suffix);
            println!("  Client identifier: {}", config.scanner.client_ident);
            println!("  Manifest: {}", config.manifest.manifest_path.display());
            println!("  Registry program: {}", config.manifest.registry_program);
            println!("  Lookup timeout: {}s", config.manifest.timeout_secs);
            println!("  Fingerprint: {}", config.fingerprint());

            Ok(0)
        }
        Err(e) => {
            eprintln!("Configuration validation failed: {}", e);
            Ok(1)
        }
    }
}

fn run_explain(rule_id: &str) -> GuardResult<i32> {
    for (id, severity, description) in RULE_CATALOG {
        if *id == rule_id {
            println!("Rule: {}", id);
            println!("Severity: {}", severity);
            println!();
            println!("Description:");
            println!("   {}", description);
            return Ok(0);
        }
    }

    eprintln!("Rule '{}' not found", rule_id);
    println!();
    println!("Available rules:");
    for (id, _, _) in RULE_CATALOG {
        println!("  - {}", id);
    }

    Ok(1)
}

fn run_list_rules() -> GuardResult<i32> {
    println!("Available Rules\n");

    for (id, severity, description) in RULE_CATALOG {
        println!("  {} [{}] - {}", id, severity, description);
    }

    Ok(0)
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_command() {
        let temp_dir = TempDir::new().unwrap();
        let test_file = temp_dir.path().join("employees.api.ts");

        fs::write(&test_file, "import axios from 'axios';\nexport const f = () => axios.get('/x');")
            .unwrap();

        let result = run_scan(
            None,
            Some(temp_dir.path().to_path_buf()),
            OutputFormatArg::Json,
            None,
            None,
            None,
            false,
            false,
            false,
        );

        // Should find violations (exit code 1)
        assert_eq!(result.unwrap(), 1);
    }

    #[test]
    fn test_validate_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("test_config.yaml");

        let config = GuardConfig::with_defaults();
        let yaml = serde_yaml::to_string(&config).unwrap();
        fs::write(&config_file, yaml).unwrap();

        let result = run_validate_config(Some(config_file));
        assert_eq!(result.unwrap(), 0);
    }

    #[test]
    fn test_explain_rule() {
        let result = run_explain("centralized-import");
        assert_eq!(result.unwrap(), 0);

        let result = run_explain("nonexistent-rule");
        assert_eq!(result.unwrap(), 1);
    }

    #[test]
    fn test_list_rules() {
        let result = run_list_rules();
        assert_eq!(result.unwrap(), 0);
    }
}
