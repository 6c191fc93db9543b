//! Build Orchestrator.
//!
//! Runs the emitters in a fixed order and writes their output. Stages are
//! fail-fast: the first I/O or render error aborts the run with context
//! naming the stage. Partially written output is left in place.

use std::fs;
use std::io;

use anyhow::{bail, Context};
use tracing::{info, warn};

use super::writer::ArtifactWriter;
use super::{container, function, gateway, terraform};
use crate::annotations::Parser;
use crate::config::BuildConfig;
use crate::model::{service_groups, Handler, ParseError, ValidationError};
use crate::validator;

/// What a [`generate`] call produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Function packages written
    pub functions: usize,
    /// Container services written
    pub services: usize,
    pub gateway: bool,
    pub terraform: bool,
    /// Total files written
    pub files: usize,
}

/// Result of a full parse → validate → generate run.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub handlers: Vec<Handler>,
    pub parse_errors: Vec<ParseError>,
    pub diagnostics: Vec<ValidationError>,
    pub summary: GenerationSummary,
}

impl BuildReport {
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }
}

/// Generate every artifact for `handlers` under `config.output_dir`.
///
/// With `clean`, the output root is removed first. The root is always
/// (re)created, so an empty handler set still leaves an empty directory.
pub fn generate(config: &BuildConfig, handlers: &[Handler]) -> anyhow::Result<GenerationSummary> {
    let output = &config.output_dir;
    config.check_output_within_root()?;

    if config.clean {
        match fs::remove_dir_all(output) {
            Ok(()) => info!(output_dir = %output.display(), "Cleaned output directory"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to clean output directory {}", output.display()))
            }
        }
    }
    fs::create_dir_all(output)
        .with_context(|| format!("failed to create output directory {}", output.display()))?;

    let writer = ArtifactWriter::new(output);
    let mut summary = GenerationSummary::default();

    let function_count = handlers.iter().filter(|h| h.is_function()).count();
    if function_count > 0 {
        let artifacts = function::render_functions(handlers, config)?;
        summary.files += writer
            .write_all(&artifacts)
            .context("failed to write function packages")?;
        summary.functions = function_count;
        info!(count = function_count, "Generated cloud functions");
    }

    let groups = service_groups(handlers);
    if !groups.is_empty() {
        let artifacts = container::render_services(handlers, config)?;
        summary.files += writer
            .write_all(&artifacts)
            .context("failed to write container services")?;
        summary.services = groups.len();
        info!(count = groups.len(), "Generated container services");
    }

    if !handlers.is_empty() {
        let artifacts = gateway::render_gateway(handlers, config)
            .context("failed to generate API gateway configuration")?;
        summary.files += writer
            .write_all(&artifacts)
            .context("failed to write API gateway configuration")?;
        summary.gateway = true;

        let artifacts = terraform::render_terraform(handlers, config)
            .context("failed to generate terraform configuration")?;
        summary.files += writer
            .write_all(&artifacts)
            .context("failed to write terraform configuration")?;
        summary.terraform = true;
    }

    info!(
        output_dir = %output.display(),
        functions = summary.functions,
        services = summary.services,
        files = summary.files,
        "Generation complete"
    );
    Ok(summary)
}

/// Parse the handlers directory, validate, then generate.
///
/// Parse and validation diagnostics are logged and returned but do not stop
/// generation unless `config.strict` is set and an Error-severity diagnostic
/// exists.
pub fn run_build(config: &BuildConfig) -> anyhow::Result<BuildReport> {
    info!(handlers_dir = %config.handlers_dir.display(), "Parsing handlers");
    let parsed = Parser::new(&config.project_root)
        .parse_directory(&config.handlers_dir)
        .context("failed to parse handlers")?;

    for err in &parsed.errors {
        warn!(
            file = %err.file_path.display(),
            line = err.line,
            annotation = %err.annotation,
            "{}",
            err.message
        );
    }
    info!(
        handlers = parsed.handlers.len(),
        errors = parsed.errors.len(),
        "Parsed handlers"
    );
    if parsed.handlers.is_empty() {
        warn!(handlers_dir = %config.handlers_dir.display(), "No annotated handlers found");
    }

    let diagnostics = validator::validate_all(&parsed.handlers);
    validator::log_diagnostics(&diagnostics);

    if config.strict && validator::has_errors(&diagnostics) {
        let count = diagnostics.iter().filter(|d| d.is_error()).count();
        bail!("validation failed with {count} error(s); refusing to generate in strict mode");
    }

    let summary = generate(config, &parsed.handlers)?;

    Ok(BuildReport {
        handlers: parsed.handlers,
        parse_errors: parsed.errors,
        diagnostics,
        summary,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::model::{DeploymentTarget, HttpMethod};
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> BuildConfig {
        let mut config = BuildConfig::new("proj", "example.com/app");
        config.project_root = dir.path().to_path_buf();
        config.output_dir = dir.path().join("build");
        config
    }

    #[test]
    fn test_zero_handlers_creates_empty_root() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        let summary = generate(&config, &[]).unwrap();

        assert_eq!(summary, GenerationSummary::default());
        assert!(config.output_dir.is_dir());
        assert_eq!(fs::read_dir(&config.output_dir).unwrap().count(), 0);
    }

    #[test]
    fn test_clean_removes_stale_files() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        fs::create_dir_all(config.output_dir.join("functions/old")).unwrap();
        fs::write(config.output_dir.join("functions/old/main.go"), "stale").unwrap();

        config.clean = true;
        generate(&config, &[]).unwrap();

        assert!(!config.output_dir.join("functions/old").exists());
        assert!(config.output_dir.is_dir());
    }

    #[test]
    fn test_clean_missing_output_is_fine() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.clean = true;
        assert!(generate(&config, &[]).is_ok());
    }

    #[test]
    fn test_summary_counts() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let handlers = vec![
            Handler::new("A", "p")
                .with_target(DeploymentTarget::Function)
                .with_route(HttpMethod::Get, "/a"),
            Handler::new("B", "p")
                .with_target(DeploymentTarget::Container)
                .with_route(HttpMethod::Get, "/b"),
            Handler::new("C", "p")
                .with_target(DeploymentTarget::Container)
                .with_route(HttpMethod::Get, "/c"),
        ];

        let summary = generate(&config, &handlers).unwrap();

        assert_eq!(summary.functions, 1);
        assert_eq!(summary.services, 1);
        assert!(summary.gateway);
        assert!(summary.terraform);
        assert!(summary.files > 8);
    }

    #[test]
    fn test_output_blocked_by_file_fails() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        config.output_dir = blocker.join("build");

        let err = generate(&config, &[]).unwrap_err();
        assert!(format!("{err:#}").contains("failed to create output directory"));
    }
}
