use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::warn;

use crate::annotations::Parser as AnnotationParser;
use crate::config::{BuildConfig, ConfigOverrides, DEFAULT_HANDLERS_DIR};
use crate::generator::run_build;
use crate::model::ParseError;
use crate::validator;

/// Command-line interface for box
///
/// Generates Cloud Functions, Cloud Run services, API Gateway and Terraform
/// configuration from `@box:` annotations on Go handlers.
#[derive(Parser)]
#[command(name = "box")]
#[command(about = "Annotation-driven deployment generator", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Parse, validate and generate deployment artifacts
    Build {
        /// Directory scanned for annotated Go handlers (default: ./handlers)
        #[arg(long)]
        handlers: Option<PathBuf>,

        /// Output directory for generated artifacts (default: ./build)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// GCP project ID
        #[arg(short, long, env = "BOX_PROJECT")]
        project: Option<String>,

        /// GCP region (default: us-central1)
        #[arg(long)]
        region: Option<String>,

        /// Environment name (default: dev)
        #[arg(long = "env")]
        environment: Option<String>,

        /// Go module path; detected from go.mod when omitted
        #[arg(long)]
        module: Option<String>,

        /// Config file (default: <project-root>/box.toml if present)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Go module root; package import paths are relative to it
        #[arg(long)]
        project_root: Option<PathBuf>,

        /// Remove the output directory before generating
        #[arg(long, default_value_t = false)]
        clean: bool,

        /// Refuse to generate when validation reports errors
        #[arg(long, default_value_t = false)]
        strict: bool,

        /// Debug-level logging
        #[arg(short, long, default_value_t = false)]
        verbose: bool,
    },
    /// Parse and validate handlers without generating anything
    Validate {
        /// Directory scanned for annotated Go handlers
        #[arg(long, default_value = DEFAULT_HANDLERS_DIR)]
        handlers: PathBuf,

        /// Go module root; package import paths are relative to it
        #[arg(long)]
        project_root: Option<PathBuf>,

        /// Debug-level logging
        #[arg(short, long, default_value_t = false)]
        verbose: bool,
    },
    /// Print version information
    Version,
}

impl Cli {
    /// Whether the selected command asked for debug logging.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Commands::Build { verbose, .. } | Commands::Validate { verbose, .. } => *verbose,
            Commands::Version => false,
        }
    }
}

/// Execute a parsed command.
pub fn run_cli(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Build {
            handlers,
            output,
            project,
            region,
            environment,
            module,
            config,
            project_root,
            clean,
            strict,
            verbose,
        } => {
            let config = BuildConfig::resolve(ConfigOverrides {
                project_root,
                config_file: config,
                handlers_dir: handlers,
                output_dir: output,
                project_id: project,
                region,
                environment,
                module_name: module,
                clean,
                strict,
                verbose,
            })?;

            let report = run_build(&config)?;
            let summary = &report.summary;

            if report.error_count() > 0 {
                warn!(
                    errors = report.error_count(),
                    "Generated despite validation errors; run `box validate` for details"
                );
            }
            println!(
                "✅ Generated {} function(s), {} container service(s), {} file(s) in {}",
                summary.functions,
                summary.services,
                summary.files,
                config.output_dir.display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate {
            handlers,
            project_root,
            verbose: _,
        } => {
            let parser = AnnotationParser::new(project_root.unwrap_or_else(|| PathBuf::from(".")));
            let parsed = parser.parse_directory(&handlers)?;

            print_parse_errors(&parsed.errors);
            let diagnostics = validator::validate_all(&parsed.handlers);
            validator::print_diagnostics(&diagnostics);
            println!("Checked {} handler(s)", parsed.handlers.len());

            if !parsed.errors.is_empty() || validator::has_errors(&diagnostics) {
                Ok(ExitCode::FAILURE)
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        Commands::Version => {
            println!("box {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_parse_errors(errors: &[ParseError]) {
    if errors.is_empty() {
        return;
    }
    println!("\n❌ Parse errors:");
    for e in errors {
        println!("   {}:{}", e.file_path.display(), e.line);
        println!("      {}", e.message);
        if !e.annotation.is_empty() {
            println!("      {}", e.annotation);
        }
    }
    println!();
}
