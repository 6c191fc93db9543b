//! # box-build
//!
//! Annotation-driven generator for hybrid serverless/container deployments.
//!
//! Go handlers declare how they are deployed with `@box:` comments. This
//! crate scans those comments and emits Cloud Functions packages, Cloud Run
//! services, an API Gateway OpenAPI document and Terraform configuration.
//!
//! ## Pipeline
//!
//! ```text
//! handlers/*.go → annotations::Parser → Vec<Handler>
//!                                         │
//!                              validator::validate_all → diagnostics
//!                                         │
//!                              generator::generate → build/{functions,containers,gateway,terraform}
//! ```
//!
//! - **[`model`]** - handler model shared by every stage
//! - **[`annotations`]** - comment scanner and typed handler builder
//! - **[`validator`]** - severity-tagged semantic checks
//! - **[`generator`]** - the four emitters and the build orchestrator
//! - **[`config`]** - build configuration and `box.toml`
//! - **[`cli`]** - the `box` command
//! - **[`otel`]** - logging setup
//!
//! ## Example
//!
//! ```rust,no_run
//! use box_build::config::BuildConfig;
//! use box_build::generator::run_build;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = BuildConfig::new("my-gcp-project", "github.com/acme/api");
//! let report = run_build(&config)?;
//! println!("{} handlers", report.handlers.len());
//! # Ok(())
//! # }
//! ```

pub mod annotations;
pub mod cli;
pub mod config;
pub mod generator;
pub mod model;
pub mod otel;
pub mod validator;
