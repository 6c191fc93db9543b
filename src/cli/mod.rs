//! # CLI Module
//!
//! Command-line surface of the `box` binary.
//!
//! ## Commands
//!
//! ### `build`
//!
//! Parse handlers, validate them, and generate every artifact:
//!
//! ```bash
//! box build --project my-gcp-project
//! box build --handlers ./handlers --output ./build --project my-gcp-project \
//!     --region europe-west1 --env staging --clean
//! ```
//!
//! Diagnostics are logged and generation continues. `--strict` refuses to
//! generate when any error-severity diagnostic exists.
//!
//! ### `validate`
//!
//! Parse and validate only. Exits non-zero on any parse error or
//! error-severity diagnostic:
//!
//! ```bash
//! box validate --handlers ./handlers
//! ```
//!
//! ### `version`
//!
//! ```bash
//! box version
//! ```
//!
//! ## Configuration
//!
//! Flags override `box.toml` in the project root, which overrides built-in
//! defaults. See [`crate::config`].

mod commands;


pub use commands::{run_cli, Cli, Commands};
