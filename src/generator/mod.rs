//! # Generator Module
//!
//! Turns the parsed handler model into deployable artifacts.
//!
//! ## Architecture
//!
//! ```text
//! Handlers → Emitter (render_*) → Vec<Artifact> → ArtifactWriter → disk
//! ```
//!
//! Emitters are pure: they take handlers plus a [`BuildConfig`] and return
//! rendered [`Artifact`]s. Only [`ArtifactWriter`] touches the filesystem,
//! and only [`generate`] decides which emitters run.
//!
//! | emitter | input | output |
//! |---|---|---|
//! | [`function`] | `@box:function` handlers | `functions/<kebab-name>/` |
//! | [`container`] | `@box:container` handlers, grouped | `containers/<kebab-group>/` |
//! | [`gateway`] | every routed handler | `gateway/` |
//! | [`terraform`] | every handler | `terraform/` |
//!
//! ## Generated Structure
//!
//! ```text
//! build/
//! ├── functions/create-account/   main.go go.mod function.yaml deploy.sh
//! ├── containers/users/           main.go Dockerfile cloudbuild.yaml deploy.sh
//! ├── gateway/                    openapi.yaml gateway-config.yaml deploy.sh
//! └── terraform/                  main.tf variables.tf outputs.tf modules/ environments/
//! ```
//!
//! Templates live in `templates/` and are compiled in by askama.
//!
//! [`BuildConfig`]: crate::config::BuildConfig

pub mod container;
pub mod function;
pub mod gateway;
mod project;
mod templates;
pub mod terraform;
mod writer;

pub use project::*;
pub use writer::{Artifact, ArtifactWriter};

/// Output subdirectory for function packages.
pub const FUNCTIONS_DIR: &str = "functions";
/// Output subdirectory for container services.
pub const CONTAINERS_DIR: &str = "containers";
pub const GATEWAY_DIR: &str = "gateway";
pub const TERRAFORM_DIR: &str = "terraform";

/// Go import path for a handler package inside `module`.
pub(crate) fn import_path(module: &str, package_path: &str) -> String {
    if package_path.is_empty() || package_path == "." {
        module.to_string()
    } else {
        format!("{module}/{package_path}")
    }
}
