//! Function emitter: one self-contained Cloud Functions package per
//! `@box:function` handler.

use std::path::PathBuf;

use anyhow::Context;
use askama::Template;

use super::templates::{
    FunctionDeployTemplate, FunctionMainTemplate, FunctionYamlTemplate, GoModTemplate,
};
use super::writer::Artifact;
use super::{import_path, FUNCTIONS_DIR};
use crate::config::BuildConfig;
use crate::model::{to_kebab_case, Handler};

/// Memory string in the unit the functions platform expects, e.g. `512Mi`.
pub fn function_memory(handler: &Handler, config: &BuildConfig) -> String {
    let mb = handler
        .memory_mb()
        .unwrap_or(config.defaults.default_memory_mb);
    format!("{mb}Mi")
}

pub fn function_timeout_secs(handler: &Handler, config: &BuildConfig) -> u64 {
    handler
        .timeout_secs()
        .unwrap_or(config.defaults.default_timeout_secs)
}

/// Directory of a function package relative to the output root.
pub fn function_dir(handler: &Handler) -> PathBuf {
    PathBuf::from(FUNCTIONS_DIR).join(to_kebab_case(&handler.function_name))
}

/// Render the four files of one function package.
pub fn render_function(handler: &Handler, config: &BuildConfig) -> anyhow::Result<Vec<Artifact>> {
    let name = to_kebab_case(&handler.function_name);
    let dir = function_dir(handler);
    let memory = function_memory(handler, config);
    let timeout_secs = function_timeout_secs(handler, config);
    let defaults = &config.defaults;

    let main_go = FunctionMainTemplate {
        import_path: import_path(&config.module_name, &handler.package_path),
        function_name: handler.function_name.clone(),
        package_name: handler.package_name.clone(),
        port: defaults.container_port,
    }
    .render()
    .context("failed to render function main.go")?;

    let output = config.output_from_root();
    let (module_path, root_path) = if output == "." {
        (
            format!("{}/{FUNCTIONS_DIR}/{name}", config.module_name),
            "../..".to_string(),
        )
    } else {
        (
            format!("{}/{output}/{FUNCTIONS_DIR}/{name}", config.module_name),
            format!("{}/../..", config.root_from_output()),
        )
    };
    let go_mod = GoModTemplate {
        module_path,
        module_name: config.module_name.clone(),
        root_path,
    }
    .render()
    .context("failed to render function go.mod")?;

    let function_yaml = FunctionYamlTemplate {
        entry_point: handler.function_name.clone(),
        name: name.clone(),
        runtime: defaults.go_runtime.clone(),
        region: config.region.clone(),
        memory: memory.clone(),
        timeout_secs,
        max_instances: defaults.max_instances,
        environment: config.environment.clone(),
    }
    .render()
    .context("failed to render function.yaml")?;

    let deploy = FunctionDeployTemplate {
        name,
        region: config.region.clone(),
        entry_point: handler.function_name.clone(),
        project_id: config.project_id.clone(),
        runtime: defaults.go_runtime.clone(),
        memory,
        timeout_secs,
        max_instances: defaults.max_instances,
        environment: config.environment.clone(),
    }
    .render()
    .context("failed to render function deploy.sh")?;

    Ok(vec![
        Artifact::new(dir.join("main.go"), main_go),
        Artifact::new(dir.join("go.mod"), go_mod),
        Artifact::new(dir.join("function.yaml"), function_yaml),
        Artifact::executable(dir.join("deploy.sh"), deploy),
    ])
}

/// Render every function handler in `handlers`, skipping containers.
pub fn render_functions(handlers: &[Handler], config: &BuildConfig) -> anyhow::Result<Vec<Artifact>> {
    let mut artifacts = Vec::new();
    for handler in handlers.iter().filter(|h| h.is_function()) {
        let rendered = render_function(handler, config)
            .with_context(|| format!("failed to generate function {}", handler.function_name))?;
        artifacts.extend(rendered);
    }
    Ok(artifacts)
}
