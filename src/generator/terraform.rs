//! # Infrastructure Emitter
//!
//! Renders the Terraform tree under `<output>/terraform`:
//!
//! ```text
//! main.tf  variables.tf  outputs.tf  .gitignore  README.md
//! environments/{dev,staging,production}.tfvars
//! modules/function-hosting/    only with function handlers
//! modules/container-hosting/   only with container handlers
//! modules/gateway/
//! modules/networking/
//! ```
//!
//! Resource names line up with the other emitters: functions are named by
//! the kebab-cased symbol, Cloud Run services by the kebab-cased group, and
//! every deployable reads `DATABASE_URL` from `database-url-<environment>`.

use std::path::PathBuf;

use anyhow::Context;
use askama::Template;

use super::container::{group_concurrency, group_timeout_secs};
use super::function::function_timeout_secs;
use super::templates::{
    ContainerHostingMainTemplate, ContainerHostingOutputsTemplate, EnvironmentTfvarsTemplate,
    FunctionHostingMainTemplate, FunctionHostingOutputsTemplate, FunctionResource,
    GatewayModuleMainTemplate, GatewayModuleOutputsTemplate, ModuleVariable,
    ModuleVariablesTemplate, NetworkingMainTemplate, NetworkingOutputsTemplate,
    ServiceAccountEntry, ServiceResource, TerraformGitignoreTemplate, TerraformMainTemplate,
    TerraformOutputsTemplate, TerraformReadmeTemplate, TerraformVariablesTemplate,
};
use super::writer::Artifact;
use super::{GATEWAY_DIR, TERRAFORM_DIR};
use crate::config::BuildConfig;
use crate::model::{
    function_handlers, groups_by_name, service_groups, to_kebab_case, to_snake_case, Handler,
};

/// Variable files produced regardless of the configured environment.
pub const ENVIRONMENTS: [&str; 3] = ["dev", "staging", "production"];

/// Path from `terraform/modules/gateway` to the generated OpenAPI document.
const OPENAPI_FROM_GATEWAY_MODULE: &str = "../../..";

fn terraform_path(rel: &str) -> PathBuf {
    PathBuf::from(TERRAFORM_DIR).join(rel)
}

fn module_path(module: &str, file: &str) -> PathBuf {
    PathBuf::from(TERRAFORM_DIR)
        .join("modules")
        .join(module)
        .join(file)
}

fn render_module_variables(title: &str, extra: Vec<ModuleVariable>) -> anyhow::Result<String> {
    ModuleVariablesTemplate {
        title: title.to_string(),
        extra,
    }
    .render()
    .with_context(|| format!("failed to render {title} variables.tf"))
}

fn vpc_connector_variable() -> ModuleVariable {
    ModuleVariable::required("vpc_connector", "VPC Access Connector ID")
}

/// Root module: providers, module wiring, variables, outputs and the
/// per-environment variable files.
pub fn render_root(handlers: &[Handler], config: &BuildConfig) -> anyhow::Result<Vec<Artifact>> {
    let has_functions = handlers.iter().any(|h| h.is_function());
    let has_containers = handlers.iter().any(|h| h.is_container());
    let api_name = config.defaults.api_name.clone();

    let main_tf = TerraformMainTemplate {
        api_name: api_name.clone(),
        has_functions,
        has_containers,
    }
    .render()
    .context("failed to render main.tf")?;

    let variables_tf = TerraformVariablesTemplate {
        region: config.region.clone(),
    }
    .render()
    .context("failed to render variables.tf")?;

    let outputs_tf = TerraformOutputsTemplate {
        has_functions,
        has_containers,
    }
    .render()
    .context("failed to render outputs.tf")?;

    let readme = TerraformReadmeTemplate {
        api_name,
        has_functions,
        has_containers,
    }
    .render()
    .context("failed to render terraform README.md")?;

    let gitignore = TerraformGitignoreTemplate
        .render()
        .context("failed to render terraform .gitignore")?;

    let mut artifacts = vec![
        Artifact::new(terraform_path("main.tf"), main_tf),
        Artifact::new(terraform_path("variables.tf"), variables_tf),
        Artifact::new(terraform_path("outputs.tf"), outputs_tf),
        Artifact::new(terraform_path(".gitignore"), gitignore),
        Artifact::new(terraform_path("README.md"), readme),
    ];

    for env in ENVIRONMENTS {
        let tfvars = EnvironmentTfvarsTemplate {
            environment: env.to_string(),
            region: config.region.clone(),
            environment_upper: env.to_uppercase(),
        }
        .render()
        .with_context(|| format!("failed to render {env}.tfvars"))?;
        artifacts.push(Artifact::new(
            terraform_path(&format!("environments/{env}.tfvars")),
            tfvars,
        ));
    }

    Ok(artifacts)
}

/// One service account per package/group owning function handlers, then one
/// Cloud Function per handler.
pub fn render_function_hosting(
    handlers: &[Handler],
    config: &BuildConfig,
) -> anyhow::Result<Vec<Artifact>> {
    let functions = function_handlers(handlers);
    let defaults = &config.defaults;

    let accounts = groups_by_name(functions.iter().copied())
        .into_keys()
        .map(|group| ServiceAccountEntry {
            id: format!("{}_sa", to_snake_case(group)),
            name: to_kebab_case(group),
        })
        .collect();

    let resources: Vec<FunctionResource> = functions
        .iter()
        .map(|h| FunctionResource {
            resource: to_snake_case(&h.function_name),
            name: to_kebab_case(&h.function_name),
            entry_point: h.function_name.clone(),
            route: h
                .route
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            runtime: defaults.go_runtime.clone(),
            account: format!("{}_sa", to_snake_case(h.group_name())),
            memory_mb: h.memory_mb().unwrap_or(defaults.default_memory_mb),
            timeout_secs: function_timeout_secs(h, config),
            max_instances: defaults.max_instances,
        })
        .collect();

    let main_tf = FunctionHostingMainTemplate {
        prefix: defaults.resource_prefix.clone(),
        accounts,
        functions: resources.clone(),
    }
    .render()
    .context("failed to render function-hosting main.tf")?;

    let outputs_tf = FunctionHostingOutputsTemplate {
        functions: resources,
    }
    .render()
    .context("failed to render function-hosting outputs.tf")?;

    let variables_tf = render_module_variables("Function hosting", vec![vpc_connector_variable()])?;

    Ok(vec![
        Artifact::new(module_path("function-hosting", "main.tf"), main_tf),
        Artifact::new(module_path("function-hosting", "variables.tf"), variables_tf),
        Artifact::new(module_path("function-hosting", "outputs.tf"), outputs_tf),
    ])
}

/// One service account and one Cloud Run service per service group.
pub fn render_container_hosting(
    handlers: &[Handler],
    config: &BuildConfig,
) -> anyhow::Result<Vec<Artifact>> {
    let services: Vec<ServiceResource> = service_groups(handlers)
        .iter()
        .map(|group| ServiceResource {
            resource: to_snake_case(&group.name),
            name: group.kebab_name(),
            group: group.name.clone(),
            routes: group
                .handlers
                .iter()
                .filter_map(|h| h.route.as_ref().map(ToString::to_string))
                .collect::<Vec<_>>()
                .join(", "),
            concurrency: group_concurrency(group, config),
            timeout_secs: group_timeout_secs(group, config),
            port: config.defaults.container_port,
        })
        .collect();

    let main_tf = ContainerHostingMainTemplate {
        prefix: config.defaults.resource_prefix.clone(),
        services: services.clone(),
    }
    .render()
    .context("failed to render container-hosting main.tf")?;

    let outputs_tf = ContainerHostingOutputsTemplate { services }
        .render()
        .context("failed to render container-hosting outputs.tf")?;

    let variables_tf =
        render_module_variables("Container hosting", vec![vpc_connector_variable()])?;

    Ok(vec![
        Artifact::new(module_path("container-hosting", "main.tf"), main_tf),
        Artifact::new(module_path("container-hosting", "variables.tf"), variables_tf),
        Artifact::new(module_path("container-hosting", "outputs.tf"), outputs_tf),
    ])
}

/// API Gateway module reading the document written by the gateway emitter.
pub fn render_gateway_module(config: &BuildConfig) -> anyhow::Result<Vec<Artifact>> {
    let main_tf = GatewayModuleMainTemplate {
        openapi_path: format!("{OPENAPI_FROM_GATEWAY_MODULE}/{GATEWAY_DIR}/openapi.yaml"),
    }
    .render()
    .context("failed to render gateway module main.tf")?;

    let outputs_tf = GatewayModuleOutputsTemplate
        .render()
        .context("failed to render gateway module outputs.tf")?;

    let variables_tf = render_module_variables(
        "Gateway",
        vec![ModuleVariable::with_default(
            "api_name",
            "API Gateway API name",
            &config.defaults.api_name,
        )],
    )?;

    Ok(vec![
        Artifact::new(module_path("gateway", "main.tf"), main_tf),
        Artifact::new(module_path("gateway", "variables.tf"), variables_tf),
        Artifact::new(module_path("gateway", "outputs.tf"), outputs_tf),
    ])
}

/// VPC, serverless connector and Cloud SQL. Independent of the handlers.
pub fn render_networking_module(config: &BuildConfig) -> anyhow::Result<Vec<Artifact>> {
    let prefix = &config.defaults.resource_prefix;

    let main_tf = NetworkingMainTemplate {
        prefix: prefix.clone(),
    }
    .render()
    .context("failed to render networking main.tf")?;

    let outputs_tf = NetworkingOutputsTemplate
        .render()
        .context("failed to render networking outputs.tf")?;

    let variables_tf = render_module_variables(
        "Networking",
        vec![
            ModuleVariable::with_default("db_tier", "Cloud SQL machine tier", "db-f1-micro"),
            ModuleVariable::with_default("max_connections", "Postgres max_connections flag", "100"),
            ModuleVariable::with_default("database_name", "Database name", prefix),
            ModuleVariable::with_default("database_user", "Database user", prefix),
            ModuleVariable::required("database_password", "Database password").sensitive(),
        ],
    )?;

    Ok(vec![
        Artifact::new(module_path("networking", "main.tf"), main_tf),
        Artifact::new(module_path("networking", "variables.tf"), variables_tf),
        Artifact::new(module_path("networking", "outputs.tf"), outputs_tf),
    ])
}

/// Render the whole Terraform tree.
pub fn render_terraform(handlers: &[Handler], config: &BuildConfig) -> anyhow::Result<Vec<Artifact>> {
    let mut artifacts = render_root(handlers, config)?;

    if handlers.iter().any(|h| h.is_function()) {
        artifacts.extend(render_function_hosting(handlers, config)?);
    }
    if handlers.iter().any(|h| h.is_container()) {
        artifacts.extend(render_container_hosting(handlers, config)?);
    }
    artifacts.extend(render_gateway_module(config)?);
    artifacts.extend(render_networking_module(config)?);

    Ok(artifacts)
}
