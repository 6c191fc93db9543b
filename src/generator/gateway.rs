//! # Gateway Emitter
//!
//! Builds the OpenAPI 3.0 document served by API Gateway, plus the gateway
//! resource descriptor and a deploy script.
//!
//! The document is modelled as serde structs and serialized with
//! `serde_yaml`. Every map is a `BTreeMap`, so paths, methods and response
//! codes come out sorted and identical input always yields identical bytes.
//!
//! ## Extensions
//!
//! - `x-google-backend`: where the gateway forwards the operation
//! - `x-google-quota`: metric cost for rate-limited operations
//! - `x-google-management`: the metric and limit each quota refers to
//! - `x-box-cors`: declared CORS origins, informational

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use anyhow::Context;
use askama::Template;
use serde::Serialize;

use super::templates::{GatewayConfigTemplate, GatewayDeployTemplate};
use super::writer::Artifact;
use super::GATEWAY_DIR;
use crate::config::BuildConfig;
use crate::model::{to_kebab_case, DeploymentTarget, Handler, HttpMethod};

const OPENAPI_VERSION: &str = "3.0.0";
const SECURITY_SCHEME: &str = "bearerAuth";

/// Root of the generated OpenAPI document.
#[derive(Debug, Clone, Serialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    pub servers: Vec<Server>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    /// path -> lower-case method -> operation
    pub paths: BTreeMap<String, BTreeMap<String, Operation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
    #[serde(rename = "x-google-management", skip_serializing_if = "Option::is_none")]
    pub management: Option<Management>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Info {
    pub title: String,
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Server {
    pub url: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: String,
    pub summary: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    pub responses: BTreeMap<String, Response>,
    #[serde(rename = "x-google-backend", skip_serializing_if = "Option::is_none")]
    pub backend: Option<Backend>,
    #[serde(rename = "x-google-quota", skip_serializing_if = "Option::is_none")]
    pub quota: Option<Quota>,
    #[serde(rename = "x-box-cors", skip_serializing_if = "Option::is_none")]
    pub cors: Option<Cors>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    pub schema: Schema,
}

#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Backend {
    pub address: String,
    pub path_translation: String,
    /// Seconds; omitted when the handler declares no timeout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quota {
    pub metric_costs: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cors {
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    pub security_schemes: BTreeMap<String, SecurityScheme>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub kind: String,
    pub scheme: String,
    pub bearer_format: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Management {
    pub metrics: Vec<Metric>,
    pub quota: QuotaLimits,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub name: String,
    pub display_name: String,
    pub value_type: String,
    pub metric_kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuotaLimits {
    pub limits: Vec<QuotaLimit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuotaLimit {
    pub name: String,
    pub metric: String,
    pub unit: String,
    pub values: BTreeMap<String, i64>,
}

/// URL the gateway forwards to for this handler.
///
/// Functions: `https://<region>-<project>.cloudfunctions.net/<kebab-name>`.
/// Containers: `https://<kebab-group>-<region>.run.app`.
pub fn backend_address(handler: &Handler, config: &BuildConfig) -> Option<String> {
    match handler.target? {
        DeploymentTarget::Function => Some(format!(
            "https://{}-{}.cloudfunctions.net/{}",
            config.region,
            config.project_id,
            to_kebab_case(&handler.function_name)
        )),
        DeploymentTarget::Container => Some(format!(
            "https://{}-{}.run.app",
            to_kebab_case(handler.group_name()),
            config.region
        )),
    }
}

fn quota_metric_name(handler: &Handler) -> String {
    format!("{}-quota", to_kebab_case(&handler.function_name))
}

fn build_responses(handler: &Handler, method: HttpMethod) -> BTreeMap<String, Response> {
    let mut responses = BTreeMap::new();
    let mut add = |code: &str, description: &str| {
        responses.insert(
            code.to_string(),
            Response {
                description: description.to_string(),
            },
        );
    };

    add("200", "Successful response");
    add("400", "Bad request");
    add("500", "Internal server error");
    if method == HttpMethod::Post {
        add("201", "Resource created");
    }
    if handler.auth.is_enabled() {
        add("401", "Missing or invalid credentials");
        add("403", "Insufficient permissions");
    }
    if handler.rate_limit.is_some() {
        add("429", "Rate limit exceeded");
    }
    responses
}

fn build_operation(handler: &Handler, config: &BuildConfig) -> Option<Operation> {
    let route = handler.route.as_ref()?;

    let security = if handler.auth.is_enabled() {
        vec![BTreeMap::from([(SECURITY_SCHEME.to_string(), Vec::new())])]
    } else {
        Vec::new()
    };

    let parameters = route
        .path_params()
        .into_iter()
        .map(|name| Parameter {
            name: name.to_string(),
            location: "path".to_string(),
            required: true,
            schema: Schema {
                kind: "string".to_string(),
            },
        })
        .collect();

    let backend = backend_address(handler, config).map(|address| Backend {
        address,
        path_translation: match handler.target {
            Some(DeploymentTarget::Container) => "APPEND_PATH_TO_ADDRESS",
            _ => "CONSTANT_ADDRESS",
        }
        .to_string(),
        deadline: handler.timeout.map(|t| t.as_secs_f64()),
    });

    let quota = handler.rate_limit.as_ref().map(|_| Quota {
        metric_costs: BTreeMap::from([(quota_metric_name(handler), 1)]),
    });

    let cors = handler.cors.as_ref().map(|cors| Cors {
        allow_origins: cors.allowed_origins.clone(),
        allow_methods: vec![route.method.as_str().to_string()],
    });

    Some(Operation {
        operation_id: handler.function_name.clone(),
        summary: route.to_string(),
        tags: vec![handler.group_name().to_string()],
        security,
        parameters,
        responses: build_responses(handler, route.method),
        backend,
        quota,
        cors,
    })
}

fn build_management(handlers: &[&Handler]) -> Option<Management> {
    let limited: Vec<_> = handlers
        .iter()
        .filter_map(|h| h.rate_limit.as_ref().map(|rl| (*h, rl)))
        .collect();
    if limited.is_empty() {
        return None;
    }

    let mut metrics = Vec::new();
    let mut limits = Vec::new();
    for (handler, rate_limit) in limited {
        let metric = quota_metric_name(handler);
        metrics.push(Metric {
            name: metric.clone(),
            display_name: format!("{} requests", handler.function_name),
            value_type: "INT64".to_string(),
            metric_kind: "DELTA".to_string(),
        });
        limits.push(QuotaLimit {
            name: format!("{}-limit", to_kebab_case(&handler.function_name)),
            metric,
            unit: "1/min/{project}".to_string(),
            values: BTreeMap::from([("STANDARD".to_string(), rate_limit.per_minute())]),
        });
    }

    Some(Management {
        metrics,
        quota: QuotaLimits { limits },
    })
}

/// Assemble the OpenAPI document. Handlers without a route are skipped; if
/// two handlers share a route the first one wins.
pub fn build_openapi(handlers: &[Handler], config: &BuildConfig) -> OpenApiDocument {
    let routed: Vec<&Handler> = handlers.iter().filter(|h| h.route.is_some()).collect();

    let mut paths: BTreeMap<String, BTreeMap<String, Operation>> = BTreeMap::new();
    let mut published: Vec<&Handler> = Vec::new();
    for handler in &routed {
        let Some(route) = handler.route.as_ref() else {
            continue;
        };
        let Some(operation) = build_operation(handler, config) else {
            continue;
        };
        if let Entry::Vacant(slot) = paths
            .entry(route.path.clone())
            .or_default()
            .entry(route.method.as_lower().to_string())
        {
            slot.insert(operation);
            published.push(handler);
        }
    }

    let tags = routed
        .iter()
        .map(|h| h.group_name())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|name| Tag {
            name: name.to_string(),
            description: format!("{name} endpoints"),
        })
        .collect();

    let components = routed.iter().any(|h| h.auth.is_enabled()).then(|| Components {
        security_schemes: BTreeMap::from([(
            SECURITY_SCHEME.to_string(),
            SecurityScheme {
                kind: "http".to_string(),
                scheme: "bearer".to_string(),
                bearer_format: "JWT".to_string(),
                description: "JWT bearer token".to_string(),
            },
        )]),
    });

    OpenApiDocument {
        openapi: OPENAPI_VERSION.to_string(),
        info: Info {
            title: config.defaults.api_name.clone(),
            description: "Generated from box handler annotations".to_string(),
            version: "1.0.0".to_string(),
        },
        servers: vec![Server {
            url: format!("https://{}-{}.gateway.dev", config.region, config.project_id),
            description: "API Gateway".to_string(),
        }],
        tags,
        paths,
        components,
        management: build_management(&published),
    }
}

/// Serialize the OpenAPI document with a generated-file header.
pub fn render_openapi(handlers: &[Handler], config: &BuildConfig) -> anyhow::Result<String> {
    let doc = build_openapi(handlers, config);
    let yaml = serde_yaml::to_string(&doc).context("failed to serialize OpenAPI document")?;
    Ok(format!(
        "# OpenAPI specification for {}\n# Generated by box. DO NOT EDIT.\n\n{yaml}",
        config.defaults.api_name
    ))
}

/// Render `openapi.yaml`, `gateway-config.yaml` and `deploy.sh`.
pub fn render_gateway(handlers: &[Handler], config: &BuildConfig) -> anyhow::Result<Vec<Artifact>> {
    let openapi = render_openapi(handlers, config)?;

    let gateway_config = GatewayConfigTemplate {
        api_name: config.defaults.api_name.clone(),
        project_id: config.project_id.clone(),
        region: config.region.clone(),
    }
    .render()
    .context("failed to render gateway-config.yaml")?;

    let deploy = GatewayDeployTemplate {
        api_name: config.defaults.api_name.clone(),
        region: config.region.clone(),
        project_id: config.project_id.clone(),
    }
    .render()
    .context("failed to render gateway deploy.sh")?;

    Ok(vec![
        Artifact::new(format!("{GATEWAY_DIR}/openapi.yaml"), openapi),
        Artifact::new(format!("{GATEWAY_DIR}/gateway-config.yaml"), gateway_config),
        Artifact::executable(format!("{GATEWAY_DIR}/deploy.sh"), deploy),
    ])
}
