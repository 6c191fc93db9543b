//! # Semantic Validator
//!
//! Checks parsed handlers against platform constraints. Both passes are pure:
//! they read the handler list and return severity-tagged diagnostics.
//!
//! ## Rules
//!
//! 1. **Completeness** - deployment target and route are required
//! 2. **Path shape** - leading `/`, no trailing `/`, well-formed `{param}` segments
//! 3. **Function limits** - memory from the fixed tier list, no concurrency, timeout <= 540s
//! 4. **Container limits** - concurrency in 1..=1000, timeout <= 3600s
//! 5. **Rate limits and CORS** - positive counts, `http(s)://` origins
//! 6. **Uniqueness** - each (method, path) pair is declared once, and no two
//!    functions deploy under the same name

use std::collections::HashMap;

use crate::model::{to_kebab_case, DeploymentTarget, Handler, Severity, ValidationError};


/// Memory tiers accepted for functions.
pub const FUNCTION_MEMORY_TIERS: &[&str] = &[
    "128MB", "256MB", "512MB", "1GB", "2GB", "4GB", "8GB", "16GB",
];

pub const FUNCTION_MAX_TIMEOUT_SECS: u64 = 540;
pub const CONTAINER_MAX_TIMEOUT_SECS: u64 = 3_600;
const SHORT_TIMEOUT_SECS: u64 = 5;

const ANN_TARGET: &str = "@box:function or @box:container";
const ANN_FUNCTION: &str = "@box:function";
const ANN_PATH: &str = "@box:path";
const ANN_MEMORY: &str = "@box:memory";
const ANN_CONCURRENCY: &str = "@box:concurrency";
const ANN_RATELIMIT: &str = "@box:ratelimit";
const ANN_CORS: &str = "@box:cors";
const ANN_TIMEOUT: &str = "@box:timeout";

/// Run the per-handler rules over every handler.
pub fn validate(handlers: &[Handler]) -> Vec<ValidationError> {
    handlers.iter().flat_map(validate_handler).collect()
}

/// Per-handler rules followed by the uniqueness passes.
pub fn validate_all(handlers: &[Handler]) -> Vec<ValidationError> {
    let mut errors = validate(handlers);
    errors.extend(validate_unique_routes(handlers));
    errors.extend(validate_unique_function_names(handlers));
    errors
}

/// True if any diagnostic is [`Severity::Error`].
pub fn has_errors(errors: &[ValidationError]) -> bool {
    errors.iter().any(ValidationError::is_error)
}

/// Report every later declaration of an already-seen (method, path).
///
/// The first handler in input order keeps the route. Handlers without a
/// route are skipped here; the per-handler pass reports them.
pub fn validate_unique_routes(handlers: &[Handler]) -> Vec<ValidationError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut errors = Vec::new();

    for handler in handlers {
        let Some(route) = handler.route.as_ref() else {
            continue;
        };
        let key = route.to_string();
        match seen.get(key.as_str()) {
            Some(existing) => errors.push(ValidationError::new(
                &handler.function_name,
                ANN_PATH,
                Severity::Error,
                format!("Duplicate route: {key} already defined in handler {existing}"),
            )),
            None => {
                seen.insert(key, &handler.function_name);
            }
        }
    }

    errors
}

/// Report functions whose deployed name collides with an earlier function.
///
/// Function packages and Terraform resources are keyed by the kebab-cased
/// symbol, so `accounts.Get` and `users.Get` would overwrite each other.
pub fn validate_unique_function_names(handlers: &[Handler]) -> Vec<ValidationError> {
    let mut seen: HashMap<String, &Handler> = HashMap::new();
    let mut errors = Vec::new();

    for handler in handlers.iter().filter(|h| h.is_function()) {
        let name = to_kebab_case(&handler.function_name);
        match seen.get(name.as_str()) {
            Some(existing) => errors.push(ValidationError::new(
                &handler.function_name,
                ANN_FUNCTION,
                Severity::Error,
                format!(
                    "Duplicate function name: {name} already used by {}.{}",
                    existing.package_name, existing.function_name
                ),
            )),
            None => {
                seen.insert(name, handler);
            }
        }
    }

    errors
}

fn validate_handler(handler: &Handler) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let name = handler.function_name.as_str();
    let error = |annotation: &str, reason: String| {
        ValidationError::new(name, annotation, Severity::Error, reason)
    };

    if handler.target.is_none() {
        errors.push(error(
            ANN_TARGET,
            "Missing deployment type annotation. Add @box:function or @box:container".into(),
        ));
    }

    match handler.route.as_ref() {
        None => errors.push(error(
            ANN_PATH,
            "Missing path annotation. Add @box:path METHOD /path".into(),
        )),
        Some(route) => validate_path(name, &route.path, &mut errors),
    }

    match handler.target {
        Some(DeploymentTarget::Function) => validate_function(handler, &mut errors),
        Some(DeploymentTarget::Container) => validate_container(handler, &mut errors),
        None => {}
    }

    if let Some(rate_limit) = handler.rate_limit.as_ref() {
        if rate_limit.count <= 0 {
            errors.push(error(
                ANN_RATELIMIT,
                format!("Rate limit count must be positive, got: {}", rate_limit.count),
            ));
        }
        if rate_limit.count > 10_000 {
            errors.push(ValidationError::new(
                name,
                ANN_RATELIMIT,
                Severity::Warning,
                format!(
                    "Rate limit seems very high: {} (consider if this is intentional)",
                    rate_limit.raw
                ),
            ));
        }
        if rate_limit.count > 0 && rate_limit.count < 10 && rate_limit.period.seconds() >= 3_600 {
            errors.push(ValidationError::new(
                name,
                ANN_RATELIMIT,
                Severity::Warning,
                format!(
                    "Rate limit seems very low: {} (consider if this is intentional)",
                    rate_limit.raw
                ),
            ));
        }
    }

    if let Some(cors) = handler.cors.as_ref() {
        if cors.allowed_origins.is_empty() {
            errors.push(error(ANN_CORS, "CORS must specify at least one origin".into()));
        }
        for origin in cors.allowed_origins.iter().filter(|o| o.as_str() != "*") {
            if !origin.starts_with("http://") && !origin.starts_with("https://") {
                errors.push(error(
                    ANN_CORS,
                    format!("CORS origin must start with http:// or https://, got: {origin}"),
                ));
            }
        }
    }

    if let Some(secs) = handler.timeout_secs() {
        if secs < SHORT_TIMEOUT_SECS {
            errors.push(ValidationError::new(
                name,
                ANN_TIMEOUT,
                Severity::Warning,
                format!("Timeout is very short: {secs}s (consider if this is intentional)"),
            ));
        }
    }

    errors
}

fn validate_path(name: &str, path: &str, errors: &mut Vec<ValidationError>) {
    if !path.starts_with('/') {
        errors.push(ValidationError::new(
            name,
            ANN_PATH,
            Severity::Error,
            format!("Path must start with '/': {path}"),
        ));
    }
    if path.len() > 1 && path.ends_with('/') {
        errors.push(ValidationError::new(
            name,
            ANN_PATH,
            Severity::Error,
            format!("Path should not end with '/': {path}"),
        ));
    }
    if (path.contains('{') || path.contains('}')) && !has_valid_path_params(path) {
        errors.push(ValidationError::new(
            name,
            ANN_PATH,
            Severity::Error,
            format!("Invalid path parameter syntax: {path} (use {{paramName}})"),
        ));
    }
}

/// Every segment containing a brace must be exactly `{name}` with a
/// non-empty name.
fn has_valid_path_params(path: &str) -> bool {
    path.split('/')
        .filter(|seg| seg.contains('{') || seg.contains('}'))
        .all(|seg| {
            seg.strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .is_some_and(|inner| !inner.is_empty() && !inner.contains(['{', '}']))
        })
}

fn validate_function(handler: &Handler, errors: &mut Vec<ValidationError>) {
    let name = handler.function_name.as_str();

    if let Some(memory) = handler.memory.as_deref() {
        if !FUNCTION_MEMORY_TIERS.contains(&memory) {
            errors.push(ValidationError::new(
                name,
                ANN_MEMORY,
                Severity::Error,
                format!(
                    "Invalid memory value: {memory} (valid: {})",
                    FUNCTION_MEMORY_TIERS.join(", ")
                ),
            ));
        }
    }

    if handler.concurrency.is_some() {
        errors.push(ValidationError::new(
            name,
            ANN_CONCURRENCY,
            Severity::Error,
            "Concurrency is not applicable to Cloud Functions, only Cloud Run containers",
        ));
    }

    if let Some(secs) = handler.timeout_secs() {
        if secs > FUNCTION_MAX_TIMEOUT_SECS {
            errors.push(ValidationError::new(
                name,
                ANN_TIMEOUT,
                Severity::Error,
                format!("Cloud Function timeout cannot exceed 540s (9 minutes), got: {secs}s"),
            ));
        }
    }
}

fn validate_container(handler: &Handler, errors: &mut Vec<ValidationError>) {
    let name = handler.function_name.as_str();

    if let Some(concurrency) = handler.concurrency {
        if !(1..=1000).contains(&concurrency) {
            errors.push(ValidationError::new(
                name,
                ANN_CONCURRENCY,
                Severity::Error,
                format!("Concurrency must be between 1 and 1000, got: {concurrency}"),
            ));
        }
    }

    if handler.memory.is_some() {
        errors.push(ValidationError::new(
            name,
            ANN_MEMORY,
            Severity::Info,
            "Memory for Cloud Run containers is configured at the service level, not per handler",
        ));
    }

    if let Some(secs) = handler.timeout_secs() {
        if secs > CONTAINER_MAX_TIMEOUT_SECS {
            errors.push(ValidationError::new(
                name,
                ANN_TIMEOUT,
                Severity::Error,
                format!("Cloud Run timeout cannot exceed 3600s (1 hour), got: {secs}s"),
            ));
        }
    }
}

/// Log every diagnostic at a level matching its severity.
pub fn log_diagnostics(errors: &[ValidationError]) {
    for e in errors {
        match e.severity {
            Severity::Error => tracing::error!(
                handler = %e.handler,
                annotation = %e.annotation,
                "{}",
                e.reason
            ),
            Severity::Warning => tracing::warn!(
                handler = %e.handler,
                annotation = %e.annotation,
                "{}",
                e.reason
            ),
            Severity::Info => tracing::info!(
                handler = %e.handler,
                annotation = %e.annotation,
                "{}",
                e.reason
            ),
        }
    }
}

/// Format diagnostics grouped by severity, for terminal output.
pub fn format_diagnostics(errors: &[ValidationError]) -> String {
    if errors.is_empty() {
        return "✅ No validation issues found!\n".to_string();
    }

    let by_severity =
        |s: Severity| errors.iter().filter(|e| e.severity == s).collect::<Vec<_>>();
    let errs = by_severity(Severity::Error);
    let warnings = by_severity(Severity::Warning);
    let infos = by_severity(Severity::Info);

    let mut out = format!(
        "\n📋 Validation Results:\n   {} error(s), {} warning(s), {} info(s)\n\n",
        errs.len(),
        warnings.len(),
        infos.len()
    );

    for (title, group) in [
        ("❌ Errors (must fix):", errs),
        ("⚠️  Warnings (should fix):", warnings),
        ("ℹ️  Info:", infos),
    ] {
        if group.is_empty() {
            continue;
        }
        out.push_str(title);
        out.push('\n');
        for e in group {
            out.push_str(&format!("   [{}] {}\n      {}\n", e.annotation, e.handler, e.reason));
        }
        out.push('\n');
    }
    out
}

pub fn print_diagnostics(errors: &[ValidationError]) {
    print!("{}", format_diagnostics(errors));
}
