//! Typed accumulation of `@box:` annotations for one declaration.
//!
//! Every recognised key has its own sub-parser writing into a dedicated
//! field. The [`Handler`] is produced only after the whole block has been
//! consumed, and only when a deployment target was declared.

use std::path::PathBuf;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{
    AuthMode, CorsPolicy, DeploymentTarget, Handler, HttpMethod, RateLimit, RatePeriod, Route,
};

static ANNOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@box:(\S*)(?:\s+(.*))?$").expect("annotation regex should be valid")
});

static TIMEOUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*([A-Za-z]+)$").expect("timeout regex should be valid"));

static MEMORY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(MB|GB)$").expect("memory regex should be valid"));

/// Annotation keys understood by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKey {
    Function,
    Container,
    Path,
    Auth,
    Cors,
    RateLimit,
    Timeout,
    Memory,
    Concurrency,
}

impl AnnotationKey {
    pub fn parse(key: &str) -> Option<Self> {
        Some(match key {
            "function" => AnnotationKey::Function,
            "container" => AnnotationKey::Container,
            "path" => AnnotationKey::Path,
            "auth" => AnnotationKey::Auth,
            "cors" => AnnotationKey::Cors,
            "ratelimit" => AnnotationKey::RateLimit,
            "timeout" => AnnotationKey::Timeout,
            "memory" => AnnotationKey::Memory,
            "concurrency" => AnnotationKey::Concurrency,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKey::Function => "function",
            AnnotationKey::Container => "container",
            AnnotationKey::Path => "path",
            AnnotationKey::Auth => "auth",
            AnnotationKey::Cors => "cors",
            AnnotationKey::RateLimit => "ratelimit",
            AnnotationKey::Timeout => "timeout",
            AnnotationKey::Memory => "memory",
            AnnotationKey::Concurrency => "concurrency",
        }
    }
}

/// A comment line split into `@box:<key>` and optional value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAnnotation<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

/// Split an `@box:` line. Returns `None` for ordinary comments and
/// `Some(Err)` for an `@box:` line without a key.
pub fn split_annotation(text: &str) -> Option<Result<RawAnnotation<'_>, String>> {
    if !text.starts_with("@box:") {
        return None;
    }
    let Some(caps) = ANNOTATION.captures(text) else {
        return Some(Err(format!("Invalid annotation format: {text}")));
    };
    let key = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    if key.is_empty() {
        return Some(Err(format!("Invalid annotation format: {text}")));
    }
    let value = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
    Some(Ok(RawAnnotation { key, value }))
}

#[derive(Debug, Default)]
pub struct HandlerBuilder {
    target: Option<DeploymentTarget>,
    service: Option<String>,
    route: Option<Route>,
    auth: AuthMode,
    cors: Option<CorsPolicy>,
    rate_limit: Option<RateLimit>,
    timeout: Option<Duration>,
    memory: Option<String>,
    concurrency: Option<i64>,
}

impl HandlerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one annotation. On error the builder is left unchanged for
    /// that key (except `function`/`container`, which still set the target).
    pub fn apply(&mut self, key: AnnotationKey, value: &str) -> Result<(), String> {
        match key {
            AnnotationKey::Function => {
                self.target = Some(DeploymentTarget::Function);
                if !value.is_empty() {
                    return Err(format!(
                        "Invalid function annotation: function takes no value, got: {value}"
                    ));
                }
            }
            AnnotationKey::Container => {
                self.target = Some(DeploymentTarget::Container);
                if !value.is_empty() {
                    self.service = Some(
                        parse_container_service(value)
                            .map_err(|e| format!("Invalid container annotation: {e}"))?,
                    );
                }
            }
            AnnotationKey::Path => {
                self.route =
                    Some(parse_route(value).map_err(|e| format!("Invalid path annotation: {e}"))?);
            }
            AnnotationKey::Auth => {
                self.auth = value
                    .parse()
                    .map_err(|e| format!("Invalid auth annotation: {e}"))?;
            }
            AnnotationKey::Cors => {
                self.cors =
                    Some(parse_cors(value).map_err(|e| format!("Invalid cors annotation: {e}"))?);
            }
            AnnotationKey::RateLimit => {
                self.rate_limit = Some(
                    parse_rate_limit(value)
                        .map_err(|e| format!("Invalid ratelimit annotation: {e}"))?,
                );
            }
            AnnotationKey::Timeout => {
                self.timeout = Some(
                    parse_timeout(value).map_err(|e| format!("Invalid timeout annotation: {e}"))?,
                );
            }
            AnnotationKey::Memory => {
                if !MEMORY.is_match(value) {
                    return Err(format!(
                        "Invalid memory annotation: memory must be in format '<n>MB' or '<n>GB', got: {value}"
                    ));
                }
                self.memory = Some(value.to_string());
            }
            AnnotationKey::Concurrency => {
                let n = value
                    .parse::<i64>()
                    .map_err(|_| format!("Invalid concurrency value: {value}"))?;
                self.concurrency = Some(n);
            }
        }
        Ok(())
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }

    /// Finish the block. `None` when no deployment target was declared.
    pub fn build(
        self,
        function_name: &str,
        package_name: &str,
        package_path: &str,
        file_path: PathBuf,
        line: usize,
    ) -> Option<Handler> {
        let target = self.target?;
        Some(Handler {
            function_name: function_name.to_string(),
            package_name: package_name.to_string(),
            package_path: package_path.to_string(),
            file_path,
            line,
            target: Some(target),
            service: self.service,
            route: self.route,
            auth: self.auth,
            cors: self.cors,
            rate_limit: self.rate_limit,
            timeout: self.timeout,
            memory: self.memory,
            concurrency: self.concurrency,
        })
    }
}

/// `service=<name>`
pub fn parse_container_service(value: &str) -> Result<String, String> {
    let Some(name) = value.strip_prefix("service=") else {
        return Err(format!(
            "container parameter must be in format 'service=name', got: {value}"
        ));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err("service name cannot be empty".to_string());
    }
    Ok(name.to_string())
}

/// `<METHOD> <path>`
pub fn parse_route(value: &str) -> Result<Route, String> {
    let Some((method, path)) = value.split_once(char::is_whitespace) else {
        return Err(format!("path must be in format 'METHOD /path', got: {value}"));
    };
    let method: HttpMethod = method.parse()?;
    let path = path.trim();
    if !path.starts_with('/') {
        return Err(format!("path must start with /, got: {path}"));
    }
    Ok(Route::new(method, path))
}

/// `origins=*` or `origins=<a>,<b>`. Empty entries are dropped.
pub fn parse_cors(value: &str) -> Result<CorsPolicy, String> {
    let Some(origins) = value.strip_prefix("origins=") else {
        return Err(format!(
            "cors must be in format 'origins=*' or 'origins=url1,url2', got: {value}"
        ));
    };
    let allowed_origins = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect();
    Ok(CorsPolicy {
        allowed_origins,
        raw: value.to_string(),
    })
}

/// `<count>/<period>`
pub fn parse_rate_limit(value: &str) -> Result<RateLimit, String> {
    let parts: Vec<&str> = value.split('/').collect();
    let [count, period] = parts.as_slice() else {
        return Err(format!(
            "ratelimit must be in format 'count/period', got: {value}"
        ));
    };
    let count = count
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("invalid count in ratelimit: {count}"))?;
    let period: RatePeriod = period.parse()?;
    Ok(RateLimit {
        count,
        period,
        raw: value.to_string(),
    })
}

/// `<int><unit>` with unit `s`, `m` or `h` (long forms accepted).
pub fn parse_timeout(value: &str) -> Result<Duration, String> {
    let caps = TIMEOUT.captures(value.trim()).ok_or_else(|| {
        format!("invalid timeout format: {value} (use format like '30s', '5m', '1h')")
    })?;
    let amount: u64 = caps[1]
        .parse()
        .map_err(|_| format!("invalid timeout format: {value}"))?;
    let multiplier = match &caps[2] {
        "s" | "sec" | "second" => 1,
        "m" | "min" | "minute" => 60,
        "h" | "hr" | "hour" => 3_600,
        unit => return Err(format!("invalid timeout unit: {unit} (use s/m/h)")),
    };
    Ok(Duration::from_secs(amount.saturating_mul(multiplier)))
}
