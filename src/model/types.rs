use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// HTTP methods accepted by `@box:path`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
        HttpMethod::Options,
        HttpMethod::Head,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Lower-case form used as the operation key in OpenAPI documents.
    pub fn as_lower(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    /// Case-insensitive; `get` and `GET` both parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        HttpMethod::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == upper)
            .ok_or_else(|| format!("invalid HTTP method: {upper}"))
    }
}

/// An HTTP method plus a path template such as `/accounts/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    pub method: HttpMethod,
    pub path: String,
}

impl Route {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Route {
            method,
            path: path.into(),
        }
    }

    /// Names of the `{name}` segments, in path order.
    ///
    /// Segments that are not fully wrapped in braces are ignored here; the
    /// validator is responsible for rejecting them.
    pub fn path_params(&self) -> Vec<&str> {
        self.path
            .split('/')
            .filter_map(|seg| seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
            .filter(|name| !name.is_empty())
            .collect()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Where a handler is deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentTarget {
    /// Short-lived, independently deployed cloud function.
    Function,
    /// Grouped, always-on Cloud Run service.
    Container,
}

impl DeploymentTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentTarget::Function => "function",
            DeploymentTarget::Container => "container",
        }
    }
}

impl fmt::Display for DeploymentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication requirement for a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    None,
    Optional,
    Required,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::None => "none",
            AuthMode::Optional => "optional",
            AuthMode::Required => "required",
        }
    }

    /// True for `optional` and `required`; both carry a bearer scheme.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, AuthMode::None)
    }
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(AuthMode::None),
            "optional" => Ok(AuthMode::Optional),
            "required" => Ok(AuthMode::Required),
            other => Err(format!(
                "auth must be 'required', 'optional', or 'none', got: {other}"
            )),
        }
    }
}

/// Allowed CORS origins, plus the annotation text they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub allowed_origins: Vec<String>,
    pub raw: String,
}

impl CorsPolicy {
    pub fn is_wildcard(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RatePeriod {
    Second,
    Minute,
    Hour,
    Day,
}

impl RatePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatePeriod::Second => "second",
            RatePeriod::Minute => "minute",
            RatePeriod::Hour => "hour",
            RatePeriod::Day => "day",
        }
    }

    pub fn seconds(&self) -> u64 {
        match self {
            RatePeriod::Second => 1,
            RatePeriod::Minute => 60,
            RatePeriod::Hour => 3_600,
            RatePeriod::Day => 86_400,
        }
    }
}

impl FromStr for RatePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "second" | "sec" | "s" => Ok(RatePeriod::Second),
            "minute" | "min" | "m" => Ok(RatePeriod::Minute),
            "hour" | "hr" | "h" => Ok(RatePeriod::Hour),
            "day" | "d" => Ok(RatePeriod::Day),
            other => Err(format!(
                "invalid period in ratelimit: {other} (use second/minute/hour/day)"
            )),
        }
    }
}

impl fmt::Display for RatePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimit {
    /// Requests allowed per window. Signed so that `0/hour` and `-5/hour`
    /// survive parsing and are rejected by the validator.
    pub count: i64,
    pub period: RatePeriod,
    pub raw: String,
}

impl RateLimit {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.period.seconds())
    }

    /// Equivalent limit per minute, rounded up, never below one.
    /// Saturates at `i64::MAX` for absurdly large counts.
    pub fn per_minute(&self) -> i64 {
        let count = self.count.max(0) as u64;
        let per_minute = count.saturating_mul(60).div_ceil(self.period.seconds());
        i64::try_from(per_minute.max(1)).unwrap_or(i64::MAX)
    }
}

/// One annotated routine discovered by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Handler {
    /// Symbol name, e.g. `CreateAccount`.
    pub function_name: String,
    /// Declared package name, e.g. `accounts`.
    pub package_name: String,
    /// Package directory relative to the module root, `/`-separated.
    pub package_path: String,
    pub file_path: PathBuf,
    /// 1-based line of the declaration.
    pub line: usize,

    pub target: Option<DeploymentTarget>,
    /// Explicit service group (`@box:container service=<name>`).
    pub service: Option<String>,
    pub route: Option<Route>,

    pub auth: AuthMode,
    pub cors: Option<CorsPolicy>,
    pub rate_limit: Option<RateLimit>,
    pub timeout: Option<Duration>,
    /// Raw memory string, e.g. `256MB`.
    pub memory: Option<String>,
    pub concurrency: Option<i64>,
}

impl Handler {
    pub fn new(function_name: impl Into<String>, package_name: impl Into<String>) -> Self {
        let package_name = package_name.into();
        Handler {
            function_name: function_name.into(),
            package_path: package_name.clone(),
            package_name,
            file_path: PathBuf::new(),
            line: 0,
            target: None,
            service: None,
            route: None,
            auth: AuthMode::None,
            cors: None,
            rate_limit: None,
            timeout: None,
            memory: None,
            concurrency: None,
        }
    }

    pub fn with_target(mut self, target: DeploymentTarget) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_route(mut self, method: HttpMethod, path: impl Into<String>) -> Self {
        self.route = Some(Route::new(method, path));
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_memory(mut self, memory: impl Into<String>) -> Self {
        self.memory = Some(memory.into());
        self
    }

    pub fn with_concurrency(mut self, concurrency: i64) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    pub fn with_rate_limit(mut self, count: i64, period: RatePeriod) -> Self {
        self.rate_limit = Some(RateLimit {
            count,
            raw: format!("{count}/{period}"),
            period,
        });
        self
    }

    pub fn with_cors(mut self, origins: &[&str]) -> Self {
        self.cors = Some(CorsPolicy {
            allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
            raw: format!("origins={}", origins.join(",")),
        });
        self
    }

    pub fn is_function(&self) -> bool {
        self.target == Some(DeploymentTarget::Function)
    }

    pub fn is_container(&self) -> bool {
        self.target == Some(DeploymentTarget::Container)
    }

    /// Service group name: explicit `service=` override, else package name.
    pub fn group_name(&self) -> &str {
        match self.service.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ if !self.package_name.is_empty() => &self.package_name,
            _ => "default",
        }
    }

    pub fn timeout_secs(&self) -> Option<u64> {
        self.timeout.map(|t| t.as_secs())
    }

    /// Memory in mebibytes, if the memory string is well-formed and fits
    /// in a `u64`.
    pub fn memory_mb(&self) -> Option<u64> {
        let memory = self.memory.as_deref()?;
        if let Some(n) = memory.strip_suffix("MB") {
            n.parse().ok()
        } else if let Some(n) = memory.strip_suffix("GB") {
            n.parse::<u64>().ok().and_then(|gb| gb.checked_mul(1024))
        } else {
            None
        }
    }
}

/// Problem found while scanning source. Never aborts the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub file_path: PathBuf,
    /// 1-based line of the offending annotation, 0 when file-scoped.
    pub line: usize,
    pub message: String,
    /// The annotation text, comment markers stripped.
    pub annotation: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file_path.display(), self.line, self.message)
    }
}

/// Severity tag for validation diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Blocks deployment on the target platform.
    Error,
    /// Legal but suspicious.
    Warning,
    /// Informational only.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub handler: String,
    /// Annotation the diagnostic is about, e.g. `@box:timeout`.
    pub annotation: String,
    pub reason: String,
    pub severity: Severity,
}

impl ValidationError {
    pub fn new(
        handler: impl Into<String>,
        annotation: impl Into<String>,
        severity: Severity,
        reason: impl Into<String>,
    ) -> Self {
        ValidationError {
            handler: handler.into(),
            annotation: annotation.into(),
            reason: reason.into(),
            severity,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.severity, self.handler, self.annotation, self.reason
        )
    }
}

/// Everything found in a directory or file.
#[derive(Debug, Clone, Default)]
pub struct ParsedAnnotations {
    pub handlers: Vec<Handler>,
    pub errors: Vec<ParseError>,
}

impl ParsedAnnotations {
    pub fn merge(&mut self, other: ParsedAnnotations) {
        self.handlers.extend(other.handlers);
        self.errors.extend(other.errors);
    }
}
