//! # Build Configuration
//!
//! Every value the emitters render that is not taken from a handler lives
//! here, with its fallback spelled out in [`RenderDefaults`] and
//! [`BuildConfig`].
//!
//! Values are layered: command-line flags override `box.toml`, which
//! overrides the defaults below.
//!
//! ```toml
//! # box.toml
//! project_id = "my-project"
//! region = "europe-west1"
//!
//! [defaults]
//! default_memory_mb = 512
//! max_instances = 20
//! ```

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use serde::{Deserialize, Serialize};

/// Name of the optional project-level config file.
pub const CONFIG_FILE_NAME: &str = "box.toml";

pub const DEFAULT_HANDLERS_DIR: &str = "./handlers";
pub const DEFAULT_OUTPUT_DIR: &str = "./build";
pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_ENVIRONMENT: &str = "dev";

/// Fallbacks used when a handler leaves a setting unspecified, plus fixed
/// platform values baked into generated artifacts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderDefaults {
    /// Function memory when `@box:memory` is absent (default: 256)
    pub default_memory_mb: u64,
    /// Request timeout when `@box:timeout` is absent (default: 60)
    pub default_timeout_secs: u64,
    /// Function instance ceiling (default: 100)
    pub max_instances: u32,
    /// Port containers listen on (default: 8080)
    pub container_port: u16,
    /// Cloud Run concurrency when no handler in a group sets one (default: 80)
    pub container_concurrency: i64,
    /// Cloud Functions runtime identifier (default: go122)
    pub go_runtime: String,
    /// API Gateway API id (default: box-api)
    pub api_name: String,
    /// Prefix for shared infrastructure names (default: box)
    pub resource_prefix: String,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        RenderDefaults {
            default_memory_mb: 256,
            default_timeout_secs: 60,
            max_instances: 100,
            container_port: 8080,
            container_concurrency: 80,
            go_runtime: "go122".to_string(),
            api_name: "box-api".to_string(),
            resource_prefix: "box".to_string(),
        }
    }
}

/// Contents of `box.toml`. Every key is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub handlers_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub project_id: Option<String>,
    pub region: Option<String>,
    pub environment: Option<String>,
    pub module_name: Option<String>,
    pub clean: Option<bool>,
    pub defaults: RenderDefaults,
}

/// Values supplied on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub project_root: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub handlers_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub project_id: Option<String>,
    pub region: Option<String>,
    pub environment: Option<String>,
    pub module_name: Option<String>,
    pub clean: bool,
    pub strict: bool,
    pub verbose: bool,
}

/// Fully resolved configuration for one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Go module root; `go.mod` and `box.toml` are looked up here (default: `.`)
    pub project_root: PathBuf,
    pub handlers_dir: PathBuf,
    pub output_dir: PathBuf,
    pub project_id: String,
    pub region: String,
    pub environment: String,
    /// Go module path, e.g. `github.com/acme/api`
    pub module_name: String,
    pub clean: bool,
    /// Refuse to generate when validation reports an error
    pub strict: bool,
    pub verbose: bool,
    pub defaults: RenderDefaults,
}

impl BuildConfig {
    /// A config with every default applied. Mostly useful for tests and
    /// library callers that build the config by hand.
    pub fn new(project_id: impl Into<String>, module_name: impl Into<String>) -> Self {
        BuildConfig {
            project_root: PathBuf::from("."),
            handlers_dir: PathBuf::from(DEFAULT_HANDLERS_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            project_id: project_id.into(),
            region: DEFAULT_REGION.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            module_name: module_name.into(),
            clean: false,
            strict: false,
            verbose: false,
            defaults: RenderDefaults::default(),
        }
    }

    /// Layer CLI overrides over `box.toml` over defaults.
    ///
    /// An explicit `config_file` must exist; the implicit
    /// `<project_root>/box.toml` is optional.
    pub fn resolve(overrides: ConfigOverrides) -> anyhow::Result<Self> {
        let project_root = overrides
            .project_root
            .unwrap_or_else(|| PathBuf::from("."));

        let file = match overrides.config_file.as_deref() {
            Some(path) => load_file_config(path)?
                .ok_or_else(|| anyhow!("config file not found: {}", path.display()))?,
            None => load_file_config(&project_root.join(CONFIG_FILE_NAME))?.unwrap_or_default(),
        };

        let project_id = overrides
            .project_id
            .or(file.project_id)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| anyhow!("project id is required (pass --project or set project_id in {CONFIG_FILE_NAME})"))?;

        let module_name = match overrides.module_name.or(file.module_name) {
            Some(name) => name,
            None => detect_module_name(&project_root.join("go.mod"))
                .context("failed to detect module name; pass --module")?,
        };

        Ok(BuildConfig {
            handlers_dir: overrides
                .handlers_dir
                .or(file.handlers_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HANDLERS_DIR)),
            output_dir: overrides
                .output_dir
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            project_id,
            region: overrides
                .region
                .or(file.region)
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            environment: overrides
                .environment
                .or(file.environment)
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            module_name,
            clean: overrides.clean || file.clean.unwrap_or(false),
            strict: overrides.strict,
            verbose: overrides.verbose,
            defaults: file.defaults,
            project_root,
        })
    }

    /// The output directory as a `/`-separated path relative to the project
    /// root, e.g. `build`. Generated Dockerfiles and `go.mod` replace
    /// directives depend on it.
    pub fn output_from_root(&self) -> String {
        let rel = relative_path(&self.output_dir, &self.project_root);
        let joined = normal_components(&rel).join("/");
        if joined.is_empty() {
            ".".to_string()
        } else {
            joined
        }
    }

    /// Fail unless the output directory lives below the project root.
    /// Generated `go.mod` replace directives and Dockerfile `COPY` paths are
    /// relative to the root and cannot point outside it.
    pub fn check_output_within_root(&self) -> anyhow::Result<()> {
        if within(&self.output_dir, &self.project_root).is_none() {
            bail!(
                "output directory {} must be inside the project root {}",
                self.output_dir.display(),
                self.project_root.display()
            );
        }
        Ok(())
    }

    /// Path from the output directory back up to the project root, e.g. `..`.
    pub fn root_from_output(&self) -> String {
        let rel = relative_path(&self.output_dir, &self.project_root);
        let depth = normal_components(&rel).len();
        if depth == 0 {
            ".".to_string()
        } else {
            vec![".."; depth].join("/")
        }
    }
}

/// Load `box.toml`. `Ok(None)` if the file does not exist.
pub fn load_file_config(path: &Path) -> anyhow::Result<Option<FileConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: FileConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(Some(config))
}

/// Read the module path from the `module` directive of a `go.mod`.
pub fn detect_module_name(go_mod: &Path) -> anyhow::Result<String> {
    let contents = fs::read_to_string(go_mod)
        .with_context(|| format!("go.mod not found: {}", go_mod.display()))?;
    parse_module_directive(&contents)
        .ok_or_else(|| anyhow!("module declaration not found in {}", go_mod.display()))
}

fn parse_module_directive(contents: &str) -> Option<String> {
    contents.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let name = rest.split("//").next()?.trim().trim_matches('"');
        (!name.is_empty()).then(|| name.to_string())
    })
}

fn relative_path(path: &Path, root: &Path) -> PathBuf {
    within(path, root).unwrap_or_else(|| path.to_path_buf())
}

/// `path` relative to `root`, or `None` if it does not live below it.
fn within(path: &Path, root: &Path) -> Option<PathBuf> {
    let rel = match strip_cur_dir(path).strip_prefix(strip_cur_dir(root)) {
        Ok(rel) => rel.to_path_buf(),
        Err(_) => {
            let p = absolute(path).ok()?;
            let r = absolute(root).ok()?;
            p.strip_prefix(&r).ok()?.to_path_buf()
        }
    };
    rel.components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then_some(rel)
}

fn strip_cur_dir(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(strip_cur_dir(path))
    } else {
        Ok(std::env::current_dir()?.join(strip_cur_dir(path)))
    }
}

fn normal_components(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}
