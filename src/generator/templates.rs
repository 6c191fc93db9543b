//! Askama template bindings.
//!
//! One struct per artifact. Sources live under `templates/` and are compiled
//! into the binary, so a missing variable is a build error rather than an
//! empty string in generated output.

use askama::Template;

// ---------------------------------------------------------------------------
// Function packages
// ---------------------------------------------------------------------------

/// Template data for a function package's `main.go`
#[derive(Template)]
#[template(path = "function/main.go.txt", escape = "none")]
pub struct FunctionMainTemplate {
    /// Go import path of the package declaring the handler
    pub import_path: String,
    /// Exported Go symbol, used as the entry point
    pub function_name: String,
    pub package_name: String,
    /// Local fallback port when `PORT` is unset
    pub port: u16,
}

/// Template data for a function package's `go.mod`
#[derive(Template)]
#[template(path = "function/go.mod.txt", escape = "none")]
pub struct GoModTemplate {
    /// Module path of the generated package itself
    pub module_path: String,
    /// Root module the handler lives in
    pub module_name: String,
    /// Relative path from the package back to the root module
    pub root_path: String,
}

/// Template data for `function.yaml`
#[derive(Template)]
#[template(path = "function/function.yaml.txt", escape = "none")]
pub struct FunctionYamlTemplate {
    pub entry_point: String,
    pub name: String,
    pub runtime: String,
    pub region: String,
    /// Memory with platform unit suffix, e.g. `256Mi`
    pub memory: String,
    pub timeout_secs: u64,
    pub max_instances: u32,
    pub environment: String,
}

/// Template data for a function's `deploy.sh`
#[derive(Template)]
#[template(path = "function/deploy.sh.txt", escape = "none")]
pub struct FunctionDeployTemplate {
    pub name: String,
    pub region: String,
    pub entry_point: String,
    pub project_id: String,
    pub runtime: String,
    pub memory: String,
    pub timeout_secs: u64,
    pub max_instances: u32,
    pub environment: String,
}

// ---------------------------------------------------------------------------
// Container services
// ---------------------------------------------------------------------------

/// Route registered on a container service's chi router
#[derive(Debug, Clone)]
pub struct RouteEntry {
    /// Upper-case HTTP method
    pub method: String,
    pub path: String,
    pub package_name: String,
    pub function_name: String,
}

/// Template data for a container service's `main.go`
#[derive(Template)]
#[template(path = "container/main.go.txt", escape = "none")]
pub struct ContainerMainTemplate {
    /// Handler package import paths, sorted
    pub imports: Vec<String>,
    pub service_name: String,
    /// Request timeout applied by the router middleware
    pub timeout_secs: u64,
    pub routes: Vec<RouteEntry>,
    pub port: u16,
}

/// Template data for a container service's `Dockerfile`
#[derive(Template)]
#[template(path = "container/Dockerfile.txt", escape = "none")]
pub struct DockerfileTemplate {
    pub service_name: String,
    /// Package directory relative to the project root
    pub package_dir: String,
    pub port: u16,
}

/// Template data for `cloudbuild.yaml`
#[derive(Template)]
#[template(path = "container/cloudbuild.yaml.txt", escape = "none")]
pub struct CloudBuildTemplate {
    pub service_name: String,
    pub package_dir: String,
    pub region: String,
    pub port: u16,
    pub concurrency: i64,
    pub timeout_secs: u64,
    pub environment: String,
}

/// Template data for a container service's `deploy.sh`
#[derive(Template)]
#[template(path = "container/deploy.sh.txt", escape = "none")]
pub struct ContainerDeployTemplate {
    pub service_name: String,
    pub region: String,
    pub project_id: String,
    /// Path from the service directory back to the project root
    pub root_path: String,
    pub package_dir: String,
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

/// Template data for `gateway-config.yaml`
#[derive(Template)]
#[template(path = "gateway/gateway-config.yaml.txt", escape = "none")]
pub struct GatewayConfigTemplate {
    pub api_name: String,
    pub project_id: String,
    pub region: String,
}

/// Template data for the gateway `deploy.sh`
#[derive(Template)]
#[template(path = "gateway/deploy.sh.txt", escape = "none")]
pub struct GatewayDeployTemplate {
    pub api_name: String,
    pub region: String,
    pub project_id: String,
}

// ---------------------------------------------------------------------------
// Terraform
// ---------------------------------------------------------------------------

/// Template data for the root `main.tf`
#[derive(Template)]
#[template(path = "terraform/main.tf.txt", escape = "none")]
pub struct TerraformMainTemplate {
    pub api_name: String,
    pub has_functions: bool,
    pub has_containers: bool,
}

/// Template data for the root `variables.tf`
#[derive(Template)]
#[template(path = "terraform/variables.tf.txt", escape = "none")]
pub struct TerraformVariablesTemplate {
    /// Default for `var.region`
    pub region: String,
}

/// Template data for the root `outputs.tf`
#[derive(Template)]
#[template(path = "terraform/outputs.tf.txt", escape = "none")]
pub struct TerraformOutputsTemplate {
    pub has_functions: bool,
    pub has_containers: bool,
}

/// Template data for `environments/<env>.tfvars`
#[derive(Template)]
#[template(path = "terraform/environment.tfvars.txt", escape = "none")]
pub struct EnvironmentTfvarsTemplate {
    pub environment: String,
    pub region: String,
    /// Upper-cased environment, used in the placeholder password
    pub environment_upper: String,
}

/// Template for the Terraform `.gitignore`
#[derive(Template)]
#[template(path = "terraform/gitignore.txt", escape = "none")]
pub struct TerraformGitignoreTemplate;

/// Template data for the Terraform `README.md`
#[derive(Template)]
#[template(path = "terraform/README.md.txt", escape = "none")]
pub struct TerraformReadmeTemplate {
    pub api_name: String,
    pub has_functions: bool,
    pub has_containers: bool,
}

/// Module-specific input beyond `project_id`, `region` and `environment`
#[derive(Debug, Clone)]
pub struct ModuleVariable {
    pub name: String,
    pub description: String,
    /// Empty means the variable has no default
    pub default_value: String,
    pub sensitive: bool,
}

impl ModuleVariable {
    pub fn required(name: &str, description: &str) -> Self {
        ModuleVariable {
            name: name.to_string(),
            description: description.to_string(),
            default_value: String::new(),
            sensitive: false,
        }
    }

    pub fn with_default(name: &str, description: &str, default_value: &str) -> Self {
        ModuleVariable {
            default_value: default_value.to_string(),
            ..ModuleVariable::required(name, description)
        }
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

/// Template data for `modules/<name>/variables.tf`
#[derive(Template)]
#[template(path = "terraform/module-variables.tf.txt", escape = "none")]
pub struct ModuleVariablesTemplate {
    /// Human-readable module title for the header comment
    pub title: String,
    pub extra: Vec<ModuleVariable>,
}

/// Service identity shared by the functions of one package or group
#[derive(Debug, Clone)]
pub struct ServiceAccountEntry {
    /// Terraform resource identifier (snake case)
    pub id: String,
    /// Account name fragment (kebab case)
    pub name: String,
}

/// One `google_cloudfunctions_function` resource
#[derive(Debug, Clone)]
pub struct FunctionResource {
    /// Terraform resource identifier (snake case)
    pub resource: String,
    /// Deployed function name (kebab case)
    pub name: String,
    pub entry_point: String,
    /// Route for the resource comment, e.g. `GET /users/{id}`
    pub route: String,
    pub runtime: String,
    /// Resource identifier of the owning service account
    pub account: String,
    pub memory_mb: u64,
    pub timeout_secs: u64,
    pub max_instances: u32,
}

/// Template data for `modules/function-hosting/main.tf`
#[derive(Template)]
#[template(path = "terraform/function-hosting/main.tf.txt", escape = "none")]
pub struct FunctionHostingMainTemplate {
    pub prefix: String,
    pub accounts: Vec<ServiceAccountEntry>,
    pub functions: Vec<FunctionResource>,
}

/// Template data for `modules/function-hosting/outputs.tf`
#[derive(Template)]
#[template(path = "terraform/function-hosting/outputs.tf.txt", escape = "none")]
pub struct FunctionHostingOutputsTemplate {
    pub functions: Vec<FunctionResource>,
}

/// One `google_cloud_run_service` resource
#[derive(Debug, Clone)]
pub struct ServiceResource {
    /// Terraform resource identifier (snake case)
    pub resource: String,
    /// Cloud Run service name (kebab case)
    pub name: String,
    /// Group name as declared
    pub group: String,
    /// Comma-separated routes for the resource comment
    pub routes: String,
    pub concurrency: i64,
    pub timeout_secs: u64,
    pub port: u16,
}

/// Template data for `modules/container-hosting/main.tf`
#[derive(Template)]
#[template(path = "terraform/container-hosting/main.tf.txt", escape = "none")]
pub struct ContainerHostingMainTemplate {
    pub prefix: String,
    pub services: Vec<ServiceResource>,
}

/// Template data for `modules/container-hosting/outputs.tf`
#[derive(Template)]
#[template(path = "terraform/container-hosting/outputs.tf.txt", escape = "none")]
pub struct ContainerHostingOutputsTemplate {
    pub services: Vec<ServiceResource>,
}

/// Template data for `modules/gateway/main.tf`
#[derive(Template)]
#[template(path = "terraform/gateway/main.tf.txt", escape = "none")]
pub struct GatewayModuleMainTemplate {
    /// Path from the module directory to `gateway/openapi.yaml`
    pub openapi_path: String,
}

/// Template for `modules/gateway/outputs.tf`
#[derive(Template)]
#[template(path = "terraform/gateway/outputs.tf.txt", escape = "none")]
pub struct GatewayModuleOutputsTemplate;

/// Template data for `modules/networking/main.tf`
#[derive(Template)]
#[template(path = "terraform/networking/main.tf.txt", escape = "none")]
pub struct NetworkingMainTemplate {
    pub prefix: String,
}

/// Template for `modules/networking/outputs.tf`
#[derive(Template)]
#[template(path = "terraform/networking/outputs.tf.txt", escape = "none")]
pub struct NetworkingOutputsTemplate;
