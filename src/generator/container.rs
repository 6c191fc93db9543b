//! Container emitter: one Cloud Run service package per [`ServiceGroup`].

use std::path::PathBuf;

use anyhow::Context;
use askama::Template;

use super::templates::{
    CloudBuildTemplate, ContainerDeployTemplate, ContainerMainTemplate, DockerfileTemplate,
    RouteEntry,
};
use super::writer::Artifact;
use super::{import_path, CONTAINERS_DIR};
use crate::config::BuildConfig;
use crate::model::{service_groups, Handler, ServiceGroup};

/// Router timeout: the largest timeout in the group, else the default.
pub fn group_timeout_secs(group: &ServiceGroup<'_>, config: &BuildConfig) -> u64 {
    group
        .max_timeout_secs()
        .unwrap_or(config.defaults.default_timeout_secs)
}

pub fn group_concurrency(group: &ServiceGroup<'_>, config: &BuildConfig) -> i64 {
    group
        .max_concurrency()
        .unwrap_or(config.defaults.container_concurrency)
}

/// Directory of a service package relative to the output root.
pub fn service_dir(group: &ServiceGroup<'_>) -> PathBuf {
    PathBuf::from(CONTAINERS_DIR).join(group.kebab_name())
}

/// Render the four files of one container service.
pub fn render_service(group: &ServiceGroup<'_>, config: &BuildConfig) -> anyhow::Result<Vec<Artifact>> {
    let service_name = group.kebab_name();
    let dir = service_dir(group);
    let output = config.output_from_root();
    let package_dir = if output == "." {
        format!("{CONTAINERS_DIR}/{service_name}")
    } else {
        format!("{output}/{CONTAINERS_DIR}/{service_name}")
    };
    let port = config.defaults.container_port;
    let timeout_secs = group_timeout_secs(group, config);

    let imports = group
        .package_imports()
        .into_iter()
        .map(|(_, path)| import_path(&config.module_name, path))
        .collect();
    let routes = group
        .handlers
        .iter()
        .filter_map(|h| {
            h.route.as_ref().map(|route| RouteEntry {
                method: route.method.as_str().to_string(),
                path: route.path.clone(),
                package_name: h.package_name.clone(),
                function_name: h.function_name.clone(),
            })
        })
        .collect();

    let main_go = ContainerMainTemplate {
        imports,
        service_name: group.name.clone(),
        timeout_secs,
        routes,
        port,
    }
    .render()
    .context("failed to render service main.go")?;

    let dockerfile = DockerfileTemplate {
        service_name: service_name.clone(),
        package_dir: package_dir.clone(),
        port,
    }
    .render()
    .context("failed to render Dockerfile")?;

    let cloudbuild = CloudBuildTemplate {
        service_name: service_name.clone(),
        package_dir: package_dir.clone(),
        region: config.region.clone(),
        port,
        concurrency: group_concurrency(group, config),
        timeout_secs,
        environment: config.environment.clone(),
    }
    .render()
    .context("failed to render cloudbuild.yaml")?;

    let root_path = if output == "." {
        "../..".to_string()
    } else {
        format!("{}/../..", config.root_from_output())
    };
    let deploy = ContainerDeployTemplate {
        service_name,
        region: config.region.clone(),
        project_id: config.project_id.clone(),
        root_path,
        package_dir,
    }
    .render()
    .context("failed to render service deploy.sh")?;

    Ok(vec![
        Artifact::new(dir.join("main.go"), main_go),
        Artifact::new(dir.join("Dockerfile"), dockerfile),
        Artifact::new(dir.join("cloudbuild.yaml"), cloudbuild),
        Artifact::executable(dir.join("deploy.sh"), deploy),
    ])
}

/// Group container handlers and render one package per group.
pub fn render_services(handlers: &[Handler], config: &BuildConfig) -> anyhow::Result<Vec<Artifact>> {
    let mut artifacts = Vec::new();
    for group in service_groups(handlers) {
        let rendered = render_service(&group, config)
            .with_context(|| format!("failed to generate container service {}", group.name))?;
        artifacts.extend(rendered);
    }
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::model::{DeploymentTarget, HttpMethod};
    use std::time::Duration;

    fn container(name: &str, pkg: &str, method: HttpMethod, path: &str) -> Handler {
        let mut h = Handler::new(name, pkg)
            .with_target(DeploymentTarget::Container)
            .with_route(method, path);
        h.package_path = format!("handlers/{pkg}");
        h
    }

    fn contents<'a>(artifacts: &'a [Artifact], file: &str) -> &'a str {
        &artifacts
            .iter()
            .find(|a| a.path.file_name().and_then(|n| n.to_str()) == Some(file))
            .unwrap()
            .contents
    }

    #[test]
    fn test_one_package_per_group() {
        let config = BuildConfig::new("proj", "example.com/app");
        let handlers = vec![
            container("GetUser", "users", HttpMethod::Get, "/u"),
            container("CreateUser", "users", HttpMethod::Post, "/u"),
        ];
        let artifacts = render_services(&handlers, &config).unwrap();

        assert_eq!(artifacts.len(), 4);
        assert!(artifacts
            .iter()
            .all(|a| a.path.starts_with("containers/users")));

        let main = contents(&artifacts, "main.go");
        assert!(main.contains("r.Method(\"GET\", \"/u\", http.HandlerFunc(users.GetUser))"));
        assert!(main.contains("r.Method(\"POST\", \"/u\", http.HandlerFunc(users.CreateUser))"));
        assert!(main.contains("r.Get(\"/health\""));
        assert_eq!(main.matches("\"example.com/app/handlers/users\"").count(), 1);
    }

    #[test]
    fn test_root_package_is_imported() {
        let config = BuildConfig::new("proj", "example.com/app");
        let mut handler = container("Ping", "app", HttpMethod::Get, "/ping");
        handler.package_path = String::new();
        let artifacts = render_services(&[handler], &config).unwrap();
        let main = contents(&artifacts, "main.go");

        assert!(main.contains("\t\"example.com/app\"\n"));
        assert!(main.contains("http.HandlerFunc(app.Ping)"));
    }

    #[test]
    fn test_service_override_groups_across_packages() {
        let config = BuildConfig::new("proj", "example.com/app");
        let handlers = vec![
            container("Send", "chat", HttpMethod::Post, "/send").with_service("Messaging"),
            container("Notify", "notify", HttpMethod::Post, "/notify").with_service("Messaging"),
        ];
        let artifacts = render_services(&handlers, &config).unwrap();
        let main = contents(&artifacts, "main.go");

        assert!(artifacts[0].path.starts_with("containers/messaging"));
        assert!(main.contains("\"example.com/app/handlers/chat\""));
        assert!(main.contains("\"example.com/app/handlers/notify\""));
    }

    #[test]
    fn test_timeout_and_concurrency_aggregate() {
        let config = BuildConfig::new("proj", "example.com/app");
        let handlers = vec![
            container("A", "svc", HttpMethod::Get, "/a")
                .with_timeout(Duration::from_secs(30))
                .with_concurrency(20),
            container("B", "svc", HttpMethod::Get, "/b").with_timeout(Duration::from_secs(300)),
        ];
        let artifacts = render_services(&handlers, &config).unwrap();
        let cloudbuild = contents(&artifacts, "cloudbuild.yaml");

        assert!(cloudbuild.contains("'--timeout=300s'"));
        assert!(cloudbuild.contains("'--concurrency=20'"));
        assert!(contents(&artifacts, "main.go").contains("middleware.Timeout(300 * time.Second)"));
    }

    #[test]
    fn test_defaults_without_declared_limits() {
        let config = BuildConfig::new("proj", "example.com/app");
        let handlers = vec![container("A", "svc", HttpMethod::Get, "/a")];
        let artifacts = render_services(&handlers, &config).unwrap();
        let cloudbuild = contents(&artifacts, "cloudbuild.yaml");

        assert!(cloudbuild.contains("'--timeout=60s'"));
        assert!(cloudbuild.contains("'--concurrency=80'"));
        assert!(cloudbuild.contains("'-f'\n      - 'build/containers/svc/Dockerfile'"));
    }

    #[test]
    fn test_dockerfile_runs_as_non_root() {
        let config = BuildConfig::new("proj", "example.com/app");
        let handlers = vec![container("A", "svc", HttpMethod::Get, "/a")];
        let artifacts = render_services(&handlers, &config).unwrap();
        let dockerfile = contents(&artifacts, "Dockerfile");

        assert!(dockerfile.contains("AS builder"));
        assert!(dockerfile.contains("USER appuser"));
        assert!(dockerfile.contains("EXPOSE 8080"));
        assert!(dockerfile.contains("HEALTHCHECK"));
        assert!(dockerfile.contains("./build/containers/svc"));
    }

    #[test]
    fn test_deploy_script_is_executable() {
        let config = BuildConfig::new("proj", "example.com/app");
        let handlers = vec![container("A", "svc", HttpMethod::Get, "/a")];
        let artifacts = render_services(&handlers, &config).unwrap();
        let deploy = artifacts
            .iter()
            .find(|a| a.path.ends_with("deploy.sh"))
            .unwrap();

        assert!(deploy.executable);
        assert!(deploy.contents.contains("cd \"$(dirname \"$0\")/../../..\""));
    }
}
