//! Build command implementation
//!
//! Resolves the effective build request from CLI flags layered over an
//! optional `kiln.toml` in the application directory, connects the Docker
//! transport, and runs the builder lifecycle.

use anyhow::Result;
use kiln_core::binding::Binding;
use kiln_core::config::{BuildRequest, BuildSection, ProjectConfig, DEFAULT_BUILDER};
use kiln_core::docker::{EngineDocker, StderrLog};
use kiln_core::errors::ConfigError;
use kiln_core::lifecycle::Lifecycle;
use kiln_core::phase::resolve_domain_socket_path;
use std::path::PathBuf;
use tracing::debug;

/// Arguments for the build command
#[derive(Debug)]
pub struct BuildArgs {
    pub image: Option<String>,
    pub path: PathBuf,
    pub builder: Option<String>,
    pub run_image: Option<String>,
    pub env: Vec<String>,
    pub volume: Vec<String>,
    pub network: Option<String>,
    pub clean_cache: bool,
    pub verbose: bool,
    pub docker_host: Option<String>,
}

/// Execute the build command
pub async fn execute(args: BuildArgs) -> Result<()> {
    let request = resolve_request(&args)?;
    let image = request.image().to_string();
    let lifecycle = Lifecycle::new(request)?;

    let docker = match args.docker_host.as_deref() {
        Some(host) => {
            let socket = resolve_domain_socket_path(Some(host), |name| std::env::var(name).ok());
            debug!("Connecting to Docker daemon at {}", socket);
            EngineDocker::connect_socket(&socket)?
        }
        None => EngineDocker::connect()?,
    };

    let mut log = StderrLog;
    lifecycle.execute(&docker, &mut log).await?;

    println!("Successfully built image '{}'", image);
    Ok(())
}

/// Layer CLI flags over the project file over built-in defaults
fn resolve_request(args: &BuildArgs) -> Result<BuildRequest> {
    let project = ProjectConfig::discover(&args.path)?;
    let section = project.and_then(|config| config.build).unwrap_or_default();

    let image = args
        .image
        .clone()
        .or_else(|| section.image.clone())
        .ok_or_else(|| ConfigError::Validation {
            message: "No image name given; use --image or set build.image in kiln.toml"
                .to_string(),
        })?;

    let mut request = BuildRequest::new(image, args.path.clone())
        .with_builder(resolve_builder(args, &section))
        .with_clean_cache(args.clean_cache)
        .with_verbose(args.verbose)
        .with_docker_host(args.docker_host.clone());

    if let Some(run_image) = args.run_image.clone().or_else(|| section.run_image.clone()) {
        request = request.with_run_image(run_image);
    }
    if let Some(network) = args.network.clone().or_else(|| section.network.clone()) {
        request = request.with_network(network);
    }

    // Project file env first so repeated CLI flags win
    if let Some(env) = &section.env {
        for (name, value) in env {
            request = request.with_env(name, value);
        }
    }
    for entry in &args.env {
        let (name, value) = parse_env_entry(entry)?;
        request = request.with_env(name, value);
    }
    for entry in &args.volume {
        let binding: Binding = entry.parse()?;
        request = request.with_binding(binding);
    }

    Ok(request)
}

fn resolve_builder(args: &BuildArgs, section: &BuildSection) -> String {
    args.builder
        .clone()
        .or_else(|| section.builder.clone())
        .unwrap_or_else(|| DEFAULT_BUILDER.to_string())
}

fn parse_env_entry(entry: &str) -> Result<(String, String)> {
    let (name, value) = entry.split_once('=').ok_or_else(|| ConfigError::Validation {
        message: format!("Invalid environment entry '{}': expected NAME=VALUE", entry),
    })?;
    if name.is_empty() {
        return Err(ConfigError::Validation {
            message: format!("Invalid environment entry '{}': empty variable name", entry),
        }
        .into());
    }
    Ok((name.to_string(), value.to_string()))
}
