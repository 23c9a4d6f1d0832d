//! Doctor command implementation
//!
//! Collects Docker daemon connectivity diagnostics. The command succeeds
//! even when the daemon is unreachable; the report says so instead.

use anyhow::Result;
use kiln_core::docker::{DockerApi, EngineDocker};
use kiln_core::phase::resolve_domain_socket_path;
use serde::Serialize;
use tracing::debug;

/// Arguments for the doctor command
#[derive(Debug)]
pub struct DoctorArgs {
    pub json: bool,
    pub docker_host: Option<String>,
}

/// Diagnostics collected from the environment
#[derive(Debug, Serialize)]
pub struct DoctorInfo {
    /// CLI version
    pub cli_version: String,
    /// Core library version
    pub core_version: String,
    /// Daemon socket path the build would bind for daemon-access phases
    pub socket_path: String,
    /// Whether the daemon answered a ping
    pub daemon_reachable: bool,
    /// Daemon version string when reachable
    pub daemon_version: Option<String>,
}

/// Execute the doctor command
pub async fn execute(args: DoctorArgs) -> Result<()> {
    let info = collect(&args).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("kiln {}", info.cli_version);
        println!("kiln-core {}", info.core_version);
        println!("Daemon socket: {}", info.socket_path);
        match &info.daemon_version {
            Some(version) => println!("Docker daemon: {} (reachable)", version),
            None => println!("Docker daemon: not reachable"),
        }
    }
    Ok(())
}

async fn collect(args: &DoctorArgs) -> DoctorInfo {
    let socket_path =
        resolve_domain_socket_path(args.docker_host.as_deref(), |name| std::env::var(name).ok());

    let mut daemon_reachable = false;
    let mut daemon_version = None;
    match connect(args) {
        Ok(docker) => {
            if docker.ping().await.is_ok() {
                daemon_reachable = true;
                daemon_version = docker.version().await.ok();
            }
        }
        Err(err) => debug!("Docker connection failed: {}", err),
    }

    DoctorInfo {
        cli_version: env!("CARGO_PKG_VERSION").to_string(),
        core_version: kiln_core::version().to_string(),
        socket_path,
        daemon_reachable,
        daemon_version,
    }
}

fn connect(args: &DoctorArgs) -> kiln_core::errors::Result<EngineDocker> {
    match args.docker_host.as_deref() {
        Some(host) => {
            let socket = resolve_domain_socket_path(Some(host), |name| std::env::var(name).ok());
            EngineDocker::connect_socket(&socket)
        }
        None => EngineDocker::connect(),
    }
}
