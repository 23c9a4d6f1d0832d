//! Docker Engine API transport
//!
//! Thin async client abstraction over the container lifecycle calls a build
//! needs: create, start, follow logs, wait, remove, plus image pull and
//! volume removal. [`EngineDocker`] implements the trait against the daemon
//! socket via bollard. Transport failures are fatal for the build in
//! progress and are never retried here.

use crate::container_config::ContainerConfig;
use crate::errors::{Result, TransportError};
use bollard::container::{
    Config, LogsOptions, RemoveContainerOptions, StartContainerOptions, WaitContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::HostConfig;
use bollard::volume::RemoveVolumeOptions;
use bollard::Docker;
use futures_util::TryStreamExt;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Sink for phase container output lines
pub trait BuildLog {
    /// Consume one line of container output
    fn line(&mut self, line: &str);
}

/// Default build log writing container output to stderr
///
/// Stdout stays reserved for command output.
#[derive(Debug, Default)]
pub struct StderrLog;

impl BuildLog for StderrLog {
    fn line(&mut self, line: &str) {
        eprintln!("{}", line);
    }
}

/// Docker Engine API client abstraction
#[allow(async_fn_in_trait)]
pub trait DockerApi {
    /// Health check for daemon availability
    async fn ping(&self) -> Result<()>;

    /// Daemon version string for diagnostics
    async fn version(&self) -> Result<String>;

    /// Pull an image so it is present in the daemon
    async fn pull_image(&self, reference: &str) -> Result<()>;

    /// Create a container from a frozen configuration, returning its id
    async fn create_container(&self, config: &ContainerConfig) -> Result<String>;

    /// Start a created container
    async fn start_container(&self, id: &str) -> Result<()>;

    /// Stream a running container's output into the given log until it exits
    async fn follow_logs(&self, id: &str, log: &mut dyn BuildLog) -> Result<()>;

    /// Block until the container exits and return its status code
    async fn wait_container(&self, id: &str) -> Result<i64>;

    /// Force-remove a container and its anonymous volumes
    async fn remove_container(&self, id: &str) -> Result<()>;

    /// Force-remove a named volume
    async fn remove_volume(&self, name: &str) -> Result<()>;
}

// Implement DockerApi for references to types that implement DockerApi

impl<T: DockerApi> DockerApi for &T {
    async fn ping(&self) -> Result<()> {
        (*self).ping().await
    }

    async fn version(&self) -> Result<String> {
        (*self).version().await
    }

    async fn pull_image(&self, reference: &str) -> Result<()> {
        (*self).pull_image(reference).await
    }

    async fn create_container(&self, config: &ContainerConfig) -> Result<String> {
        (*self).create_container(config).await
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        (*self).start_container(id).await
    }

    async fn follow_logs(&self, id: &str, log: &mut dyn BuildLog) -> Result<()> {
        (*self).follow_logs(id, log).await
    }

    async fn wait_container(&self, id: &str) -> Result<i64> {
        (*self).wait_container(id).await
    }

    async fn remove_container(&self, id: &str) -> Result<()> {
        (*self).remove_container(id).await
    }

    async fn remove_volume(&self, name: &str) -> Result<()> {
        (*self).remove_volume(name).await
    }
}

/// Engine API implementation over the local daemon socket
#[derive(Debug, Clone)]
pub struct EngineDocker {
    client: Docker,
}

const CONNECT_TIMEOUT_SECS: u64 = 120;

impl EngineDocker {
    /// Connect using the local platform defaults (honors `DOCKER_HOST`)
    pub fn connect() -> Result<Self> {
        let client = Docker::connect_with_local_defaults().map_err(TransportError::Api)?;
        Ok(Self { client })
    }

    /// Connect to an explicit unix socket path
    pub fn connect_socket(path: &str) -> Result<Self> {
        let client = Docker::connect_with_unix(
            path,
            CONNECT_TIMEOUT_SECS,
            bollard::API_DEFAULT_VERSION,
        )
        .map_err(TransportError::Api)?;
        Ok(Self { client })
    }
}

/// Translate a frozen [`ContainerConfig`] into the Engine API payload
fn engine_config(config: &ContainerConfig) -> Config<String> {
    let env: Vec<String> = config
        .env()
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    let binds: Vec<String> = config
        .bindings()
        .iter()
        .map(|binding| binding.to_string())
        .collect();
    let labels: HashMap<String, String> = config
        .labels()
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    let host_config = HostConfig {
        binds: (!binds.is_empty()).then_some(binds),
        network_mode: config.network_mode().map(str::to_string),
        ..Default::default()
    };
    Config {
        image: Some(config.image().to_string()),
        cmd: (!config.command().is_empty()).then(|| config.command().to_vec()),
        user: config.user().map(str::to_string),
        env: (!env.is_empty()).then_some(env),
        labels: (!labels.is_empty()).then_some(labels),
        host_config: Some(host_config),
        ..Default::default()
    }
}

impl DockerApi for EngineDocker {
    async fn ping(&self) -> Result<()> {
        self.client
            .ping()
            .await
            .map_err(|err| TransportError::Unreachable {
                message: err.to_string(),
            })?;
        Ok(())
    }

    async fn version(&self) -> Result<String> {
        let version = self
            .client
            .version()
            .await
            .map_err(TransportError::Api)?;
        let daemon = version.version.unwrap_or_else(|| "unknown".to_string());
        let api = version.api_version.unwrap_or_else(|| "unknown".to_string());
        Ok(format!("{} (API {})", daemon, api))
    }

    async fn pull_image(&self, reference: &str) -> Result<()> {
        debug!("Pulling image '{}'", reference);
        let options = CreateImageOptions::<String> {
            from_image: reference.to_string(),
            ..Default::default()
        };
        let mut stream = self.client.create_image(Some(options), None, None);
        while let Some(progress) = stream.try_next().await.map_err(TransportError::Api)? {
            if let Some(status) = progress.status {
                trace!(image = reference, "{}", status);
            }
        }
        Ok(())
    }

    async fn create_container(&self, config: &ContainerConfig) -> Result<String> {
        let payload = engine_config(config);
        let response = self
            .client
            .create_container::<String, String>(None, payload)
            .await
            .map_err(TransportError::Api)?;
        debug!(container = %response.id, image = config.image(), "Created container");
        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<()> {
        self.client
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(TransportError::Api)?;
        Ok(())
    }

    async fn follow_logs(&self, id: &str, log: &mut dyn BuildLog) -> Result<()> {
        let options = LogsOptions::<String> {
            follow: true,
            stdout: true,
            stderr: true,
            ..Default::default()
        };
        let mut stream = self.client.logs(id, Some(options));
        while let Some(output) = stream.try_next().await.map_err(TransportError::Api)? {
            let chunk = String::from_utf8_lossy(&output.into_bytes()).into_owned();
            for line in chunk.lines() {
                log.line(line);
            }
        }
        Ok(())
    }

    async fn wait_container(&self, id: &str) -> Result<i64> {
        let options = WaitContainerOptions {
            condition: "not-running".to_string(),
        };
        let mut stream = self.client.wait_container(id, Some(options));
        match stream.try_next().await {
            Ok(Some(response)) => Ok(response.status_code),
            Ok(None) => Err(TransportError::ContainerNotFound { id: id.to_string() }.into()),
            // bollard surfaces a non-zero exit as an error; that is a phase
            // result here, not a transport failure
            Err(bollard::errors::Error::DockerContainerWaitError { code, .. }) => Ok(code),
            Err(err) => Err(TransportError::Api(err).into()),
        }
    }

    async fn remove_container(&self, id: &str) -> Result<()> {
        let options = RemoveContainerOptions {
            force: true,
            v: true,
            ..Default::default()
        };
        self.client
            .remove_container(id, Some(options))
            .await
            .map_err(TransportError::Api)?;
        Ok(())
    }

    async fn remove_volume(&self, name: &str) -> Result<()> {
        let options = RemoveVolumeOptions { force: true };
        self.client
            .remove_volume(name, Some(options))
            .await
            .map_err(TransportError::Api)?;
        Ok(())
    }
}
