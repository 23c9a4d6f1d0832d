//! Build lifecycle orchestration
//!
//! Executes the buildpack lifecycle phases in their fixed order inside
//! ephemeral containers created from the builder image. Each phase container
//! must fully exit before the next phase starts; a non-zero exit aborts the
//! whole run and surfaces the phase name and status code. Transport errors
//! abort immediately with no retry. No timeout is enforced here, callers
//! impose their own.

use crate::binding::Binding;
use crate::cache::VolumeName;
use crate::config::BuildRequest;
use crate::container_config::ContainerConfig;
use crate::docker::{BuildLog, DockerApi};
use crate::errors::{LifecycleError, Result};
use crate::phase::Phase;
use std::fmt;
use tracing::{debug, info, warn};

/// Platform API version advertised to the lifecycle binaries
const PLATFORM_API_VERSION: &str = "0.8";

const APP_DIR: &str = "/workspace";

const LAYERS_DIR: &str = "/layers";

const PLATFORM_DIR: &str = "/platform";

const CACHE_DIR: &str = "/cache";

const LAUNCH_CACHE_DIR: &str = "/launch-cache";

const ANALYZED_PATH: &str = "/layers/analyzed.toml";

/// Lifecycle phases in the order the builder runs them
///
/// The execution order is fixed: detect -> analyze -> restore -> build ->
/// export. Restore must precede build, which must precede export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    /// Select the buildpack group that will build the application
    Detect,
    /// Read metadata from the previous image in the daemon
    Analyze,
    /// Restore cached layers from the build cache
    Restore,
    /// Run the selected buildpacks against the application source
    Build,
    /// Export the built layers as an image into the daemon
    Export,
}

impl LifecyclePhase {
    /// The lifecycle binary name for this phase
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecyclePhase::Detect => "detector",
            LifecyclePhase::Analyze => "analyzer",
            LifecyclePhase::Restore => "restorer",
            LifecyclePhase::Build => "builder",
            LifecyclePhase::Export => "exporter",
        }
    }

    /// Returns the phases in execution order
    pub fn spec_order() -> &'static [LifecyclePhase] {
        &[
            LifecyclePhase::Detect,
            LifecyclePhase::Analyze,
            LifecyclePhase::Restore,
            LifecyclePhase::Build,
            LifecyclePhase::Export,
        ]
    }

    /// Whether this phase talks to the Docker daemon through its socket
    ///
    /// Analyze reads the previous image from the daemon and export writes
    /// the new one; the other phases only touch mounted volumes.
    pub fn needs_daemon_access(&self) -> bool {
        matches!(self, LifecyclePhase::Analyze | LifecyclePhase::Export)
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Executor for one build run
///
/// Owns the phases it constructs for the duration of the run; volumes for
/// the build and launch caches are derived from the image name and persist
/// across runs, the layers volume is per-run scratch space.
#[derive(Debug)]
pub struct Lifecycle {
    request: BuildRequest,
    layers_volume: VolumeName,
    build_cache: VolumeName,
    launch_cache: VolumeName,
}

impl Lifecycle {
    /// Create an executor for the given request, failing fast on invalid
    /// configuration
    pub fn new(request: BuildRequest) -> Result<Self> {
        request.validate()?;
        let build_cache = VolumeName::based_on(request.image(), "kiln-cache-", ".build", 6);
        let launch_cache = VolumeName::based_on(request.image(), "kiln-cache-", ".launch", 6);
        let layers_volume = VolumeName::random("kiln-layers-");
        Ok(Self {
            request,
            layers_volume,
            build_cache,
            launch_cache,
        })
    }

    /// The per-image build cache volume
    pub fn build_cache(&self) -> &VolumeName {
        &self.build_cache
    }

    /// The per-image launch cache volume
    pub fn launch_cache(&self) -> &VolumeName {
        &self.launch_cache
    }

    /// Run all phases in order against the given transport
    ///
    /// Stops at the first failing phase; phase container output goes to
    /// `log` when verbose logging was requested.
    pub async fn execute<D: DockerApi>(&self, docker: &D, log: &mut dyn BuildLog) -> Result<()> {
        info!(
            image = self.request.image(),
            builder = self.request.builder(),
            "Running builder lifecycle"
        );
        if self.request.clean_cache() {
            for cache in [&self.build_cache, &self.launch_cache] {
                debug!(volume = %cache, "Discarding cache volume");
                docker.remove_volume(cache.as_str()).await?;
            }
        }
        docker.pull_image(self.request.builder()).await?;
        for kind in LifecyclePhase::spec_order() {
            let phase = self.create_phase(*kind);
            self.run_phase(docker, &phase, log).await?;
        }
        if let Err(err) = docker.remove_volume(self.layers_volume.as_str()).await {
            warn!(volume = %self.layers_volume, "Failed to remove layers volume: {}", err);
        }
        info!(image = self.request.image(), "Successfully built image");
        Ok(())
    }

    fn create_phase(&self, kind: LifecyclePhase) -> Phase {
        let mut phase = Phase::new(kind.as_str(), self.request.verbose());
        phase.with_docker_host(self.request.docker_host().map(str::to_string));
        if kind.needs_daemon_access() {
            phase.with_daemon_access();
        }
        phase.with_log_level_args();
        phase.with_env("CNB_PLATFORM_API", PLATFORM_API_VERSION);
        match kind {
            LifecyclePhase::Detect => {
                phase.with_args(["-app", APP_DIR]);
                phase.with_args(["-platform", PLATFORM_DIR]);
                phase.with_args(["-layers", LAYERS_DIR]);
            }
            LifecyclePhase::Analyze => {
                phase.with_args(["-daemon"]);
                phase.with_args(["-run-image", self.request.run_image()]);
                phase.with_args(["-analyzed", ANALYZED_PATH]);
                phase.with_args(["-layers", LAYERS_DIR]);
                phase.with_args([self.request.image()]);
            }
            LifecyclePhase::Restore => {
                phase.with_args(["-cache-dir", CACHE_DIR]);
                phase.with_args(["-layers", LAYERS_DIR]);
                phase.with_binding(Binding::from(self.build_cache.as_str(), CACHE_DIR));
            }
            LifecyclePhase::Build => {
                phase.with_args(["-app", APP_DIR]);
                phase.with_args(["-platform", PLATFORM_DIR]);
                phase.with_args(["-layers", LAYERS_DIR]);
                for binding in self.request.bindings() {
                    phase.with_binding(binding.clone());
                }
            }
            LifecyclePhase::Export => {
                phase.with_args(["-daemon"]);
                phase.with_args(["-analyzed", ANALYZED_PATH]);
                phase.with_args(["-app", APP_DIR]);
                phase.with_args(["-layers", LAYERS_DIR]);
                phase.with_args(["-cache-dir", CACHE_DIR]);
                phase.with_args(["-launch-cache", LAUNCH_CACHE_DIR]);
                phase.with_args([self.request.image()]);
                phase.with_binding(Binding::from(self.build_cache.as_str(), CACHE_DIR));
                phase.with_binding(Binding::from(self.launch_cache.as_str(), LAUNCH_CACHE_DIR));
            }
        }
        phase.with_binding(Binding::from(self.layers_volume.as_str(), LAYERS_DIR));
        phase.with_binding(Binding::from(
            self.request.app_dir().display().to_string(),
            APP_DIR,
        ));
        if matches!(kind, LifecyclePhase::Detect | LifecyclePhase::Build) {
            for (name, value) in self.request.env() {
                phase.with_env(name, value);
            }
        }
        phase
    }

    async fn run_phase<D: DockerApi>(
        &self,
        docker: &D,
        phase: &Phase,
        log: &mut dyn BuildLog,
    ) -> Result<()> {
        debug!(phase = %phase, "Running lifecycle phase");
        let config = ContainerConfig::of(self.request.builder(), |update| {
            phase.apply(update);
            if let Some(network) = self.request.network() {
                update.with_network_mode(network);
            }
        });
        let id = docker.create_container(&config).await?;
        let result = self.run_container(docker, &id, phase, log).await;
        // The container is removed even when the phase failed; a removal
        // failure must not mask the phase result.
        if let Err(err) = docker.remove_container(&id).await {
            warn!(container = %id, "Failed to remove phase container: {}", err);
        }
        result
    }

    async fn run_container<D: DockerApi>(
        &self,
        docker: &D,
        id: &str,
        phase: &Phase,
        log: &mut dyn BuildLog,
    ) -> Result<()> {
        docker.start_container(id).await?;
        if self.request.verbose() {
            docker.follow_logs(id, log).await?;
        }
        let status = docker.wait_container(id).await?;
        if status != 0 {
            return Err(LifecycleError::PhaseFailed {
                phase: phase.name().to_string(),
                status,
            }
            .into());
        }
        debug!(phase = %phase, "Phase completed");
        Ok(())
    }
}
