//! Build configuration resolution
//!
//! A [`BuildRequest`] carries the validated parameters for one build run:
//! the image to produce, the builder to run it with, the application
//! directory, and the knobs that shape phase execution (env, extra
//! bindings, cache behavior, verbosity, network, daemon socket override).
//!
//! Defaults come from built-in conventions, optionally overridden by a
//! `kiln.toml` project file in the application directory, overridden in
//! turn by whatever the caller (the CLI) sets explicitly. Unknown keys in
//! the project file are logged at DEBUG level for forward compatibility.

use crate::binding::Binding;
use crate::errors::{ConfigError, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Builder image used when neither the CLI nor kiln.toml names one
pub const DEFAULT_BUILDER: &str = "paketobuildpacks/builder-jammy-base:latest";

/// Run image paired with the default builder
pub const DEFAULT_RUN_IMAGE: &str = "paketobuildpacks/run-jammy-base:latest";

/// Project file name discovered in the application directory
pub const PROJECT_FILE_NAME: &str = "kiln.toml";

/// Validated parameters for one build run
#[derive(Debug, Clone)]
pub struct BuildRequest {
    image: String,
    builder: String,
    run_image: Option<String>,
    app_dir: PathBuf,
    env: IndexMap<String, String>,
    bindings: Vec<Binding>,
    clean_cache: bool,
    verbose: bool,
    docker_host: Option<String>,
    network: Option<String>,
}

impl BuildRequest {
    /// Create a request to build `image` from the application in `app_dir`
    pub fn new(image: impl Into<String>, app_dir: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            builder: DEFAULT_BUILDER.to_string(),
            run_image: None,
            app_dir: app_dir.into(),
            env: IndexMap::new(),
            bindings: Vec::new(),
            clean_cache: false,
            verbose: false,
            docker_host: None,
            network: None,
        }
    }

    /// Use a specific builder image
    pub fn with_builder(mut self, builder: impl Into<String>) -> Self {
        self.builder = builder.into();
        self
    }

    /// Use a specific run image instead of the default paired one
    pub fn with_run_image(mut self, run_image: impl Into<String>) -> Self {
        self.run_image = Some(run_image.into());
        self
    }

    /// Add an environment variable for the detect and build phases
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Add an extra volume binding for the build phase
    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Discard the build and launch cache volumes before building
    pub fn with_clean_cache(mut self, clean_cache: bool) -> Self {
        self.clean_cache = clean_cache;
        self
    }

    /// Stream phase container logs
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Override the host Docker daemon socket path
    pub fn with_docker_host(mut self, docker_host: Option<String>) -> Self {
        self.docker_host = docker_host;
        self
    }

    /// Run phase containers on a specific network
    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    /// Name of the image to build
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Builder image reference
    pub fn builder(&self) -> &str {
        &self.builder
    }

    /// Run image reference, defaulted when not set explicitly
    pub fn run_image(&self) -> &str {
        self.run_image.as_deref().unwrap_or(DEFAULT_RUN_IMAGE)
    }

    /// Application directory on the host
    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    /// Environment for the detect and build phases
    pub fn env(&self) -> &IndexMap<String, String> {
        &self.env
    }

    /// Extra bindings for the build phase
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Whether cache volumes are discarded before the run
    pub fn clean_cache(&self) -> bool {
        self.clean_cache
    }

    /// Whether phase container logs are streamed
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Explicit daemon socket path, if any
    pub fn docker_host(&self) -> Option<&str> {
        self.docker_host.as_deref()
    }

    /// Network mode for phase containers, if any
    pub fn network(&self) -> Option<&str> {
        self.network.as_deref()
    }

    /// Validate the request before any container is created
    pub fn validate(&self) -> Result<()> {
        validate_image_reference(&self.image)?;
        if !self.app_dir.is_dir() {
            return Err(ConfigError::Validation {
                message: format!(
                    "Application directory '{}' does not exist or is not a directory",
                    self.app_dir.display()
                ),
            }
            .into());
        }
        for binding in &self.bindings {
            binding.validate()?;
        }
        Ok(())
    }
}

/// Validate an image reference of the form `[registry/][namespace/]name[:tag]`
///
/// Repository components must be lowercase alphanumerics with dots, hyphens,
/// and underscores; the tag allows uppercase as well. This is a syntactic
/// check only, the daemon has the final word.
pub fn validate_image_reference(reference: &str) -> Result<()> {
    if reference.is_empty() {
        return Err(ConfigError::Validation {
            message: "Image name must not be empty".to_string(),
        }
        .into());
    }

    let (name_part, tag) = match reference.rsplit_once(':') {
        // A ':' followed by a '/' belongs to a registry:port prefix
        Some((_, after)) if after.contains('/') => (reference, None),
        Some((before, after)) => (before, Some(after)),
        None => (reference, None),
    };

    if let Some(tag) = tag {
        if tag.is_empty() {
            return Err(ConfigError::Validation {
                message: format!("Image tag after ':' must not be empty in '{}'", reference),
            }
            .into());
        }
        if !tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
        {
            return Err(ConfigError::Validation {
                message: format!("Image tag '{}' contains invalid characters", tag),
            }
            .into());
        }
    }

    for (index, component) in name_part.split('/').enumerate() {
        if component.is_empty() {
            return Err(ConfigError::Validation {
                message: format!("Image reference '{}' contains an empty component", reference),
            }
            .into());
        }
        // The first component may be a registry host with dots and a port
        if index == 0 && (component.contains('.') || component.contains(':')) {
            continue;
        }
        if !component
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-' || c == '_')
        {
            return Err(ConfigError::Validation {
                message: format!(
                    "Image name component '{}' contains invalid characters; only lowercase alphanumerics, dots, hyphens, and underscores are allowed",
                    component
                ),
            }
            .into());
        }
    }

    Ok(())
}

/// Project-level build settings parsed from `kiln.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectConfig {
    /// `[build]` table
    pub build: Option<BuildSection>,

    #[serde(flatten)]
    unknown: HashMap<String, toml::Value>,
}

/// `[build]` table of a project file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuildSection {
    /// Name of the image to build
    pub image: Option<String>,
    /// Builder image reference
    pub builder: Option<String>,
    /// Run image reference
    pub run_image: Option<String>,
    /// Network mode for phase containers
    pub network: Option<String>,
    /// Environment for the detect and build phases
    pub env: Option<IndexMap<String, String>>,

    #[serde(flatten)]
    unknown: HashMap<String, toml::Value>,
}

impl ProjectConfig {
    /// Discover and load `kiln.toml` in the given directory
    ///
    /// Returns `Ok(None)` when the directory has no project file.
    pub fn discover(dir: &Path) -> Result<Option<ProjectConfig>> {
        let path = dir.join(PROJECT_FILE_NAME);
        if !path.is_file() {
            debug!("No {} found in {}", PROJECT_FILE_NAME, dir.display());
            return Ok(None);
        }
        Ok(Some(Self::load_from_path(&path)?))
    }

    /// Load a project file from an explicit path
    pub fn load_from_path(path: &Path) -> Result<ProjectConfig> {
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let config: ProjectConfig =
            toml::from_str(&content).map_err(|err| ConfigError::Parsing {
                message: err.to_string(),
            })?;
        config.log_unknown_keys(path);
        Ok(config)
    }

    fn log_unknown_keys(&self, path: &Path) {
        for key in self.unknown.keys() {
            debug!("Ignoring unknown key '{}' in {}", key, path.display());
        }
        if let Some(build) = &self.build {
            for key in build.unknown.keys() {
                debug!("Ignoring unknown key 'build.{}' in {}", key, path.display());
            }
        }
    }
}
