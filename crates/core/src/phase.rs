//! Build phase model
//!
//! A [`Phase`] is the declarative recipe for one lifecycle step executed in
//! its own ephemeral container: the lifecycle binary to invoke, its
//! arguments, volume bindings, and environment. Phases are assembled by the
//! lifecycle executor and applied onto a container configuration just before
//! the container is created.
//!
//! A phase that needs to talk to the Docker daemon declares daemon access;
//! applying such a phase always runs the container as root and binds the
//! host daemon socket to the well-known in-container path. The host socket
//! path is resolved from an explicit override, then the `docker.host`
//! environment variable, then `DOCKER_HOST`, then the default
//! `/var/run/docker.sock`; resolution never fails, it falls back.

use crate::binding::Binding;
use crate::container_config::Update;
use indexmap::IndexMap;
use std::fmt;

const DOCKER_HOST_KEY: &str = "docker.host";

const DOMAIN_SOCKET_PATH: &str = "/var/run/docker.sock";

const UNIX_SCHEME_PREFIX: &str = "unix://";

const LIFECYCLE_BINARY_DIR: &str = "/cnb/lifecycle";

const AUTHOR_LABEL: &str = "author";

const AUTHOR: &str = "kiln";

/// An individual build phase executed as part of a lifecycle run
#[derive(Debug, Clone)]
pub struct Phase {
    name: String,
    verbose: bool,
    daemon_access: bool,
    args: Vec<String>,
    bindings: Vec<Binding>,
    env: IndexMap<String, String>,
    docker_host: Option<String>,
}

impl Phase {
    /// Create a new phase for the named lifecycle binary
    pub fn new(name: impl Into<String>, verbose: bool) -> Self {
        Self {
            name: name.into(),
            verbose,
            daemon_access: false,
            args: Vec::new(),
            bindings: Vec::new(),
            env: IndexMap::new(),
            docker_host: None,
        }
    }

    /// The phase name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Request Docker daemon access for this phase
    pub fn with_daemon_access(&mut self) {
        self.daemon_access = true;
    }

    /// Set an explicit daemon socket path, overriding environment resolution
    pub fn with_docker_host(&mut self, docker_host: Option<String>) {
        self.docker_host = docker_host;
    }

    /// Add a debug log-level argument if verbose logging was requested
    pub fn with_log_level_args(&mut self) {
        if self.verbose {
            self.args.push("-log-level".to_string());
            self.args.push("debug".to_string());
        }
    }

    /// Append run arguments
    pub fn with_args<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
    }

    /// Add a volume binding
    pub fn with_binding(&mut self, binding: Binding) {
        self.bindings.push(binding);
    }

    /// Add an environment variable
    pub fn with_env(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.env.insert(name.into(), value.into());
    }

    /// Apply this phase to a container configuration update
    ///
    /// Sets the command to the lifecycle binary plus the accumulated
    /// arguments, adds the author label, and copies bindings and environment
    /// entries in insertion order. When daemon access was requested the
    /// container runs as root with the host daemon socket bound to
    /// `/var/run/docker.sock`; this holds before any container is created.
    pub fn apply(&self, update: &mut Update) {
        if self.daemon_access {
            update.with_user("root");
            update.with_binding(Binding::from(self.domain_socket_path(), DOMAIN_SOCKET_PATH));
        }
        update.with_command(
            format!("{}/{}", LIFECYCLE_BINARY_DIR, self.name),
            self.args.iter().cloned(),
        );
        update.with_label(AUTHOR_LABEL, AUTHOR);
        for binding in &self.bindings {
            update.with_binding(binding.clone());
        }
        for (name, value) in &self.env {
            update.with_env(name, value);
        }
    }

    fn domain_socket_path(&self) -> String {
        resolve_domain_socket_path(self.docker_host.as_deref(), |name| {
            std::env::var(name).ok()
        })
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Resolve the host-side Docker daemon socket path
///
/// Precedence: explicit override, then the `docker.host` environment
/// variable, then `DOCKER_HOST`, then the built-in default. Empty values
/// and lookup failures fall through silently; a `unix://` scheme prefix is
/// stripped. The `env` lookup is injectable so precedence is testable
/// without touching process-global state.
pub fn resolve_domain_socket_path(
    configured: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> String {
    let candidates = [
        configured.map(str::to_string),
        env(DOCKER_HOST_KEY),
        env(&DOCKER_HOST_KEY.to_uppercase().replace('.', "_")),
    ];
    for candidate in candidates.into_iter().flatten() {
        let path = candidate
            .strip_prefix(UNIX_SCHEME_PREFIX)
            .unwrap_or(&candidate);
        if !path.is_empty() {
            return path.to_string();
        }
    }
    DOMAIN_SOCKET_PATH.to_string()
}
