//! Container creation descriptors
//!
//! `ContainerConfig` is the declarative snapshot handed to the
//! container-creation call: image, command, user, labels, environment, and
//! volume bindings. It is built incrementally through an [`Update`] mutation
//! object inside [`ContainerConfig::of`] and frozen once the closure
//! returns; nothing mutates it afterwards.
//!
//! Label and environment insertion order is preserved (`IndexMap`) so that
//! the payload sent to the daemon is deterministic.

use crate::binding::Binding;
use indexmap::IndexMap;

/// Frozen configuration for creating one container
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerConfig {
    image: String,
    user: Option<String>,
    command: Vec<String>,
    labels: IndexMap<String, String>,
    env: IndexMap<String, String>,
    bindings: Vec<Binding>,
    network_mode: Option<String>,
}

impl ContainerConfig {
    /// Create a configuration for the given image, applying `update` before
    /// the snapshot is frozen
    pub fn of(image: impl Into<String>, update: impl FnOnce(&mut Update)) -> Self {
        let mut builder = Update {
            config: ContainerConfig {
                image: image.into(),
                user: None,
                command: Vec::new(),
                labels: IndexMap::new(),
                env: IndexMap::new(),
                bindings: Vec::new(),
                network_mode: None,
            },
        };
        update(&mut builder);
        builder.config
    }

    /// The image reference the container is created from
    pub fn image(&self) -> &str {
        &self.image
    }

    /// The user the container runs as, if overridden
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// The full command (binary and arguments)
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Container labels in insertion order
    pub fn labels(&self) -> &IndexMap<String, String> {
        &self.labels
    }

    /// Environment variables in insertion order
    pub fn env(&self) -> &IndexMap<String, String> {
        &self.env
    }

    /// Volume bindings
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Network mode for the container, if overridden
    pub fn network_mode(&self) -> Option<&str> {
        self.network_mode.as_deref()
    }
}

/// Mutation object used while a [`ContainerConfig`] is being built
#[derive(Debug)]
pub struct Update {
    config: ContainerConfig,
}

impl Update {
    /// Run the container as the given user
    pub fn with_user(&mut self, user: impl Into<String>) {
        self.config.user = Some(user.into());
    }

    /// Set the command and its arguments
    pub fn with_command<I, S>(&mut self, binary: impl Into<String>, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut command = vec![binary.into()];
        command.extend(args.into_iter().map(Into::into));
        self.config.command = command;
    }

    /// Add a container label; a repeated name overwrites the earlier value
    pub fn with_label(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.config.labels.insert(name.into(), value.into());
    }

    /// Add an environment variable; a repeated name overwrites the earlier value
    pub fn with_env(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.config.env.insert(name.into(), value.into());
    }

    /// Add a volume binding
    pub fn with_binding(&mut self, binding: Binding) {
        self.config.bindings.push(binding);
    }

    /// Set the container network mode
    pub fn with_network_mode(&mut self, network_mode: impl Into<String>) {
        self.config.network_mode = Some(network_mode.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_freezes_update_result() {
        let config = ContainerConfig::of("paketobuildpacks/builder-jammy-base:latest", |update| {
            update.with_user("root");
            update.with_command("/cnb/lifecycle/detector", ["-app", "/workspace"]);
            update.with_label("author", "kiln");
            update.with_env("CNB_PLATFORM_API", "0.8");
            update.with_binding(Binding::from("/src", "/workspace"));
        });

        assert_eq!(config.image(), "paketobuildpacks/builder-jammy-base:latest");
        assert_eq!(config.user(), Some("root"));
        assert_eq!(
            config.command(),
            ["/cnb/lifecycle/detector", "-app", "/workspace"]
        );
        assert_eq!(config.labels().get("author").map(String::as_str), Some("kiln"));
        assert_eq!(
            config.env().get("CNB_PLATFORM_API").map(String::as_str),
            Some("0.8")
        );
        assert_eq!(config.bindings(), [Binding::from("/src", "/workspace")]);
        assert_eq!(config.network_mode(), None);
    }

    #[test]
    fn test_defaults_are_empty() {
        let config = ContainerConfig::of("alpine:3.19", |_| {});
        assert_eq!(config.user(), None);
        assert!(config.command().is_empty());
        assert!(config.labels().is_empty());
        assert!(config.env().is_empty());
        assert!(config.bindings().is_empty());
    }

    #[test]
    fn test_env_preserves_insertion_order() {
        let config = ContainerConfig::of("alpine:3.19", |update| {
            update.with_env("B_SECOND", "2");
            update.with_env("A_FIRST", "1");
            update.with_env("C_THIRD", "3");
        });
        let names: Vec<&str> = config.env().keys().map(String::as_str).collect();
        assert_eq!(names, ["B_SECOND", "A_FIRST", "C_THIRD"]);
    }

    #[test]
    fn test_repeated_env_name_overwrites() {
        let config = ContainerConfig::of("alpine:3.19", |update| {
            update.with_env("NAME", "first");
            update.with_env("NAME", "second");
        });
        assert_eq!(config.env().get("NAME").map(String::as_str), Some("second"));
        assert_eq!(config.env().len(), 1);
    }

    #[test]
    fn test_network_mode() {
        let config = ContainerConfig::of("alpine:3.19", |update| {
            update.with_network_mode("host");
        });
        assert_eq!(config.network_mode(), Some("host"));
    }
}
