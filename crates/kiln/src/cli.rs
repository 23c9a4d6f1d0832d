//! CLI argument parsing and dispatch

use crate::commands;
use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    Text,
    /// JSON structured format
    Json,
}

impl LogFormat {
    fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        }
    }
}

/// Log level options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Error messages only
    Error,
    /// Warning and error messages
    Warn,
    /// Informational messages and above
    Info,
    /// Debug messages and above
    Debug,
    /// All messages including trace
    Trace,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Build OCI images from application source using Cloud Native Buildpacks
#[derive(Debug, Parser)]
#[command(name = "kiln", version, about)]
pub struct Cli {
    /// Log output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub log_format: LogFormat,

    /// Default log level when KILN_LOG and RUST_LOG are unset
    #[arg(long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Docker daemon socket path (overrides DOCKER_HOST)
    #[arg(long, global = true)]
    pub docker_host: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// kiln subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build an image from an application directory
    Build {
        /// Name of the image to build (e.g. myapp:latest)
        #[arg(long)]
        image: Option<String>,

        /// Application directory
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Builder image
        #[arg(long)]
        builder: Option<String>,

        /// Run image paired with the builder
        #[arg(long)]
        run_image: Option<String>,

        /// Environment variable for the detect and build phases (NAME=VALUE, can be repeated)
        #[arg(long = "env", action = ArgAction::Append)]
        env: Vec<String>,

        /// Additional volume binding for the build phase (SOURCE:TARGET, can be repeated)
        #[arg(long = "volume", action = ArgAction::Append)]
        volume: Vec<String>,

        /// Network mode for phase containers
        #[arg(long)]
        network: Option<String>,

        /// Discard cache volumes before building
        #[arg(long)]
        clean_cache: bool,

        /// Stream phase container logs
        #[arg(long, short)]
        verbose: bool,
    },
    /// Report Docker daemon connectivity diagnostics
    Doctor {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Dispatch the parsed command
    pub async fn dispatch(self) -> Result<()> {
        kiln_core::logging::init(
            Some(self.log_format.as_str()),
            self.log_level.map(|level| level.as_str()),
        )?;

        match self.command {
            Commands::Build {
                image,
                path,
                builder,
                run_image,
                env,
                volume,
                network,
                clean_cache,
                verbose,
            } => {
                let args = commands::build::BuildArgs {
                    image,
                    path,
                    builder,
                    run_image,
                    env,
                    volume,
                    network,
                    clean_cache,
                    verbose,
                    docker_host: self.docker_host,
                };
                commands::build::execute(args).await
            }
            Commands::Doctor { json } => {
                let args = commands::doctor::DoctorArgs {
                    json,
                    docker_host: self.docker_host,
                };
                commands::doctor::execute(args).await
            }
        }
    }
}
