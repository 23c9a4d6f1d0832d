//! Command implementations
//!
//! This module contains implementations for all CLI subcommands.

pub mod build;
pub mod doctor;
