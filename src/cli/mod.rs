//! CLI module for FrameGrab
//!
//! This module handles command-line argument parsing and command execution.

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// FrameGrab CLI
///
/// A command-line tool for extracting event screenshots from screen
/// recordings, driven by timestamped events from an upstream analysis stage.
#[derive(Parser)]
#[command(name = "framegrab")]
#[command(about = "FrameGrab - Event screenshot extraction from screen recordings")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Extract screenshots for a set of timestamped events
    Extract(args::ExtractArgs),
    /// Probe a video file for its duration
    Probe(args::ProbeArgs),
}
