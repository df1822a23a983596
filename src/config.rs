//! Configuration module.
//!
//! This module defines the command-line interface (CLI) using `clap`.
//! It handles parsing the binary and descriptor paths and the optional overrides.

use clap::Parser;
use std::path::PathBuf;

use crate::writer::DEFAULT_HAMMER_COUNT;

/// Builds the loader's attack configuration for a rowhammer-protected binary.
///
/// Reads the final linked binary and the layout descriptor emitted by the compiler, and
/// writes the attack configuration next to the descriptor.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Final linked binary
    pub binary: PathBuf,

    /// Layout descriptor emitted by the compiler (compiler_output_<id>.txt)
    pub descriptor: PathBuf,

    /// Hammer rounds per aggressor pattern
    #[arg(long, default_value_t = DEFAULT_HAMMER_COUNT)]
    pub hammer_count: u64,

    /// Output file (default: attack_config_<id>.toml next to the descriptor)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub log_level: String,
}
