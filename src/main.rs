//! Entry point for rhconf.
//!
//! This file handles high-level application flow:
//! 1. Parse command-line arguments using `clap`.
//! 2. Read the layout descriptor and the section layout of the final binary.
//! 3. Build the attack configuration: resolve, aggregate, deduplicate.
//! 4. Write the configuration next to the descriptor.
//!
//! Error handling is done via `anyhow`.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use rhconf::binary::ElfLayout;
use rhconf::builder::{config_path_for, Builder};
use rhconf::config::Config;
use rhconf::descriptor::Descriptor;
use rhconf::writer::write_config;

fn main() -> Result<()> {
    let config = Config::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let descriptor = Descriptor::from_path(&config.descriptor)
        .with_context(|| format!("failed to read {}", config.descriptor.display()))?;
    check_target_binary(&descriptor, &config.binary);

    let binary = ElfLayout::open(&config.binary)
        .with_context(|| format!("failed to read {}", config.binary.display()))?;

    let attack_config = Builder::new(binary)
        .with_hammer_count(config.hammer_count)
        .build(&descriptor)
        .context("failed to build attack configuration")?;

    let output = config
        .output
        .unwrap_or_else(|| config_path_for(&config.descriptor));
    write_config(&output, &attack_config)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("Attack configuration written to {}", output.display());
    Ok(())
}

/// Warns when the descriptor was produced for a different binary than the one given.
fn check_target_binary(descriptor: &Descriptor, binary: &Path) {
    let Some(recorded) = descriptor.target_binary() else {
        return;
    };
    if Path::new(recorded).file_name() != binary.file_name() {
        tracing::warn!(
            "Descriptor was generated for {}, but building against {}",
            recorded,
            binary.display()
        );
    }
}
