//! Core builder logic.
//!
//! This module contains the `Builder` struct which turns a layout descriptor into an attack
//! configuration:
//! 1. Resolution: places every victim in a file page and a physical frame.
//! 2. Aggregation: groups victims per file page, rejecting pages bound to two frames.
//! 3. Deduplication: numbers the distinct aggressor patterns.
//! 4. Output: hands back the `AttackConfig` ready to be written.

use std::path::{Path, PathBuf};

use crate::binary::BinaryLayout;
use crate::descriptor::Descriptor;
use crate::error::Result;
use crate::layout::PageAggregator;
use crate::resolver::resolve;
use crate::writer::{AttackConfig, DEFAULT_HAMMER_COUNT};

const DESCRIPTOR_PREFIX: &str = "compiler_output";
const CONFIG_PREFIX: &str = "attack_config";

pub struct Builder<B: BinaryLayout> {
    binary: B,
    hammer_count: u64,
}

impl<B: BinaryLayout> Builder<B> {
    pub fn new(binary: B) -> Self {
        Self {
            binary,
            hammer_count: DEFAULT_HAMMER_COUNT,
        }
    }

    pub fn with_hammer_count(mut self, hammer_count: u64) -> Self {
        self.hammer_count = hammer_count;
        self
    }

    pub fn build(&self, descriptor: &Descriptor) -> Result<AttackConfig> {
        let resolution = resolve(&self.binary, descriptor)?;

        let mut aggregator = PageAggregator::new();
        for victim in &resolution.victims {
            aggregator.add(victim)?;
        }
        let (victim_frames, aggressor_patterns) = aggregator.finish();
        if aggressor_patterns.is_empty() {
            tracing::warn!("Descriptor has no layout records, the configuration is empty");
        }

        tracing::info!(
            "{} victims on {} pages, {} aggressor patterns",
            resolution.victims.len(),
            victim_frames.len(),
            aggressor_patterns.len()
        );

        Ok(AttackConfig {
            hammer_count: self.hammer_count,
            segment_virt_addr: resolution.segment_virt_addr,
            victim_frames,
            aggressor_patterns,
        })
    }
}

/// Derives the configuration path written next to a descriptor.
///
/// `compiler_output_<id>.txt` maps to `attack_config_<id>.toml`.
pub fn config_path_for(descriptor_path: &Path) -> PathBuf {
    let stem = descriptor_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name = match stem.strip_prefix(DESCRIPTOR_PREFIX) {
        Some("") => format!("{CONFIG_PREFIX}.toml"),
        Some(id) if id.starts_with('_') => format!("{CONFIG_PREFIX}{id}.toml"),
        _ if stem.is_empty() => format!("{CONFIG_PREFIX}.toml"),
        _ => format!("{CONFIG_PREFIX}_{stem}.toml"),
    };
    descriptor_path.with_file_name(name)
}
