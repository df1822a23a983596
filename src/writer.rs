//! Attack configuration writer.
//!
//! This module renders the finished configuration as the TOML file read by the loader.
//! Addresses and offsets are written as hex integer literals and strings as single-quoted
//! literals, which serde-based TOML serializers cannot produce, so the text is built here.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::layout::VictimFrame;
use crate::pattern::PatternDeduplicator;

/// Number of hammer rounds per aggressor pattern used when none is given.
pub const DEFAULT_HAMMER_COUNT: u64 = 1_000_000;

/// Runtime configuration of one attack.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    pub hammer_count: u64,
    /// Virtual address the loader maps the `PT_NULL` segment to.
    pub segment_virt_addr: u64,
    pub victim_frames: Vec<VictimFrame>,
    pub aggressor_patterns: PatternDeduplicator,
}

impl AttackConfig {
    /// Renders the configuration as TOML text.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for AttackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "hammer_count = {}", self.hammer_count)?;
        writeln!(f, "segment_virt_addr = {:#x}", self.segment_virt_addr)?;
        if self.victim_frames.is_empty() {
            writeln!(f, "victim_frames = []")?;
        }

        for frame in &self.victim_frames {
            writeln!(f)?;
            writeln!(f, "[[victim_frames]]")?;
            writeln!(f, "page_file_offset = {:#x}", frame.page_file_offset)?;
            writeln!(f, "frame_addr = {:#x}", frame.frame_addr)?;
            writeln!(f, "victim_bits = [")?;
            for bit in &frame.victim_bits {
                writeln!(
                    f,
                    "    {{offset = {:#x}, bitflip = '{}', aggr_pattern_key = '{}'}},",
                    bit.offset_within_frame, bit.bitflip_sign, bit.aggr_pattern_key
                )?;
            }
            writeln!(f, "]")?;
        }

        writeln!(f)?;
        writeln!(f, "[aggressor_patterns]")?;
        for (key, pattern) in self.aggressor_patterns.iter() {
            writeln!(f, "{} = '{}'", key, pattern)?;
        }
        Ok(())
    }
}

/// Writes `config` to `path`.
///
/// The text goes to a temporary sibling first and is renamed into place, so `path` never
/// holds a partial artifact.
pub fn write_config(path: &Path, config: &AttackConfig) -> Result<()> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let written =
        fs::write(&tmp_path, config.render()).and_then(|()| fs::rename(&tmp_path, path));
    if written.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    written?;

    tracing::info!(
        "Wrote {} victim frames and {} aggressor patterns to {}",
        config.victim_frames.len(),
        config.aggressor_patterns.len(),
        path.display()
    );
    Ok(())
}
