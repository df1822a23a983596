//! Victim frame layout.
//!
//! This module groups resolved victims by the file page that contains them. Each file page
//! becomes one `VictimFrame`: the loader copies that page into exactly one physical frame, so
//! every victim on the page must agree on which frame that is.

use indexmap::IndexMap;

use crate::descriptor::BitflipSign;
use crate::error::{BuildError, Result};
use crate::pattern::{AggressorPattern, PatternDeduplicator, PatternKey};
use crate::resolver::ResolvedVictim;

/// A single bit expected to flip inside a victim frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VictimBit {
    /// Offset of the victim byte within the frame.
    pub offset_within_frame: u64,
    pub bitflip_sign: BitflipSign,
    /// Aggressor pattern used to flip this bit.
    pub aggr_pattern_key: PatternKey,
}

/// A file page pinned to a physical frame, with the bits expected to flip in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VictimFrame {
    /// Page-aligned file offset of the page.
    pub page_file_offset: u64,
    /// Page-aligned physical address the page must be loaded into.
    pub frame_addr: u64,
    /// Victim bits in record arrival order.
    pub victim_bits: Vec<VictimBit>,
}

/// A victim bit whose pattern has not been assigned a key yet.
#[derive(Debug, Clone)]
struct PendingBit {
    offset_within_frame: u64,
    bitflip_sign: BitflipSign,
    pattern: AggressorPattern,
}

#[derive(Debug, Clone)]
struct PendingFrame {
    frame_addr: u64,
    bits: Vec<PendingBit>,
}

/// Collects resolved victims into frames, keyed by page file offset in first-sight order.
#[derive(Debug, Default)]
pub struct PageAggregator {
    frames: IndexMap<u64, PendingFrame>,
}

impl PageAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one victim, failing if its page is already bound to another frame.
    pub fn add(&mut self, victim: &ResolvedVictim<'_>) -> Result<()> {
        let frame = self
            .frames
            .entry(victim.page_file_offset)
            .or_insert_with(|| {
                tracing::debug!(
                    "Page at file offset {:#x} goes to frame {:#x}",
                    victim.page_file_offset,
                    victim.frame_addr
                );
                PendingFrame {
                    frame_addr: victim.frame_addr,
                    bits: Vec::new(),
                }
            });

        if frame.frame_addr != victim.frame_addr {
            return Err(BuildError::FrameCollision {
                page_file_offset: victim.page_file_offset,
                existing: frame.frame_addr,
                conflicting: victim.frame_addr,
            });
        }

        let record = victim.record;
        frame.bits.push(PendingBit {
            offset_within_frame: victim.offset_within_frame,
            bitflip_sign: record.bitflip_sign,
            pattern: AggressorPattern::new(
                record.aggressor_addresses.clone(),
                record.aggressor_init,
            ),
        });
        Ok(())
    }

    /// Finalises the frames, numbering aggressor patterns in frame order, then bit order.
    pub fn finish(self) -> (Vec<VictimFrame>, PatternDeduplicator) {
        let mut patterns = PatternDeduplicator::new();
        let frames = self
            .frames
            .into_iter()
            .map(|(page_file_offset, pending)| VictimFrame {
                page_file_offset,
                frame_addr: pending.frame_addr,
                victim_bits: pending
                    .bits
                    .into_iter()
                    .map(|bit| VictimBit {
                        offset_within_frame: bit.offset_within_frame,
                        bitflip_sign: bit.bitflip_sign,
                        aggr_pattern_key: patterns.lookup_or_insert(bit.pattern),
                    })
                    .collect(),
            })
            .collect();
        (frames, patterns)
    }
}
