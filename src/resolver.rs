//! Resolution of section-relative victims to file pages and physical frames.

use crate::binary::BinaryLayout;
use crate::descriptor::{Descriptor, LayoutRecord};
use crate::error::{BuildError, Result};
use crate::utils::{align_down, page_offset, PAGE_SIZE};

/// A layout record placed in the file and in physical memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVictim<'a> {
    pub record: &'a LayoutRecord,
    /// Page-aligned absolute file offset of the victim.
    pub page_file_offset: u64,
    /// Page-aligned physical address of the victim.
    pub frame_addr: u64,
    pub offset_within_frame: u64,
}

impl<'a> ResolvedVictim<'a> {
    /// Places `record` given the file offset of the section it lives in.
    pub fn new(record: &'a LayoutRecord, section_file_offset: u64) -> Result<Self> {
        let absolute = section_file_offset
            .checked_add(record.offset_in_section)
            .ok_or_else(|| BuildError::OffsetOverflow {
                section: record.section_name.clone(),
                offset: record.offset_in_section,
            })?;
        let victim = record.physical_victim_address;
        Ok(Self {
            record,
            page_file_offset: align_down(absolute, PAGE_SIZE),
            frame_addr: align_down(victim, PAGE_SIZE),
            offset_within_frame: page_offset(victim),
        })
    }
}

/// All victims of a descriptor, resolved against one binary.
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    /// Base virtual address of the `PT_NULL` segment.
    pub segment_virt_addr: u64,
    /// Victims in descriptor processing order.
    pub victims: Vec<ResolvedVictim<'a>>,
}

pub fn resolve<'a, B>(binary: &B, descriptor: &'a Descriptor) -> Result<Resolution<'a>>
where
    B: BinaryLayout + ?Sized,
{
    let segment_virt_addr = binary.null_segment_base_virtual_address()?;
    tracing::debug!("Attack segment is mapped at {:#x}", segment_virt_addr);

    let mut victims = Vec::with_capacity(descriptor.record_count());
    for (section, records) in &descriptor.layout {
        let section_offset = binary.section_file_offset(section)?;
        tracing::debug!(
            "Section {} starts at file offset {:#x} ({} victims)",
            section,
            section_offset,
            records.len()
        );
        for record in records {
            victims.push(ResolvedVictim::new(record, section_offset)?);
        }
    }

    Ok(Resolution {
        segment_virt_addr,
        victims,
    })
}
