//! Binary layout provider.
//!
//! This module defines the `BinaryLayout` trait, the only view of the final linked binary the
//! builder needs: where sections start in the file, and where the loader will map the
//! placeholder (`PT_NULL`) segment. `ElfLayout` implements it for ELF executables.

use memmap2::Mmap;
use object::read::elf::{FileHeader, ProgramHeader, SectionHeader};
use object::{elf, Endianness, FileKind};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use crate::error::{BuildError, Result};

/// Section and segment information of a linked binary.
pub trait BinaryLayout {
    /// File offset at which section `name` starts.
    fn section_file_offset(&self, name: &str) -> Result<u64>;

    /// Virtual address of the placeholder segment the loader maps the attack pages into.
    fn null_segment_base_virtual_address(&self) -> Result<u64>;
}

/// Layout of an ELF file, extracted once so the file does not stay mapped.
#[derive(Debug, Clone, Default)]
pub struct ElfLayout {
    sections: HashMap<String, u64>,
    null_segment: Option<u64>,
}

impl ElfLayout {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        // The mapping is dropped at the end of this function.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::parse(&mmap)
    }

    /// Parses ELF32 or ELF64 data of either endianness.
    pub fn parse(data: &[u8]) -> Result<Self> {
        match FileKind::parse(data)? {
            FileKind::Elf32 => Self::parse_elf::<elf::FileHeader32<Endianness>>(data),
            FileKind::Elf64 => Self::parse_elf::<elf::FileHeader64<Endianness>>(data),
            kind => Err(BuildError::UnsupportedBinary(format!("{kind:?}"))),
        }
    }

    fn parse_elf<Elf: FileHeader<Endian = Endianness>>(data: &[u8]) -> Result<Self> {
        let header = Elf::parse(data)?;
        let endian = header.endian()?;

        let mut null_segment = None;
        for segment in header.program_headers(endian, data)? {
            if segment.p_type(endian) != elf::PT_NULL {
                continue;
            }
            let vaddr: u64 = segment.p_vaddr(endian).into();
            if let Some(previous) = null_segment {
                tracing::warn!(
                    "Multiple PT_NULL segments, using {:#x} instead of {:#x}",
                    vaddr,
                    previous
                );
            } else {
                tracing::debug!("Found PT_NULL segment at {:#x}", vaddr);
            }
            // The last PT_NULL header wins.
            null_segment = Some(vaddr);
        }

        let table = header.sections(endian, data)?;
        let mut sections = HashMap::new();
        for section in table.iter() {
            let name = table.section_name(endian, section)?;
            let Ok(name) = std::str::from_utf8(name) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            let offset: u64 = section.sh_offset(endian).into();
            sections.entry(name.to_string()).or_insert(offset);
        }

        Ok(Self {
            sections,
            null_segment,
        })
    }

    /// Builds a layout from already known values.
    ///
    /// This is the seam for binaries whose layout does not come from an ELF file, and for
    /// driving the builder without one.
    pub fn from_parts<I, S>(sections: I, null_segment: Option<u64>) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            sections: sections.into_iter().map(|(n, o)| (n.into(), o)).collect(),
            null_segment,
        }
    }
}

impl BinaryLayout for ElfLayout {
    fn section_file_offset(&self, name: &str) -> Result<u64> {
        self.sections
            .get(name)
            .copied()
            .ok_or_else(|| BuildError::SectionNotFound(name.to_string()))
    }

    fn null_segment_base_virtual_address(&self) -> Result<u64> {
        self.null_segment.ok_or(BuildError::SegmentNotFound)
    }
}
