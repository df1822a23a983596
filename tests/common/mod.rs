//! Test fixtures: minimal ELF executables and scratch directories.

#![allow(dead_code)]

use object::elf;
use object::endian::{U16, U32, U64};
use object::pod::bytes_of;
use object::Endianness;
use std::path::PathBuf;

const LOAD_VADDR: u64 = 0x40_0000;

/// A section placed at a fixed file offset.
pub struct FixtureSection {
    pub name: &'static str,
    pub file_offset: u64,
    pub size: u64,
}

/// Description of a minimal ELF executable: one `PT_LOAD` segment, any number of `PT_NULL`
/// segments and the given sections. Section contents are zero.
pub struct ElfFixture {
    is_64: bool,
    endian: Endianness,
    sections: Vec<FixtureSection>,
    null_vaddrs: Vec<u64>,
}

impl ElfFixture {
    /// Little-endian ELF64 without a `PT_NULL` segment.
    pub fn new(sections: Vec<FixtureSection>) -> Self {
        Self {
            is_64: true,
            endian: Endianness::Little,
            sections,
            null_vaddrs: Vec::new(),
        }
    }

    pub fn elf32(mut self) -> Self {
        self.is_64 = false;
        self
    }

    pub fn big_endian(mut self) -> Self {
        self.endian = Endianness::Big;
        self
    }

    /// Appends a `PT_NULL` program header at `vaddr`.
    pub fn null_segment(mut self, vaddr: u64) -> Self {
        self.null_vaddrs.push(vaddr);
        self
    }

    fn ehdr_size(&self) -> u64 {
        if self.is_64 { 64 } else { 52 }
    }

    fn phdr_size(&self) -> u64 {
        if self.is_64 { 56 } else { 32 }
    }

    fn shdr_size(&self) -> u64 {
        if self.is_64 { 64 } else { 40 }
    }

    fn u16(&self, v: u64) -> U16<Endianness> {
        U16::new(self.endian, v as u16)
    }

    fn u32(&self, v: u64) -> U32<Endianness> {
        U32::new(self.endian, v as u32)
    }

    fn u64(&self, v: u64) -> U64<Endianness> {
        U64::new(self.endian, v)
    }

    pub fn build(&self) -> Vec<u8> {
        let num_phdrs = 1 + self.null_vaddrs.len() as u64;
        // null section + fixture sections + .shstrtab
        let num_sections = self.sections.len() as u64 + 2;

        let mut shstrtab = vec![0u8];
        let mut name_offsets = Vec::new();
        for section in &self.sections {
            name_offsets.push(shstrtab.len() as u64);
            shstrtab.extend_from_slice(section.name.as_bytes());
            shstrtab.push(0);
        }
        let shstrtab_name = shstrtab.len() as u64;
        shstrtab.extend_from_slice(b".shstrtab\0");

        let data_end = self
            .sections
            .iter()
            .map(|s| s.file_offset + s.size)
            .max()
            .unwrap_or(0)
            .max(self.ehdr_size() + num_phdrs * self.phdr_size());
        let shstrtab_offset = data_end;
        let shoff = (shstrtab_offset + shstrtab.len() as u64 + 7) & !7;

        let mut buffer = Vec::new();
        self.push_file_header(&mut buffer, num_phdrs, num_sections, shoff);

        self.push_program_header(&mut buffer, elf::PT_LOAD, LOAD_VADDR, data_end);
        for vaddr in &self.null_vaddrs {
            self.push_program_header(&mut buffer, elf::PT_NULL, *vaddr, data_end);
        }

        buffer.resize(shstrtab_offset as usize, 0);
        buffer.extend_from_slice(&shstrtab);
        buffer.resize(shoff as usize, 0);

        self.push_section_header(&mut buffer, 0, elf::SHT_NULL, 0, 0, 0);
        for (section, name) in self.sections.iter().zip(&name_offsets) {
            self.push_section_header(
                &mut buffer,
                *name,
                elf::SHT_PROGBITS,
                (elf::SHF_ALLOC | elf::SHF_EXECINSTR) as u64,
                section.file_offset,
                section.size,
            );
        }
        self.push_section_header(
            &mut buffer,
            shstrtab_name,
            elf::SHT_STRTAB,
            0,
            shstrtab_offset,
            shstrtab.len() as u64,
        );

        buffer
    }

    fn push_file_header(&self, buffer: &mut Vec<u8>, phnum: u64, shnum: u64, shoff: u64) {
        let e_ident = elf::Ident {
            magic: elf::ELFMAG,
            class: if self.is_64 { elf::ELFCLASS64 } else { elf::ELFCLASS32 },
            data: match self.endian {
                Endianness::Little => elf::ELFDATA2LSB,
                Endianness::Big => elf::ELFDATA2MSB,
            },
            version: elf::EV_CURRENT,
            os_abi: elf::ELFOSABI_SYSV,
            abi_version: 0,
            padding: [0; 7],
        };
        let machine = match (self.is_64, self.endian) {
            (true, Endianness::Little) => elf::EM_X86_64,
            (false, Endianness::Little) => elf::EM_386,
            (true, Endianness::Big) => elf::EM_PPC64,
            (false, Endianness::Big) => elf::EM_PPC,
        };

        if self.is_64 {
            let header = elf::FileHeader64::<Endianness> {
                e_ident,
                e_type: self.u16(elf::ET_EXEC.into()),
                e_machine: self.u16(machine.into()),
                e_version: self.u32(elf::EV_CURRENT.into()),
                e_entry: self.u64(0),
                e_phoff: self.u64(self.ehdr_size()),
                e_shoff: self.u64(shoff),
                e_flags: self.u32(0),
                e_ehsize: self.u16(self.ehdr_size()),
                e_phentsize: self.u16(self.phdr_size()),
                e_phnum: self.u16(phnum),
                e_shentsize: self.u16(self.shdr_size()),
                e_shnum: self.u16(shnum),
                e_shstrndx: self.u16(shnum - 1),
            };
            buffer.extend_from_slice(bytes_of(&header));
        } else {
            let header = elf::FileHeader32::<Endianness> {
                e_ident,
                e_type: self.u16(elf::ET_EXEC.into()),
                e_machine: self.u16(machine.into()),
                e_version: self.u32(elf::EV_CURRENT.into()),
                e_entry: self.u32(0),
                e_phoff: self.u32(self.ehdr_size()),
                e_shoff: self.u32(shoff),
                e_flags: self.u32(0),
                e_ehsize: self.u16(self.ehdr_size()),
                e_phentsize: self.u16(self.phdr_size()),
                e_phnum: self.u16(phnum),
                e_shentsize: self.u16(self.shdr_size()),
                e_shnum: self.u16(shnum),
                e_shstrndx: self.u16(shnum - 1),
            };
            buffer.extend_from_slice(bytes_of(&header));
        }
    }

    fn push_program_header(&self, buffer: &mut Vec<u8>, p_type: u32, vaddr: u64, size: u64) {
        let flags = (elf::PF_R | elf::PF_X).into();
        if self.is_64 {
            let header = elf::ProgramHeader64::<Endianness> {
                p_type: self.u32(p_type.into()),
                p_flags: self.u32(flags),
                p_offset: self.u64(0),
                p_vaddr: self.u64(vaddr),
                p_paddr: self.u64(vaddr),
                p_filesz: self.u64(size),
                p_memsz: self.u64(size),
                p_align: self.u64(0x1000),
            };
            buffer.extend_from_slice(bytes_of(&header));
        } else {
            let header = elf::ProgramHeader32::<Endianness> {
                p_type: self.u32(p_type.into()),
                p_offset: self.u32(0),
                p_vaddr: self.u32(vaddr),
                p_paddr: self.u32(vaddr),
                p_filesz: self.u32(size),
                p_memsz: self.u32(size),
                p_flags: self.u32(flags),
                p_align: self.u32(0x1000),
            };
            buffer.extend_from_slice(bytes_of(&header));
        }
    }

    fn push_section_header(
        &self,
        buffer: &mut Vec<u8>,
        name: u64,
        sh_type: u32,
        flags: u64,
        offset: u64,
        size: u64,
    ) {
        let addr = if sh_type == elf::SHT_PROGBITS { LOAD_VADDR + offset } else { 0 };
        let align = if sh_type == elf::SHT_PROGBITS { 16 } else { 1 };
        if self.is_64 {
            let header = elf::SectionHeader64::<Endianness> {
                sh_name: self.u32(name),
                sh_type: self.u32(sh_type.into()),
                sh_flags: self.u64(flags),
                sh_addr: self.u64(addr),
                sh_offset: self.u64(offset),
                sh_size: self.u64(size),
                sh_link: self.u32(0),
                sh_info: self.u32(0),
                sh_addralign: self.u64(align),
                sh_entsize: self.u64(0),
            };
            buffer.extend_from_slice(bytes_of(&header));
        } else {
            let header = elf::SectionHeader32::<Endianness> {
                sh_name: self.u32(name),
                sh_type: self.u32(sh_type.into()),
                sh_flags: self.u32(flags),
                sh_addr: self.u32(addr),
                sh_offset: self.u32(offset),
                sh_size: self.u32(size),
                sh_link: self.u32(0),
                sh_info: self.u32(0),
                sh_addralign: self.u32(align),
                sh_entsize: self.u32(0),
            };
            buffer.extend_from_slice(bytes_of(&header));
        }
    }
}

/// Little-endian ELF64 with an optional `PT_NULL` segment at `null_vaddr`.
pub fn elf64(sections: Vec<FixtureSection>, null_vaddr: Option<u64>) -> Vec<u8> {
    let fixture = ElfFixture::new(sections);
    match null_vaddr {
        Some(vaddr) => fixture.null_segment(vaddr).build(),
        None => fixture.build(),
    }
}

/// A fresh, empty directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rhconf-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
