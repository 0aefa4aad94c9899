//! Linked-application ELF files for tests, written with `object`.
//!
//! Produces an `ET_EXEC` file with one `PT_LOAD` per segment, an optional
//! `.symtab`/`.strtab` pair and an optional relocation section.

use object::elf::{
    EM_ARM, ET_EXEC, PF_R, PF_X, PT_LOAD, SHF_ALLOC, SHN_ABS, SHT_PROGBITS, STB_GLOBAL,
    STT_NOTYPE,
};
use object::write::elf::{FileHeader, ProgramHeader, Rel, SectionHeader, SectionIndex, Sym, Writer};
use object::Endianness;
use std::io;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct FixtureSegment {
    pub name: String,
    pub addr: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct FixtureRelocations {
    pub section: String,
    pub rela: bool,
    /// `(r_offset, r_type)` pairs.
    pub entries: Vec<(u32, u32)>,
}

#[derive(Debug, Clone)]
pub struct ElfFixture {
    pub entry: u32,
    pub is_64: bool,
    pub big_endian: bool,
    pub segments: Vec<FixtureSegment>,
    pub symtab: bool,
    pub symbols: Vec<(String, u32)>,
    pub relocations: Option<FixtureRelocations>,
}

impl ElfFixture {
    /// A linked application with `.rom` at 0x0, `.rom.ram` at 0x20 (leaving a
    /// 16-byte hole), the six exported symbols and two ABS32 relocations.
    pub fn post_issuance_app() -> Self {
        Self {
            entry: 0x1,
            is_64: false,
            big_endian: false,
            segments: vec![
                FixtureSegment {
                    name: ".rom".to_string(),
                    addr: 0x0,
                    data: (0x10..0x20).collect(),
                },
                FixtureSegment {
                    name: ".rom.ram".to_string(),
                    addr: 0x20,
                    data: (0xD0..0xD8).collect(),
                },
            ],
            symtab: true,
            symbols: [
                ("start", 0x1),
                ("__rom_size", 0x10),
                ("__rom_ram_size", 0x8),
                ("__ram_size", 0x40),
                ("__got_size", 0x4),
                ("__rom_ram_end", 0x28),
                ("main", 0x5),
            ]
            .iter()
            .map(|(n, v)| (n.to_string(), *v))
            .collect(),
            relocations: Some(FixtureRelocations {
                section: ".rel.rom.ram".to_string(),
                rela: false,
                entries: vec![(0x20, 2), (0x24, 2)],
            }),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let endian = if self.big_endian {
            Endianness::Big
        } else {
            Endianness::Little
        };
        let mut out = Vec::new();
        let mut writer = Writer::new(endian, self.is_64, &mut out);

        // Everything is reserved in file order, then written in the same order.
        writer.reserve_file_header();
        writer.reserve_program_headers(self.segments.len() as u32);
        writer.reserve_null_section_index();

        let segments: Vec<_> = self
            .segments
            .iter()
            .map(|seg| {
                let name = writer.add_section_name(seg.name.as_bytes());
                writer.reserve_section_index();
                let offset = writer.reserve(seg.data.len(), 4);
                (seg, name, offset)
            })
            .collect();

        let mut symbols = Vec::new();
        let mut symtab_index = SectionIndex(0);
        if self.symtab {
            writer.reserve_null_symbol_index();
            for (name, value) in &self.symbols {
                let name = writer.add_string(name.as_bytes());
                writer.reserve_symbol_index(None);
                symbols.push((name, *value));
            }
            symtab_index = writer.reserve_symtab_section_index();
            writer.reserve_symtab();
            writer.reserve_strtab_section_index();
            writer.reserve_strtab();
        }

        let relocations = self.relocations.as_ref().map(|rel| {
            let name = writer.add_section_name(rel.section.as_bytes());
            writer.reserve_section_index();
            let offset = writer.reserve_relocations(rel.entries.len(), rel.rela);
            (rel, name, offset)
        });

        writer.reserve_shstrtab_section_index();
        writer.reserve_shstrtab();
        writer.reserve_section_headers();

        writer
            .write_file_header(&FileHeader {
                os_abi: 0,
                abi_version: 0,
                e_type: ET_EXEC,
                e_machine: EM_ARM,
                e_entry: self.entry.into(),
                e_flags: 0x0500_0000,
            })
            .expect("Failed to write ELF fixture header");

        writer.write_align_program_headers();
        for (seg, _, offset) in &segments {
            writer.write_program_header(&ProgramHeader {
                p_type: PT_LOAD,
                p_flags: PF_R | PF_X,
                p_offset: *offset as u64,
                p_vaddr: seg.addr.into(),
                p_paddr: seg.addr.into(),
                p_filesz: seg.data.len() as u64,
                p_memsz: seg.data.len() as u64,
                p_align: 4,
            });
        }

        for (seg, _, _) in &segments {
            writer.write_align(4);
            writer.write(&seg.data);
        }

        if self.symtab {
            writer.write_null_symbol();
            for (name, value) in &symbols {
                writer.write_symbol(&Sym {
                    name: Some(*name),
                    section: None,
                    st_info: (STB_GLOBAL << 4) | STT_NOTYPE,
                    st_other: 0,
                    st_shndx: SHN_ABS,
                    st_value: (*value).into(),
                    st_size: 0,
                });
            }
            writer.write_strtab();
        }

        if let Some((rel, _, _)) = &relocations {
            writer.write_align_relocation();
            for (offset, r_type) in &rel.entries {
                writer.write_relocation(
                    rel.rela,
                    &Rel {
                        r_offset: (*offset).into(),
                        r_sym: u32::from(self.symtab),
                        r_type: *r_type,
                        r_addend: 0,
                    },
                );
            }
        }

        writer.write_shstrtab();

        writer.write_null_section_header();
        for (seg, name, offset) in &segments {
            writer.write_section_header(&SectionHeader {
                name: Some(*name),
                sh_type: SHT_PROGBITS,
                sh_flags: SHF_ALLOC.into(),
                sh_addr: seg.addr.into(),
                sh_offset: *offset as u64,
                sh_size: seg.data.len() as u64,
                sh_link: 0,
                sh_info: 0,
                sh_addralign: 4,
                sh_entsize: 0,
            });
        }
        if self.symtab {
            writer.write_symtab_section_header(1);
            writer.write_strtab_section_header();
        }
        if let Some((rel, name, offset)) = &relocations {
            writer.write_relocation_section_header(
                *name,
                SectionIndex(0),
                symtab_index,
                *offset,
                rel.entries.len(),
                rel.rela,
            );
        }
        writer.write_shstrtab_section_header();

        out
    }

    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.to_bytes())
    }
}
