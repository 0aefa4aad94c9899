use anyhow::{anyhow, Context, Result};
use fae_core::memory::ProgramImage;
use fae_core::{ElfObject, FaeError, Relocation, SectionInfo, Symbol};
use goblin::elf::program_header::PT_LOAD;
use goblin::elf::Elf;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

#[cfg(any(test, feature = "fixtures"))]
pub mod fixture;

pub fn load_elf(path: &Path) -> Result<ElfObject> {
    let buffer = fs::read(path).with_context(|| format!("Failed to read ELF file: {:?}", path))?;
    parse_elf(&buffer).with_context(|| format!("Failed to load ELF file: {:?}", path))
}

pub fn parse_elf(buffer: &[u8]) -> Result<ElfObject> {
    let elf = Elf::parse(buffer).context("Failed to parse ELF binary")?;

    if elf.is_64 || !elf.little_endian {
        return Err(FaeError::UnsupportedElf.into());
    }

    info!("ELF Entry Point: {:#x}", elf.entry);

    let section_name = |sh_name: usize| elf.shdr_strtab.get_at(sh_name).unwrap_or("").to_string();

    let sections: Vec<SectionInfo> = elf
        .section_headers
        .iter()
        .map(|sh| SectionInfo {
            name: section_name(sh.sh_name),
            sh_type: sh.sh_type,
        })
        .collect();

    let symbols: Vec<Symbol> = elf
        .syms
        .iter()
        .filter_map(|sym| {
            let name = elf.strtab.get_at(sym.st_name)?;
            (!name.is_empty()).then(|| Symbol {
                name: name.to_string(),
                value: sym.st_value,
            })
        })
        .collect();
    debug!("Found {} named symbols", symbols.len());

    let mut object = ElfObject {
        sections,
        symbols,
        image: ProgramImage::new(elf.entry),
        ..ElfObject::default()
    };

    for (idx, relocs) in &elf.shdr_relocs {
        let name = object
            .sections
            .get(*idx)
            .map(|s| s.name.clone())
            .ok_or_else(|| anyhow!("Relocation section index {} out of range", idx))?;
        let entries: Vec<Relocation> = relocs
            .iter()
            .map(|r| Relocation {
                offset: r.r_offset,
                r_type: r.r_type,
            })
            .collect();
        debug!("Relocation section {}: {} entries", name, entries.len());
        object.relocations.insert(name, entries);
    }

    for ph in &elf.program_headers {
        if ph.p_type == PT_LOAD {
            // Physical address (LMA) is where the bytes live in flash
            let start_addr = ph.p_paddr;
            let size = ph.p_filesz as usize;
            let offset = ph.p_offset as usize;

            if size == 0 {
                continue;
            }

            debug!(
                "Found Loadable Segment: Addr={:#x}, Size={} bytes, Offset={:#x}",
                start_addr, size, offset
            );

            if offset + size > buffer.len() {
                return Err(anyhow!("Segment out of bounds in ELF file"));
            }

            object
                .image
                .add_segment(start_addr, buffer[offset..offset + size].to_vec());
        }
    }

    if object.image.segments.is_empty() {
        warn!("No loadable segments found in ELF file");
    }

    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{ElfFixture, FixtureRelocations};
    use fae_config::ImageLayout;

    #[test]
    fn test_parse_fixture_tables() {
        let object = parse_elf(&ElfFixture::post_issuance_app().to_bytes()).unwrap();

        assert_eq!(object.image.entry_point, 0x1);
        assert!(object.section(".symtab").is_some());
        assert_eq!(object.unique_symbol("__rom_size").unwrap(), 0x10);
        assert_eq!(object.unique_symbol("__rom_ram_end").unwrap(), 0x28);
        assert_eq!(
            object.relocation_offsets(".rel.rom.ram").unwrap(),
            vec![0x20, 0x24]
        );
        assert_eq!(object.image.segments.len(), 2);
        assert_eq!(object.image.flatten().len(), 0x28);
    }

    #[test]
    fn test_missing_symtab_detected() {
        let fixture = ElfFixture {
            symtab: false,
            ..ElfFixture::post_issuance_app()
        };
        let object = parse_elf(&fixture.to_bytes()).unwrap();
        assert_eq!(object.symbol_table().unwrap_err(), FaeError::MissingSymtab);
    }

    #[test]
    fn test_rela_section_rejected() {
        let mut fixture = ElfFixture::post_issuance_app();
        if let Some(rel) = fixture.relocations.as_mut() {
            rel.rela = true;
        }
        let object = parse_elf(&fixture.to_bytes()).unwrap();
        let err = fae_core::build_image(&object, &[], &ImageLayout::default()).unwrap_err();
        assert_eq!(err, FaeError::UnsupportedRela(".rel.rom.ram".to_string()));
    }

    #[test]
    fn test_relocation_type_preserved() {
        let fixture = ElfFixture {
            relocations: Some(FixtureRelocations {
                section: ".rel.rom.ram".to_string(),
                rela: false,
                entries: vec![(0x20, 2), (0x24, 3)],
            }),
            ..ElfFixture::post_issuance_app()
        };
        let object = parse_elf(&fixture.to_bytes()).unwrap();
        let entries = &object.relocations[".rel.rom.ram"];
        assert_eq!(entries[1], Relocation { offset: 0x24, r_type: 3 });
    }

    #[test]
    fn test_64bit_elf_rejected() {
        let fixture = ElfFixture {
            is_64: true,
            ..ElfFixture::post_issuance_app()
        };
        let err = parse_elf(&fixture.to_bytes()).unwrap_err();
        assert_eq!(err.downcast_ref::<FaeError>(), Some(&FaeError::UnsupportedElf));
    }

    #[test]
    fn test_big_endian_elf_rejected() {
        let fixture = ElfFixture {
            big_endian: true,
            ..ElfFixture::post_issuance_app()
        };
        let err = parse_elf(&fixture.to_bytes()).unwrap_err();
        assert_eq!(err.downcast_ref::<FaeError>(), Some(&FaeError::UnsupportedElf));
    }

    #[test]
    fn test_garbage_is_not_elf() {
        assert!(parse_elf(b"definitely not an elf file").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_elf(Path::new("non_existent_file.elf")).unwrap_err();
        assert!(err.to_string().contains("Failed to read ELF file"));
    }
}
