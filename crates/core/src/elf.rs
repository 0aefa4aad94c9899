// FAE Tools - Post-Issuance Software Toolkit
// Copyright (C) 2026 FAE Tools Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Format-neutral view of the parts of an ELF file the image builder reads.
//!
//! The loader crate fills an [`ElfObject`] from the raw file; everything
//! here works on already-decoded tables so it can be tested without ELF
//! bytes.

use crate::memory::ProgramImage;
use crate::{FaeError, FaeResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const SHT_SYMTAB: u32 = 2;
pub const SHT_RELA: u32 = 4;
pub const SHT_REL: u32 = 9;

pub const R_ARM_ABS32: u32 = 2;

pub const SYMTAB_SECTION: &str = ".symtab";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionInfo {
    pub name: String,
    pub sh_type: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub value: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Relocation {
    pub offset: u64,
    pub r_type: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElfObject {
    pub sections: Vec<SectionInfo>,
    /// Entries of the `SHT_SYMTAB` section, null symbol excluded.
    pub symbols: Vec<Symbol>,
    /// Entries of every `SHT_REL`/`SHT_RELA` section, keyed by section name.
    pub relocations: HashMap<String, Vec<Relocation>>,
    pub image: ProgramImage,
}

impl ElfObject {
    pub fn section(&self, name: &str) -> Option<&SectionInfo> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// The static symbol table, once `.symtab` is known to be a real one.
    pub fn symbol_table(&self) -> FaeResult<&[Symbol]> {
        match self.section(SYMTAB_SECTION) {
            None => Err(FaeError::MissingSymtab),
            Some(s) if s.sh_type != SHT_SYMTAB => Err(FaeError::SymtabWrongType(s.sh_type)),
            Some(_) => Ok(&self.symbols),
        }
    }

    /// Value of the single symbol called `name`.
    pub fn unique_symbol(&self, name: &str) -> FaeResult<u64> {
        let matches: Vec<u64> = self
            .symbol_table()?
            .iter()
            .filter(|s| s.name == name)
            .map(|s| s.value)
            .collect();

        match matches.as_slice() {
            [] => Err(FaeError::MissingSymbol(name.to_string())),
            [value] => Ok(*value),
            _ => Err(FaeError::DuplicateSymbol {
                name: name.to_string(),
                count: matches.len(),
            }),
        }
    }

    /// Offsets of every entry in the `SHT_REL` section `name`. All entries
    /// must be `R_ARM_ABS32`.
    pub fn relocation_offsets(&self, name: &str) -> FaeResult<Vec<u64>> {
        let section = self
            .section(name)
            .ok_or_else(|| FaeError::MissingRelocationSection(name.to_string()))?;

        match section.sh_type {
            SHT_REL => {}
            SHT_RELA => return Err(FaeError::UnsupportedRela(name.to_string())),
            _ => return Err(FaeError::NotRelocationSection(name.to_string())),
        }

        let entries = self.relocations.get(name).map(Vec::as_slice).unwrap_or(&[]);
        entries
            .iter()
            .enumerate()
            .map(|(index, r)| {
                if r.r_type == R_ARM_ABS32 {
                    Ok(r.offset)
                } else {
                    Err(FaeError::UnsupportedRelocationType {
                        section: name.to_string(),
                        index,
                        r_type: r.r_type,
                    })
                }
            })
            .collect()
    }
}
