// FAE Tools - Post-Issuance Software Toolkit
// Copyright (C) 2026 FAE Tools Team
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod elf;
pub mod gdbinit;
pub mod image;
pub mod memory;

pub use elf::{ElfObject, Relocation, SectionInfo, Symbol};
pub use gdbinit::GdbInit;
pub use image::{build_image, output_path, FaeImage, ImageSummary};


#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FaeError {
    #[error(".symtab: no section with this name found")]
    MissingSymtab,
    #[error(".symtab: is not a SHT_SYMTAB section (type {0})")]
    SymtabWrongType(u32),
    #[error(".symtab: {0}: no symbol with this name")]
    MissingSymbol(String),
    #[error(".symtab: {name}: more than one symbol with this name ({count})")]
    DuplicateSymbol { name: String, count: usize },
    #[error("{0}: no relocation section with this name found")]
    MissingRelocationSection(String),
    #[error("{0}: is not a relocation section")]
    NotRelocationSection(String),
    #[error("{0}: unsupported RELA")]
    UnsupportedRela(String),
    #[error("{section}: entry {index}: unsupported relocation type {r_type}")]
    UnsupportedRelocationType {
        section: String,
        index: usize,
        r_type: u32,
    },
    #[error("{what}: value {value:#x} does not fit in a 32-bit word")]
    WordOverflow { what: String, value: u64 },
    #[error("only 32-bit little-endian ELF files are supported")]
    UnsupportedElf,
    #[error("bad ELF file name {0:?}: should be something along the line of name.elf")]
    InvalidElfName(String),
    #[error("nothing has been written into the image")]
    EmptyImage,
    #[error("image is {size} bytes, which exceeds the maximum of {max} bytes")]
    ImageTooLarge { size: u64, max: u64 },
    #[error("invalid layout: {0}")]
    Layout(String),
}

pub type FaeResult<T> = Result<T, FaeError>;

/// Encodes `value` as a little-endian 32-bit word.
pub fn to_word(what: &str, value: u64) -> FaeResult<[u8; 4]> {
    u32::try_from(value)
        .map(u32::to_le_bytes)
        .map_err(|_| FaeError::WordOverflow {
            what: what.to_string(),
            value,
        })
}

/// Rounds `x` up to the next multiple of `align`, which must be a power of
/// two. `None` on overflow.
pub fn align_up(x: u64, align: u64) -> Option<u64> {
    Some(x.checked_add(align - 1)? & !(align - 1))
}
