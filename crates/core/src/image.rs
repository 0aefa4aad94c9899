use crate::elf::ElfObject;
use crate::{align_up, to_word, FaeError, FaeResult};
use fae_config::ImageLayout;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const FAE_EXTENSION: &str = "fae";
pub const ELF_EXTENSION: &str = "elf";

/// Sizes and exported values of an assembled image.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageSummary {
    pub crt0_size: usize,
    pub symbols_size: usize,
    pub relocations_size: usize,
    pub metadata_size: usize,
    pub partition_size: usize,
    pub padding_size: usize,
    pub total_size: usize,
    pub symbols: Vec<(String, u32)>,
    pub relocation_counts: Vec<(String, usize)>,
}

#[derive(Debug, Clone)]
pub struct FaeImage {
    pub bytes: Vec<u8>,
    pub summary: ImageSummary,
}

impl FaeImage {
    pub fn metadata_size(&self) -> usize {
        self.summary.metadata_size
    }
}

/// Assembles crt0, symbol words, relocation tables, the flat partition and
/// the trailing padding into one image.
pub fn build_image(object: &ElfObject, crt0: &[u8], layout: &ImageLayout) -> FaeResult<FaeImage> {
    layout
        .validate()
        .map_err(|e| FaeError::Layout(e.to_string()))?;

    let mut bytes = Vec::with_capacity(crt0.len());
    let mut summary = ImageSummary::default();

    bytes.extend_from_slice(crt0);
    summary.crt0_size = crt0.len();
    debug!("crt0: {} bytes", crt0.len());

    for name in &layout.exported_symbols {
        let value = object.unique_symbol(name)?;
        let word = to_word(name, value)?;
        debug!("Symbol {} = {:#x}", name, value);
        bytes.extend_from_slice(&word);
        summary.symbols.push((name.clone(), u32::from_le_bytes(word)));
    }
    summary.symbols_size = bytes.len() - summary.crt0_size;

    for name in &layout.relocation_tables {
        let offsets = object.relocation_offsets(name)?;
        bytes.extend_from_slice(&to_word(name, offsets.len() as u64)?);
        for (index, offset) in offsets.iter().enumerate() {
            bytes.extend_from_slice(&to_word(&format!("{} entry {}", name, index), *offset)?);
        }
        debug!("Relocation table {}: {} entries", name, offsets.len());
        summary.relocation_counts.push((name.clone(), offsets.len()));
    }
    summary.metadata_size = bytes.len();
    summary.relocations_size = summary.metadata_size - summary.crt0_size - summary.symbols_size;

    let partition = object.image.flatten();
    summary.partition_size = partition.len();
    bytes.extend_from_slice(&partition);

    let unpadded = bytes.len() as u64;
    let padded = align_up(unpadded, layout.alignment).ok_or(FaeError::ImageTooLarge {
        size: unpadded,
        max: u64::MAX,
    })?;

    if padded == 0 {
        return Err(FaeError::EmptyImage);
    }

    let max = layout
        .max_image_bytes()
        .map_err(|e| FaeError::Layout(e.to_string()))?;
    if let Some(max) = max {
        if padded > max {
            return Err(FaeError::ImageTooLarge { size: padded, max });
        }
    }

    let padded = usize::try_from(padded).map_err(|_| FaeError::ImageTooLarge {
        size: padded,
        max: usize::MAX as u64,
    })?;
    summary.padding_size = padded - bytes.len();
    bytes.resize(padded, layout.padding_value);
    summary.total_size = bytes.len();

    info!(
        "Image assembled: {} bytes (metadata {}, partition {}, padding {})",
        summary.total_size, summary.metadata_size, summary.partition_size, summary.padding_size
    );

    Ok(FaeImage { bytes, summary })
}

/// Maps `dir/name.elf` to `dir/name.fae`. The file name must contain
/// exactly one dot and end in `.elf`.
pub fn output_path(elf: &Path) -> FaeResult<PathBuf> {
    let invalid = || FaeError::InvalidElfName(elf.display().to_string());

    let file_name = elf.file_name().and_then(|n| n.to_str()).ok_or_else(invalid)?;
    let parts: Vec<&str> = file_name.split('.').collect();
    match parts.as_slice() {
        [stem, ext] if !stem.is_empty() && *ext == ELF_EXTENSION => {
            Ok(elf.with_file_name(format!("{}.{}", stem, FAE_EXTENSION)))
        }
        _ => Err(invalid()),
    }
}
