use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Symbols whose values follow the crt0 blob, in image order.
pub const DEFAULT_EXPORTED_SYMBOLS: [&str; 6] = [
    "start",
    "__rom_size",
    "__rom_ram_size",
    "__ram_size",
    "__got_size",
    "__rom_ram_end",
];

pub const DEFAULT_RELOCATION_TABLES: [&str; 1] = [".rel.rom.ram"];

/// Minimum region alignment of the ARMv7-M MPU.
pub const DEFAULT_ALIGNMENT: u64 = 32;

/// Largest accepted alignment; images are addressed with 32-bit words.
pub const MAX_ALIGNMENT: u64 = 1 << 31;

/// Erased state of NOR/NAND flash.
pub const DEFAULT_PADDING_VALUE: u8 = 0xFF;

/// Describes how a `.fae` image is laid out.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ImageLayout {
    #[serde(default = "default_exported_symbols")]
    pub exported_symbols: Vec<String>,
    #[serde(default = "default_relocation_tables")]
    pub relocation_tables: Vec<String>,
    #[serde(default = "default_alignment")]
    pub alignment: u64,
    #[serde(default = "default_padding_value")]
    pub padding_value: u8,
    /// Human readable, e.g. "256KB". `KB`/`KiB` are 1024 bytes, `kB` is 1000.
    #[serde(default)]
    pub max_image_size: Option<String>,
}

fn default_exported_symbols() -> Vec<String> {
    DEFAULT_EXPORTED_SYMBOLS.iter().map(|s| s.to_string()).collect()
}

fn default_relocation_tables() -> Vec<String> {
    DEFAULT_RELOCATION_TABLES.iter().map(|s| s.to_string()).collect()
}

fn default_alignment() -> u64 {
    DEFAULT_ALIGNMENT
}

fn default_padding_value() -> u8 {
    DEFAULT_PADDING_VALUE
}

impl Default for ImageLayout {
    fn default() -> Self {
        Self {
            exported_symbols: default_exported_symbols(),
            relocation_tables: default_relocation_tables(),
            alignment: default_alignment(),
            padding_value: default_padding_value(),
            max_image_size: None,
        }
    }
}

impl ImageLayout {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open image layout at {:?}", path.as_ref()))?;
        let layout: Self =
            serde_yaml::from_reader(f).context("Failed to parse Image Layout YAML")?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> Result<()> {
        if self.exported_symbols.is_empty() {
            anyhow::bail!("Layout 'exported_symbols' cannot be empty");
        }

        if let Some(name) = self.exported_symbols.iter().find(|s| s.trim().is_empty()) {
            anyhow::bail!("Layout 'exported_symbols' contains an empty name: {:?}", name);
        }

        if self.alignment == 0 || !self.alignment.is_power_of_two() {
            anyhow::bail!(
                "Layout 'alignment' must be a non-zero power of two, got {}",
                self.alignment
            );
        }

        if self.alignment > MAX_ALIGNMENT {
            anyhow::bail!(
                "Layout 'alignment' must not exceed {:#x}, got {:#x}",
                MAX_ALIGNMENT,
                self.alignment
            );
        }

        self.max_image_bytes()?;

        Ok(())
    }

    /// Upper bound for the assembled image, if one is configured.
    pub fn max_image_bytes(&self) -> Result<Option<u64>> {
        self.max_image_size.as_deref().map(parse_size).transpose()
    }
}

pub fn parse_size(size_str: &str) -> Result<u64> {
    use human_size::{Byte, Size, SpecificSize};
    let s: Size = size_str
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid size format: {}", e))?;
    let bytes: SpecificSize<Byte> = s.into();
    Ok(bytes.value() as u64)
}
