use crate::elf::ElfObject;
use crate::FaeResult;
use std::fmt;
use std::path::PathBuf;

pub const GDBINIT_FILE: &str = "gdbinit";

/// GDB script that places the crt0 and application symbols at the
/// addresses the image occupies once flashed.
#[derive(Debug, Clone, PartialEq)]
pub struct GdbInit {
    pub metadata_size: u64,
    pub text_size: u64,
    pub got_size: u64,
    pub data_size: u64,
    pub bss_size: u64,
    pub crt0_elf: PathBuf,
    pub app_elf: PathBuf,
}

impl GdbInit {
    pub fn from_object(
        object: &ElfObject,
        metadata_size: usize,
        crt0_elf: PathBuf,
        app_elf: PathBuf,
    ) -> FaeResult<Self> {
        Ok(Self {
            metadata_size: metadata_size as u64,
            text_size: object.unique_symbol("__rom_size")?,
            got_size: object.unique_symbol("__got_size")?,
            data_size: object.unique_symbol("__rom_ram_size")?,
            bss_size: object.unique_symbol("__ram_size")?,
            crt0_elf,
            app_elf,
        })
    }

    pub fn flash_size(&self) -> u64 {
        self.metadata_size + self.text_size + self.got_size + self.data_size
    }

    pub fn ram_size(&self) -> u64 {
        self.got_size + self.data_size + self.bss_size
    }
}

impl fmt::Display for GdbInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "set $flash_base = # Define the flash base address here")?;
        writeln!(f, "set $ram_base = # Define the RAM base address here")?;
        writeln!(f, "set $crt0_text = $flash_base")?;
        writeln!(f, "set $text = $crt0_text + {}", self.metadata_size)?;
        writeln!(f, "set $got = $text + {}", self.text_size)?;
        writeln!(f, "set $data = $got + {}", self.got_size)?;
        writeln!(f, "set $rel_got = $ram_base")?;
        writeln!(f, "set $rel_data = $rel_got + {}", self.got_size)?;
        writeln!(f, "set $bss = $rel_data + {}", self.data_size)?;
        writeln!(
            f,
            "add-symbol-file {} -s .text $crt0_text",
            self.crt0_elf.display()
        )?;
        writeln!(
            f,
            "add-symbol-file {} -s .rom $text -s .got $rel_got -s .rom.ram $rel_data -s .ram $bss",
            self.app_elf.display()
        )?;
        writeln!(f, "set $flash_end = $flash_base + {}", self.flash_size())?;
        writeln!(f, "set $ram_end = $ram_base + {}", self.ram_size())
    }
}
