use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

pub const DEFAULT_CRT0_DIR: &str = "./crt0/";
pub const CRT0_BLOB: &str = "crt0.fae";
pub const CRT0_ELF: &str = "crt0.elf";

pub fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .context("Failed to resolve current directory")?
            .join(path))
    }
}

/// Runs `make -C <dir> realclean all`.
pub fn make(dir: &Path) -> Result<()> {
    let dir = absolute(dir)?;
    info!("Building crt0 in {:?}", dir);

    let output = Command::new("make")
        .arg("-C")
        .arg(&dir)
        .args(["realclean", "all"])
        .output()
        .context("Failed to run make")?;

    if !output.status.success() {
        bail!(
            "failed to build crt0: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

pub fn read_blob(dir: &Path) -> Result<Vec<u8>> {
    let path = dir.join(CRT0_BLOB);
    let blob = std::fs::read(&path).with_context(|| format!("Failed to read crt0 blob: {:?}", path))?;
    debug!("crt0 blob {:?}: {} bytes", path, blob.len());
    Ok(blob)
}
