use anyhow::{Context, Result};
use fae_core::{FaeImage, ImageSummary};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct BuildReport<'a> {
    pub output: String,
    pub image_sha256: String,
    #[serde(flatten)]
    pub summary: &'a ImageSummary,
}

impl<'a> BuildReport<'a> {
    pub fn new(output: &Path, image: &'a FaeImage) -> Self {
        let digest = Sha256::digest(&image.bytes);
        Self {
            output: output.display().to_string(),
            image_sha256: digest.iter().map(|b| format!("{:02x}", b)).collect(),
            summary: &image.summary,
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize build report")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write build report: {:?}", path))
    }
}
