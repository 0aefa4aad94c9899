use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start_addr: u64,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramImage {
    pub entry_point: u64,
    pub segments: Vec<Segment>,
}

impl ProgramImage {
    pub fn new(entry_point: u64) -> Self {
        Self {
            entry_point,
            segments: Vec::new(),
        }
    }

    pub fn add_segment(&mut self, start_addr: u64, data: Vec<u8>) {
        self.segments.push(Segment { start_addr, data });
    }

    /// Lowest load address among the non-empty segments.
    pub fn base_addr(&self) -> Option<u64> {
        self.segments
            .iter()
            .filter(|s| !s.data.is_empty())
            .map(|s| s.start_addr)
            .min()
    }

    /// Flat binary of all segments, laid out by load address starting at
    /// [`Self::base_addr`]. Holes between segments are zero-filled.
    pub fn flatten(&self) -> Vec<u8> {
        let Some(base) = self.base_addr() else {
            return Vec::new();
        };
        let loaded = self.segments.iter().filter(|s| !s.data.is_empty());
        let end = loaded
            .clone()
            .map(|s| s.start_addr + s.data.len() as u64)
            .max()
            .unwrap_or(base);

        let mut flat = vec![0u8; (end - base) as usize];
        for segment in loaded {
            let offset = (segment.start_addr - base) as usize;
            flat[offset..offset + segment.data.len()].copy_from_slice(&segment.data);
        }
        flat
    }
}
