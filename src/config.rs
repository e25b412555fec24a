// In: src/config.rs

//! The single source of truth for all cubedct codec configuration.
//!
//! This module defines the unified `CodecConfig` struct, which is designed to be
//! created once at the application boundary (e.g., from command-line flags or a
//! JSON file) and then passed down through the system via a shared, read-only
//! `Arc<CodecConfig>`.
//!
//! The coded bitstream carries no header, so the exact same frame size and cube
//! geometry must be supplied to both the encoder and the decoder.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CubeDctError;
use crate::frame_pipeline::FrameLayout;
use crate::types::CubeGeometry;

//==================================================================================
// I. Core Configuration Enums
//==================================================================================

/// Selects the general-purpose byte-stream compressor applied after entropy coding.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompressorKind {
    /// **Default:** zlib-framed deflate. This is the reference cubedct bitstream.
    #[default]
    Zlib,

    /// Zstandard frames. Usually smaller and faster, but not readable by zlib-only decoders.
    Zstd,
}

impl CompressorKind {
    /// The inclusive range of compression levels this compressor accepts.
    pub fn level_range(&self) -> (i32, i32) {
        match self {
            CompressorKind::Zlib => (0, 9),
            CompressorKind::Zstd => (1, 22),
        }
    }
}

impl std::str::FromStr for CompressorKind {
    type Err = CubeDctError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zlib" | "deflate" => Ok(CompressorKind::Zlib),
            "zstd" => Ok(CompressorKind::Zstd),
            other => Err(CubeDctError::InvalidConfig(format!(
                "unknown compressor '{}', expected 'zlib' or 'zstd'",
                other
            ))),
        }
    }
}

//==================================================================================
// II. The Unified CodecConfig
//==================================================================================

/// The single, unified configuration for one encode or decode run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CodecConfig {
    /// Width of every frame, in samples. Must be a multiple of `geometry.width`.
    /// Optional in JSON so a file can carry only codec settings; zero fails validation.
    #[serde(default)]
    pub frame_width: usize,

    /// Height of every frame, in samples. Must be a multiple of `geometry.height`.
    #[serde(default)]
    pub frame_height: usize,

    /// The transform cube dimensions. `geometry.depth` frames form one batch.
    #[serde(default)]
    pub geometry: CubeGeometry,

    /// The byte-stream compressor wrapped around the Exp-Golomb data.
    #[serde(default)]
    pub compressor: CompressorKind,

    /// Compressor level. Zlib accepts 0..=9, zstd accepts 1..=22.
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,

    /// Upper bound for the CPU backend's reduction group size.
    #[serde(default = "default_max_work_group_size")]
    pub max_work_group_size: usize,

    /// Size of the Exp-Golomb staging region. Defaults to the worst case for one batch.
    #[serde(default)]
    pub entropy_buffer_bytes: Option<usize>,

    /// Size of the decoder's compressed-input staging region. Defaults to one batch.
    #[serde(default)]
    pub input_buffer_bytes: Option<usize>,
}

impl CodecConfig {
    /// Creates a configuration with default geometry and compressor settings.
    pub fn new(frame_width: usize, frame_height: usize) -> Self {
        Self {
            frame_width,
            frame_height,
            geometry: CubeGeometry::default(),
            compressor: CompressorKind::default(),
            compression_level: default_compression_level(),
            max_work_group_size: default_max_work_group_size(),
            entropy_buffer_bytes: None,
            input_buffer_bytes: None,
        }
    }

    pub fn with_geometry(mut self, geometry: CubeGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Switches the compressor, clamping the level into the new compressor's range.
    pub fn with_compressor(mut self, compressor: CompressorKind) -> Self {
        let (min, max) = compressor.level_range();
        self.compressor = compressor;
        self.compression_level = self.compression_level.clamp(min, max);
        self
    }

    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    /// Loads a configuration from a JSON string and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, CubeDctError> {
        let config: CodecConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a JSON file and validates it.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CubeDctError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks every cross-field constraint the pipeline relies on.
    pub fn validate(&self) -> Result<(), CubeDctError> {
        self.geometry.validate()?;

        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(CubeDctError::InvalidConfig(format!(
                "frame size must be positive, got {}x{}",
                self.frame_width, self.frame_height
            )));
        }
        if self.frame_width % self.geometry.width != 0
            || self.frame_height % self.geometry.height != 0
        {
            return Err(CubeDctError::InvalidConfig(format!(
                "frame size {}x{} is not a multiple of the cube face {}x{}",
                self.frame_width, self.frame_height, self.geometry.width, self.geometry.height
            )));
        }

        let (min, max) = self.compressor.level_range();
        if self.compression_level < min || self.compression_level > max {
            return Err(CubeDctError::InvalidConfig(format!(
                "compression level {} is outside {}..={} for {:?}",
                self.compression_level, min, max, self.compressor
            )));
        }

        if self.max_work_group_size == 0 {
            return Err(CubeDctError::InvalidConfig(
                "max_work_group_size must be positive".to_string(),
            ));
        }

        // A single Exp-Golomb code of a 32-bit value spans at most 9 bytes.
        if let Some(bytes) = self.entropy_buffer_bytes {
            if bytes < MIN_STAGING_BYTES {
                return Err(CubeDctError::InvalidConfig(format!(
                    "entropy_buffer_bytes must be at least {}, got {}",
                    MIN_STAGING_BYTES, bytes
                )));
            }
        }
        if let Some(bytes) = self.input_buffer_bytes {
            if bytes == 0 {
                return Err(CubeDctError::InvalidConfig(
                    "input_buffer_bytes must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// The raw-side layout implied by this configuration.
    pub fn layout(&self) -> FrameLayout {
        FrameLayout::new(self.frame_width, self.frame_height, self.geometry)
    }

    /// Exp-Golomb region size actually used by the pipeline.
    pub fn entropy_capacity(&self) -> usize {
        self.entropy_buffer_bytes
            .unwrap_or_else(|| self.layout().batch_len() * MAX_CODE_BYTES + 1)
    }

    /// Compressed-input staging size actually used by the decoder.
    pub fn input_capacity(&self) -> usize {
        self.input_buffer_bytes
            .unwrap_or_else(|| self.layout().batch_len())
    }
}

/// Upper bound on the bytes touched by one Exp-Golomb code of an `i32`.
pub const MAX_CODE_BYTES: usize = 9;

/// Smallest staging region that can always hold one complete code.
const MIN_STAGING_BYTES: usize = MAX_CODE_BYTES + 1;

/// Zlib's best compression.
fn default_compression_level() -> i32 {
    9
}

fn default_max_work_group_size() -> usize {
    256
}
