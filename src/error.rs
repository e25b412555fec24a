// In: src/error.rs

//! This module defines the single, unified error type for the entire cubedct library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.
//!
//! Every stage of the codec reports failures through `CubeDctError`. There is no
//! partial-success mode: the first error stops the encode/decode run and is handed
//! back to the caller.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CubeDctError {
    // =========================================================================
    // === Configuration & Geometry Errors
    // =========================================================================
    #[error("Invalid cube geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid codec configuration: {0}")]
    InvalidConfig(String),

    // =========================================================================
    // === Raw / Coded Stream Exhaustion
    // =========================================================================
    /// The raw source ended before the declared number of frames was read.
    #[error("Short read on raw input: needed {expected} bytes for the batch starting at frame {frame}")]
    ShortRead { expected: usize, frame: usize },

    /// The coded source ended before a full cube batch could be assembled.
    #[error("Coded stream ended early: {frames_decoded} frames decoded, {values_pending} values pending")]
    TruncatedStream {
        frames_decoded: usize,
        values_pending: usize,
    },

    // =========================================================================
    // === Entropy / Quantization Errors
    // =========================================================================
    #[error("Exp-Golomb buffer capacity exceeded: {needed} bytes needed, capacity is {capacity}")]
    ExpGolombCapacity { needed: usize, capacity: usize },

    #[error("Exp-Golomb read past the filled region of the buffer")]
    ExpGolombTruncated,

    #[error("Corrupt Exp-Golomb code: {0}")]
    ExpGolombCorrupt(String),

    #[error("Quantized coefficient {0} is not representable as a 32-bit integer")]
    CoefficientOverflow(f32),

    #[error("Buffer length mismatch: expected {0}, got {1}")]
    BufferMismatch(usize, usize),

    // =========================================================================
    // === Collaborator Errors
    // =========================================================================
    #[error("Transform backend failed: {0}")]
    Transform(String),

    #[error("Zlib operation failed: {0}")]
    ZlibError(String),

    #[error("Zstd operation failed: {0}")]
    ZstdError(String),

    #[error("Compressor session has already been finalized")]
    SessionFinished,

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the underlying I/O subsystem (e.g., file not found).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically while loading a config file.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Pipeline execution failed at stage '{stage}': {source}")]
    PipelineError {
        stage: String,
        #[source]
        source: Box<CubeDctError>,
    },
}

impl CubeDctError {
    /// Wraps an error with the name of the pipeline stage that produced it.
    pub fn in_stage(stage: &str, source: CubeDctError) -> Self {
        CubeDctError::PipelineError {
            stage: stage.to_string(),
            source: Box::new(source),
        }
    }
}
