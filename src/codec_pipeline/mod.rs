//! This module contains the encode and decode orchestrators.
//!
//! Each orchestrator is a single-threaded loop over batches of `geometry.depth`
//! frames that drives, in order, the transform backend, the quantizer, the diagonal
//! order with the Exp-Golomb stream, and a compressor session. Parallelism lives
//! entirely inside the backend. The first failing stage stops the run; bytes already
//! written to the sink are left as they are.

mod decoder;
mod encoder;

pub use decoder::CubeDecoder;
pub use encoder::CubeEncoder;

/// Summary of a finished encode run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeReport {
    pub frames: usize,
    pub batches: usize,
    /// Raw frame bytes consumed.
    pub raw_bytes: usize,
    /// Exp-Golomb bytes handed to the compressor, including the final partial byte.
    pub coded_bytes: usize,
    /// Bytes written to the sink.
    pub compressed_bytes: usize,
}

impl EncodeReport {
    /// Raw bytes per compressed byte; 0.0 for an empty run.
    pub fn compression_ratio(&self) -> f64 {
        if self.compressed_bytes == 0 {
            return 0.0;
        }
        self.raw_bytes as f64 / self.compressed_bytes as f64
    }
}

/// Summary of a finished decode run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeReport {
    pub frames: usize,
    pub batches: usize,
    /// Compressed bytes read from the source.
    pub compressed_bytes: usize,
    /// Raw frame bytes written to the sink.
    pub raw_bytes: usize,
}

#[cfg(test)]
mod pipeline_tests;
