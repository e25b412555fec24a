//! This module defines the collaborator contracts the codec pipeline is built on.
//!
//! The pipeline owns none of the numeric transform or byte-stream compression
//! machinery. It drives three capabilities through these traits, each of which is
//! exclusively owned by a single encode or decode loop for the duration of a run.

use crate::error::CubeDctError;

/// A forward/inverse 3D transform over exactly one cube batch.
///
/// Both buffers hold one value per voxel of the batch, laid out cube after cube with
/// (z, y, x) raster order inside each cube. Calls are synchronous from the pipeline's
/// point of view: when they return, `output` is fully written and `input` may be
/// refilled for the next batch.
pub trait TransformBackend {
    /// Spatial samples -> frequency coefficients.
    fn forward(&mut self, input: &[f32], output: &mut [f32]) -> Result<(), CubeDctError>;

    /// Frequency coefficients -> spatial samples, clamped to the 8-bit sample range.
    fn inverse(&mut self, input: &[f32], output: &mut [f32]) -> Result<(), CubeDctError>;
}

/// How a compressor call should treat its internal buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushMode {
    /// More input will follow; emit whatever the compressor is ready to emit.
    None,
    /// This is the last input of the run; terminate the compressed stream.
    Finish,
}

/// A stateful, resumable compression session spanning a whole encode run.
pub trait StreamCompressor {
    /// Compresses `input`, appending every byte produced to `output`.
    ///
    /// `FlushMode::Finish` may be passed exactly once; the session is unusable afterwards.
    fn compress(
        &mut self,
        input: &[u8],
        flush: FlushMode,
        output: &mut Vec<u8>,
    ) -> Result<(), CubeDctError>;
}

/// A stateful, resumable decompression session spanning a whole decode run.
pub trait StreamDecompressor {
    /// Decompresses as much of `input` as fits into `output`.
    ///
    /// Returns `(consumed, produced)`: the number of input bytes consumed and the number
    /// of bytes written to the front of `output`. Unconsumed input must be presented
    /// again on the next call.
    fn decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(usize, usize), CubeDctError>;
}
