//! This file is the root of the `cubedct` Rust crate, a lossy 3D-block video codec.
//!
//! Frames are grouped into cubes of voxels, transformed with a 3D DCT, quantized by
//! position, Exp-Golomb coded in diagonal order and finally wrapped in a single
//! zlib (or zstd) stream. Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of the library.
//! 2.  Re-exporting the types most callers need.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

#[doc(hidden)]
pub use log as __log;

pub mod backend;
pub mod bridge;
pub mod codec_pipeline;
pub mod config;
pub mod error;
pub mod frame_pipeline;
pub mod kernels;
pub mod traits;
pub mod types;

//==================================================================================
// 2. Public Re-exports
//==================================================================================
pub use backend::CpuDctBackend;
pub use codec_pipeline::{CubeDecoder, CubeEncoder, DecodeReport, EncodeReport};
pub use config::{CodecConfig, CompressorKind};
pub use error::CubeDctError;
pub use traits::{FlushMode, StreamCompressor, StreamDecompressor, TransformBackend};
pub use types::{Coordinate, CubeGeometry};
