// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the public-facing API of the cubedct library. It wires a validated
// `CodecConfig` to the reference CPU transform backend and the configured compressor
// session, then hands both to the codec pipeline. Callers never assemble encoders or
// decoders themselves unless they bring their own `TransformBackend`.
//
// Data Flow (Encoding):
//
//   1. [Stateless API (encode_bytes / encode_file)] -> Receives raw frames + config
//         |
//         `-> a. Validates the config and freezes it in an `Arc<CodecConfig>`
//         |
//         `-> b. Opens `CpuDctBackend` + `kernels::open_compressor`
//
//   2. [Pipeline Engine (codec_pipeline::CubeEncoder)] -> Writes one compressed stream
//
//
// Data Flow (Decoding):
//
//   1. [Stateless API (decode_bytes / decode_file)] -> Receives compressed stream + config
//
//   2. [Pipeline Engine (codec_pipeline::CubeDecoder)] -> Writes raw frames
//
// The coded stream has no header: the decode config must match the encode config.
// ====================================================================================
pub mod stateless_api;

pub use stateless_api::{
    decode_bytes, decode_file, encode_bytes, encode_file, frames_in_input, new_decoder,
    new_encoder,
};

#[cfg(test)]
mod tests;
