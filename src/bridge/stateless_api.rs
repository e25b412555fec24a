// In: src/bridge/stateless_api.rs

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

use crate::backend::CpuDctBackend;
use crate::codec_pipeline::{CubeDecoder, CubeEncoder, DecodeReport, EncodeReport};
use crate::config::CodecConfig;
use crate::error::CubeDctError;
use crate::kernels;

/// Builds an encoder over the CPU backend and the configured compressor.
pub fn new_encoder(config: &CodecConfig) -> Result<CubeEncoder<CpuDctBackend>, CubeDctError> {
    config.validate()?;
    let config = Arc::new(config.clone());
    let backend = CpuDctBackend::from_config(&config)?;
    let compressor = kernels::open_compressor(&config)?;
    CubeEncoder::new(config, backend, compressor)
}

/// Builds a decoder over the CPU backend and the configured decompressor.
pub fn new_decoder(config: &CodecConfig) -> Result<CubeDecoder<CpuDctBackend>, CubeDctError> {
    config.validate()?;
    let config = Arc::new(config.clone());
    let backend = CpuDctBackend::from_config(&config)?;
    let decompressor = kernels::open_decompressor(&config)?;
    CubeDecoder::new(config, backend, decompressor)
}

/// How many frames `input_len` raw bytes hold, rounded down to whole batches.
pub fn frames_in_input(input_len: u64, config: &CodecConfig) -> usize {
    config.layout().frames_in_input(input_len)
}

/// Encodes `frames` raw frames held in memory.
pub fn encode_bytes(
    raw: &[u8],
    config: &CodecConfig,
    frames: usize,
) -> Result<Vec<u8>, CubeDctError> {
    let mut out = Vec::new();
    new_encoder(config)?.encode(&mut &raw[..], &mut out, frames)?;
    Ok(out)
}

/// Decodes `frames` frames from a compressed stream held in memory.
pub fn decode_bytes(
    compressed: &[u8],
    config: &CodecConfig,
    frames: usize,
) -> Result<Vec<u8>, CubeDctError> {
    let mut out = Vec::with_capacity(frames * config.layout().frame_size());
    new_decoder(config)?.decode(&mut &compressed[..], &mut out, frames)?;
    Ok(out)
}

/// Encodes a raw frame file. With `frames == None` every whole batch in the file is
/// encoded and any trailing partial batch is ignored.
pub fn encode_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    config: &CodecConfig,
    frames: Option<usize>,
) -> Result<EncodeReport, CubeDctError> {
    let encoder = new_encoder(config)?;
    let source = File::open(input.as_ref())?;
    let frames = match frames {
        Some(frames) => frames,
        None => frames_in_input(source.metadata()?.len(), config),
    };
    log::info!(
        "encoding {} frames: {} -> {}",
        frames,
        input.as_ref().display(),
        output.as_ref().display()
    );

    let mut reader = BufReader::new(source);
    let mut writer = BufWriter::new(File::create(output.as_ref())?);
    encoder.encode(&mut reader, &mut writer, frames)
}

/// Decodes `frames` frames from a compressed file into a raw frame file.
pub fn decode_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    config: &CodecConfig,
    frames: usize,
) -> Result<DecodeReport, CubeDctError> {
    let decoder = new_decoder(config)?;
    log::info!(
        "decoding {} frames: {} -> {}",
        frames,
        input.as_ref().display(),
        output.as_ref().display()
    );

    let mut reader = BufReader::new(File::open(input.as_ref())?);
    let mut writer = BufWriter::new(File::create(output.as_ref())?);
    decoder.decode(&mut reader, &mut writer, frames)
}
