use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::backend::CpuDctBackend;
use crate::config::{CodecConfig, CompressorKind};
use crate::error::CubeDctError;
use crate::kernels;
use crate::types::CubeGeometry;

//==================================================================================
// Helpers
//==================================================================================

fn small_config(compressor: CompressorKind) -> Arc<CodecConfig> {
    Arc::new(
        CodecConfig::new(16, 8)
            .with_geometry(CubeGeometry::new(4, 4, 4).unwrap())
            .with_compressor(compressor),
    )
}

fn encode(
    config: &Arc<CodecConfig>,
    raw: &[u8],
    frames: usize,
) -> Result<(Vec<u8>, EncodeReport), CubeDctError> {
    let backend = CpuDctBackend::from_config(config)?;
    let compressor = kernels::open_compressor(config)?;
    let encoder = CubeEncoder::new(Arc::clone(config), backend, compressor)?;
    let mut out = Vec::new();
    let report = encoder.encode(&mut &raw[..], &mut out, frames)?;
    Ok((out, report))
}

fn decode(
    config: &Arc<CodecConfig>,
    compressed: &[u8],
    frames: usize,
) -> Result<(Vec<u8>, DecodeReport), CubeDctError> {
    let backend = CpuDctBackend::from_config(config)?;
    let decompressor = kernels::open_decompressor(config)?;
    let decoder = CubeDecoder::new(Arc::clone(config), backend, decompressor)?;
    let mut out = Vec::new();
    let report = decoder.decode(&mut &compressed[..], &mut out, frames)?;
    Ok((out, report))
}

/// Frames whose every cube is constant: the DCT keeps only DC, which survives
/// quantization unchanged, so these round-trip exactly.
fn block_constant_frames(config: &CodecConfig, frames: usize) -> Vec<u8> {
    let g = config.geometry;
    let mut raw = Vec::with_capacity(config.frame_width * config.frame_height * frames);
    for frame in 0..frames {
        let batch = frame / g.depth;
        for y in 0..config.frame_height {
            for x in 0..config.frame_width {
                let cube = (y / g.height) * (config.frame_width / g.width) + x / g.width;
                raw.push(((cube * 37 + batch * 91 + 11) % 256) as u8);
            }
        }
    }
    raw
}

fn mean_abs_error(a: &[u8], b: &[u8]) -> f64 {
    let total: u64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| (x as i32 - y as i32).unsigned_abs() as u64)
        .sum();
    total as f64 / a.len() as f64
}

//==================================================================================
// Round trips
//==================================================================================

#[test]
fn test_constant_video_roundtrips_exactly() {
    let config = small_config(CompressorKind::Zlib);
    let raw = vec![173u8; 16 * 8 * 4];

    let (compressed, report) = encode(&config, &raw, 4).unwrap();
    assert_eq!(report.frames, 4);
    assert_eq!(report.batches, 1);
    assert_eq!(report.raw_bytes, raw.len());
    assert_eq!(report.compressed_bytes, compressed.len());
    assert!(compressed.len() < raw.len() / 4);
    assert_eq!(compressed[0], 0x78);

    let (decoded, decode_report) = decode(&config, &compressed, 4).unwrap();
    assert_eq!(decoded, raw);
    assert_eq!(decode_report.frames, 4);
    assert_eq!(decode_report.raw_bytes, raw.len());
}

#[test]
fn test_block_constant_video_roundtrips_across_batches() {
    let config = small_config(CompressorKind::Zlib);
    let frames = 3 * config.geometry.depth;
    let raw = block_constant_frames(&config, frames);

    let (compressed, report) = encode(&config, &raw, frames).unwrap();
    assert_eq!(report.batches, 3);
    assert!(report.compression_ratio() > 1.0);

    let (decoded, decode_report) = decode(&config, &compressed, frames).unwrap();
    assert_eq!(decode_report.batches, 3);
    assert_eq!(decode_report.compressed_bytes, compressed.len());
    assert_eq!(decoded, raw);
}

#[test]
fn test_zstd_session_roundtrips() {
    let config = small_config(CompressorKind::Zstd);
    let frames = 2 * config.geometry.depth;
    let raw = block_constant_frames(&config, frames);

    let (compressed, _) = encode(&config, &raw, frames).unwrap();
    // Zstandard frame magic, little endian.
    assert_eq!(&compressed[..4], &[0x28, 0xB5, 0x2F, 0xFD]);

    let (decoded, _) = decode(&config, &compressed, frames).unwrap();
    assert_eq!(decoded, raw);
}

#[test]
fn test_tiny_staging_buffers_decode_the_same_stream() {
    let config = small_config(CompressorKind::Zlib);
    let frames = 2 * config.geometry.depth;
    let raw = block_constant_frames(&config, frames);
    let (compressed, _) = encode(&config, &raw, frames).unwrap();

    // Codes straddle every refill boundary with these sizes.
    let mut tight = (*config).clone();
    tight.input_buffer_bytes = Some(3);
    tight.entropy_buffer_bytes = Some(11);
    let (decoded, _) = decode(&Arc::new(tight), &compressed, frames).unwrap();
    assert_eq!(decoded, raw);
}

#[test]
fn test_smooth_video_stays_close() {
    let config = Arc::new(CodecConfig::new(16, 16));
    let frames = config.geometry.depth;
    let mut raw = Vec::new();
    for z in 0..frames {
        for y in 0..16 {
            for x in 0..16 {
                raw.push((x * 6 + y * 3 + z * 2) as u8);
            }
        }
    }

    let (compressed, _) = encode(&config, &raw, frames).unwrap();
    let (decoded, _) = decode(&config, &compressed, frames).unwrap();
    assert_eq!(decoded.len(), raw.len());
    let error = mean_abs_error(&raw, &decoded);
    assert!(error < 4.0, "mean abs error {}", error);
}

#[test]
fn test_noisy_video_stays_close_on_average() {
    let config = small_config(CompressorKind::Zlib);
    let frames = config.geometry.depth;
    let mut rng = StdRng::seed_from_u64(42);
    let raw: Vec<u8> = (0..16 * 8 * frames)
        .map(|_| rng.random_range(120..=136u8))
        .collect();

    let (compressed, _) = encode(&config, &raw, frames).unwrap();
    let (decoded, _) = decode(&config, &compressed, frames).unwrap();
    let error = mean_abs_error(&raw, &decoded);
    assert!(error < 10.0, "mean abs error {}", error);
}

#[test]
fn test_zero_frames_produce_a_finished_stream() {
    let config = small_config(CompressorKind::Zlib);
    let (compressed, report) = encode(&config, &[], 0).unwrap();
    assert_eq!(report.batches, 0);
    assert!(!compressed.is_empty());

    let (decoded, _) = decode(&config, &compressed, 0).unwrap();
    assert!(decoded.is_empty());
}

//==================================================================================
// Failures
//==================================================================================

#[test]
fn test_truncated_stream_is_reported() {
    let config = small_config(CompressorKind::Zlib);
    let frames = 2 * config.geometry.depth;
    let mut rng = StdRng::seed_from_u64(9);
    let raw: Vec<u8> = (0..16 * 8 * frames).map(|_| rng.random()).collect();
    let (compressed, _) = encode(&config, &raw, frames).unwrap();

    let cut = &compressed[..compressed.len() / 2];
    let err = decode(&config, cut, frames).unwrap_err();
    assert!(
        matches!(err, CubeDctError::TruncatedStream { .. }),
        "unexpected error: {}",
        err
    );
}

#[test]
fn test_short_raw_input_is_reported() {
    let config = small_config(CompressorKind::Zlib);
    let raw = vec![5u8; 16 * 8 * 6];
    let err = encode(&config, &raw, 8).unwrap_err();
    assert!(matches!(
        err,
        CubeDctError::ShortRead {
            expected: 512,
            frame: 4
        }
    ));
}

#[test]
fn test_partial_batch_frame_count_is_rejected() {
    let config = small_config(CompressorKind::Zlib);
    let raw = vec![5u8; 16 * 8 * 6];
    let err = encode(&config, &raw, 6).unwrap_err();
    assert!(matches!(err, CubeDctError::InvalidConfig(_)));
}

#[test]
fn test_undersized_entropy_region_fails_encoding() {
    let mut config = (*small_config(CompressorKind::Zlib)).clone();
    config.entropy_buffer_bytes = Some(16);
    let raw = vec![200u8; 16 * 8 * 4];
    let err = encode(&Arc::new(config), &raw, 4).unwrap_err();
    match err {
        CubeDctError::PipelineError { stage, source } => {
            assert_eq!(stage, "entropy coding");
            assert!(matches!(*source, CubeDctError::ExpGolombCapacity { .. }));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_mismatched_geometry_does_not_reproduce_input() {
    let config = small_config(CompressorKind::Zlib);
    let frames = 2 * config.geometry.depth;
    let raw = block_constant_frames(&config, frames);
    let (compressed, _) = encode(&config, &raw, frames).unwrap();

    let other = Arc::new(
        CodecConfig::new(16, 8).with_geometry(CubeGeometry::new(2, 2, 2).unwrap()),
    );
    match decode(&other, &compressed, frames) {
        Ok((decoded, _)) => assert_ne!(decoded, raw),
        Err(_) => {}
    }
}
