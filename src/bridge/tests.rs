use super::*;
use crate::config::{CodecConfig, CompressorKind};
use crate::error::CubeDctError;
use crate::types::CubeGeometry;
use std::path::PathBuf;

fn test_config() -> CodecConfig {
    CodecConfig::new(8, 8).with_geometry(CubeGeometry::new(4, 4, 2).unwrap())
}

/// Frames made of flat 4x4x2 blocks, which the codec reproduces exactly.
fn flat_block_frames(frames: usize) -> Vec<u8> {
    let mut raw = Vec::with_capacity(64 * frames);
    for frame in 0..frames {
        for y in 0..8 {
            for x in 0..8 {
                let block = (y / 4) * 2 + x / 4;
                raw.push((block * 50 + (frame / 2) * 7 + 3) as u8);
            }
        }
    }
    raw
}

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("cubedct_bridge_{}_{}", std::process::id(), name))
}

#[test]
fn test_bytes_roundtrip() {
    let config = test_config();
    let raw = flat_block_frames(6);

    let compressed = encode_bytes(&raw, &config, 6).unwrap();
    let decoded = decode_bytes(&compressed, &config, 6).unwrap();
    assert_eq!(decoded, raw);
}

#[test]
fn test_bytes_roundtrip_with_zstd() {
    let config = test_config().with_compressor(CompressorKind::Zstd);
    let raw = flat_block_frames(4);

    let compressed = encode_bytes(&raw, &config, 4).unwrap();
    assert_eq!(decode_bytes(&compressed, &config, 4).unwrap(), raw);
}

#[test]
fn test_decoding_fewer_frames_than_encoded() {
    let config = test_config();
    let raw = flat_block_frames(6);
    let compressed = encode_bytes(&raw, &config, 6).unwrap();

    let decoded = decode_bytes(&compressed, &config, 2).unwrap();
    assert_eq!(decoded, raw[..128]);
}

#[test]
fn test_frames_in_input_rounds_down_to_batches() {
    let config = test_config();
    assert_eq!(frames_in_input(0, &config), 0);
    assert_eq!(frames_in_input(64 * 3, &config), 2);
    assert_eq!(frames_in_input(64 * 4 + 10, &config), 4);
}

#[test]
fn test_invalid_config_is_rejected_before_any_work() {
    let config = CodecConfig::new(10, 8).with_geometry(CubeGeometry::new(4, 4, 2).unwrap());
    let err = encode_bytes(&[0u8; 160], &config, 2).unwrap_err();
    assert!(matches!(err, CubeDctError::InvalidConfig(_)));
}

#[test]
fn test_file_roundtrip_derives_frame_count() {
    let config = test_config();
    let raw = flat_block_frames(4);
    let raw_path = scratch_path("in.raw");
    let coded_path = scratch_path("out.cdct");
    let decoded_path = scratch_path("out.raw");

    // One extra frame that does not fill a batch is ignored.
    let mut on_disk = raw.clone();
    on_disk.extend_from_slice(&[9u8; 64]);
    std::fs::write(&raw_path, &on_disk).unwrap();

    let report = encode_file(&raw_path, &coded_path, &config, None).unwrap();
    assert_eq!(report.frames, 4);
    assert_eq!(report.batches, 2);
    assert_eq!(
        report.compressed_bytes as u64,
        std::fs::metadata(&coded_path).unwrap().len()
    );

    let decode_report = decode_file(&coded_path, &decoded_path, &config, 4).unwrap();
    assert_eq!(decode_report.raw_bytes, raw.len());
    assert_eq!(std::fs::read(&decoded_path).unwrap(), raw);

    for path in [raw_path, coded_path, decoded_path] {
        let _ = std::fs::remove_file(path);
    }
}

#[test]
fn test_missing_input_file_is_an_io_error() {
    let config = test_config();
    let err = encode_file(
        scratch_path("does_not_exist.raw"),
        scratch_path("never_written.cdct"),
        &config,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, CubeDctError::Io(_)));
}
