//! Command-line front end for the cubedct codec.

use std::error::Error;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::time::Instant;

use argh::FromArgs;
use log::LevelFilter;

use cubedct::bridge;
use cubedct::{CodecConfig, CompressorKind, CubeDctError, CubeGeometry};

#[derive(FromArgs, Debug)]
/// Lossy 3D-DCT video codec for raw 8-bit frame files
struct TopLevel {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
enum Commands {
    Encode(EncodeCmd),
    Decode(DecodeCmd),
}

#[derive(FromArgs, Debug)]
/// Encode raw 8-bit frames into a compressed cube stream
#[argh(subcommand, name = "encode")]
struct EncodeCmd {
    /// raw input file (frames of width*height bytes)
    #[argh(positional)]
    input: PathBuf,

    /// compressed output file
    #[argh(positional)]
    output: PathBuf,

    /// frame width in samples
    #[argh(positional)]
    width: usize,

    /// frame height in samples
    #[argh(positional)]
    height: usize,

    /// frames to encode [default: every whole batch in the input]
    #[argh(option)]
    frames: Option<usize>,

    /// cube size as WxHxD [default: 8x8x8]
    #[argh(option)]
    block: Option<CubeGeometry>,

    /// byte-stream compressor: zlib or zstd [default: zlib]
    #[argh(option)]
    compressor: Option<CompressorKind>,

    /// compressor level
    #[argh(option)]
    level: Option<i32>,

    /// JSON codec configuration; the flags above override it
    #[argh(option)]
    config: Option<PathBuf>,

    /// log per-batch progress and buffer levels
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// append log output to this file instead of stderr
    #[argh(option)]
    log_file: Option<PathBuf>,
}

#[derive(FromArgs, Debug)]
/// Decode a compressed cube stream back into raw 8-bit frames
#[argh(subcommand, name = "decode")]
struct DecodeCmd {
    /// compressed input file
    #[argh(positional)]
    input: PathBuf,

    /// raw output file
    #[argh(positional)]
    output: PathBuf,

    /// frame width in samples
    #[argh(positional)]
    width: usize,

    /// frame height in samples
    #[argh(positional)]
    height: usize,

    /// frames to decode (the stream does not record it)
    #[argh(option)]
    frames: Option<usize>,

    /// cube size as WxHxD, must match the encoder [default: 8x8x8]
    #[argh(option)]
    block: Option<CubeGeometry>,

    /// byte-stream compressor: zlib or zstd, must match the encoder
    #[argh(option)]
    compressor: Option<CompressorKind>,

    /// JSON codec configuration; the flags above override it
    #[argh(option)]
    config: Option<PathBuf>,

    /// log per-batch progress and buffer levels
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// append log output to this file instead of stderr
    #[argh(option)]
    log_file: Option<PathBuf>,
}

fn init_logging(verbose: bool, log_file: Option<&PathBuf>) -> Result<(), Box<dyn Error>> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    // Just the level and the message.
    builder.format(|buf, record| {
        use std::io::Write;
        writeln!(buf, "[{}] {}", record.level(), record.args())
    });

    if let Some(path) = log_file {
        let file = OpenOptions::new().append(true).create(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.parse_default_env();
    let _ = builder.try_init();
    Ok(())
}

fn build_config(
    width: usize,
    height: usize,
    config_path: Option<&PathBuf>,
    block: Option<CubeGeometry>,
    compressor: Option<CompressorKind>,
    level: Option<i32>,
) -> Result<CodecConfig, CubeDctError> {
    let mut config = match config_path {
        Some(path) => {
            let mut loaded: CodecConfig =
                serde_json::from_str(&std::fs::read_to_string(path)?)?;
            loaded.frame_width = width;
            loaded.frame_height = height;
            loaded
        }
        None => CodecConfig::new(width, height),
    };
    if let Some(geometry) = block {
        config = config.with_geometry(geometry);
    }
    if let Some(kind) = compressor {
        config = config.with_compressor(kind);
    }
    if let Some(level) = level {
        config = config.with_compression_level(level);
    }
    config.validate()?;
    Ok(config)
}

fn run_encode(cmd: EncodeCmd) -> Result<(), Box<dyn Error>> {
    init_logging(cmd.verbose, cmd.log_file.as_ref())?;
    let config = build_config(
        cmd.width,
        cmd.height,
        cmd.config.as_ref(),
        cmd.block,
        cmd.compressor,
        cmd.level,
    )?;

    let start = Instant::now();
    let report = bridge::encode_file(&cmd.input, &cmd.output, &config, cmd.frames)?;
    log::info!(
        "encoded {} frames in {} batches: {} -> {} bytes (ratio {:.2}) in {:.2?}",
        report.frames,
        report.batches,
        report.raw_bytes,
        report.compressed_bytes,
        report.compression_ratio(),
        start.elapsed()
    );
    Ok(())
}

fn run_decode(cmd: DecodeCmd) -> Result<(), Box<dyn Error>> {
    init_logging(cmd.verbose, cmd.log_file.as_ref())?;
    let config = build_config(
        cmd.width,
        cmd.height,
        cmd.config.as_ref(),
        cmd.block,
        cmd.compressor,
        None,
    )?;
    let frames = cmd.frames.ok_or_else(|| {
        CubeDctError::InvalidConfig("decode needs --frames: the stream does not record it".into())
    })?;

    let start = Instant::now();
    let report = bridge::decode_file(&cmd.input, &cmd.output, &config, frames)?;
    log::info!(
        "decoded {} frames in {} batches: {} -> {} bytes in {:.2?}",
        report.frames,
        report.batches,
        report.compressed_bytes,
        report.raw_bytes,
        start.elapsed()
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli: TopLevel = argh::from_env();

    match cli.command {
        Commands::Encode(cmd) => run_encode(cmd)?,
        Commands::Decode(cmd) => run_decode(cmd)?,
    }

    Ok(())
}
