//! The encode loop: raw frames in, one compressed coefficient stream out.

use std::io::{Read, Write};
use std::sync::Arc;

use super::EncodeReport;
use crate::config::CodecConfig;
use crate::error::CubeDctError;
use crate::frame_pipeline::FrameLayout;
use crate::kernels::diagonal::DiagonalOrder;
use crate::kernels::exp_golomb::{CompactMode, ExpGolombStream};
use crate::kernels::quantize;
use crate::traits::{FlushMode, StreamCompressor, TransformBackend};

/// Drives one encode run.
///
/// Every working buffer is allocated once in [`CubeEncoder::new`] and reused for each
/// batch. The compressor session spans the whole run, so an encoder is consumed by
/// [`CubeEncoder::encode`].
pub struct CubeEncoder<B: TransformBackend> {
    config: Arc<CodecConfig>,
    layout: FrameLayout,
    order: DiagonalOrder,
    backend: B,
    compressor: Box<dyn StreamCompressor>,
    stream: ExpGolombStream,
    raw: Vec<u8>,
    samples: Vec<f32>,
    coeffs: Vec<f32>,
    ordered: Vec<f32>,
    compressed: Vec<u8>,
}

impl<B: TransformBackend> CubeEncoder<B> {
    pub fn new(
        config: Arc<CodecConfig>,
        backend: B,
        compressor: Box<dyn StreamCompressor>,
    ) -> Result<Self, CubeDctError> {
        config.validate()?;
        let layout = config.layout();
        let batch_len = layout.batch_len();
        let volume = config.geometry.volume();
        Ok(Self {
            order: DiagonalOrder::build(config.geometry),
            stream: ExpGolombStream::with_capacity(config.entropy_capacity()),
            raw: vec![0u8; batch_len],
            samples: vec![0.0; batch_len],
            coeffs: vec![0.0; batch_len],
            ordered: Vec::with_capacity(volume),
            compressed: Vec::new(),
            layout,
            backend,
            compressor,
            config,
        })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encodes `frames` frames from `reader` into `writer`.
    ///
    /// `frames` must be a multiple of the cube depth. The compressed stream is
    /// finalized even when `frames` is zero.
    pub fn encode<R: Read, W: Write>(
        mut self,
        reader: &mut R,
        writer: &mut W,
        frames: usize,
    ) -> Result<EncodeReport, CubeDctError> {
        self.layout.check_frame_count(frames)?;
        let depth = self.layout.frames_per_batch();
        let batches = frames / depth;
        let mut report = EncodeReport::default();

        log::debug!(
            "encode: {} frames of {}x{} in {} batches of {} cubes ({})",
            frames,
            self.layout.frame_width,
            self.layout.frame_height,
            batches,
            self.layout.cubes_per_batch(),
            self.config.geometry
        );

        if batches == 0 {
            self.compressor
                .compress(&[], FlushMode::Finish, &mut self.compressed)
                .map_err(|e| CubeDctError::in_stage("compress", e))?;
            writer.write_all(&self.compressed)?;
            report.compressed_bytes += self.compressed.len();
            writer.flush()?;
            return Ok(report);
        }

        for batch in 0..batches {
            let first_frame = batch * depth;
            self.layout
                .read_batch(reader, &mut self.raw, &mut self.samples, first_frame)?;
            report.raw_bytes += self.raw.len();

            self.backend
                .forward(&self.samples, &mut self.coeffs)
                .map_err(|e| CubeDctError::in_stage("forward transform", e))?;
            quantize::quantize_batch(&mut self.coeffs, self.config.geometry)?;
            self.entropy_code_batch()?;

            let last = batch + 1 == batches;
            let coded = self.stream.coded_len();
            self.compressed.clear();
            if last {
                // The cursor byte is always sent on the final flush, even when empty.
                let tail = self.stream.written();
                report.coded_bytes += tail.len();
                self.compressor
                    .compress(tail, FlushMode::Finish, &mut self.compressed)
                    .map_err(|e| CubeDctError::in_stage("compress", e))?;
            } else {
                report.coded_bytes += coded;
                self.compressor
                    .compress(&self.stream.written()[..coded], FlushMode::None, &mut self.compressed)
                    .map_err(|e| CubeDctError::in_stage("compress", e))?;
                self.stream.compact(coded, CompactMode::Writing);
            }

            writer.write_all(&self.compressed)?;
            report.compressed_bytes += self.compressed.len();
            report.batches += 1;
            report.frames = first_frame + depth;

            log::info!("frames processed: {}", report.frames);
            log_metric!(
                "event" = "encode_batch",
                "batch" = &batch,
                "coded_bytes" = &coded,
                "compressed_bytes" = &self.compressed.len(),
                "carry_bits" = &(8 - self.stream.bit_offset())
            );
        }

        writer.flush()?;
        Ok(report)
    }

    /// Writes every cube of the quantized batch in diagonal order.
    fn entropy_code_batch(&mut self) -> Result<(), CubeDctError> {
        let volume = self.order.len();
        for cube in self.coeffs.chunks_exact(volume) {
            self.ordered.clear();
            self.order.gather(cube, &mut self.ordered);
            for &coeff in &self.ordered {
                let symbol = quantize::to_symbol(coeff)?;
                self.stream
                    .write(symbol)
                    .map_err(|e| CubeDctError::in_stage("entropy coding", e))?;
            }
        }
        Ok(())
    }
}
