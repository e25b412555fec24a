//! The decode loop: one compressed coefficient stream in, raw frames out.
//!
//! Compressed bytes, Exp-Golomb bytes and decoded values never line up with cube
//! boundaries, so the loop keeps three independent fill levels: the compressed
//! staging buffer, the filled part of the Exp-Golomb region, and the decoded values
//! still waiting for a full batch.

use std::io::{ErrorKind, Read, Write};
use std::sync::Arc;

use super::DecodeReport;
use crate::config::CodecConfig;
use crate::error::CubeDctError;
use crate::frame_pipeline::FrameLayout;
use crate::kernels::diagonal::DiagonalOrder;
use crate::kernels::exp_golomb::{CompactMode, ExpGolombStream};
use crate::kernels::quantize;
use crate::traits::{StreamDecompressor, TransformBackend};

/// Drives one decode run. Consumed by [`CubeDecoder::decode`].
pub struct CubeDecoder<B: TransformBackend> {
    config: Arc<CodecConfig>,
    layout: FrameLayout,
    order: DiagonalOrder,
    backend: B,
    decompressor: Box<dyn StreamDecompressor>,
    stream: ExpGolombStream,
    staging: Vec<u8>,
    staging_capacity: usize,
    input_eof: bool,
    values: Vec<i32>,
    ordered: Vec<f32>,
    coeffs: Vec<f32>,
    samples: Vec<f32>,
    raw: Vec<u8>,
}

impl<B: TransformBackend> CubeDecoder<B> {
    pub fn new(
        config: Arc<CodecConfig>,
        backend: B,
        decompressor: Box<dyn StreamDecompressor>,
    ) -> Result<Self, CubeDctError> {
        config.validate()?;
        let layout = config.layout();
        let batch_len = layout.batch_len();
        let volume = config.geometry.volume();
        let staging_capacity = config.input_capacity();
        Ok(Self {
            order: DiagonalOrder::build(config.geometry),
            stream: ExpGolombStream::with_capacity(config.entropy_capacity()),
            staging: Vec::with_capacity(staging_capacity),
            staging_capacity,
            input_eof: false,
            values: Vec::with_capacity(batch_len),
            ordered: vec![0.0; volume],
            coeffs: vec![0.0; batch_len],
            samples: vec![0.0; batch_len],
            raw: vec![0u8; batch_len],
            layout,
            backend,
            decompressor,
            config,
        })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decodes `frames` frames from `reader` and writes them to `writer`.
    ///
    /// Stops after `frames` frames; anything left in the compressed source is ignored.
    /// A source that ends before the last batch is complete is a `TruncatedStream`.
    pub fn decode<R: Read, W: Write>(
        mut self,
        reader: &mut R,
        writer: &mut W,
        frames: usize,
    ) -> Result<DecodeReport, CubeDctError> {
        self.layout.check_frame_count(frames)?;
        let depth = self.layout.frames_per_batch();
        let batches = frames / depth;
        let batch_len = self.layout.batch_len();
        let mut report = DecodeReport::default();

        log::debug!(
            "decode: {} frames of {}x{} in {} batches ({})",
            frames,
            self.layout.frame_width,
            self.layout.frame_height,
            batches,
            self.config.geometry
        );

        for batch in 0..batches {
            while self.values.len() < batch_len {
                self.fill_values(reader, batch_len, &mut report)?;
            }

            self.scatter_batch(batch_len);
            self.values.drain(..batch_len);

            quantize::dequantize_batch(&mut self.coeffs, self.config.geometry)?;
            self.backend
                .inverse(&self.coeffs, &mut self.samples)
                .map_err(|e| CubeDctError::in_stage("inverse transform", e))?;
            self.layout
                .write_batch(writer, &self.samples, &mut self.raw)?;

            report.raw_bytes += self.raw.len();
            report.batches += 1;
            report.frames += depth;

            log::info!("frames processed: {}", report.frames);
            log_metric!(
                "event" = "decode_batch",
                "batch" = &batch,
                "staged_bytes" = &self.staging.len(),
                "coded_bytes" = &self.stream.filled_len(),
                "values_carried" = &self.values.len()
            );
        }

        writer.flush()?;
        Ok(report)
    }

    /// One refill step: read, decompress, bit-decode, compact.
    ///
    /// Decoding stops at `target` values; later codes stay in the Exp-Golomb region for
    /// the next batch. Fails with `TruncatedStream` when no stage can make progress.
    fn fill_values<R: Read>(
        &mut self,
        reader: &mut R,
        target: usize,
        report: &mut DecodeReport,
    ) -> Result<(), CubeDctError> {
        let read = self.refill_staging(reader)?;
        report.compressed_bytes += read;

        let (consumed, produced) = self
            .decompressor
            .decompress(&self.staging, self.stream.unfilled_mut())
            .map_err(|e| CubeDctError::in_stage("decompress", e))?;
        self.stream.commit_filled(produced)?;
        self.staging.drain(..consumed);

        let before = self.values.len();
        while self.values.len() < target {
            match self
                .stream
                .try_read()
                .map_err(|e| CubeDctError::in_stage("entropy decoding", e))?
            {
                Some(value) => self.values.push(value),
                None => break,
            }
        }
        let filled = self.stream.filled_len();
        self.stream.compact(filled, CompactMode::Reading);

        if read == 0 && consumed == 0 && produced == 0 && self.values.len() == before {
            return Err(CubeDctError::TruncatedStream {
                frames_decoded: report.frames,
                values_pending: self.values.len(),
            });
        }
        Ok(())
    }

    /// Tops up the compressed staging buffer. Returns the number of bytes read.
    fn refill_staging<R: Read>(&mut self, reader: &mut R) -> Result<usize, CubeDctError> {
        if self.input_eof || self.staging.len() >= self.staging_capacity {
            return Ok(0);
        }
        let start = self.staging.len();
        self.staging.resize(self.staging_capacity, 0);
        let read = loop {
            match reader.read(&mut self.staging[start..]) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.staging.truncate(start);
                    return Err(e.into());
                }
            }
        };
        self.staging.truncate(start + read);
        if read == 0 {
            log::debug!("decode: compressed input exhausted");
            self.input_eof = true;
        }
        Ok(read)
    }

    /// Moves one batch of diagonal-ordered values into raster-ordered coefficients.
    fn scatter_batch(&mut self, batch_len: usize) {
        let volume = self.order.len();
        for (values, cube) in self.values[..batch_len]
            .chunks_exact(volume)
            .zip(self.coeffs.chunks_exact_mut(volume))
        {
            for (slot, &value) in self.ordered.iter_mut().zip(values) {
                *slot = value as f32;
            }
            self.order.scatter(&self.ordered, cube);
        }
    }
}
