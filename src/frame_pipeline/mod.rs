//! This module owns the raw side of the codec: how a batch of 8-bit frames maps
//! onto the cube-batch buffer the transform backend consumes, and back.
//!
//! A batch is `geometry.depth` consecutive frames. Its cube-batch buffer lists the
//! cubes by cube row, then cube column; inside a cube, samples are in (z, y, x)
//! raster order, where `z` is the frame index within the batch.

use std::io::{ErrorKind, Read, Write};

use crate::error::CubeDctError;
use crate::types::CubeGeometry;

//==================================================================================
// 1. Layout
//==================================================================================

/// The raw frame geometry of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub frame_width: usize,
    pub frame_height: usize,
    pub geometry: CubeGeometry,
}

impl FrameLayout {
    pub fn new(frame_width: usize, frame_height: usize, geometry: CubeGeometry) -> Self {
        Self {
            frame_width,
            frame_height,
            geometry,
        }
    }

    /// Bytes in one frame.
    pub fn frame_size(&self) -> usize {
        self.frame_width * self.frame_height
    }

    /// Frames per batch.
    pub fn frames_per_batch(&self) -> usize {
        self.geometry.depth
    }

    /// Samples (and raw bytes) in one batch.
    pub fn batch_len(&self) -> usize {
        self.frame_size() * self.geometry.depth
    }

    pub fn cubes_per_row(&self) -> usize {
        self.frame_width / self.geometry.width
    }

    pub fn cubes_per_batch(&self) -> usize {
        self.cubes_per_row() * (self.frame_height / self.geometry.height)
    }

    /// Frame count that fits in `input_len` raw bytes, rounded down to whole batches.
    pub fn frames_in_input(&self, input_len: u64) -> usize {
        let batch = self.batch_len() as u64;
        if batch == 0 {
            return 0;
        }
        ((input_len / batch) * self.geometry.depth as u64) as usize
    }

    /// Checks that a frame count is a whole number of batches.
    pub fn check_frame_count(&self, frames: usize) -> Result<(), CubeDctError> {
        if frames % self.geometry.depth != 0 {
            return Err(CubeDctError::InvalidConfig(format!(
                "frame count {} is not a multiple of the cube depth {}",
                frames, self.geometry.depth
            )));
        }
        Ok(())
    }

    fn check_lengths(&self, raw: usize, samples: usize) -> Result<(), CubeDctError> {
        let expected = self.batch_len();
        if raw != expected {
            return Err(CubeDctError::BufferMismatch(expected, raw));
        }
        if samples != expected {
            return Err(CubeDctError::BufferMismatch(expected, samples));
        }
        Ok(())
    }

    /// Visits every (raw offset, cube-batch offset) pair of one batch, cube by cube.
    fn for_each_sample(&self, mut visit: impl FnMut(usize, usize)) {
        let g = self.geometry;
        let frame_size = self.frame_size();
        let mut out = 0;
        for cube_y in (0..self.frame_height).step_by(g.height) {
            for cube_x in (0..self.frame_width).step_by(g.width) {
                for z in 0..g.depth {
                    for y in 0..g.height {
                        let row = z * frame_size + (cube_y + y) * self.frame_width + cube_x;
                        for x in 0..g.width {
                            visit(row + x, out);
                            out += 1;
                        }
                    }
                }
            }
        }
    }

    //==============================================================================
    // 2. Decomposition / Composition
    //==============================================================================

    /// Rearranges `depth` raw frames into cube-batch order.
    pub fn decompose(&self, raw: &[u8], samples: &mut [f32]) -> Result<(), CubeDctError> {
        self.check_lengths(raw.len(), samples.len())?;
        self.for_each_sample(|src, dst| samples[dst] = raw[src] as f32);
        Ok(())
    }

    /// The inverse of [`Self::decompose`]. Samples are rounded and clamped to 0..=255.
    pub fn compose(&self, samples: &[f32], raw: &mut [u8]) -> Result<(), CubeDctError> {
        self.check_lengths(raw.len(), samples.len())?;
        self.for_each_sample(|dst, src| raw[dst] = samples[src].round().clamp(0.0, 255.0) as u8);
        Ok(())
    }

    //==============================================================================
    // 3. Batch I/O
    //==============================================================================

    /// Reads one batch starting at `first_frame` and decomposes it into `samples`.
    ///
    /// `scratch` must hold exactly one batch. A source that ends early is a `ShortRead`.
    pub fn read_batch<R: Read>(
        &self,
        reader: &mut R,
        scratch: &mut [u8],
        samples: &mut [f32],
        first_frame: usize,
    ) -> Result<(), CubeDctError> {
        reader.read_exact(scratch).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => CubeDctError::ShortRead {
                expected: scratch.len(),
                frame: first_frame,
            },
            _ => CubeDctError::Io(e),
        })?;
        self.decompose(scratch, samples)
    }

    /// Composes one reconstructed batch and writes its frames to `writer`.
    pub fn write_batch<W: Write>(
        &self,
        writer: &mut W,
        samples: &[f32],
        scratch: &mut [u8],
    ) -> Result<(), CubeDctError> {
        self.compose(samples, scratch)?;
        writer.write_all(scratch)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> FrameLayout {
        FrameLayout::new(4, 2, CubeGeometry::new(2, 2, 2).unwrap())
    }

    #[test]
    fn test_decompose_orders_cubes_then_raster() {
        let layout = layout();
        assert_eq!(layout.batch_len(), 16);
        assert_eq!(layout.cubes_per_batch(), 2);

        let raw: Vec<u8> = (0..16).collect();
        let mut samples = vec![0.0f32; 16];
        layout.decompose(&raw, &mut samples).unwrap();

        // First cube: frame 0 rows 0..2 cols 0..2, then the same window of frame 1.
        let expected: Vec<f32> = [0, 1, 4, 5, 8, 9, 12, 13, 2, 3, 6, 7, 10, 11, 14, 15]
            .iter()
            .map(|&v| v as f32)
            .collect();
        assert_eq!(samples, expected);
    }

    #[test]
    fn test_compose_inverts_decompose() {
        let layout = FrameLayout::new(8, 4, CubeGeometry::new(4, 2, 3).unwrap());
        let raw: Vec<u8> = (0..layout.batch_len()).map(|i| (i * 7 % 256) as u8).collect();
        let mut samples = vec![0.0f32; raw.len()];
        layout.decompose(&raw, &mut samples).unwrap();

        let mut restored = vec![0u8; raw.len()];
        layout.compose(&samples, &mut restored).unwrap();
        assert_eq!(restored, raw);
    }

    #[test]
    fn test_compose_rounds_and_clamps() {
        let layout = layout();
        let mut samples = vec![99.6f32; 16];
        samples[0] = -3.0;
        samples[1] = 300.0;
        let mut raw = vec![0u8; 16];
        layout.compose(&samples, &mut raw).unwrap();
        assert_eq!(raw[0], 0);
        assert_eq!(raw[1], 255);
        assert_eq!(raw[4], 100);
    }

    #[test]
    fn test_short_read_reports_frame() {
        let layout = layout();
        let source = vec![7u8; 20];
        let mut reader = source.as_slice();
        let mut scratch = vec![0u8; 16];
        let mut samples = vec![0.0f32; 16];

        layout.read_batch(&mut reader, &mut scratch, &mut samples, 0).unwrap();
        let err = layout
            .read_batch(&mut reader, &mut scratch, &mut samples, 2)
            .unwrap_err();
        assert!(matches!(err, CubeDctError::ShortRead { expected: 16, frame: 2 }));
    }

    #[test]
    fn test_frame_count_helpers() {
        let layout = layout();
        assert_eq!(layout.frames_in_input(16 * 3 + 5), 6);
        assert_eq!(layout.frames_in_input(10), 0);
        assert!(layout.check_frame_count(4).is_ok());
        assert!(layout.check_frame_count(3).is_err());
    }
}
