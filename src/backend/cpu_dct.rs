//! An in-process `TransformBackend`: the orthonormal 3D DCT-II and its inverse,
//! computed with a two-phase partial-sum/aggregate reduction.
//!
//! Phase 1 splits every output element's dot product into `volume / local_size`
//! groups and writes one partial sum per group into a reused buffer. Phase 2 reads
//! that buffer back and aggregates each element's partials. Phase 2 depends on all of
//! phase 1 having finished; the rayon `for_each` boundary provides that ordering.
//!
//! The basis is separable, so only three 1D cosine tables are stored and each 3D basis
//! value is their product.

use std::f64::consts::PI;

use rayon::prelude::*;

use crate::config::CodecConfig;
use crate::error::CubeDctError;
use crate::traits::TransformBackend;
use crate::types::{Coordinate, CubeGeometry};

/// Upper bound of a reconstructed sample.
const SAMPLE_MAX: f32 = 255.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Inverse,
}

/// Orthonormal 1D DCT-II matrix, row-major `[k * n_len + n]`.
fn cosine_table(n_len: usize) -> Vec<f32> {
    let n_f = n_len as f64;
    let mut table = Vec::with_capacity(n_len * n_len);
    for k in 0..n_len {
        let alpha = if k == 0 {
            (1.0 / n_f).sqrt()
        } else {
            (2.0 / n_f).sqrt()
        };
        for n in 0..n_len {
            let angle = PI * (2 * n + 1) as f64 * k as f64 / (2.0 * n_f);
            table.push((alpha * angle.cos()) as f32);
        }
    }
    table
}

/// The largest divisor of `volume` that does not exceed `max_work_group_size`.
pub fn work_group_size(volume: usize, max_work_group_size: usize) -> usize {
    let mut size = max_work_group_size.clamp(1, volume.max(1));
    while volume % size != 0 {
        size -= 1;
    }
    size
}

/// Separable basis of one cube geometry.
#[derive(Debug, Clone)]
struct DctBasis {
    geometry: CubeGeometry,
    cos_x: Vec<f32>,
    cos_y: Vec<f32>,
    cos_z: Vec<f32>,
    coords: Vec<Coordinate>,
}

impl DctBasis {
    fn new(geometry: CubeGeometry) -> Self {
        Self {
            geometry,
            cos_x: cosine_table(geometry.width),
            cos_y: cosine_table(geometry.height),
            cos_z: cosine_table(geometry.depth),
            coords: geometry.raster_coordinates().collect(),
        }
    }

    /// Basis function of frequency `k` sampled at position `n`.
    #[inline]
    fn at(&self, k: Coordinate, n: Coordinate) -> f32 {
        let g = &self.geometry;
        self.cos_x[k.x * g.width + n.x]
            * self.cos_y[k.y * g.height + n.y]
            * self.cos_z[k.z * g.depth + n.z]
    }
}

/// Reference transform backend running on the rayon thread pool.
pub struct CpuDctBackend {
    basis: DctBasis,
    local_size: usize,
    partials: Vec<f32>,
}

impl CpuDctBackend {
    pub fn new(geometry: CubeGeometry, max_work_group_size: usize) -> Result<Self, CubeDctError> {
        geometry.validate()?;
        if max_work_group_size == 0 {
            return Err(CubeDctError::InvalidConfig(
                "max_work_group_size must be positive".to_string(),
            ));
        }
        let local_size = work_group_size(geometry.volume(), max_work_group_size);
        log::debug!(
            "cpu dct backend: geometry {}, local size {}, {} partials per element",
            geometry,
            local_size,
            geometry.volume() / local_size
        );
        Ok(Self {
            basis: DctBasis::new(geometry),
            local_size,
            partials: Vec::new(),
        })
    }

    pub fn from_config(config: &CodecConfig) -> Result<Self, CubeDctError> {
        Self::new(config.geometry, config.max_work_group_size)
    }

    pub fn geometry(&self) -> CubeGeometry {
        self.basis.geometry
    }

    pub fn local_size(&self) -> usize {
        self.local_size
    }

    /// Number of partial sums produced per output element in phase 1.
    pub fn groups(&self) -> usize {
        self.basis.geometry.volume() / self.local_size
    }

    fn check_buffers(&self, input: &[f32], output: &[f32]) -> Result<(), CubeDctError> {
        let volume = self.basis.geometry.volume();
        if input.len() != output.len() {
            return Err(CubeDctError::BufferMismatch(input.len(), output.len()));
        }
        if input.len() % volume != 0 {
            return Err(CubeDctError::BufferMismatch(
                input.len().next_multiple_of(volume),
                input.len(),
            ));
        }
        Ok(())
    }

    fn run(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        direction: Direction,
    ) -> Result<(), CubeDctError> {
        self.check_buffers(input, output)?;
        let volume = self.basis.geometry.volume();
        let groups = self.groups();
        let local_size = self.local_size;

        let needed = input.len() * groups;
        if self.partials.len() < needed {
            self.partials.resize(needed, 0.0);
        }
        let basis = &self.basis;
        let partials = &mut self.partials[..needed];

        // Phase 1: partial sums.
        input
            .par_chunks(volume)
            .zip(partials.par_chunks_mut(volume * groups))
            .for_each(|(cube, cube_partials)| {
                for (element, slots) in cube_partials.chunks_mut(groups).enumerate() {
                    let target = basis.coords[element];
                    for (group, slot) in slots.iter_mut().enumerate() {
                        let start = group * local_size;
                        let span = start..start + local_size;
                        *slot = match direction {
                            Direction::Forward => span
                                .map(|n| cube[n] * basis.at(target, basis.coords[n]))
                                .sum::<f32>(),
                            Direction::Inverse => span
                                .filter(|&k| cube[k] != 0.0)
                                .map(|k| cube[k] * basis.at(basis.coords[k], target))
                                .sum::<f32>(),
                        };
                    }
                }
            });

        // Phase 2: aggregate.
        partials
            .par_chunks(groups)
            .zip(output.par_iter_mut())
            .for_each(|(slots, out)| {
                let sum: f32 = slots.iter().sum();
                *out = match direction {
                    Direction::Forward => sum,
                    Direction::Inverse => sum.clamp(0.0, SAMPLE_MAX),
                };
            });

        Ok(())
    }
}

impl TransformBackend for CpuDctBackend {
    fn forward(&mut self, input: &[f32], output: &mut [f32]) -> Result<(), CubeDctError> {
        self.run(input, output, Direction::Forward)
    }

    fn inverse(&mut self, input: &[f32], output: &mut [f32]) -> Result<(), CubeDctError> {
        self.run(input, output, Direction::Inverse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_work_group_size_divides_volume() {
        assert_eq!(work_group_size(512, 256), 256);
        assert_eq!(work_group_size(512, 1024), 512);
        assert_eq!(work_group_size(24, 5), 4);
        assert_eq!(work_group_size(7, 3), 1);
    }

    #[test]
    fn test_constant_cube_has_only_dc() {
        let geometry = CubeGeometry::new(4, 4, 2).unwrap();
        let mut backend = CpuDctBackend::new(geometry, 8).unwrap();
        assert_eq!(backend.groups(), 4);

        let input = vec![100.0f32; geometry.volume() * 2];
        let mut coeffs = vec![0.0f32; input.len()];
        backend.forward(&input, &mut coeffs).unwrap();

        let dc = 100.0 * (geometry.volume() as f32).sqrt();
        for cube in coeffs.chunks(geometry.volume()) {
            assert!((cube[0] - dc).abs() < 1e-2, "dc was {}", cube[0]);
            assert!(cube[1..].iter().all(|c| c.abs() < 1e-3));
        }
    }

    #[test]
    fn test_forward_then_inverse_recovers_samples() {
        let geometry = CubeGeometry::new(4, 2, 3).unwrap();
        let mut backend = CpuDctBackend::new(geometry, 5).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let input: Vec<f32> = (0..geometry.volume() * 3)
            .map(|_| rng.random_range(0..=255u8) as f32)
            .collect();

        let mut coeffs = vec![0.0f32; input.len()];
        let mut restored = vec![0.0f32; input.len()];
        backend.forward(&input, &mut coeffs).unwrap();
        backend.inverse(&coeffs, &mut restored).unwrap();

        for (a, b) in input.iter().zip(&restored) {
            assert!((a - b).abs() < 0.05, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_inverse_clamps_to_sample_range() {
        let geometry = CubeGeometry::new(2, 2, 2).unwrap();
        let mut backend = CpuDctBackend::new(geometry, 256).unwrap();
        let mut coeffs = vec![0.0f32; 8];
        coeffs[0] = 10_000.0;
        let mut samples = vec![0.0f32; 8];
        backend.inverse(&coeffs, &mut samples).unwrap();
        assert!(samples.iter().all(|&s| s == 255.0));

        coeffs[0] = -10_000.0;
        backend.inverse(&coeffs, &mut samples).unwrap();
        assert!(samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_partial_batch_is_rejected() {
        let geometry = CubeGeometry::new(2, 2, 2).unwrap();
        let mut backend = CpuDctBackend::new(geometry, 4).unwrap();
        let input = vec![0.0f32; 12];
        let mut output = vec![0.0f32; 12];
        assert!(matches!(
            backend.forward(&input, &mut output),
            Err(CubeDctError::BufferMismatch(16, 12))
        ));
        let mut short = vec![0.0f32; 8];
        assert!(backend.forward(&input[..8], &mut short[..4]).is_err());
    }
}
