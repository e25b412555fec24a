//! This module contains the diagonal traversal order used to serialize the
//! coefficients of one cube.
//!
//! Coefficients are emitted shell by shell, where a shell is every coordinate with the
//! same `x + y + z`. Quantization drives most large-sum (high-frequency) coefficients
//! to zero, so this order packs them into long contiguous zero runs right before the
//! byte-stream compressor sees them. The table is a pure function of the geometry and
//! is shared, read-only, by the encode and decode paths.

use crate::types::{Coordinate, CubeGeometry};

/// The shell-by-shell traversal of one cube, with its raster projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagonalOrder {
    geometry: CubeGeometry,
    positions: Vec<Coordinate>,
    raster_indices: Vec<usize>,
}

impl DiagonalOrder {
    /// Builds the traversal for `geometry`.
    ///
    /// Within a shell the scan runs `y` (outer), `z`, then `x` (inner). Each loop is
    /// bounded to the only values that can still reach the target sum given the other
    /// two axes' maxima, so nearly every visited triple is a hit.
    pub fn build(geometry: CubeGeometry) -> Self {
        let positions = diagonal_positions(geometry.width, geometry.height, geometry.depth);
        let raster_indices = positions.iter().map(|&c| geometry.index_of(c)).collect();
        Self {
            geometry,
            positions,
            raster_indices,
        }
    }

    pub fn geometry(&self) -> CubeGeometry {
        self.geometry
    }

    /// Number of positions; always equal to the cube volume.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The coordinates, in traversal order.
    pub fn positions(&self) -> &[Coordinate] {
        &self.positions
    }

    /// For each traversal step, the raster (z, y, x) offset inside the cube.
    pub fn raster_indices(&self) -> &[usize] {
        &self.raster_indices
    }

    /// Copies one raster-ordered cube into traversal order.
    pub fn gather<T: Copy>(&self, cube: &[T], out: &mut Vec<T>) {
        out.extend(self.raster_indices.iter().map(|&i| cube[i]));
    }

    /// Writes traversal-ordered values back into a raster-ordered cube.
    pub fn scatter<T: Copy>(&self, ordered: &[T], cube: &mut [T]) {
        for (&raster, &value) in self.raster_indices.iter().zip(ordered) {
            cube[raster] = value;
        }
    }
}

fn diagonal_positions(width: usize, height: usize, depth: usize) -> Vec<Coordinate> {
    let mut positions = Vec::with_capacity(width * height * depth);
    let max_sum = (width - 1) + (height - 1) + (depth - 1);

    for target in 0..=max_sum {
        let max_x = (width - 1).min(target);
        let max_y = (height - 1).min(target);
        let max_z = (depth - 1).min(target);
        let min_x = target.saturating_sub(max_y + max_z);
        let min_y = target.saturating_sub(max_x + max_z);
        let min_z = target.saturating_sub(max_x + max_y);

        for y in min_y..=max_y {
            for z in min_z..=max_z {
                for x in min_x..=max_x {
                    if x + y + z == target {
                        positions.push(Coordinate { x, y, z });
                    }
                }
            }
        }
    }
    positions
}
