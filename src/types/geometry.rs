//! Cube geometry and in-cube coordinates.

use crate::error::CubeDctError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The default edge length of a transform block, in voxels.
pub const DEFAULT_BLOCK_EDGE: usize = 8;

/// The dimensions of one transform cube: `width × height × depth` voxels.
///
/// The geometry is fixed for a codec instance; every cube of every batch shares it.
/// `depth` is also the number of frames consumed per batch.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CubeGeometry {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

impl Default for CubeGeometry {
    fn default() -> Self {
        Self {
            width: DEFAULT_BLOCK_EDGE,
            height: DEFAULT_BLOCK_EDGE,
            depth: DEFAULT_BLOCK_EDGE,
        }
    }
}

impl CubeGeometry {
    /// Creates a validated geometry.
    pub fn new(width: usize, height: usize, depth: usize) -> Result<Self, CubeDctError> {
        let geometry = Self {
            width,
            height,
            depth,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Checks that every dimension is positive.
    pub fn validate(&self) -> Result<(), CubeDctError> {
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return Err(CubeDctError::InvalidGeometry(format!(
                "all cube dimensions must be positive, got {}",
                self
            )));
        }
        Ok(())
    }

    /// Number of voxels in one cube. This is the quantization and entropy unit size.
    pub fn volume(&self) -> usize {
        self.width * self.height * self.depth
    }

    /// Number of voxels in one `z` slice of the cube.
    pub fn face_size(&self) -> usize {
        self.width * self.height
    }

    /// The largest `x + y + z` any coordinate of this cube can have.
    pub fn max_coordinate_sum(&self) -> usize {
        (self.width - 1) + (self.height - 1) + (self.depth - 1)
    }

    /// Raster (z, y, x) offset of a coordinate inside one cube.
    #[inline]
    pub fn index_of(&self, coord: Coordinate) -> usize {
        coord.z * self.face_size() + coord.y * self.width + coord.x
    }

    /// The coordinate living at a raster offset inside one cube.
    #[inline]
    pub fn coordinate_at(&self, index: usize) -> Coordinate {
        let face = self.face_size();
        Coordinate {
            x: index % self.width,
            y: (index % face) / self.width,
            z: index / face,
        }
    }

    /// Iterates every coordinate of the cube in raster (z, y, x) order.
    pub fn raster_coordinates(&self) -> impl Iterator<Item = Coordinate> + '_ {
        (0..self.volume()).map(move |index| self.coordinate_at(index))
    }
}

impl fmt::Display for CubeGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.depth)
    }
}

/// Parses the `WxHxD` form used on the command line.
impl std::str::FromStr for CubeGeometry {
    type Err = CubeDctError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('x').collect();
        if parts.len() != 3 {
            return Err(CubeDctError::InvalidGeometry(format!(
                "expected WxHxD, got '{}'",
                s
            )));
        }
        let mut dims = [0usize; 3];
        for (dim, part) in dims.iter_mut().zip(&parts) {
            *dim = part.trim().parse().map_err(|_| {
                CubeDctError::InvalidGeometry(format!("'{}' is not a dimension in '{}'", part, s))
            })?;
        }
        Self::new(dims[0], dims[1], dims[2])
    }
}

/// A voxel position inside one cube. `0 <= x < width`, and likewise for `y` and `z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coordinate {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Coordinate {
    pub fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// The diagonal shell this coordinate belongs to.
    #[inline]
    pub fn sum(&self) -> usize {
        self.x + self.y + self.z
    }
}
