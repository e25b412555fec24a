//! This module defines the core, strongly-typed data representations used
//! throughout the cubedct pipeline.
//!
//! It currently holds the cube geometry and the in-cube coordinate type. Every
//! stage (traversal order, quantizer, transform backend, frame layout) receives
//! the same `CubeGeometry` value instead of reading compile-time block constants.

pub mod geometry;

// Re-export the main type(s) for easier access.
pub use geometry::{Coordinate, CubeGeometry};
