//! Transform backends the codec pipeline can drive.
//!
//! The pipeline only depends on `traits::TransformBackend`. This module ships the
//! reference CPU implementation; device backends plug in through the same trait.

pub mod cpu_dct;

pub use cpu_dct::CpuDctBackend;
