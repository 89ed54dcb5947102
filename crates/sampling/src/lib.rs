#![forbid(unsafe_code)]

pub mod downsample;
pub mod flatness;
pub mod reservoir;
pub mod voxel;

pub use downsample::{adaptive_downsample, DownsampleError, SamplerParams};
pub use flatness::{classify, smallest_eigenvalue, ShapeClass};
pub use reservoir::SampleReservoir;
pub use voxel::VoxelKey;
