#![forbid(unsafe_code)]

//! Facade over the sparsecloud workspace crates.
//!
//! The pipeline reduces a dense, optionally per-point-labeled point cloud to
//! a sparse representative subset: points are binned into voxels, each voxel
//! keeps a small spatially diverse reservoir of candidates, and a PCA
//! flatness test decides whether the voxel is adequately represented by one
//! point (flat) or needs a richer sample (structured).

pub use sparsecloud_core::{Aabb, Colors, PointCloud, VoxelCenter};
pub use sparsecloud_io::{
    read_labels, read_pcd, write_labels, write_pcd, write_pcd_binary, write_sparse,
};
pub use sparsecloud_sampling::{
    adaptive_downsample, classify, smallest_eigenvalue, DownsampleError, SampleReservoir,
    SamplerParams, ShapeClass, VoxelKey,
};
