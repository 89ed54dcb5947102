/// Discrete voxel coordinate: per-axis `floor(coord / voxel_size)`.
///
/// Two points share a key iff they fall in the same axis-aligned cube of edge
/// `voxel_size`. The derived `Ord` is lexicographic on `(ix, iy, iz)`, which
/// fixes the iteration order of the voxel map and therefore the output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoxelKey {
    pub ix: i32,
    pub iy: i32,
    pub iz: i32,
}

impl VoxelKey {
    /// Bin a point. `voxel_size` must be positive and finite; callers
    /// validate it once up front via `SamplerParams::validate`.
    pub fn of(p: [f64; 3], voxel_size: f64) -> Self {
        Self {
            ix: (p[0] / voxel_size).floor() as i32,
            iy: (p[1] / voxel_size).floor() as i32,
            iz: (p[2] / voxel_size).floor() as i32,
        }
    }

    /// Lower corner of the voxel: exactly `floor(c / voxel_size) * voxel_size`
    /// per axis, the snap formula used for emitted records.
    pub fn corner(&self, voxel_size: f64) -> [f64; 3] {
        [
            self.ix as f64 * voxel_size,
            self.iy as f64 * voxel_size,
            self.iz as f64 * voxel_size,
        ]
    }
}
