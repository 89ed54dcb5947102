/// One retained representative point, as emitted by the sampling engine.
///
/// The coordinates are snapped to the lower corner of the voxel the source
/// point fell in (`floor(c / voxel_size) * voxel_size` per axis), so every
/// record of the same voxel carries the same `(x, y, z)`; records differ in
/// color and label because they stand for distinct source points.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelCenter {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Color channels in `[0, 1]`, copied from the source point.
    pub r: f64,
    pub g: f64,
    pub b: f64,
    /// Semantic class of the source point; `None` when the run had no labels.
    pub label: Option<i32>,
}

impl VoxelCenter {
    pub fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn color(&self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }
}
