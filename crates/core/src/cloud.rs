use crate::Aabb;

/// A dense point cloud in structure-of-arrays layout.
///
/// Coordinates are f64: outdoor LiDAR scans sit far from the origin and the
/// voxel corner snapping downstream must stay exact. Colors are optional and
/// normalized to `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub colors: Option<Colors>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Colors {
    pub r: Vec<f64>,
    pub g: Vec<f64>,
    pub b: Vec<f64>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self {
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            colors: None,
        }
    }

    pub fn from_xyz(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Self {
        assert_eq!(x.len(), y.len(), "x and y must have same length");
        assert_eq!(x.len(), z.len(), "x and z must have same length");

        Self {
            x,
            y,
            z,
            colors: None,
        }
    }

    pub fn with_colors(
        x: Vec<f64>,
        y: Vec<f64>,
        z: Vec<f64>,
        r: Vec<f64>,
        g: Vec<f64>,
        b: Vec<f64>,
    ) -> Self {
        let mut cloud = Self::from_xyz(x, y, z);
        assert_eq!(cloud.len(), r.len(), "color columns must match point count");
        assert_eq!(r.len(), g.len(), "r and g must have same length");
        assert_eq!(r.len(), b.len(), "r and b must have same length");
        cloud.colors = Some(Colors { r, g, b });
        cloud
    }

    pub fn len(&self) -> usize {
        debug_assert_eq!(self.x.len(), self.y.len());
        debug_assert_eq!(self.x.len(), self.z.len());
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn point(&self, i: usize) -> [f64; 3] {
        [self.x[i], self.y[i], self.z[i]]
    }

    /// Color of point `i`, or black when the cloud carries no colors.
    pub fn color(&self, i: usize) -> [f64; 3] {
        match &self.colors {
            Some(c) => [c.r[i], c.g[i], c.b[i]],
            None => [0.0, 0.0, 0.0],
        }
    }

    pub fn iter_points(&self) -> impl Iterator<Item = [f64; 3]> + '_ {
        self.x
            .iter()
            .zip(&self.y)
            .zip(&self.z)
            .map(|((x, y), z)| [*x, *y, *z])
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_cloud(self)
    }
}

impl Default for PointCloud {
    fn default() -> Self {
        Self::new()
    }
}
