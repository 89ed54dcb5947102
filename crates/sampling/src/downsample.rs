use hashbrown::HashMap;
use rayon::prelude::*;
use sparsecloud_core::{PointCloud, VoxelCenter};

use crate::reservoir::SampleReservoir;
use crate::voxel::VoxelKey;

/// Tuning constants of the sampling engine. Only `voxel_size` varies between
/// runs in practice; the rest default to the values the pipeline was
/// calibrated with.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerParams {
    /// Edge length of the cubic voxels. Must be finite and > 0.
    pub voxel_size: f64,
    /// Reservoir slot count per voxel.
    pub capacity: usize,
    /// ε²: candidates closer than this (squared) to a retained point are dropped.
    pub min_separation_sq: f64,
    /// τ: smallest-eigenvalue threshold separating flat from structured voxels.
    pub flatness_threshold: f64,
    /// Points kept for a flat voxel.
    pub flat_budget: usize,
    /// Points kept for a structured voxel.
    pub structured_budget: usize,
}

impl SamplerParams {
    pub fn new(voxel_size: f64) -> Self {
        Self {
            voxel_size,
            capacity: 10,
            min_separation_sq: 0.001,
            flatness_threshold: 1e-5,
            flat_budget: 1,
            structured_budget: 4,
        }
    }

    pub fn validate(&self) -> Result<(), DownsampleError> {
        if !self.voxel_size.is_finite() || self.voxel_size <= 0.0 {
            return Err(DownsampleError::InvalidVoxelSize(self.voxel_size));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DownsampleError {
    /// The configured voxel size is non-positive or non-finite.
    InvalidVoxelSize(f64),
    /// A label column was supplied but its length differs from the cloud's.
    LabelCountMismatch { points: usize, labels: usize },
}

impl std::fmt::Display for DownsampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownsampleError::InvalidVoxelSize(v) => {
                write!(f, "voxel size must be finite and > 0, got {}", v)
            }
            DownsampleError::LabelCountMismatch { points, labels } => write!(
                f,
                "label count ({}) does not match point count ({})",
                labels, points
            ),
        }
    }
}

impl std::error::Error for DownsampleError {}

/// Reduce a dense cloud to a sparse representative subset.
///
/// Points are streamed once into per-voxel reservoirs; points labeled 0
/// ("unlabeled / ignore") are skipped entirely, as are points with
/// non-finite coordinates. After the stream every reservoir is finalized and
/// flattened to records, ordered by voxel key and, within a voxel, by
/// retention order — so identical input and parameters always produce
/// identical output.
///
/// `labels`, when present, must be parallel to the cloud (one per point).
/// When absent every point participates and the records carry `label: None`.
pub fn adaptive_downsample(
    cloud: &PointCloud,
    labels: Option<&[i32]>,
    params: &SamplerParams,
) -> Result<Vec<VoxelCenter>, DownsampleError> {
    params.validate()?;

    if let Some(labels) = labels {
        if labels.len() != cloud.len() {
            return Err(DownsampleError::LabelCountMismatch {
                points: cloud.len(),
                labels: labels.len(),
            });
        }
    }

    let mut voxels: HashMap<VoxelKey, SampleReservoir> = HashMap::new();

    for i in 0..cloud.len() {
        let label = labels.map(|l| l[i]);
        if label == Some(0) {
            continue;
        }

        let p = cloud.point(i);
        if !p.iter().all(|v| v.is_finite()) {
            continue;
        }

        let key = VoxelKey::of(p, params.voxel_size);
        let corner = key.corner(params.voxel_size);
        let [r, g, b] = cloud.color(i);
        let center = VoxelCenter {
            x: corner[0],
            y: corner[1],
            z: corner[2],
            r,
            g,
            b,
            label,
        };

        voxels
            .entry(key)
            .or_insert_with(|| SampleReservoir::new(params.capacity))
            .insert_if_room(p, center, params);

        if i > 0 && i % 1_000_000 == 0 {
            log::debug!("{} points binned into {} voxels", i, voxels.len());
        }
    }

    // Deterministic output order: sort once by key, then finalize. Each voxel
    // is independent, so the sweep runs in parallel.
    let mut entries: Vec<(VoxelKey, SampleReservoir)> = voxels.into_iter().collect();
    entries.sort_unstable_by_key(|(key, _)| *key);
    entries
        .par_iter_mut()
        .for_each(|(_, reservoir)| reservoir.finalize());

    let mut records = Vec::new();
    for (_, reservoir) in &entries {
        records.extend(reservoir.centers().cloned());
    }

    log::debug!(
        "{} dense points -> {} sparse points in {} voxels",
        cloud.len(),
        records.len(),
        entries.len()
    );

    Ok(records)
}
