use sparsecloud_core::VoxelCenter;

use crate::downsample::SamplerParams;
use crate::flatness::{classify, ShapeClass};

/// One retained candidate: the original sample position (used by the
/// separation test and the plane fit) plus the corner-snapped output record.
#[derive(Debug, Clone)]
struct Slot {
    position: [f64; 3],
    center: VoxelCenter,
}

/// Bounded per-voxel buffer of candidate representative points.
///
/// Candidates are accepted while there is room and the candidate keeps a
/// minimum squared distance ε² to everything already retained, which spends
/// the few slots on spatially diverse samples instead of near-duplicates.
/// The first time the buffer fills, the flatness of the retained sample is
/// classified and the buffer shrinks to the decided budget; from then on the
/// reservoir is finalized and drops all further candidates without scanning.
#[derive(Debug, Clone)]
pub struct SampleReservoir {
    slots: Vec<Slot>,
    finalized: bool,
}

impl SampleReservoir {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            finalized: false,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Offer a candidate. `position` is the source point's original
    /// coordinates; `center` the record to emit if the candidate is kept.
    pub fn insert_if_room(&mut self, position: [f64; 3], center: VoxelCenter, params: &SamplerParams) {
        if self.finalized {
            return;
        }

        // Empty reservoir: distance is unbounded, always accept.
        let min_d2 = self
            .slots
            .iter()
            .map(|s| squared_distance(s.position, position))
            .fold(f64::INFINITY, f64::min);

        if min_d2 > params.min_separation_sq {
            self.slots.push(Slot { position, center });
            if self.slots.len() >= params.capacity {
                self.apply_shape_budget(params);
                self.finalized = true;
            }
        }
    }

    /// Freeze the reservoir as-is. Idempotent; reservoirs that never reached
    /// capacity keep whatever they accepted, with no shape decision.
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    /// Emitted records, in retention order.
    pub fn centers(&self) -> impl Iterator<Item = &VoxelCenter> {
        self.slots.iter().map(|s| &s.center)
    }

    /// Retained sample positions, in retention order.
    pub fn positions(&self) -> Vec<[f64; 3]> {
        self.slots.iter().map(|s| s.position).collect()
    }

    /// Classify the filled reservoir and shrink to the decided point budget.
    ///
    /// Flat surfaces keep only the first-accepted point; structured ones keep
    /// the most mutually separated subset. Selection is deterministic so
    /// repeated runs on identical input emit identical output.
    fn apply_shape_budget(&mut self, params: &SamplerParams) {
        if self.slots.len() < 3 {
            // A plane fit needs at least 3 points.
            return;
        }

        let positions = self.positions();
        let budget = match classify(&positions, params.flatness_threshold) {
            ShapeClass::Flat => params.flat_budget,
            ShapeClass::Structured => params.structured_budget,
        };

        if budget >= self.slots.len() {
            return;
        }

        let mut keep = farthest_point_subset(&positions, budget);
        keep.sort_unstable(); // emit survivors in insertion order
        let mut kept = Vec::with_capacity(keep.len());
        for idx in keep {
            kept.push(self.slots[idx].clone());
        }
        self.slots = kept;
    }
}

/// Greedy farthest-point selection of `k` indices, seeded at index 0 (the
/// first-accepted point). Each step adds the point maximizing the minimum
/// squared distance to the chosen set; ties break toward the lower index.
fn farthest_point_subset(positions: &[[f64; 3]], k: usize) -> Vec<usize> {
    debug_assert!(k >= 1 && k <= positions.len());

    let mut chosen = vec![0usize];
    let mut min_d2: Vec<f64> = positions
        .iter()
        .map(|&p| squared_distance(positions[0], p))
        .collect();

    while chosen.len() < k {
        let mut best = None;
        let mut best_d2 = f64::NEG_INFINITY;
        for (i, &d2) in min_d2.iter().enumerate() {
            if chosen.contains(&i) {
                continue;
            }
            if d2 > best_d2 {
                best_d2 = d2;
                best = Some(i);
            }
        }
        let next = match best {
            Some(i) => i,
            None => break,
        };
        chosen.push(next);
        for (i, d2) in min_d2.iter_mut().enumerate() {
            let d = squared_distance(positions[next], positions[i]);
            if d < *d2 {
                *d2 = d;
            }
        }
    }

    chosen
}

fn squared_distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}
