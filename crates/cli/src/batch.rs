use std::fs;
use std::io;
use std::path::Path;

use sparsecloud_io::{read_labels, read_pcd, write_sparse};
use sparsecloud_sampling::{adaptive_downsample, DownsampleError, SamplerParams};

/// Per-scan outcome for batch reporting.
#[derive(Debug, Clone, Copy)]
pub struct ScanSummary {
    pub dense_points: usize,
    pub sparse_points: usize,
    pub voxels: usize,
    pub labeled: bool,
}

/// One scan failed; the batch driver logs it and continues.
#[derive(Debug)]
pub enum PipelineError {
    Read(io::Error),
    Downsample(DownsampleError),
    Write(io::Error),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Read(e) => write!(f, "cannot read dense input: {}", e),
            PipelineError::Downsample(e) => write!(f, "down-sampling failed: {}", e),
            PipelineError::Write(e) => write!(f, "cannot write sparse output: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Read(e) | PipelineError::Write(e) => Some(e),
            PipelineError::Downsample(e) => Some(e),
        }
    }
}

/// Process one scan end to end: read dense points and (optionally) labels,
/// down-sample, write the sparse result. Nothing is written unless the whole
/// map was built and finalized, so a failed scan leaves no partial output.
pub fn process_scan(
    dense_dir: &Path,
    sparse_dir: &Path,
    prefix: &str,
    voxel_size: f64,
) -> Result<ScanSummary, PipelineError> {
    let dense_points_path = dense_dir.join(format!("{}.pcd", prefix));
    let dense_labels_path = dense_dir.join(format!("{}.labels", prefix));
    let sparse_points_path = sparse_dir.join(format!("{}_all.txt", prefix));

    let cloud = read_pcd(&dense_points_path).map_err(PipelineError::Read)?;
    log::info!("{} dense points", cloud.len());

    let aabb = cloud.aabb();
    if !aabb.is_empty() {
        log::debug!("bounds min={:?} max={:?} extent={:?}", aabb.min, aabb.max, aabb.extent());
    }

    // The label file is optional: a missing one degrades the run to
    // unlabeled mode instead of failing.
    let labels = match read_labels(&dense_labels_path) {
        Ok(labels) => {
            log::info!("{} dense labels", labels.len());
            Some(labels)
        }
        Err(e) => {
            log::warn!(
                "dense labels not found ({}: {}), running unlabeled",
                dense_labels_path.display(),
                e
            );
            None
        }
    };

    let params = SamplerParams::new(voxel_size);
    let records = adaptive_downsample(&cloud, labels.as_deref(), &params)
        .map_err(PipelineError::Downsample)?;

    let voxels = count_voxels(&records);
    write_sparse(&sparse_points_path, &records, labels.is_some()).map_err(PipelineError::Write)?;
    log::info!("output written to {}", sparse_points_path.display());

    Ok(ScanSummary {
        dense_points: cloud.len(),
        sparse_points: records.len(),
        voxels,
        labeled: labels.is_some(),
    })
}

/// Scan a directory for `.pcd` files and return their stems, sorted. Used
/// when the caller does not pass an explicit prefix list.
pub fn discover_prefixes(dense_dir: &Path) -> io::Result<Vec<String>> {
    let mut prefixes = Vec::new();
    for entry in fs::read_dir(dense_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("pcd") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                prefixes.push(stem.to_string());
            }
        }
    }
    prefixes.sort_unstable();
    Ok(prefixes)
}

/// Records arrive sorted by voxel, so distinct corners count the voxels.
fn count_voxels(records: &[sparsecloud_core::VoxelCenter]) -> usize {
    let mut count = 0;
    let mut last: Option<[f64; 3]> = None;
    for rec in records {
        let corner = rec.position();
        if last != Some(corner) {
            count += 1;
            last = Some(corner);
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::{discover_prefixes, process_scan};
    use sparsecloud_core::PointCloud;
    use sparsecloud_io::{write_labels, write_pcd};
    use tempfile::tempdir;

    fn write_scan(dir: &std::path::Path, prefix: &str, n: usize) {
        let cloud = PointCloud::from_xyz(
            (0..n).map(|i| i as f64 * 0.7).collect(),
            (0..n).map(|i| i as f64 * 0.4).collect(),
            (0..n).map(|i| i as f64 * 0.2).collect(),
        );
        write_pcd(dir.join(format!("{}.pcd", prefix)), &cloud).unwrap();
    }

    #[test]
    fn discovers_pcd_stems_sorted() {
        let dir = tempdir().unwrap();
        write_scan(dir.path(), "station_b", 3);
        write_scan(dir.path(), "station_a", 3);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let prefixes = discover_prefixes(dir.path()).unwrap();
        assert_eq!(prefixes, vec!["station_a", "station_b"]);
    }

    #[test]
    fn labeled_scan_produces_labeled_output() {
        let dense = tempdir().unwrap();
        let sparse = tempdir().unwrap();
        write_scan(dense.path(), "scan", 20);
        write_labels(
            dense.path().join("scan.labels"),
            &(0..20).map(|i| (i % 3) as i32).collect::<Vec<_>>(),
        )
        .unwrap();

        let summary = process_scan(dense.path(), sparse.path(), "scan", 1.0).unwrap();
        assert!(summary.labeled);
        assert!(summary.sparse_points > 0);

        let content = std::fs::read_to_string(sparse.path().join("scan_all.txt")).unwrap();
        for line in content.lines() {
            let cols: Vec<&str> = line.split_whitespace().collect();
            assert_eq!(cols.len(), 7);
            // label 0 never reaches the output
            assert_ne!(cols[6], "0");
        }
    }

    #[test]
    fn missing_labels_degrades_to_unlabeled() {
        let dense = tempdir().unwrap();
        let sparse = tempdir().unwrap();
        write_scan(dense.path(), "scan", 10);

        let summary = process_scan(dense.path(), sparse.path(), "scan", 1.0).unwrap();
        assert!(!summary.labeled);

        let content = std::fs::read_to_string(sparse.path().join("scan_all.txt")).unwrap();
        assert!(content.lines().count() > 0);
        for line in content.lines() {
            assert_eq!(line.split_whitespace().count(), 6);
        }
    }

    #[test]
    fn missing_dense_file_is_a_read_error() {
        let dense = tempdir().unwrap();
        let sparse = tempdir().unwrap();
        let err = process_scan(dense.path(), sparse.path(), "ghost", 1.0).unwrap_err();
        assert!(matches!(err, super::PipelineError::Read(_)));
        assert!(!sparse.path().join("ghost_all.txt").exists());
    }

    #[test]
    fn invalid_voxel_size_fails_without_output() {
        let dense = tempdir().unwrap();
        let sparse = tempdir().unwrap();
        write_scan(dense.path(), "scan", 5);
        let err = process_scan(dense.path(), sparse.path(), "scan", 0.0).unwrap_err();
        assert!(matches!(err, super::PipelineError::Downsample(_)));
        assert!(!sparse.path().join("scan_all.txt").exists());
    }

    #[test]
    fn unwritable_output_directory_is_a_write_error() {
        let dense = tempdir().unwrap();
        let sparse = tempdir().unwrap();
        write_scan(dense.path(), "scan", 5);
        let missing = sparse.path().join("does_not_exist");
        let err = process_scan(dense.path(), &missing, "scan", 1.0).unwrap_err();
        assert!(matches!(err, super::PipelineError::Write(_)));
    }
}
