//! Batch down-sampling driver.
//!
//! Usage: sparsecloud <dense_dir> <sparse_dir> <voxel_size> [prefix...]
//!
//! For every prefix the driver reads `<dense_dir>/<prefix>.pcd` (and
//! `<dense_dir>/<prefix>.labels` when present), runs the adaptive voxel
//! down-sampling, and writes `<sparse_dir>/<prefix>_all.txt`. When no
//! prefixes are given they are discovered by scanning `dense_dir` for
//! `.pcd` files. A failing file is logged and the batch moves on.

mod batch;

use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!("USAGE: {} dense_dir sparse_dir voxel_size [prefix...]", args[0]);
        return ExitCode::from(1);
    }

    let dense_dir = Path::new(&args[1]);
    let sparse_dir = Path::new(&args[2]);
    // No validation here: the sampling engine rejects non-positive sizes.
    let voxel_size: f64 = match args[3].parse() {
        Ok(v) => v,
        Err(_) => {
            eprintln!("voxel_size must be a number, got {:?}", args[3]);
            return ExitCode::from(1);
        }
    };

    let prefixes: Vec<String> = if args.len() > 4 {
        args[4..].to_vec()
    } else {
        match batch::discover_prefixes(dense_dir) {
            Ok(found) => found,
            Err(e) => {
                log::error!("cannot scan {}: {}", dense_dir.display(), e);
                return ExitCode::from(1);
            }
        }
    };

    if prefixes.is_empty() {
        log::warn!("no input scans found in {}", dense_dir.display());
        return ExitCode::SUCCESS;
    }

    let mut failures = 0usize;
    for prefix in &prefixes {
        log::info!("[down-sampling] {}", prefix);
        match batch::process_scan(dense_dir, sparse_dir, prefix, voxel_size) {
            Ok(summary) => log::info!(
                "{}: {} dense -> {} sparse points in {} voxels",
                prefix,
                summary.dense_points,
                summary.sparse_points,
                summary.voxels
            ),
            Err(e) => {
                log::error!("{}: {}", prefix, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        log::error!("{} of {} scans failed", failures, prefixes.len());
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}
