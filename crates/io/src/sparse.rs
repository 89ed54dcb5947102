use sparsecloud_core::VoxelCenter;
use std::fs;
use std::io::{self, BufWriter, Write as _};
use std::path::Path;

/// Writes the sparse result file: one ASCII line per retained point,
/// `x y z r g b` plus a trailing ` label` column when the run had labels.
/// Records are written in the order given (voxel-key order from the engine).
///
/// A create failure names the path and hints at the usual cause — the output
/// directory not existing yet.
pub fn write_sparse(
    path: impl AsRef<Path>,
    records: &[VoxelCenter],
    with_labels: bool,
) -> io::Result<()> {
    let path = path.as_ref();
    let file = fs::File::create(path).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!(
                "output file cannot be created: {} ({}); consider creating the directory first",
                path.display(),
                e
            ),
        )
    })?;

    let mut out = BufWriter::new(file);
    for rec in records {
        write!(out, "{} {} {} {} {} {}", rec.x, rec.y, rec.z, rec.r, rec.g, rec.b)?;
        if with_labels {
            if let Some(label) = rec.label {
                write!(out, " {}", label)?;
            }
        }
        writeln!(out)?;
    }
    out.flush()
}
