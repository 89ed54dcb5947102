use std::fs;
use std::io::{self, BufWriter, Write as _};
use std::path::Path;

/// Reads a dense label file: whitespace/newline-separated integers, one per
/// point, in point order. A missing file is an ordinary io::Error; callers
/// that treat labels as optional recover from it and run unlabeled.
pub fn read_labels(path: impl AsRef<Path>) -> io::Result<Vec<i32>> {
    let content = fs::read_to_string(path)?;
    let mut labels = Vec::new();
    for token in content.split_whitespace() {
        let label = token.parse::<i32>().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid label token: {:?}", token),
            )
        })?;
        labels.push(label);
    }
    Ok(labels)
}

/// Writes a dense label file, one integer per line.
pub fn write_labels(path: impl AsRef<Path>, labels: &[i32]) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut out = BufWriter::new(file);
    for label in labels {
        writeln!(out, "{}", label)?;
    }
    out.flush()
}
