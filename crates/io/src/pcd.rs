use sparsecloud_core::{Colors, PointCloud};
use std::fs;
use std::io;
use std::path::Path;

/// Reads a PCD file (ASCII or binary little-endian).
///
/// Coordinates come from the `x y z` fields. Colors are taken from either a
/// packed `rgb` field (PCL convention: the bit pattern holds `0x00RRGGBB`) or
/// separate `r g b` fields, and are normalized to `[0, 1]`. Files without
/// color fields load with `colors: None`.
pub fn read_pcd(path: impl AsRef<Path>) -> io::Result<PointCloud> {
    let raw = fs::read(path)?;
    let header = parse_header(&raw)?;

    match header.format {
        DataFormat::Ascii => read_ascii(&raw, &header),
        DataFormat::Binary => read_binary(&raw, &header),
    }
}

/// Writes an ASCII PCD file with `x y z` and, when the cloud has colors, a
/// packed `rgb` column.
pub fn write_pcd(path: impl AsRef<Path>, cloud: &PointCloud) -> io::Result<()> {
    let mut out = header_text(cloud, "ascii");
    for i in 0..cloud.len() {
        if cloud.colors.is_some() {
            out.push_str(&format!(
                "{} {} {} {}\n",
                cloud.x[i],
                cloud.y[i],
                cloud.z[i],
                pack_rgb(cloud.color(i))
            ));
        } else {
            out.push_str(&format!("{} {} {}\n", cloud.x[i], cloud.y[i], cloud.z[i]));
        }
    }
    fs::write(path, out)
}

/// Writes a binary little-endian PCD file (f64 coordinates, packed rgb).
pub fn write_pcd_binary(path: impl AsRef<Path>, cloud: &PointCloud) -> io::Result<()> {
    let header = header_text(cloud, "binary");
    let point_size = if cloud.colors.is_some() { 28 } else { 24 };
    let mut buf = Vec::with_capacity(header.len() + cloud.len() * point_size);
    buf.extend_from_slice(header.as_bytes());

    for i in 0..cloud.len() {
        buf.extend_from_slice(&cloud.x[i].to_le_bytes());
        buf.extend_from_slice(&cloud.y[i].to_le_bytes());
        buf.extend_from_slice(&cloud.z[i].to_le_bytes());
        if cloud.colors.is_some() {
            buf.extend_from_slice(&pack_rgb(cloud.color(i)).to_le_bytes());
        }
    }
    fs::write(path, buf)
}

// --- Internal helpers ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataFormat {
    Ascii,
    Binary,
}

struct PcdHeader {
    format: DataFormat,
    points: usize,
    fields: Vec<String>,
    sizes: Vec<usize>,
    data_offset: usize, // byte offset just past the DATA line
}

impl PcdHeader {
    fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

fn header_text(cloud: &PointCloud, data: &str) -> String {
    let (fields, size, ptype, count) = if cloud.colors.is_some() {
        ("x y z rgb", "8 8 8 4", "F F F U", "1 1 1 1")
    } else {
        ("x y z", "8 8 8", "F F F", "1 1 1")
    };
    format!(
        "# .PCD v0.7 - Point Cloud Data file format\n\
         VERSION 0.7\n\
         FIELDS {}\n\
         SIZE {}\n\
         TYPE {}\n\
         COUNT {}\n\
         WIDTH {}\n\
         HEIGHT 1\n\
         VIEWPOINT 0 0 0 1 0 0 0\n\
         POINTS {}\n\
         DATA {}\n",
        fields,
        size,
        ptype,
        count,
        cloud.len(),
        cloud.len(),
        data
    )
}

/// Finds the byte offset just past the newline ending the DATA line.
fn find_data_line_end(raw: &[u8]) -> Option<usize> {
    let marker = b"DATA";
    for i in 0..raw.len().saturating_sub(marker.len()) {
        if (i == 0 || raw[i - 1] == b'\n') && raw[i..].starts_with(marker) {
            return match raw[i..].iter().position(|&b| b == b'\n') {
                Some(off) => Some(i + off + 1),
                None => Some(raw.len()),
            };
        }
    }
    None
}

fn parse_header(raw: &[u8]) -> io::Result<PcdHeader> {
    let data_offset =
        find_data_line_end(raw).ok_or_else(|| invalid("PCD file missing DATA line"))?;
    let text = std::str::from_utf8(&raw[..data_offset])
        .map_err(|_| invalid("PCD header is not valid UTF-8"))?;

    let mut format = None;
    let mut points = None;
    let mut width = None;
    let mut fields: Vec<String> = Vec::new();
    let mut sizes: Vec<usize> = Vec::new();

    for line in text.lines() {
        let mut tokens = line.split_whitespace();
        let Some(tag) = tokens.next() else { continue };
        match tag {
            "FIELDS" => fields = tokens.map(|t| t.to_string()).collect(),
            "SIZE" => {
                sizes = tokens
                    .map(|t| t.parse::<usize>())
                    .collect::<Result<_, _>>()
                    .map_err(|e| invalid(format!("invalid SIZE value: {}", e)))?;
            }
            "POINTS" => {
                points = Some(
                    tokens
                        .next()
                        .ok_or_else(|| invalid("POINTS line missing value"))?
                        .parse::<usize>()
                        .map_err(|e| invalid(format!("invalid POINTS value: {}", e)))?,
                );
            }
            "WIDTH" => {
                width = tokens.next().and_then(|t| t.parse::<usize>().ok());
            }
            "DATA" => {
                format = match tokens.next() {
                    Some("ascii") => Some(DataFormat::Ascii),
                    Some("binary") => Some(DataFormat::Binary),
                    Some(other) => {
                        return Err(io::Error::new(
                            io::ErrorKind::Unsupported,
                            format!("unsupported PCD DATA format: {}", other),
                        ));
                    }
                    None => return Err(invalid("DATA line missing format")),
                };
            }
            _ => {}
        }
    }

    if fields.is_empty() {
        fields = vec!["x".to_string(), "y".to_string(), "z".to_string()];
    }
    if sizes.len() != fields.len() {
        // ASCII parsing does not need sizes; default to 4-byte fields.
        sizes = vec![4; fields.len()];
    }

    let header = PcdHeader {
        format: format.ok_or_else(|| invalid("PCD file missing DATA line"))?,
        points: points
            .or(width)
            .ok_or_else(|| invalid("PCD file missing POINTS/WIDTH header"))?,
        fields,
        sizes,
        data_offset,
    };

    for name in ["x", "y", "z"] {
        if header.field_index(name).is_none() {
            return Err(invalid(format!("PCD file missing {} field", name)));
        }
    }

    Ok(header)
}

fn unpack_rgb(packed: u32) -> [f64; 3] {
    [
        ((packed >> 16) & 0xff) as f64 / 255.0,
        ((packed >> 8) & 0xff) as f64 / 255.0,
        (packed & 0xff) as f64 / 255.0,
    ]
}

fn pack_rgb(color: [f64; 3]) -> u32 {
    let channel = |v: f64| ((v.clamp(0.0, 1.0) * 255.0).round() as u32) & 0xff;
    (channel(color[0]) << 16) | (channel(color[1]) << 8) | channel(color[2])
}

/// A packed rgb token in ASCII is either the raw integer or a float whose bit
/// pattern holds the integer (both occur in the wild).
fn parse_packed_rgb(token: &str) -> io::Result<u32> {
    if let Ok(v) = token.parse::<u32>() {
        return Ok(v);
    }
    token
        .parse::<f32>()
        .map(|f| f.to_bits())
        .map_err(|_| invalid(format!("invalid rgb value: {}", token)))
}

fn read_ascii(raw: &[u8], header: &PcdHeader) -> io::Result<PointCloud> {
    let content =
        std::str::from_utf8(raw).map_err(|e| invalid(format!("invalid UTF-8: {}", e)))?;

    let ix = header.field_index("x").unwrap_or(0);
    let iy = header.field_index("y").unwrap_or(1);
    let iz = header.field_index("z").unwrap_or(2);
    let irgb = header.field_index("rgb");
    let irsep = header.field_index("r");
    let igsep = header.field_index("g");
    let ibsep = header.field_index("b");
    let has_sep = irsep.is_some() && igsep.is_some() && ibsep.is_some();

    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut z = Vec::new();
    let mut r = Vec::new();
    let mut g = Vec::new();
    let mut b = Vec::new();

    let mut in_data = false;
    for line in content.lines() {
        if line.trim_start().starts_with("DATA") {
            in_data = true;
            continue;
        }
        if !in_data || line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < header.fields.len() {
            continue;
        }

        let coord = |idx: usize| -> io::Result<f64> {
            tokens[idx]
                .parse::<f64>()
                .map_err(|_| invalid(format!("invalid coordinate: {}", tokens[idx])))
        };
        x.push(coord(ix)?);
        y.push(coord(iy)?);
        z.push(coord(iz)?);

        if let Some(idx) = irgb {
            let [cr, cg, cb] = unpack_rgb(parse_packed_rgb(tokens[idx])?);
            r.push(cr);
            g.push(cg);
            b.push(cb);
        } else if has_sep {
            for (dst, idx) in [
                (&mut r, irsep.unwrap_or(0)),
                (&mut g, igsep.unwrap_or(0)),
                (&mut b, ibsep.unwrap_or(0)),
            ] {
                dst.push(
                    tokens[idx]
                        .parse::<f64>()
                        .map_err(|_| invalid(format!("invalid color value: {}", tokens[idx])))?,
                );
            }
        }
    }

    finish_cloud(x, y, z, r, g, b, irgb.is_some() || has_sep)
}

fn read_binary(raw: &[u8], header: &PcdHeader) -> io::Result<PointCloud> {
    let point_size: usize = header.sizes.iter().sum();
    let offsets: Vec<usize> = header
        .sizes
        .iter()
        .scan(0usize, |acc, &s| {
            let off = *acc;
            *acc += s;
            Some(off)
        })
        .collect();

    let data = &raw[header.data_offset..];
    let expected = header.points * point_size;
    if data.len() < expected {
        return Err(invalid(format!(
            "binary PCD data too short: have {} bytes, expected {} ({} points x {} bytes)",
            data.len(),
            expected,
            header.points,
            point_size
        )));
    }

    // Reading a numeric field honors its declared SIZE (4 = f32, 8 = f64).
    let scalar = |record: &[u8], field: usize| -> io::Result<f64> {
        let off = offsets[field];
        match header.sizes[field] {
            4 => {
                let bytes: [u8; 4] = record[off..off + 4]
                    .try_into()
                    .map_err(|_| invalid("truncated field"))?;
                Ok(f32::from_le_bytes(bytes) as f64)
            }
            8 => {
                let bytes: [u8; 8] = record[off..off + 8]
                    .try_into()
                    .map_err(|_| invalid("truncated field"))?;
                Ok(f64::from_le_bytes(bytes))
            }
            other => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported field size: {}", other),
            )),
        }
    };

    let ix = header.field_index("x").unwrap_or(0);
    let iy = header.field_index("y").unwrap_or(1);
    let iz = header.field_index("z").unwrap_or(2);
    let irgb = header.field_index("rgb");

    let mut x = Vec::with_capacity(header.points);
    let mut y = Vec::with_capacity(header.points);
    let mut z = Vec::with_capacity(header.points);
    let mut r = Vec::new();
    let mut g = Vec::new();
    let mut b = Vec::new();

    for p in 0..header.points {
        let record = &data[p * point_size..(p + 1) * point_size];
        x.push(scalar(record, ix)?);
        y.push(scalar(record, iy)?);
        z.push(scalar(record, iz)?);

        if let Some(idx) = irgb {
            let off = offsets[idx];
            let bytes: [u8; 4] = record[off..off + 4]
                .try_into()
                .map_err(|_| invalid("truncated rgb field"))?;
            let [cr, cg, cb] = unpack_rgb(u32::from_le_bytes(bytes));
            r.push(cr);
            g.push(cg);
            b.push(cb);
        }
    }

    finish_cloud(x, y, z, r, g, b, irgb.is_some())
}

/// Assemble the cloud, normalizing byte-valued color channels to `[0, 1]`.
fn finish_cloud(
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
    mut r: Vec<f64>,
    mut g: Vec<f64>,
    mut b: Vec<f64>,
    has_colors: bool,
) -> io::Result<PointCloud> {
    if !has_colors {
        return Ok(PointCloud::from_xyz(x, y, z));
    }

    let max = r
        .iter()
        .chain(&g)
        .chain(&b)
        .fold(0.0f64, |acc, &v| acc.max(v));
    if max > 1.0 {
        for channel in [&mut r, &mut g, &mut b] {
            for v in channel.iter_mut() {
                *v /= 255.0;
            }
        }
    }

    Ok(PointCloud::with_colors(x, y, z, r, g, b))
}
