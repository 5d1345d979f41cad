//! Minimal NPY decoding for phy-format result files.
//!
//! Kilosort-family sorters write their spike times and cluster assignments
//! as 1-D little-endian integer arrays in numpy's NPY container. This module
//! decodes exactly that subset: NPY versions 1-3, C-order, shape `(n,)`,
//! descr one of `<i4`, `<u4`, `<i8`, `<u8`. Anything else is a format error.

use std::path::Path;

use crate::errors::{Result, SpikesortError};

const MAGIC: &[u8] = b"\x93NUMPY";

/// Reads a 1-D integer NPY file, widening every element to `i64`.
///
/// # Errors
/// Returns an error if the file cannot be read, is not an NPY file, or is
/// outside the supported subset (multi-dimensional, Fortran-order,
/// non-integer, big-endian, or an unsigned value above `i64::MAX`).
pub fn read_1d_integers(path: &Path) -> Result<Vec<i64>> {
    let bytes = std::fs::read(path).map_err(|e| SpikesortError::io(path, e))?;
    parse_1d_integers(&bytes).map_err(|reason| SpikesortError::InvalidFileFormat {
        file_type: "NPY".to_string(),
        path: path.display().to_string(),
        reason,
    })
}

fn parse_1d_integers(bytes: &[u8]) -> std::result::Result<Vec<i64>, String> {
    if bytes.len() < 8 || &bytes[..6] != MAGIC {
        return Err("missing NPY magic".to_string());
    }
    let (major, minor) = (bytes[6], bytes[7]);
    let (header_start, header_len) = match major {
        1 => {
            if bytes.len() < 10 {
                return Err("truncated NPY header length".to_string());
            }
            (10, u16::from_le_bytes([bytes[8], bytes[9]]) as usize)
        }
        2 | 3 => {
            if bytes.len() < 12 {
                return Err("truncated NPY header length".to_string());
            }
            (12, u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize)
        }
        _ => return Err(format!("unsupported NPY version {major}.{minor}")),
    };
    let data_start = header_start + header_len;
    if bytes.len() < data_start {
        return Err("truncated NPY header".to_string());
    }
    let header = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|_| "NPY header is not valid UTF-8".to_string())?;

    let descr = quoted_field(header, "descr")?;
    if bool_field(header, "fortran_order")? {
        return Err("Fortran-order arrays are not supported".to_string());
    }
    let shape = shape_field(header)?;
    if shape.len() != 1 {
        return Err(format!("expected a 1-D array, got {}-D shape {shape:?}", shape.len()));
    }
    let count = shape[0] as usize;

    let (width, signed) = match descr.as_str() {
        "<i4" => (4, true),
        "<u4" => (4, false),
        "<i8" => (8, true),
        "<u8" => (8, false),
        other => return Err(format!("unsupported dtype descr '{other}'")),
    };
    let data = &bytes[data_start..];
    if data.len() != count * width {
        return Err(format!("expected {} data bytes, found {}", count * width, data.len()));
    }

    let mut values = Vec::with_capacity(count);
    for chunk in data.chunks_exact(width) {
        let value = match (width, signed) {
            (4, true) => i64::from(i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])),
            (4, false) => i64::from(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])),
            (8, true) => i64::from_le_bytes(chunk.try_into().unwrap()),
            (8, false) => {
                let raw = u64::from_le_bytes(chunk.try_into().unwrap());
                i64::try_from(raw).map_err(|_| format!("value {raw} does not fit in i64"))?
            }
            _ => unreachable!(),
        };
        values.push(value);
    }
    Ok(values)
}

/// Extracts the text following `'key':` in the header dict.
fn field_value<'a>(header: &'a str, key: &str) -> std::result::Result<&'a str, String> {
    let pattern = format!("'{key}':");
    let at = header.find(&pattern).ok_or_else(|| format!("missing '{key}' in NPY header"))?;
    Ok(header[at + pattern.len()..].trim_start())
}

fn quoted_field(header: &str, key: &str) -> std::result::Result<String, String> {
    let rest = field_value(header, key)?;
    let rest = rest
        .strip_prefix('\'')
        .ok_or_else(|| format!("'{key}' in NPY header is not a quoted string"))?;
    let end = rest.find('\'').ok_or_else(|| format!("unterminated '{key}' in NPY header"))?;
    Ok(rest[..end].to_string())
}

fn bool_field(header: &str, key: &str) -> std::result::Result<bool, String> {
    let rest = field_value(header, key)?;
    if rest.starts_with("True") {
        Ok(true)
    } else if rest.starts_with("False") {
        Ok(false)
    } else {
        Err(format!("'{key}' in NPY header is not a boolean"))
    }
}

fn shape_field(header: &str) -> std::result::Result<Vec<u64>, String> {
    let rest = field_value(header, "shape")?;
    let rest =
        rest.strip_prefix('(').ok_or_else(|| "'shape' in NPY header is not a tuple".to_string())?;
    let end = rest.find(')').ok_or_else(|| "unterminated 'shape' in NPY header".to_string())?;
    rest[..end]
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<u64>().map_err(|_| format!("bad shape element '{part}'")))
        .collect()
}
