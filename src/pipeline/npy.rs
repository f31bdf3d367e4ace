//! Minimal reader/writer for NumPy `.npy` vectors of floats.
//!
//! Only what reference histograms need: `f4`/`f8` in either byte order and a
//! shape with at most one non-unit dimension, e.g. `(32,)` or `(32, 1)`.
use crate::error::ReferenceError;

const MAGIC: &[u8] = b"\x93NUMPY";
const ALIGN: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct NpyVector {
    pub values: Vec<f64>,
    pub shape: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ByteOrder {
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Dtype {
    order: ByteOrder,
    size: usize,
}

fn malformed(msg: impl Into<String>) -> ReferenceError {
    ReferenceError::Npy(msg.into())
}

impl TryFrom<&[u8]> for NpyVector {
    type Error = ReferenceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        if slice.len() < 10 || &slice[..6] != MAGIC {
            return Err(malformed("missing NUMPY magic"));
        }

        let major = slice[6];
        let (header_start, header_len) = match major {
            1 => (10, u16::from_le_bytes([slice[8], slice[9]]) as usize),
            2 | 3 => {
                if slice.len() < 12 {
                    return Err(malformed("truncated header length"));
                }
                let len = u32::from_le_bytes([slice[8], slice[9], slice[10], slice[11]]);
                (12, len as usize)
            }
            v => return Err(malformed(format!("unsupported format version {}", v))),
        };

        let data_start = header_start + header_len;
        let header = slice
            .get(header_start..data_start)
            .ok_or_else(|| malformed("truncated header"))?;
        let header =
            std::str::from_utf8(header).map_err(|_| malformed("header is not valid text"))?;

        let dtype = parse_descr(header)?;
        // memory order does not matter once the shape is a vector
        fortran_order(header)?;
        let shape = parse_shape(header)?;
        if shape.iter().filter(|&&d| d > 1).count() > 1 {
            return Err(malformed(format!("expected a vector, got shape {:?}", shape)));
        }

        let count = shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| malformed("shape too large"))?;
        let byte_len = count
            .checked_mul(dtype.size)
            .ok_or_else(|| malformed("shape too large"))?;
        let data = &slice[data_start..];
        if data.len() < byte_len {
            return Err(malformed(format!(
                "expected {} bytes of data, found {}",
                byte_len,
                data.len()
            )));
        }

        let values = data
            .chunks_exact(dtype.size)
            .take(count)
            .map(|chunk| decode_value(chunk, dtype))
            .collect();

        Ok(NpyVector { values, shape })
    }
}

fn decode_value(chunk: &[u8], dtype: Dtype) -> f64 {
    match (dtype.size, dtype.order) {
        (4, ByteOrder::Little) => f32::from_le_bytes(array(chunk)) as f64,
        (4, ByteOrder::Big) => f32::from_be_bytes(array(chunk)) as f64,
        (_, ByteOrder::Little) => f64::from_le_bytes(array(chunk)),
        (_, ByteOrder::Big) => f64::from_be_bytes(array(chunk)),
    }
}

fn array<const N: usize>(chunk: &[u8]) -> [u8; N] {
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(&chunk[..N]);
    bytes
}

/// Text following `'key':` in the header dict.
fn dict_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    ['\'', '"'].iter().find_map(|quote| {
        let pattern = format!("{quote}{key}{quote}");
        let pos = header.find(&pattern)?;
        header[pos + pattern.len()..]
            .trim_start()
            .strip_prefix(':')
            .map(str::trim_start)
    })
}

fn parse_descr(header: &str) -> Result<Dtype, ReferenceError> {
    let value = dict_value(header, "descr").ok_or_else(|| malformed("missing descr"))?;
    let quote = value
        .chars()
        .next()
        .filter(|c| *c == '\'' || *c == '"')
        .ok_or_else(|| malformed("descr is not a string"))?;
    let end = value[1..]
        .find(quote)
        .ok_or_else(|| malformed("unterminated descr"))?;
    let descr = &value[1..1 + end];

    let order = match descr.chars().next() {
        Some('<') => ByteOrder::Little,
        Some('>') => ByteOrder::Big,
        Some('=') if cfg!(target_endian = "big") => ByteOrder::Big,
        Some('=') => ByteOrder::Little,
        _ => return Err(malformed(format!("unsupported dtype {}", descr))),
    };
    let size = match &descr[1..] {
        "f4" => 4,
        "f8" => 8,
        other => return Err(malformed(format!("unsupported dtype {}", other))),
    };
    Ok(Dtype { order, size })
}

fn fortran_order(header: &str) -> Result<bool, ReferenceError> {
    match dict_value(header, "fortran_order") {
        Some(v) if v.starts_with("True") => Ok(true),
        Some(v) if v.starts_with("False") => Ok(false),
        _ => Err(malformed("missing fortran_order")),
    }
}

fn parse_shape(header: &str) -> Result<Vec<usize>, ReferenceError> {
    let value = dict_value(header, "shape").ok_or_else(|| malformed("missing shape"))?;
    let inner = value
        .strip_prefix('(')
        .and_then(|rest| rest.split(')').next())
        .ok_or_else(|| malformed("shape is not a tuple"))?;
    inner
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| {
            dim.parse::<usize>()
                .map_err(|_| malformed(format!("bad dimension '{}'", dim)))
        })
        .collect()
}

/// Serialise as a version 1.0 `<f8` vector of shape `(n,)`.
pub fn encode(values: &[f64]) -> Vec<u8> {
    let mut header = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({},), }}",
        values.len()
    );
    let unpadded = MAGIC.len() + 4 + header.len() + 1;
    let padding = (ALIGN - unpadded % ALIGN) % ALIGN;
    header.extend(std::iter::repeat(' ').take(padding));
    header.push('\n');

    let mut out = Vec::with_capacity(MAGIC.len() + 4 + header.len() + values.len() * 8);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}
