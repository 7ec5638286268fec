#![allow(dead_code)]

/// Build the header dict numpy writes, e.g.
/// `{'descr': '<f8', 'fortran_order': False, 'shape': (2, 3), }`.
pub fn header_dict(descr: &str, fortran: bool, shape: &[usize]) -> String {
    let shape_str = match shape {
        [single] => format!("({single},)"),
        dims => format!(
            "({})",
            dims.iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    };
    format!(
        "{{'descr': '{}', 'fortran_order': {}, 'shape': {}, }}",
        descr,
        if fortran { "True" } else { "False" },
        shape_str
    )
}

/// Wrap a header dict and payload into a complete NPY v1.0 stream.
///
/// The header is space-padded and newline-terminated so that the payload
/// starts on a 64-byte boundary, as numpy does.
pub fn npy_with_dict(dict: &str, payload: &[u8]) -> Vec<u8> {
    let unpadded = 10 + dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    let mut header = dict.to_string();
    header.push_str(&" ".repeat(padding));
    header.push('\n');

    let mut buf = Vec::new();
    buf.extend_from_slice(b"\x93NUMPY");
    buf.push(1);
    buf.push(0);
    buf.extend_from_slice(&(header.len() as u16).to_le_bytes());
    buf.extend_from_slice(header.as_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Same as [`npy_with_dict`] but with a version 2.0 (u32 length) header.
pub fn npy_v2_with_dict(dict: &str, payload: &[u8]) -> Vec<u8> {
    let mut header = dict.to_string();
    header.push('\n');

    let mut buf = Vec::new();
    buf.extend_from_slice(b"\x93NUMPY");
    buf.push(2);
    buf.push(0);
    buf.extend_from_slice(&(header.len() as u32).to_le_bytes());
    buf.extend_from_slice(header.as_bytes());
    buf.extend_from_slice(payload);
    buf
}

pub fn npy(descr: &str, fortran: bool, shape: &[usize], payload: &[u8]) -> Vec<u8> {
    npy_with_dict(&header_dict(descr, fortran, shape), payload)
}

pub fn f64_le(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// A C-ordered `<f8` array built from rows.
pub fn npy_f64_rows(rows: &[&[f64]]) -> Vec<u8> {
    let h = rows.len();
    let w = rows.first().map_or(0, |r| r.len());
    let flat: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    npy("<f8", false, &[h, w], &f64_le(&flat))
}

/// A `|S<n>` scalar array holding `text`, the way a tag string is stored.
pub fn npy_bytes_scalar(text: &str) -> Vec<u8> {
    npy(&format!("|S{}", text.len()), false, &[], text.as_bytes())
}

/// Concatenate tag, metadata and data arrays into one input record.
pub fn record(tag: &[u8], metadata: &[u8], data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(tag.len() + metadata.len() + data.len());
    buf.extend_from_slice(tag);
    buf.extend_from_slice(metadata);
    buf.extend_from_slice(data);
    buf
}

/// Record with a string tag and a small float metadata vector.
pub fn simple_record(data: &[u8]) -> Vec<u8> {
    record(
        &npy_bytes_scalar("array"),
        &npy("<f8", false, &[2], &f64_le(&[0.5, 2.0])),
        data,
    )
}
