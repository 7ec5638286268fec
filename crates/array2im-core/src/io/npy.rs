use std::fmt;
use std::io::Read;

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use half::f16;
use ndarray::{Array2, ShapeBuilder};
use num_complex::Complex64;

use crate::consts::{NPY_MAGIC, NPY_MAX_HEADER_LEN};
use crate::error::{Array2ImError, Result};
use crate::io::pickle::skip_pickle;

/// Byte order marker of an NPY dtype descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
    /// `|`: single-byte or byte-order-free types.
    NotApplicable,
}

impl Endianness {
    fn from_code(code: char) -> Option<Self> {
        match code {
            '<' => Some(Self::Little),
            '>' => Some(Self::Big),
            '|' => Some(Self::NotApplicable),
            '=' if cfg!(target_endian = "big") => Some(Self::Big),
            '=' => Some(Self::Little),
            _ => None,
        }
    }
}

/// Element kind of an NPY array, keyed by numpy's one-letter kind codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DtypeKind {
    Boolean,
    Integer,
    UnsignedInteger,
    FloatingPoint,
    Complex,
    ByteString,
    UnicodeString,
    Object,
    Void,
    DateTime,
    TimeDelta,
}

impl DtypeKind {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'b' | '?' => Some(Self::Boolean),
            'i' => Some(Self::Integer),
            'u' => Some(Self::UnsignedInteger),
            'f' => Some(Self::FloatingPoint),
            'c' => Some(Self::Complex),
            'S' | 'a' => Some(Self::ByteString),
            'U' => Some(Self::UnicodeString),
            'O' => Some(Self::Object),
            'V' => Some(Self::Void),
            'M' => Some(Self::DateTime),
            'm' => Some(Self::TimeDelta),
            _ => None,
        }
    }
}

impl fmt::Display for DtypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::UnsignedInteger => "unsigned integer",
            Self::FloatingPoint => "floating point",
            Self::Complex => "complex",
            Self::ByteString => "byte string",
            Self::UnicodeString => "unicode string",
            Self::Object => "object",
            Self::Void => "void",
            Self::DateTime => "datetime",
            Self::TimeDelta => "timedelta",
        };
        f.write_str(name)
    }
}

/// Parsed `descr` entry of an NPY header, e.g. `<f8`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dtype {
    pub endianness: Endianness,
    pub kind: DtypeKind,
    /// Bytes per element.
    pub item_size: usize,
}

impl Dtype {
    pub fn parse(descr: &str) -> Result<Self> {
        let bad = || Array2ImError::InvalidNpy(format!("unrecognised dtype descriptor '{descr}'"));

        let mut chars = descr.chars();
        let first = chars.next().ok_or_else(bad)?;
        let (endianness, kind_code) = match Endianness::from_code(first) {
            Some(e) => (e, chars.next().ok_or_else(bad)?),
            None => (Endianness::NotApplicable, first),
        };
        let kind = DtypeKind::from_code(kind_code).ok_or_else(bad)?;

        // Datetime units ("M8[ns]") do not affect the item size.
        let rest = chars.as_str();
        let digits = rest.split('[').next().unwrap_or("");
        let count: usize = if digits.is_empty() {
            match kind {
                DtypeKind::Boolean => 1,
                DtypeKind::Object => std::mem::size_of::<usize>(),
                _ => return Err(bad()),
            }
        } else {
            digits.parse().map_err(|_| bad())?
        };

        // Unicode counts code points, stored as UCS-4.
        let item_size = if kind == DtypeKind::UnicodeString {
            count.checked_mul(4).ok_or_else(bad)?
        } else {
            count
        };

        Ok(Self {
            endianness,
            kind,
            item_size,
        })
    }
}

/// Header of one NPY array.
#[derive(Clone, Debug, PartialEq)]
pub struct NpyHeader {
    pub version: (u8, u8),
    pub dtype: Dtype,
    pub fortran_order: bool,
    pub shape: Vec<usize>,
}

impl NpyHeader {
    pub fn element_count(&self) -> Result<usize> {
        self.shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| Array2ImError::InvalidNpy("array shape overflows".into()))
    }

    /// Size of the payload following the header, in bytes.
    pub fn payload_len(&self) -> Result<usize> {
        self.element_count()?
            .checked_mul(self.dtype.item_size)
            .ok_or_else(|| Array2ImError::InvalidNpy("array size overflows".into()))
    }

    /// Shape formatted as a Python tuple: `()`, `(5,)`, `(2, 3, 4)`.
    pub fn shape_string(&self) -> String {
        match self.shape.as_slice() {
            [single] => format!("({single},)"),
            dims => {
                let parts: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
                format!("({})", parts.join(", "))
            }
        }
    }
}

/// An array read off the stream, payload still in its stored encoding.
#[derive(Clone, Debug)]
pub struct RawArray {
    pub header: NpyHeader,
    pub bytes: Vec<u8>,
}

/// A validated two-dimensional real array.
#[derive(Clone, Debug)]
pub struct RealArray {
    pub data: Array2<f64>,
    pub kind: DtypeKind,
    /// True when the source was complex and its imaginary part was dropped.
    pub discarded_imaginary: bool,
}

impl RealArray {
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }
}

impl RawArray {
    /// Validate shape and element type, then decode into `f64` samples.
    ///
    /// Complex arrays keep only their real part. Integer, boolean and
    /// non-numeric kinds are rejected.
    pub fn into_real_2d(self) -> Result<RealArray> {
        let header = &self.header;
        let (h, w) = match header.shape.as_slice() {
            &[h, w] => (h, w),
            _ => {
                return Err(Array2ImError::NotTwoDimensional {
                    shape: header.shape_string(),
                })
            }
        };
        if u32::try_from(h).is_err() || u32::try_from(w).is_err() {
            return Err(Array2ImError::InvalidDimensions {
                width: w,
                height: h,
            });
        }

        let expected = header.payload_len()?;
        if self.bytes.len() != expected {
            return Err(Array2ImError::InvalidNpy(format!(
                "payload is {} bytes, header describes {expected}",
                self.bytes.len()
            )));
        }

        let dtype = header.dtype;
        let big = dtype.endianness == Endianness::Big;
        let (values, discarded_imaginary) = match dtype.kind {
            DtypeKind::FloatingPoint => (decode_floats(&self.bytes, dtype, big)?, false),
            DtypeKind::Complex => {
                let complex = decode_complex(&self.bytes, dtype, big)?;
                (complex.iter().map(|c| c.re).collect(), true)
            }
            kind => return Err(Array2ImError::UnsupportedDataType(kind)),
        };

        let shaped = if header.fortran_order {
            Array2::from_shape_vec((h, w).f(), values)
        } else {
            Array2::from_shape_vec((h, w), values)
        };
        let data = shaped
            .map_err(|e| Array2ImError::InvalidNpy(e.to_string()))?
            .as_standard_layout()
            .into_owned();

        tracing::debug!(
            height = h,
            width = w,
            kind = %dtype.kind,
            item_size = dtype.item_size,
            fortran_order = header.fortran_order,
            "Decoded input array"
        );

        Ok(RealArray {
            data,
            kind: dtype.kind,
            discarded_imaginary,
        })
    }
}

fn decode_floats(bytes: &[u8], dtype: Dtype, big: bool) -> Result<Vec<f64>> {
    match dtype.item_size {
        2 => {
            let mut bits = vec![0u16; bytes.len() / 2];
            if big {
                BigEndian::read_u16_into(bytes, &mut bits);
            } else {
                LittleEndian::read_u16_into(bytes, &mut bits);
            }
            Ok(bits.into_iter().map(|b| f16::from_bits(b).to_f64()).collect())
        }
        4 => {
            let mut out = vec![0f32; bytes.len() / 4];
            if big {
                BigEndian::read_f32_into(bytes, &mut out);
            } else {
                LittleEndian::read_f32_into(bytes, &mut out);
            }
            Ok(out.into_iter().map(f64::from).collect())
        }
        8 => {
            let mut out = vec![0f64; bytes.len() / 8];
            if big {
                BigEndian::read_f64_into(bytes, &mut out);
            } else {
                LittleEndian::read_f64_into(bytes, &mut out);
            }
            Ok(out)
        }
        size => Err(Array2ImError::UnsupportedItemSize {
            kind: dtype.kind,
            size,
        }),
    }
}

fn decode_complex(bytes: &[u8], dtype: Dtype, big: bool) -> Result<Vec<Complex64>> {
    // A complex element is two floats of half its size.
    let component = Dtype {
        kind: DtypeKind::FloatingPoint,
        item_size: dtype.item_size / 2,
        ..dtype
    };
    if !matches!(dtype.item_size, 4 | 8 | 16) {
        return Err(Array2ImError::UnsupportedItemSize {
            kind: dtype.kind,
            size: dtype.item_size,
        });
    }
    let parts = decode_floats(bytes, component, big)?;
    Ok(parts
        .chunks_exact(2)
        .map(|pair| Complex64::new(pair[0], pair[1]))
        .collect())
}

/// Sequential reader of NPY arrays from a byte stream.
pub struct NpyReader<R> {
    inner: R,
}

impl<R: Read> NpyReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Read the magic, version and header dict of the next array.
    pub fn read_header(&mut self) -> Result<NpyHeader> {
        let mut magic = [0u8; 6];
        self.inner.read_exact(&mut magic)?;
        if &magic != NPY_MAGIC {
            return Err(Array2ImError::InvalidNpy("missing \\x93NUMPY magic".into()));
        }

        let major = self.inner.read_u8()?;
        let minor = self.inner.read_u8()?;
        let header_len = match major {
            1 => self.inner.read_u16::<LittleEndian>()? as usize,
            2 | 3 => self.inner.read_u32::<LittleEndian>()? as usize,
            _ => return Err(Array2ImError::UnsupportedNpyVersion { major, minor }),
        };
        if header_len > NPY_MAX_HEADER_LEN {
            return Err(Array2ImError::InvalidNpy(format!(
                "header length {header_len} exceeds limit"
            )));
        }

        let mut raw = vec![0u8; header_len];
        self.inner.read_exact(&mut raw)?;
        let text = if major == 3 {
            String::from_utf8(raw).map_err(|_| invalid_header("header is not valid UTF-8"))?
        } else {
            // Versions 1 and 2 are latin-1; anything outside ASCII cannot be a valid dict.
            if !raw.is_ascii() {
                return Err(invalid_header("header is not ASCII"));
            }
            String::from_utf8(raw).map_err(|_| invalid_header("header is not ASCII"))?
        };

        let header = parse_header_dict(&text, (major, minor))?;
        tracing::debug!(
            version = ?header.version,
            descr = ?header.dtype,
            shape = %header.shape_string(),
            "Read NPY header"
        );
        Ok(header)
    }

    /// Read the payload described by `header`.
    pub fn read_payload(&mut self, header: &NpyHeader) -> Result<Vec<u8>> {
        if header.dtype.kind == DtypeKind::Object {
            return Err(Array2ImError::UnsupportedDataType(DtypeKind::Object));
        }
        let len = header.payload_len()?;
        let mut bytes = Vec::new();
        let read = (&mut self.inner).take(len as u64).read_to_end(&mut bytes)?;
        if read != len {
            return Err(truncated(len, read));
        }
        Ok(bytes)
    }

    /// Consume the payload described by `header` without keeping it.
    pub fn skip_payload(&mut self, header: &NpyHeader) -> Result<()> {
        if header.dtype.kind == DtypeKind::Object {
            skip_pickle(&mut self.inner)?;
            return Ok(());
        }
        let len = header.payload_len()?;
        let skipped = std::io::copy(&mut (&mut self.inner).take(len as u64), &mut std::io::sink())?;
        if skipped != len as u64 {
            return Err(truncated(len, skipped as usize));
        }
        Ok(())
    }

    /// Read the next array, header and payload.
    pub fn read_array(&mut self) -> Result<RawArray> {
        let header = self.read_header()?;
        let bytes = self.read_payload(&header)?;
        Ok(RawArray { header, bytes })
    }

    /// Read the next array and discard it.
    pub fn skip_array(&mut self) -> Result<NpyHeader> {
        let header = self.read_header()?;
        self.skip_payload(&header)?;
        Ok(header)
    }
}

/// Read an input record: a tag array, a metadata array, then the data array.
///
/// Tag and metadata are skipped; only the data array is returned.
pub fn read_input_record<R: Read>(reader: R) -> Result<RawArray> {
    let mut npy = NpyReader::new(reader);
    let tag = npy.skip_array()?;
    let metadata = npy.skip_array()?;
    tracing::debug!(
        tag_kind = %tag.dtype.kind,
        metadata_kind = %metadata.dtype.kind,
        "Skipped record tag and metadata"
    );
    npy.read_array()
}

fn truncated(expected: usize, got: usize) -> Array2ImError {
    Array2ImError::InvalidNpy(format!(
        "truncated payload: expected {expected} bytes, got {got}"
    ))
}

fn invalid_header(msg: &str) -> Array2ImError {
    Array2ImError::InvalidNpy(format!("malformed header: {msg}"))
}

enum HeaderValue {
    Str(String),
    Bool(bool),
    Tuple(Vec<usize>),
}

fn parse_header_dict(text: &str, version: (u8, u8)) -> Result<NpyHeader> {
    let mut parser = HeaderParser {
        bytes: text.as_bytes(),
        pos: 0,
    };
    let entries = parser.parse_dict()?;

    let mut descr = None;
    let mut fortran_order = None;
    let mut shape = None;
    for (key, value) in entries {
        match (key.as_str(), value) {
            ("descr", HeaderValue::Str(s)) => descr = Some(s),
            ("fortran_order", HeaderValue::Bool(b)) => fortran_order = Some(b),
            ("shape", HeaderValue::Tuple(t)) => shape = Some(t),
            ("descr" | "fortran_order" | "shape", _) => {
                return Err(invalid_header(&format!("unexpected value type for '{key}'")))
            }
            _ => {}
        }
    }

    Ok(NpyHeader {
        version,
        dtype: Dtype::parse(&descr.ok_or_else(|| invalid_header("missing 'descr'"))?)?,
        fortran_order: fortran_order.ok_or_else(|| invalid_header("missing 'fortran_order'"))?,
        shape: shape.ok_or_else(|| invalid_header("missing 'shape'"))?,
    })
}

/// Parser for the restricted Python dict literal numpy writes as a header.
struct HeaderParser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl HeaderParser<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, c: u8) -> Result<()> {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(invalid_header(&format!(
                "expected '{}' at offset {}",
                c as char, self.pos
            )))
        }
    }

    /// Consume `c` if it is the next non-blank character.
    fn eat(&mut self, c: u8) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_dict(&mut self) -> Result<Vec<(String, HeaderValue)>> {
        self.expect(b'{')?;
        let mut entries = Vec::new();
        loop {
            if self.eat(b'}') {
                return Ok(entries);
            }
            let key = self.parse_string()?;
            self.expect(b':')?;
            let value = self.parse_value()?;
            entries.push((key, value));
            if !self.eat(b',') {
                self.expect(b'}')?;
                return Ok(entries);
            }
        }
    }

    fn parse_value(&mut self) -> Result<HeaderValue> {
        self.skip_ws();
        match self.peek() {
            Some(b'\'' | b'"') => Ok(HeaderValue::Str(self.parse_string()?)),
            Some(b'(') => Ok(HeaderValue::Tuple(self.parse_tuple()?)),
            Some(b'[') => Err(invalid_header("structured dtypes are not supported")),
            _ => {
                let word = self.parse_word();
                match word {
                    "True" => Ok(HeaderValue::Bool(true)),
                    "False" => Ok(HeaderValue::Bool(false)),
                    _ => Err(invalid_header(&format!("unexpected token '{word}'"))),
                }
            }
        }
    }

    fn parse_word(&mut self) -> &str {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
            self.pos += 1;
        }
        std::str::from_utf8(&self.bytes[start..self.pos]).unwrap_or("")
    }

    fn parse_string(&mut self) -> Result<String> {
        self.skip_ws();
        let quote = match self.peek() {
            Some(q @ (b'\'' | b'"')) => q,
            _ => return Err(invalid_header("expected a quoted string")),
        };
        self.pos += 1;
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == quote {
                let s = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
                self.pos += 1;
                return Ok(s);
            }
            self.pos += 1;
        }
        Err(invalid_header("unterminated string"))
    }

    fn parse_tuple(&mut self) -> Result<Vec<usize>> {
        self.expect(b'(')?;
        let mut dims = Vec::new();
        loop {
            if self.eat(b')') {
                return Ok(dims);
            }
            self.skip_ws();
            let word = self.parse_word();
            // Python 2 writes long integers with an `L` suffix.
            let digits = word.strip_suffix('L').unwrap_or(word);
            let dim = digits
                .parse::<usize>()
                .map_err(|_| invalid_header(&format!("bad shape entry '{word}'")))?;
            dims.push(dim);
            if !self.eat(b',') {
                self.expect(b')')?;
                return Ok(dims);
            }
        }
    }
}
