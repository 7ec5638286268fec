//! Opcode walker for pickle streams.
//!
//! Object arrays in an NPY stream are stored as a pickle with no length
//! prefix. Nothing here unpickles anything: the walker only steps over
//! opcode arguments until it reaches `STOP`, which is enough to find where
//! the next array begins.

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Array2ImError, Result};

const STOP: u8 = b'.';
const FRAME: u8 = 0x95;

/// How an opcode's argument is laid out on the wire.
enum Arg {
    None,
    Fixed(usize),
    /// One text line, terminated by `\n`.
    Line,
    /// Two text lines (module and name).
    TwoLines,
    /// A little-endian length of the given width followed by that many bytes.
    Counted(usize),
}

fn arg_layout(op: u8) -> Option<Arg> {
    let arg = match op {
        // MARK POP POP_MARK DUP NONE REDUCE APPEND BUILD DICT EMPTY_DICT APPENDS
        // LIST EMPTY_LIST OBJ SETITEM TUPLE EMPTY_TUPLE SETITEMS BINPERSID
        b'(' | b'0' | b'1' | b'2' | b'N' | b'R' | b'a' | b'b' | b'd' | b'}' | b'e' | b'l'
        | b']' | b'o' | b's' | b't' | b')' | b'u' | b'Q' => Arg::None,
        // NEWOBJ TUPLE1..3 NEWTRUE NEWFALSE EMPTY_SET ADDITEMS FROZENSET NEWOBJ_EX
        // STACK_GLOBAL MEMOIZE NEXT_BUFFER READONLY_BUFFER
        0x81 | 0x85 | 0x86 | 0x87 | 0x88 | 0x89 | 0x8f | 0x90 | 0x91 | 0x92 | 0x93 | 0x94
        | 0x97 | 0x98 => Arg::None,
        // BININT1 BINPUT BINGET PROTO EXT1
        b'K' | b'q' | b'h' | 0x80 | 0x82 => Arg::Fixed(1),
        // BININT2 EXT2
        b'M' | 0x83 => Arg::Fixed(2),
        // BININT LONG_BINPUT LONG_BINGET EXT4
        b'J' | b'r' | b'j' | 0x84 => Arg::Fixed(4),
        // BINFLOAT FRAME
        b'G' | FRAME => Arg::Fixed(8),
        // INT LONG FLOAT STRING UNICODE PUT GET PERSID
        b'I' | b'L' | b'F' | b'S' | b'V' | b'p' | b'g' | b'P' => Arg::Line,
        // GLOBAL INST
        b'c' | b'i' => Arg::TwoLines,
        // SHORT_BINSTRING SHORT_BINBYTES SHORT_BINUNICODE LONG1
        b'U' | b'C' | 0x8c | 0x8a => Arg::Counted(1),
        // BINSTRING BINUNICODE BINBYTES LONG4
        b'T' | b'X' | b'B' | 0x8b => Arg::Counted(4),
        // BINUNICODE8 BINBYTES8 BYTEARRAY8
        0x8d | 0x8e | 0x96 => Arg::Counted(8),
        _ => return None,
    };
    Some(arg)
}

/// Step over one complete pickle, returning the number of bytes consumed.
pub fn skip_pickle<R: Read>(reader: &mut R) -> Result<u64> {
    let mut consumed = 0u64;
    loop {
        let op = reader.read_u8()?;
        consumed += 1;
        if op == STOP {
            tracing::debug!(bytes = consumed, "Skipped pickled object array");
            return Ok(consumed);
        }

        let layout = arg_layout(op).ok_or_else(|| {
            Array2ImError::InvalidNpy(format!("unknown pickle opcode 0x{op:02x}"))
        })?;
        consumed += match layout {
            Arg::None => 0,
            Arg::Fixed(n) => discard(reader, n as u64)?,
            Arg::Line => skip_line(reader)?,
            Arg::TwoLines => skip_line(reader)? + skip_line(reader)?,
            Arg::Counted(width) => {
                let len = match width {
                    1 => reader.read_u8()? as u64,
                    4 => reader.read_u32::<LittleEndian>()? as u64,
                    _ => reader.read_u64::<LittleEndian>()?,
                };
                width as u64 + discard(reader, len)?
            }
        };
    }
}

fn discard<R: Read>(reader: &mut R, len: u64) -> Result<u64> {
    let n = std::io::copy(&mut reader.by_ref().take(len), &mut std::io::sink())?;
    if n != len {
        return Err(Array2ImError::InvalidNpy("truncated pickle stream".into()));
    }
    Ok(n)
}

fn skip_line<R: Read>(reader: &mut R) -> Result<u64> {
    let mut n = 0u64;
    loop {
        let b = reader.read_u8()?;
        n += 1;
        if b == b'\n' {
            return Ok(n);
        }
    }
}
