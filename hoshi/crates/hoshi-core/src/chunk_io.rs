//! The binary chunk file format.
//!
//! Layout, in order, every multi-byte integer little-endian:
//!
//! 1. Magic: `7F 48 4F 53 48 49 7F` (`0x7F "HOSHI" 0x7F`).
//! 2. Version: `u16` major, `u16` minor. Files older than
//!    [`MIN_READ_VERSION`] are rejected.
//! 3. Constant pool: `u16` count, then tagged value records. A record is a
//!    `u8` type tag followed by its payload: numbers are 8 raw IEEE-754
//!    little-endian bytes, booleans one byte, nil nothing, and objects a
//!    `u8` object tag plus a `u32` length-prefixed byte string.
//! 4. Code: `u32` count, then the raw code bytes.
//! 5. Line markers: `u32` count, then `u32` offset / `u32` line pairs.
//!
//! With the `debug-flags` cargo feature enabled, ASCII section markers
//! (`.magic`, `.version`, `.consts`, `.code`, `.lines`, `.notes`, and the
//! per-record `#` / `/` / `=` markers) are interleaved so a hex dump reads
//! like an outline. A file written with markers can only be read by a
//! build that also has them enabled.

use std::io::{self, Read, Write};

use thiserror::Error;

use hoshi_util::Version;

use crate::chunk::{Chunk, LineStart};
use crate::heap::Heap;
use crate::value::Value;

/// The file signature every chunk starts with.
pub const MAGIC: [u8; 7] = [0x7F, b'H', b'O', b'S', b'H', b'I', 0x7F];

/// Oldest file version this build still reads.
pub const MIN_READ_VERSION: Version = Version::new(1, 0);

const TAG_NUMBER: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_NIL: u8 = 2;
const TAG_OBJECT: u8 = 3;

const OBJECT_TAG_STRING: u8 = 0;

/// Failure while reading or writing a chunk file.
#[derive(Debug, Error)]
pub enum ChunkIoError {
    /// Underlying I/O failure (includes truncated files).
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The file does not start with [`MAGIC`].
    #[error("magic number is invalid")]
    BadMagic,

    /// The file predates [`MIN_READ_VERSION`].
    #[error("file version older than minimum readable version (got {found}, expected at least {minimum})")]
    VersionTooOld {
        /// The version recorded in the file.
        found: Version,
        /// The oldest version this build accepts.
        minimum: Version,
    },

    /// A constant record carried an unrecognized type tag.
    #[error("unknown value tag: {0}")]
    UnknownValueTag(u8),

    /// An object record carried an unrecognized object tag.
    #[error("unknown object tag: {0}")]
    UnknownObjectTag(u8),

    /// The constant pool exceeds the file format's `u16` count field.
    #[error("too many constants for the chunk file format ({0}, limit {})", u16::MAX)]
    TooManyConstants(usize),

    /// A section marker was missing or corrupt (`debug-flags` builds only).
    #[cfg(feature = "debug-flags")]
    #[error("missing section marker '{0}'")]
    BadSectionMarker(&'static str),
}

// Little-endian primitives.

fn write_u8<W: Write>(w: &mut W, v: u8) -> io::Result<()> {
    w.write_all(&[v])
}

fn write_u16<W: Write>(w: &mut W, v: u16) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_u32<W: Write>(w: &mut W, v: u32) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn write_f64<W: Write>(w: &mut W, v: f64) -> io::Result<()> {
    w.write_all(&v.to_le_bytes())
}

fn read_u8<R: Read>(r: &mut R) -> io::Result<u8> {
    let mut buf = [0; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u16<R: Read>(r: &mut R) -> io::Result<u16> {
    let mut buf = [0; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_f64<R: Read>(r: &mut R) -> io::Result<f64> {
    let mut buf = [0; 8];
    r.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

// Section markers: real bytes with `debug-flags`, no-ops without.

#[cfg(feature = "debug-flags")]
fn write_marker<W: Write>(w: &mut W, marker: &'static str) -> Result<(), ChunkIoError> {
    w.write_all(marker.as_bytes())?;
    Ok(())
}

#[cfg(not(feature = "debug-flags"))]
fn write_marker<W: Write>(_w: &mut W, _marker: &'static str) -> Result<(), ChunkIoError> {
    Ok(())
}

#[cfg(feature = "debug-flags")]
fn read_marker<R: Read>(r: &mut R, marker: &'static str) -> Result<(), ChunkIoError> {
    let mut buf = vec![0; marker.len()];
    r.read_exact(&mut buf)?;
    if buf != marker.as_bytes() {
        return Err(ChunkIoError::BadSectionMarker(marker));
    }
    Ok(())
}

#[cfg(not(feature = "debug-flags"))]
fn read_marker<R: Read>(_r: &mut R, _marker: &'static str) -> Result<(), ChunkIoError> {
    Ok(())
}

fn write_value<W: Write>(w: &mut W, heap: &Heap, value: Value) -> Result<(), ChunkIoError> {
    write_marker(w, "#")?;
    match value {
        Value::Number(n) => {
            write_u8(w, TAG_NUMBER)?;
            write_marker(w, "=")?;
            write_f64(w, n)?;
        }
        Value::Bool(b) => {
            write_u8(w, TAG_BOOL)?;
            write_marker(w, "=")?;
            write_u8(w, u8::from(b))?;
        }
        Value::Nil => {
            write_u8(w, TAG_NIL)?;
            write_marker(w, "=")?;
        }
        Value::Str(id) => {
            write_u8(w, TAG_OBJECT)?;
            write_marker(w, "=")?;
            write_marker(w, "/")?;
            write_u8(w, OBJECT_TAG_STRING)?;
            write_marker(w, "=")?;
            let bytes = heap.bytes(id);
            write_u32(w, bytes.len() as u32)?;
            w.write_all(bytes)?;
        }
    }
    Ok(())
}

fn read_value<R: Read>(r: &mut R, heap: &mut Heap) -> Result<Value, ChunkIoError> {
    read_marker(r, "#")?;
    let tag = read_u8(r)?;
    read_marker(r, "=")?;
    match tag {
        TAG_NUMBER => Ok(Value::Number(read_f64(r)?)),
        TAG_BOOL => Ok(Value::Bool(read_u8(r)? != 0)),
        TAG_NIL => Ok(Value::Nil),
        TAG_OBJECT => {
            read_marker(r, "/")?;
            let object_tag = read_u8(r)?;
            read_marker(r, "=")?;
            match object_tag {
                OBJECT_TAG_STRING => {
                    let length = read_u32(r)? as usize;
                    let mut bytes = vec![0; length];
                    r.read_exact(&mut bytes)?;
                    Ok(Value::Str(heap.intern_owned(bytes)))
                }
                other => Err(ChunkIoError::UnknownObjectTag(other)),
            }
        }
        other => Err(ChunkIoError::UnknownValueTag(other)),
    }
}

/// Serializes a chunk.
///
/// String constants are resolved through `heap`; everything else is
/// self-contained. The byte stream is deterministic for a given chunk.
pub fn write_chunk<W: Write>(w: &mut W, heap: &Heap, chunk: &Chunk) -> Result<(), ChunkIoError> {
    write_marker(w, ".magic")?;
    w.write_all(&MAGIC)?;

    write_marker(w, ".version")?;
    write_u16(w, hoshi_util::VERSION.major)?;
    write_u16(w, hoshi_util::VERSION.minor)?;

    write_marker(w, ".consts")?;
    let constant_count = u16::try_from(chunk.constants.len())
        .map_err(|_| ChunkIoError::TooManyConstants(chunk.constants.len()))?;
    write_u16(w, constant_count)?;
    for &value in &chunk.constants {
        write_value(w, heap, value)?;
    }

    write_marker(w, ".code")?;
    write_u32(w, chunk.code.len() as u32)?;
    w.write_all(&chunk.code)?;

    write_marker(w, ".lines")?;
    write_u32(w, chunk.lines.len() as u32)?;
    for start in &chunk.lines {
        write_u32(w, start.offset as u32)?;
        write_u32(w, start.line)?;
    }

    write_marker(w, ".notes")?;
    Ok(())
}

/// Deserializes a chunk, interning its string constants into `heap`.
///
/// Rejects files without the magic signature and files older than
/// [`MIN_READ_VERSION`].
pub fn read_chunk<R: Read>(r: &mut R, heap: &mut Heap) -> Result<Chunk, ChunkIoError> {
    read_marker(r, ".magic")?;
    let mut magic = [0; 7];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(ChunkIoError::BadMagic);
    }

    read_marker(r, ".version")?;
    let found = Version::new(read_u16(r)?, read_u16(r)?);
    if found < MIN_READ_VERSION {
        return Err(ChunkIoError::VersionTooOld {
            found,
            minimum: MIN_READ_VERSION,
        });
    }

    read_marker(r, ".consts")?;
    let constant_count = read_u16(r)? as usize;
    let mut constants = Vec::with_capacity(constant_count);
    for _ in 0..constant_count {
        constants.push(read_value(r, heap)?);
    }

    read_marker(r, ".code")?;
    let code_count = read_u32(r)? as usize;
    let mut code = vec![0; code_count];
    r.read_exact(&mut code)?;

    read_marker(r, ".lines")?;
    let line_count = read_u32(r)? as usize;
    let mut lines = Vec::with_capacity(line_count);
    for _ in 0..line_count {
        let offset = read_u32(r)? as usize;
        let line = read_u32(r)?;
        lines.push(LineStart { offset, line });
    }

    read_marker(r, ".notes")?;

    Ok(Chunk {
        code,
        constants,
        lines,
    })
}
