use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Not enough data")]
    NotEnoughData,
    #[error("String too long: {0} > {1}")]
    StringTooLong(usize, usize),
    #[error("Array too long: {0} > {1}")]
    ArrayTooLong(usize, usize),
    #[error("Connect payload corrupted after shuffle")]
    ShuffleCorrupted,
    #[error("Invalid value for {0}")]
    InvalidValue(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CodecResult<T> = Result<T, CodecError>;

fn ensure(buf: &BytesMut, len: usize) -> CodecResult<()> {
    if buf.remaining() < len {
        return Err(CodecError::NotEnoughData);
    }
    Ok(())
}

pub fn read_u8(buf: &mut BytesMut) -> CodecResult<u8> {
    ensure(buf, 1)?;
    Ok(buf.get_u8())
}

pub fn read_i8(buf: &mut BytesMut) -> CodecResult<i8> {
    ensure(buf, 1)?;
    Ok(buf.get_i8())
}

pub fn read_bool(buf: &mut BytesMut) -> CodecResult<bool> {
    Ok(read_u8(buf)? != 0)
}

pub fn read_u16(buf: &mut BytesMut) -> CodecResult<u16> {
    ensure(buf, 2)?;
    Ok(buf.get_u16())
}

pub fn read_i16(buf: &mut BytesMut) -> CodecResult<i16> {
    ensure(buf, 2)?;
    Ok(buf.get_i16())
}

pub fn read_u32(buf: &mut BytesMut) -> CodecResult<u32> {
    ensure(buf, 4)?;
    Ok(buf.get_u32())
}

pub fn read_i32(buf: &mut BytesMut) -> CodecResult<i32> {
    ensure(buf, 4)?;
    Ok(buf.get_i32())
}

pub fn read_i64(buf: &mut BytesMut) -> CodecResult<i64> {
    ensure(buf, 8)?;
    Ok(buf.get_i64())
}

pub fn read_f32(buf: &mut BytesMut) -> CodecResult<f32> {
    ensure(buf, 4)?;
    Ok(buf.get_f32())
}

/// Read a 24-bit big-endian unsigned integer.
pub fn read_u24(buf: &mut BytesMut) -> CodecResult<u32> {
    ensure(buf, 3)?;
    let hi = buf.get_u8() as u32;
    let mid = buf.get_u8() as u32;
    let lo = buf.get_u8() as u32;
    Ok((hi << 16) | (mid << 8) | lo)
}

/// Write a 24-bit big-endian unsigned integer. The top byte of `value` is
/// discarded.
pub fn write_u24(buf: &mut BytesMut, value: u32) {
    buf.put_u8((value >> 16) as u8);
    buf.put_u8((value >> 8) as u8);
    buf.put_u8(value as u8);
}

// === MUTF8 strings ===
//
// Length-prefixed (u16) modified UTF-8, as produced by Java's
// DataOutputStream.writeUTF: NUL is two bytes, supplementary characters are
// CESU-8 surrogate pairs. The reader is lossy; ill-formed sequences decode
// to replacement characters instead of failing.

pub const MUTF8_MAX_LENGTH: usize = 0xFFFF;

fn mutf8_bytes(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for c in s.chars() {
        let cp = c as u32;
        if cp == 0 {
            out.extend_from_slice(&[0xC0, 0x80]);
        } else if cp < 0x80 {
            out.push(cp as u8);
        } else if cp < 0x800 {
            out.push(0xC0 | (cp >> 6) as u8);
            out.push(0x80 | (cp & 0x3F) as u8);
        } else if cp < 0x10000 {
            out.push(0xE0 | (cp >> 12) as u8);
            out.push(0x80 | ((cp >> 6) & 0x3F) as u8);
            out.push(0x80 | (cp & 0x3F) as u8);
        } else {
            let v = cp - 0x10000;
            for unit in [0xD800 + (v >> 10), 0xDC00 + (v & 0x3FF)] {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

/// Write a MUTF8 string, optionally capped below the format's 65535-byte
/// ceiling (e.g. the 16-byte connect alias).
pub fn write_mutf8_capped(buf: &mut BytesMut, s: &str, max_len: usize) -> CodecResult<()> {
    let bytes = mutf8_bytes(s);
    if bytes.len() > max_len {
        return Err(CodecError::StringTooLong(bytes.len(), max_len));
    }
    buf.put_u16(bytes.len() as u16);
    buf.put_slice(&bytes);
    Ok(())
}

pub fn write_mutf8(buf: &mut BytesMut, s: &str) -> CodecResult<()> {
    write_mutf8_capped(buf, s, MUTF8_MAX_LENGTH)
}

pub fn read_mutf8(buf: &mut BytesMut) -> CodecResult<String> {
    let len = read_u16(buf)? as usize;
    ensure(buf, len)?;
    let bytes = buf.split_to(len);
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// === Variable-length byte arrays ===
//
// The length prefix is 1 or 2 bytes depending on the field.

pub fn read_var_array(buf: &mut BytesMut, prefix_size: usize) -> CodecResult<Vec<u8>> {
    let len = match prefix_size {
        1 => read_u8(buf)? as usize,
        _ => read_u16(buf)? as usize,
    };
    ensure(buf, len)?;
    Ok(buf.split_to(len).to_vec())
}

pub fn write_var_array(buf: &mut BytesMut, prefix_size: usize, values: &[u8]) -> CodecResult<()> {
    let max = (1usize << (8 * prefix_size)) - 1;
    if values.len() > max {
        return Err(CodecError::ArrayTooLong(values.len(), max));
    }
    match prefix_size {
        1 => buf.put_u8(values.len() as u8),
        _ => buf.put_u16(values.len() as u16),
    }
    buf.put_slice(values);
    Ok(())
}

// === Compressed floats ===
//
// Fixed-point encodings over a declared range. Compression truncates toward
// zero, matching the game's encoder.

/// 2-byte compressed float over `[0, max_range]`.
pub fn write_compressed_f2(buf: &mut BytesMut, value: f32, max_range: f32) {
    buf.put_u16((value * 65535.0 / max_range) as u16);
}

pub fn read_compressed_f2(buf: &mut BytesMut, max_range: f32) -> CodecResult<f32> {
    let raw = read_u16(buf)?;
    Ok(raw as f32 * max_range / 65535.0)
}

/// 3-byte compressed float over `[0, max_range]`.
pub fn write_compressed_f3(buf: &mut BytesMut, value: f32, max_range: f32) {
    write_u24(buf, (value as f64 * 16777215.0 / max_range as f64) as u32);
}

pub fn read_compressed_f3(buf: &mut BytesMut, max_range: f32) -> CodecResult<f32> {
    let raw = read_u24(buf)?;
    Ok((max_range as f64 * raw as f64 / 16777215.0) as f32)
}

/// 1-byte compressed float over `[min, max]`.
pub fn write_compressed_f1_clamped(buf: &mut BytesMut, value: f32, min: f32, max: f32) {
    buf.put_u8(((value - min) * 255.0 / (max - min)) as u8);
}

pub fn read_compressed_f1_clamped(buf: &mut BytesMut, min: f32, max: f32) -> CodecResult<f32> {
    let raw = read_u8(buf)?;
    Ok(raw as f32 * (max - min) / 255.0 + min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutf8_vectors() {
        let mut buf = BytesMut::new();
        write_mutf8(&mut buf, "hi").unwrap();
        assert_eq!(buf.to_vec(), vec![0x00, 0x02, 0x68, 0x69]);

        let mut buf = BytesMut::new();
        write_mutf8(&mut buf, "").unwrap();
        assert_eq!(buf.to_vec(), vec![0x00, 0x00]);
    }

    #[test]
    fn test_mutf8_roundtrip() {
        for s in ["", "hi", "blob player", "ünïcødé", "日本語"] {
            let mut buf = BytesMut::new();
            write_mutf8(&mut buf, s).unwrap();
            assert_eq!(read_mutf8(&mut buf).unwrap(), s);
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_mutf8_java_quirks() {
        // NUL is the two-byte sequence C0 80
        let mut buf = BytesMut::new();
        write_mutf8(&mut buf, "\0").unwrap();
        assert_eq!(buf.to_vec(), vec![0x00, 0x02, 0xC0, 0x80]);

        // supplementary characters become CESU-8 surrogate pairs
        let mut buf = BytesMut::new();
        write_mutf8(&mut buf, "\u{1F600}").unwrap();
        assert_eq!(buf[0..2], [0x00, 0x06]);
        assert_eq!(buf.len(), 8);
    }

    #[test]
    fn test_mutf8_lossy_read() {
        // ill-formed sequence decodes to replacement characters, not an error
        let mut buf = BytesMut::from(&[0x00, 0x02, 0xFF, 0xFE][..]);
        let s = read_mutf8(&mut buf).unwrap();
        assert_eq!(s.chars().count(), 2);
        assert!(s.chars().all(|c| c == char::REPLACEMENT_CHARACTER));
    }

    #[test]
    fn test_mutf8_cap() {
        let mut buf = BytesMut::new();
        let err = write_mutf8_capped(&mut buf, "seventeen bytes!!", 16).unwrap_err();
        assert!(matches!(err, CodecError::StringTooLong(17, 16)));
    }

    #[test]
    fn test_var_array_vectors() {
        let mut buf = BytesMut::new();
        write_var_array(&mut buf, 1, &[0xAA, 0xBB]).unwrap();
        assert_eq!(buf.to_vec(), vec![0x02, 0xAA, 0xBB]);

        let mut buf = BytesMut::new();
        write_var_array(&mut buf, 2, &[]).unwrap();
        assert_eq!(buf.to_vec(), vec![0x00, 0x00]);
    }

    #[test]
    fn test_var_array_roundtrip() {
        let values: Vec<u8> = (0..=255).collect();
        for prefix in [1usize, 2] {
            let mut buf = BytesMut::new();
            write_var_array(&mut buf, prefix, &values).unwrap();
            assert_eq!(read_var_array(&mut buf, prefix).unwrap(), values);
        }
    }

    #[test]
    fn test_var_array_overflow() {
        let mut buf = BytesMut::new();
        let too_long = vec![0u8; 256];
        assert!(write_var_array(&mut buf, 1, &too_long).is_err());
    }

    #[test]
    fn test_compressed_f2_vector() {
        // 30.0 over a 60.0 range truncates to 0x7FFF
        let mut buf = BytesMut::new();
        write_compressed_f2(&mut buf, 30.0, 60.0);
        assert_eq!(buf.to_vec(), vec![0x7F, 0xFF]);

        let decoded = read_compressed_f2(&mut buf, 60.0).unwrap();
        assert!((decoded - 30.0).abs() <= 60.0 / 65535.0);
    }

    #[test]
    fn test_compressed_float_error_bounds() {
        for v in [0.0f32, 0.37, 12.5, 59.99, 60.0] {
            let mut buf = BytesMut::new();
            write_compressed_f2(&mut buf, v, 60.0);
            let back = read_compressed_f2(&mut buf, 60.0).unwrap();
            assert!((back - v).abs() <= 60.0 / 65535.0, "f2 {v}");
        }
        for v in [0.0f32, 1.0, 511.0, 42000.0] {
            let mut buf = BytesMut::new();
            write_compressed_f3(&mut buf, v, 42000.0);
            let back = read_compressed_f3(&mut buf, 42000.0).unwrap();
            assert!((back - v).abs() <= 42000.0 / 16777215.0, "f3 {v}");
        }
        for v in [1.0f32, 1.5, 2.0, 2.99, 3.0] {
            let mut buf = BytesMut::new();
            write_compressed_f1_clamped(&mut buf, v, 1.0, 3.0);
            let back = read_compressed_f1_clamped(&mut buf, 1.0, 3.0).unwrap();
            assert!((back - v).abs() <= (3.0 - 1.0) / 255.0, "f1 {v}");
        }
    }

    #[test]
    fn test_u24_roundtrip() {
        for v in [0u32, 1, 0x1234, 0xFFFFFF] {
            let mut buf = BytesMut::new();
            write_u24(&mut buf, v);
            assert_eq!(buf.len(), 3);
            assert_eq!(read_u24(&mut buf).unwrap(), v);
        }
    }

    #[test]
    fn test_underrun() {
        let mut buf = BytesMut::from(&[0x01][..]);
        assert!(matches!(read_i32(&mut buf), Err(CodecError::NotEnoughData)));
        let mut buf = BytesMut::from(&[0x00, 0x05, 0x68][..]);
        assert!(matches!(read_mutf8(&mut buf), Err(CodecError::NotEnoughData)));
    }
}
