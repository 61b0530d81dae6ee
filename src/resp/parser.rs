//! Streaming RESP2/RESP3 decoder.
//!
//! [`parse`] takes a byte buffer and returns `Ok((RespValue, bytes_consumed))`,
//! `Err(Incomplete)` when more data is needed, or `Err(Protocol(…))` on
//! malformed input. Bulk strings are extracted with zero-copy `Bytes::slice`.

use bytes::Bytes;
use memchr::memchr;

use crate::error::{Error, Result};
use crate::resp::types::RespValue;

/// Maximum number of elements allowed in a single array/set/map/push.
///
/// Guards against an attacker-controlled count (e.g. `*2147483647\r\n`)
/// triggering a multi-GB allocation before any element is read.
const MAX_ELEMENTS: usize = 16_777_216;

/// Maximum recursion depth for nested aggregates.
const MAX_DEPTH: usize = 512;

/// Parse one RESP value from the front of `buf`.
///
/// Returns `(value, bytes_consumed)` on success. `Err(Incomplete)` means
/// the caller should read more data and retry.
pub fn parse(buf: &Bytes) -> Result<(RespValue, usize)> {
    parse_at(buf, 0, 0)
}

/// Inner recursive parser with absolute-offset tracking.
fn parse_at(buf: &Bytes, pos: usize, depth: usize) -> Result<(RespValue, usize)> {
    if depth > MAX_DEPTH {
        return Err(Error::Protocol(format!(
            "RESP nesting depth exceeds maximum of {MAX_DEPTH}"
        )));
    }
    if pos >= buf.len() {
        return Err(Error::Incomplete);
    }
    match buf[pos] {
        b'+' => {
            let (line, next) = read_line(buf, pos + 1)?;
            Ok((RespValue::SimpleString(utf8(line)?.to_string()), next))
        }
        b'-' => {
            let (line, next) = read_line(buf, pos + 1)?;
            Ok((RespValue::Error(utf8(line)?.to_string()), next))
        }
        b':' => {
            let (line, next) = read_line(buf, pos + 1)?;
            Ok((RespValue::Integer(parse_int(line)?), next))
        }
        b'$' => {
            let (data, next) = read_blob(buf, pos)?;
            match data {
                Some(bytes) => Ok((RespValue::BulkString(bytes), next)),
                None => Ok((RespValue::Null, next)),
            }
        }
        b'*' => {
            let (items, next) = read_elements(buf, pos, depth)?;
            match items {
                Some(items) => Ok((RespValue::Array(items), next)),
                None => Ok((RespValue::Null, next)),
            }
        }
        b'~' => {
            let (items, next) = read_elements(buf, pos, depth)?;
            match items {
                Some(items) => Ok((RespValue::Set(items), next)),
                None => Err(Error::Protocol("negative set count".into())),
            }
        }
        b'>' => {
            let (items, next) = read_elements(buf, pos, depth)?;
            match items {
                Some(items) => Ok((RespValue::Push(items), next)),
                None => Err(Error::Protocol("negative push count".into())),
            }
        }
        b'%' => {
            let (pairs, next) = read_pairs(buf, pos, depth)?;
            Ok((RespValue::Map(pairs), next))
        }
        b'|' => {
            // Attribute frame: out-of-band metadata pairs followed by the
            // actual reply. The metadata is consumed and discarded.
            let (_, next) = read_pairs(buf, pos, depth)?;
            parse_at(buf, next, depth + 1)
        }
        b'_' => {
            if buf.len() < pos + 3 {
                return Err(Error::Incomplete);
            }
            if &buf[pos + 1..pos + 3] != b"\r\n" {
                return Err(Error::Protocol("null frame not terminated by \\r\\n".into()));
            }
            Ok((RespValue::Null, pos + 3))
        }
        b'#' => {
            if buf.len() < pos + 4 {
                return Err(Error::Incomplete);
            }
            let val = match buf[pos + 1] {
                b't' => true,
                b'f' => false,
                other => {
                    return Err(Error::Protocol(format!("invalid boolean value: 0x{other:02x}")))
                }
            };
            if &buf[pos + 2..pos + 4] != b"\r\n" {
                return Err(Error::Protocol("boolean not terminated by \\r\\n".into()));
            }
            Ok((RespValue::Boolean(val), pos + 4))
        }
        b',' => {
            let (line, next) = read_line(buf, pos + 1)?;
            let s = utf8(line)?;
            let f: f64 = match s {
                "inf" => f64::INFINITY,
                "-inf" => f64::NEG_INFINITY,
                _ => s
                    .parse()
                    .map_err(|e| Error::Protocol(format!("invalid double: {e}")))?,
            };
            Ok((RespValue::Double(f), next))
        }
        b'(' => {
            let (line, next) = read_line(buf, pos + 1)?;
            Ok((RespValue::BigNumber(utf8(line)?.to_string()), next))
        }
        b'!' => {
            let (data, next) = read_blob(buf, pos)?;
            match data {
                Some(bytes) => Ok((
                    RespValue::BulkError(String::from_utf8_lossy(&bytes).into_owned()),
                    next,
                )),
                None => Err(Error::Protocol("negative bulk error length".into())),
            }
        }
        b'=' => {
            let (data, next) = read_blob(buf, pos)?;
            match data {
                Some(bytes) => {
                    // Drop the "txt:" / "mkd:" encoding prefix.
                    let text = if bytes.len() > 4 && bytes[3] == b':' {
                        &bytes[4..]
                    } else {
                        &bytes[..]
                    };
                    Ok((RespValue::Verbatim(utf8(text)?.to_string()), next))
                }
                None => Err(Error::Protocol("negative verbatim string length".into())),
            }
        }
        other => Err(Error::Protocol(format!(
            "unknown RESP type byte: 0x{other:02x}"
        ))),
    }
}

/// Compute the byte length of one complete frame at the front of `buf`
/// without allocating or building a `RespValue` tree.
///
/// The transport uses this to find the frame boundary before splitting
/// the read buffer, so [`parse`] only ever sees a frozen, exact-length
/// frame. `Err(Incomplete)` means the frame is still partial.
pub fn frame_len(buf: &[u8]) -> Result<usize> {
    frame_len_at(buf, 0, 0)
}

fn frame_len_at(buf: &[u8], pos: usize, depth: usize) -> Result<usize> {
    if depth > MAX_DEPTH {
        return Err(Error::Protocol(format!(
            "RESP nesting depth exceeds maximum of {MAX_DEPTH}"
        )));
    }
    if pos >= buf.len() {
        return Err(Error::Incomplete);
    }
    match buf[pos] {
        b'+' | b'-' | b':' | b',' | b'(' => {
            let (_, next) = read_line(buf, pos + 1)?;
            Ok(next)
        }
        b'_' => {
            if buf.len() < pos + 3 {
                return Err(Error::Incomplete);
            }
            Ok(pos + 3)
        }
        b'#' => {
            if buf.len() < pos + 4 {
                return Err(Error::Incomplete);
            }
            Ok(pos + 4)
        }
        b'$' | b'!' | b'=' => {
            let (line, next) = read_line(buf, pos + 1)?;
            let len = parse_int(line)?;
            if len < 0 {
                // Null bulk: header only.
                return Ok(next);
            }
            let end = next + len as usize + 2;
            if buf.len() < end {
                return Err(Error::Incomplete);
            }
            Ok(end)
        }
        b'*' | b'~' | b'>' => {
            let (line, mut next) = read_line(buf, pos + 1)?;
            let count = parse_int(line)?;
            if count < 0 {
                return Ok(next);
            }
            for _ in 0..checked_count(count)? {
                next = frame_len_at(buf, next, depth + 1)?;
            }
            Ok(next)
        }
        b'%' | b'|' => {
            let (line, mut next) = read_line(buf, pos + 1)?;
            let count = parse_int(line)?;
            if count < 0 {
                return Err(Error::Protocol("negative map count".into()));
            }
            for _ in 0..checked_count(count)? {
                next = frame_len_at(buf, next, depth + 1)?;
                next = frame_len_at(buf, next, depth + 1)?;
            }
            if buf[pos] == b'|' {
                // The attribute pairs precede the actual reply.
                next = frame_len_at(buf, next, depth + 1)?;
            }
            Ok(next)
        }
        other => Err(Error::Protocol(format!(
            "unknown RESP type byte: 0x{other:02x}"
        ))),
    }
}

// ── Frame pieces ───────────────────────────────────────────────────

/// Find the `\r\n` line terminator starting at `offset`; returns the line
/// and the offset just past the terminator.
#[inline]
fn read_line(buf: &[u8], offset: usize) -> Result<(&[u8], usize)> {
    match memchr(b'\r', &buf[offset..]) {
        Some(rel) => {
            let cr = offset + rel;
            if cr + 1 >= buf.len() {
                Err(Error::Incomplete)
            } else if buf[cr + 1] != b'\n' {
                Err(Error::Protocol("expected \\n after \\r".into()))
            } else {
                Ok((&buf[offset..cr], cr + 2))
            }
        }
        None => Err(Error::Incomplete),
    }
}

/// Parse a signed decimal integer from raw bytes, overflow-checked.
fn parse_int(bytes: &[u8]) -> Result<i64> {
    if bytes.is_empty() {
        return Err(Error::Protocol("empty integer".into()));
    }
    let (negative, digits) = match bytes[0] {
        b'-' => (true, &bytes[1..]),
        b'+' => (false, &bytes[1..]),
        _ => (false, bytes),
    };
    if digits.is_empty() {
        return Err(Error::Protocol("integer has no digits".into()));
    }
    // Accumulate negative so i64::MIN round-trips.
    let mut n: i64 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return Err(Error::Protocol(format!("invalid byte in integer: 0x{b:02x}")));
        }
        n = n
            .checked_mul(10)
            .and_then(|n| n.checked_sub((b - b'0') as i64))
            .ok_or_else(|| Error::Protocol("integer overflow".into()))?;
    }
    Ok(if negative { n } else { -n })
}

/// Read a length-prefixed blob (`$`, `!`, `=`). `None` for a negative
/// (null) length. Zero-copy slice into the shared buffer.
fn read_blob(buf: &Bytes, pos: usize) -> Result<(Option<Bytes>, usize)> {
    let (line, next) = read_line(buf, pos + 1)?;
    let len = parse_int(line)?;
    if len < 0 {
        return Ok((None, next));
    }
    let len = len as usize;
    let end = next + len;
    if buf.len() < end + 2 {
        return Err(Error::Incomplete);
    }
    if &buf[end..end + 2] != b"\r\n" {
        return Err(Error::Protocol("blob not terminated by \\r\\n".into()));
    }
    Ok((Some(buf.slice(next..end)), end + 2))
}

/// Read a counted run of elements (`*`, `~`, `>`). `None` for a negative
/// (RESP2 null array) count.
fn read_elements(buf: &Bytes, pos: usize, depth: usize) -> Result<(Option<Vec<RespValue>>, usize)> {
    let (line, mut next) = read_line(buf, pos + 1)?;
    let count = parse_int(line)?;
    if count < 0 {
        return Ok((None, next));
    }
    let count = checked_count(count)?;
    let mut items = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        let (val, end) = parse_at(buf, next, depth + 1)?;
        items.push(val);
        next = end;
    }
    Ok((Some(items), next))
}

/// Read a counted run of key/value pairs (`%`, `|`).
fn read_pairs(
    buf: &Bytes,
    pos: usize,
    depth: usize,
) -> Result<(Vec<(RespValue, RespValue)>, usize)> {
    let (line, mut next) = read_line(buf, pos + 1)?;
    let count = parse_int(line)?;
    if count < 0 {
        return Err(Error::Protocol("negative map count".into()));
    }
    let count = checked_count(count)?;
    let mut pairs = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        let (key, after_key) = parse_at(buf, next, depth + 1)?;
        let (val, after_val) = parse_at(buf, after_key, depth + 1)?;
        pairs.push((key, val));
        next = after_val;
    }
    Ok((pairs, next))
}

fn checked_count(count: i64) -> Result<usize> {
    let count = count as usize;
    if count > MAX_ELEMENTS {
        return Err(Error::Protocol(format!(
            "element count {count} exceeds maximum {MAX_ELEMENTS}"
        )));
    }
    Ok(count)
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| Error::Protocol(format!("invalid UTF-8: {e}")))
}

// ── Tests ──────────────────────────────────────────────────────────
