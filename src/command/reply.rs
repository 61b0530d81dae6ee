//! Parsed reply values and the shared response-parser building blocks.
//!
//! Parsers receive the raw [`RespValue`] together with the negotiated
//! [`Protocol`], and normalize the protocol-dependent wire shapes into a
//! stable [`Reply`] so callers see one result shape under RESP2 and RESP3
//! alike. Server error frames never reach a parser's happy path — they
//! are surfaced verbatim as [`Error::Redis`] first.

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::resp::{Protocol, RespValue};

/// A fully parsed command reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Nil,
    /// Simple status line (`OK`, `PONG`, …).
    Status(String),
    Int(i64),
    Bool(bool),
    Double(f64),
    Bytes(Bytes),
    BigNumber(String),
    Array(Vec<Reply>),
    /// Insertion-ordered field→value pairs.
    Map(Vec<(Bytes, Reply)>),
    Set(Vec<Reply>),
}

impl Reply {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Reply::Status(s) => Some(s),
            Reply::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Reply::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }

    /// Look up a map field by key.
    pub fn get(&self, key: &[u8]) -> Option<&Reply> {
        match self {
            Reply::Map(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

/// Convert a raw RESP value into a reply, surfacing server errors.
///
/// This is the structural fallback used by `identity` and by parsers that
/// recurse into aggregates; it performs no shape normalization beyond the
/// one-to-one mapping of wire types.
pub fn from_resp(value: RespValue) -> Result<Reply> {
    match value {
        RespValue::Error(msg) | RespValue::BulkError(msg) => Err(Error::redis(msg)),
        RespValue::SimpleString(s) => Ok(Reply::Status(s)),
        RespValue::Integer(i) => Ok(Reply::Int(i)),
        RespValue::BulkString(b) => Ok(Reply::Bytes(b)),
        RespValue::Verbatim(s) => Ok(Reply::Bytes(Bytes::from(s.into_bytes()))),
        RespValue::Null => Ok(Reply::Nil),
        RespValue::Double(f) => Ok(Reply::Double(f)),
        RespValue::Boolean(b) => Ok(Reply::Bool(b)),
        RespValue::BigNumber(s) => Ok(Reply::BigNumber(s)),
        RespValue::Array(items) | RespValue::Push(items) => {
            Ok(Reply::Array(convert_all(items)?))
        }
        RespValue::Set(items) => Ok(Reply::Set(convert_all(items)?)),
        RespValue::Map(pairs) => {
            let mut out = Vec::with_capacity(pairs.len());
            for (k, v) in pairs {
                out.push((key_bytes(k)?, from_resp(v)?));
            }
            Ok(Reply::Map(out))
        }
    }
}

fn convert_all(items: Vec<RespValue>) -> Result<Vec<Reply>> {
    items.into_iter().map(from_resp).collect()
}

/// Coerce a map key into bytes. Servers key maps with strings, but XINFO
/// and friends occasionally use integers.
fn key_bytes(key: RespValue) -> Result<Bytes> {
    match key {
        RespValue::BulkString(b) => Ok(b),
        RespValue::SimpleString(s) | RespValue::Verbatim(s) => {
            Ok(Bytes::from(s.into_bytes()))
        }
        RespValue::Integer(i) => {
            let mut buf = itoa::Buffer::new();
            Ok(Bytes::copy_from_slice(buf.format(i).as_bytes()))
        }
        RespValue::Double(f) => Ok(Bytes::from(f.to_string().into_bytes())),
        other => Err(mismatch("string map key", &other)),
    }
}

/// A reply whose wire shape does not match what the command's parser
/// expects — a protocol-level fault, reported loudly rather than guessed at.
pub(crate) fn mismatch(expected: &str, got: &RespValue) -> Error {
    Error::Protocol(format!(
        "expected {expected} reply, got {}",
        got.type_name()
    ))
}

// ── Shared parsers ─────────────────────────────────────────────────
//
// These have the uniform `fn(RespValue, Protocol) -> Result<Reply>`
// signature so the registry can hold them as plain function pointers.

/// Pass the structurally converted value through unchanged.
pub fn identity(value: RespValue, _proto: Protocol) -> Result<Reply> {
    from_resp(value)
}

/// Normalize the yes/no reply shapes into a boolean: RESP2 integers 0/1,
/// RESP3 booleans, `+OK` acknowledgements, and nil-means-no.
pub fn bool_reply(value: RespValue, _proto: Protocol) -> Result<Reply> {
    match value {
        RespValue::Integer(i) => Ok(Reply::Bool(i != 0)),
        RespValue::Boolean(b) => Ok(Reply::Bool(b)),
        RespValue::SimpleString(s) if s == "OK" => Ok(Reply::Bool(true)),
        RespValue::Null => Ok(Reply::Bool(false)),
        RespValue::Error(msg) | RespValue::BulkError(msg) => Err(Error::redis(msg)),
        other => Err(mismatch("boolean-shaped", &other)),
    }
}

/// Normalize a field/value reply into an insertion-ordered map: RESP3
/// native maps and RESP2 flat `[k1, v1, k2, v2, …]` arrays fold to the
/// same shape. An odd-length flat array is a protocol fault.
pub fn pairs_map(value: RespValue, _proto: Protocol) -> Result<Reply> {
    match value {
        RespValue::Map(pairs) => {
            let mut out = Vec::with_capacity(pairs.len());
            for (k, v) in pairs {
                out.push((key_bytes(k)?, from_resp(v)?));
            }
            Ok(Reply::Map(out))
        }
        RespValue::Array(items) => fold_flat_pairs(items),
        RespValue::Null => Ok(Reply::Nil),
        RespValue::Error(msg) | RespValue::BulkError(msg) => Err(Error::redis(msg)),
        other => Err(mismatch("map-shaped", &other)),
    }
}

fn fold_flat_pairs(items: Vec<RespValue>) -> Result<Reply> {
    if items.len() % 2 != 0 {
        return Err(Error::Protocol(format!(
            "cannot fold {}-element array into field/value pairs",
            items.len()
        )));
    }
    let mut out = Vec::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(k), Some(v)) = (iter.next(), iter.next()) {
        out.push((key_bytes(k)?, from_resp(v)?));
    }
    Ok(Reply::Map(out))
}

/// Normalize member/score replies (WITHSCORES ranges, ZPOPMIN/MAX, ZRANDMEMBER
/// WITHSCORES) into a member→score map. RESP2 sends a flat alternating array
/// with scores as strings; RESP3 sends `[member, score]` pair arrays with
/// native doubles. The shape is unified; the score representation is kept
/// as the wire delivered it.
pub fn scores_map(value: RespValue, _proto: Protocol) -> Result<Reply> {
    let items = match value {
        RespValue::Array(items) => items,
        RespValue::Map(pairs) => {
            let mut out = Vec::with_capacity(pairs.len());
            for (k, v) in pairs {
                out.push((key_bytes(k)?, from_resp(v)?));
            }
            return Ok(Reply::Map(out));
        }
        RespValue::Null => return Ok(Reply::Nil),
        RespValue::Error(msg) | RespValue::BulkError(msg) => return Err(Error::redis(msg)),
        other => return Err(mismatch("member/score", &other)),
    };
    // RESP3 nests each member/score pair in its own two-element array.
    let nested = items
        .iter()
        .all(|item| matches!(item, RespValue::Array(pair) if pair.len() == 2));
    if nested && !items.is_empty() {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let RespValue::Array(pair) = item else {
                unreachable!()
            };
            let mut pair = pair.into_iter();
            let (member, score) = (pair.next(), pair.next());
            match (member, score) {
                (Some(m), Some(s)) => out.push((key_bytes(m)?, from_resp(s)?)),
                _ => return Err(Error::Protocol("short member/score pair".into())),
            }
        }
        Ok(Reply::Map(out))
    } else {
        fold_flat_pairs(items)
    }
}

/// Normalize a floating-point reply: RESP2 bulk-string scores parse into
/// doubles, RESP3 doubles pass through, nil stays nil.
pub fn double_reply(value: RespValue, _proto: Protocol) -> Result<Reply> {
    match value {
        RespValue::Double(f) => Ok(Reply::Double(f)),
        RespValue::Integer(i) => Ok(Reply::Double(i as f64)),
        RespValue::Null => Ok(Reply::Nil),
        RespValue::Error(msg) | RespValue::BulkError(msg) => Err(Error::redis(msg)),
        other => match other.as_str() {
            Some(s) => Ok(Reply::Double(parse_double(s)?)),
            None => Err(mismatch("double-shaped", &other)),
        },
    }
}

pub(crate) fn parse_double(s: &str) -> Result<f64> {
    match s {
        "inf" | "+inf" => Ok(f64::INFINITY),
        "-inf" => Ok(f64::NEG_INFINITY),
        _ => s
            .parse::<f64>()
            .map_err(|_| Error::Protocol(format!("invalid double: {s:?}"))),
    }
}

/// Normalize set-shaped replies to a plain array so SMEMBERS and friends
/// look the same under both protocols. Scalar shapes (SPOP without a
/// count) pass through structurally.
pub fn member_array(value: RespValue, _proto: Protocol) -> Result<Reply> {
    match value {
        RespValue::Set(items) => Ok(Reply::Array(convert_all(items)?)),
        other => from_resp(other),
    }
}

/// Fold `[member, score]` pair arrays into a map when the server sent that
/// shape (RESP3 WITHSCORES aggregates); anything else passes through
/// structurally. Unlike [`scores_map`], a flat array is NOT folded — the
/// same command without WITHSCORES returns a flat member list and the two
/// are indistinguishable on the RESP2 wire.
pub fn maybe_scores(value: RespValue, _proto: Protocol) -> Result<Reply> {
    let nested = match &value {
        RespValue::Array(items) => {
            !items.is_empty()
                && items
                    .iter()
                    .all(|item| matches!(item, RespValue::Array(pair) if pair.len() == 2))
        }
        _ => false,
    };
    if nested {
        scores_map(value, _proto)
    } else {
        from_resp(value)
    }
}

/// Fold a flat field/value array into a map when the reply has that shape:
/// even length with string-shaped keys at the even positions. Covers
/// CONFIG GET, MEMORY STATS, and XINFO STREAM under RESP2 without
/// disturbing the scalar and list replies of their sibling subcommands.
pub fn maybe_pairs(value: RespValue, _proto: Protocol) -> Result<Reply> {
    let foldable = match &value {
        RespValue::Array(items) => {
            !items.is_empty()
                && items.len() % 2 == 0
                && items.iter().step_by(2).all(|k| k.as_bytes().is_some())
        }
        _ => false,
    };
    match value {
        RespValue::Array(items) if foldable => fold_flat_pairs(items),
        RespValue::Map(_) => pairs_map(value, _proto),
        other => from_resp(other),
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk(s: &'static str) -> RespValue {
        RespValue::BulkString(Bytes::from_static(s.as_bytes()))
    }

    #[test]
    fn errors_surface_verbatim() {
        let err = from_resp(RespValue::Error(
            "WRONGTYPE Operation against a key holding the wrong kind of value".into(),
        ))
        .unwrap_err();
        assert_eq!(
            err.redis_message(),
            Some("WRONGTYPE Operation against a key holding the wrong kind of value")
        );
    }

    #[test]
    fn bool_reply_shapes() {
        let p = Protocol::Resp2;
        assert_eq!(bool_reply(RespValue::Integer(1), p).unwrap(), Reply::Bool(true));
        assert_eq!(bool_reply(RespValue::Integer(0), p).unwrap(), Reply::Bool(false));
        assert_eq!(bool_reply(RespValue::Boolean(true), p).unwrap(), Reply::Bool(true));
        assert_eq!(
            bool_reply(RespValue::SimpleString("OK".into()), p).unwrap(),
            Reply::Bool(true)
        );
        assert_eq!(bool_reply(RespValue::Null, p).unwrap(), Reply::Bool(false));
        assert!(bool_reply(bulk("nope"), p).is_err());
    }

    #[test]
    fn pairs_map_folds_flat_array() {
        let value = RespValue::Array(vec![bulk("name"), bulk("Alice"), bulk("age"), bulk("30")]);
        let reply = pairs_map(value, Protocol::Resp2).unwrap();
        assert_eq!(
            reply,
            Reply::Map(vec![
                (Bytes::from_static(b"name"), Reply::Bytes(Bytes::from_static(b"Alice"))),
                (Bytes::from_static(b"age"), Reply::Bytes(Bytes::from_static(b"30"))),
            ])
        );
    }

    #[test]
    fn pairs_map_accepts_native_map() {
        let value = RespValue::Map(vec![(bulk("name"), bulk("Alice"))]);
        let reply = pairs_map(value, Protocol::Resp3).unwrap();
        assert_eq!(reply.get(b"name").and_then(Reply::as_str), Some("Alice"));
    }

    #[test]
    fn pairs_map_rejects_odd_length() {
        let value = RespValue::Array(vec![bulk("lonely")]);
        assert!(matches!(
            pairs_map(value, Protocol::Resp2),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn pairs_map_preserves_order() {
        let value = RespValue::Array(vec![bulk("z"), bulk("1"), bulk("a"), bulk("2")]);
        let Reply::Map(pairs) = pairs_map(value, Protocol::Resp2).unwrap() else {
            panic!("expected map");
        };
        assert_eq!(pairs[0].0, Bytes::from_static(b"z"));
        assert_eq!(pairs[1].0, Bytes::from_static(b"a"));
    }

    #[test]
    fn scores_map_flat_resp2() {
        let value = RespValue::Array(vec![bulk("one"), bulk("1"), bulk("two"), bulk("2")]);
        let reply = scores_map(value, Protocol::Resp2).unwrap();
        // RESP2 scores stay as the wire's string representation.
        assert_eq!(
            reply.get(b"one"),
            Some(&Reply::Bytes(Bytes::from_static(b"1")))
        );
    }

    #[test]
    fn scores_map_nested_resp3() {
        let value = RespValue::Array(vec![
            RespValue::Array(vec![bulk("one"), RespValue::Double(1.0)]),
            RespValue::Array(vec![bulk("two"), RespValue::Double(2.0)]),
        ]);
        let reply = scores_map(value, Protocol::Resp3).unwrap();
        assert_eq!(reply.get(b"two"), Some(&Reply::Double(2.0)));
    }

    #[test]
    fn double_reply_shapes() {
        assert_eq!(
            double_reply(bulk("3.14"), Protocol::Resp2).unwrap(),
            Reply::Double(3.14)
        );
        assert_eq!(
            double_reply(RespValue::Double(2.5), Protocol::Resp3).unwrap(),
            Reply::Double(2.5)
        );
        assert_eq!(
            double_reply(bulk("-inf"), Protocol::Resp2).unwrap(),
            Reply::Double(f64::NEG_INFINITY)
        );
        assert_eq!(double_reply(RespValue::Null, Protocol::Resp2).unwrap(), Reply::Nil);
        assert!(double_reply(bulk("abc"), Protocol::Resp2).is_err());
    }

    #[test]
    fn member_array_normalizes_sets() {
        let value = RespValue::Set(vec![bulk("a"), bulk("b")]);
        let reply = member_array(value, Protocol::Resp3).unwrap();
        assert!(matches!(reply, Reply::Array(ref items) if items.len() == 2));
    }

    #[test]
    fn maybe_scores_folds_only_nested_pairs() {
        let nested = RespValue::Array(vec![RespValue::Array(vec![
            bulk("one"),
            RespValue::Double(1.0),
        ])]);
        assert!(matches!(
            maybe_scores(nested, Protocol::Resp3).unwrap(),
            Reply::Map(_)
        ));

        // Flat member lists stay flat, even with an even element count.
        let flat = RespValue::Array(vec![bulk("a"), bulk("b")]);
        assert!(matches!(
            maybe_scores(flat, Protocol::Resp2).unwrap(),
            Reply::Array(_)
        ));
    }

    #[test]
    fn maybe_pairs_folds_string_keyed_arrays() {
        let flat = RespValue::Array(vec![bulk("maxmemory"), bulk("0")]);
        let reply = maybe_pairs(flat, Protocol::Resp2).unwrap();
        assert_eq!(reply.get(b"maxmemory").and_then(Reply::as_str), Some("0"));

        // Array-of-arrays (XINFO GROUPS shape) passes through.
        let nested = RespValue::Array(vec![
            RespValue::Array(vec![bulk("name"), bulk("g")]),
            RespValue::Array(vec![bulk("name"), bulk("h")]),
        ]);
        assert!(matches!(
            maybe_pairs(nested, Protocol::Resp2).unwrap(),
            Reply::Array(_)
        ));

        // Scalars pass through.
        assert_eq!(
            maybe_pairs(RespValue::Integer(3), Protocol::Resp2).unwrap(),
            Reply::Int(3)
        );
    }

    #[test]
    fn from_resp_converts_push_to_array() {
        let value = RespValue::Push(vec![bulk("message"), bulk("ch"), bulk("hi")]);
        let reply = from_resp(value).unwrap();
        assert!(matches!(reply, Reply::Array(ref items) if items.len() == 3));
    }

    #[test]
    fn map_keys_coerced_from_integers() {
        let value = RespValue::Map(vec![(RespValue::Integer(5), bulk("v"))]);
        let reply = from_resp(value).unwrap();
        assert_eq!(
            reply.get(b"5"),
            Some(&Reply::Bytes(Bytes::from_static(b"v")))
        );
    }
}
