use bytes::Bytes;

/// A decoded-but-unparsed RESP value — the "raw reply" handed to the
/// per-command response parsers (RESP2 + RESP3).
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    /// +OK\r\n
    SimpleString(String),
    /// -ERR message\r\n
    Error(String),
    /// :1000\r\n
    Integer(i64),
    /// $6\r\nfoobar\r\n
    BulkString(Bytes),
    /// *2\r\n…
    Array(Vec<RespValue>),
    /// $-1\r\n or *-1\r\n (RESP2), _\r\n (RESP3)
    Null,
    /// ,3.14\r\n (RESP3)
    Double(f64),
    /// #t\r\n or #f\r\n (RESP3)
    Boolean(bool),
    /// %N\r\n (RESP3 map, insertion-ordered)
    Map(Vec<(RespValue, RespValue)>),
    /// ~N\r\n (RESP3 set)
    Set(Vec<RespValue>),
    /// =15\r\ntxt:Some string\r\n (RESP3; the encoding prefix is dropped)
    Verbatim(String),
    /// (34928903284…\r\n (RESP3)
    BigNumber(String),
    /// !21\r\nSYNTAX invalid syntax\r\n (RESP3 bulk error)
    BulkError(String),
    /// >N\r\n… (RESP3 push frame, e.g. pub/sub messages)
    Push(Vec<RespValue>),
}

impl RespValue {
    /// Interpret as a UTF-8 string, if this is a string-shaped value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::SimpleString(s) | Self::Verbatim(s) => Some(s),
            Self::BulkString(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Interpret as raw bytes, if this is a string-shaped value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::BulkString(b) => Some(b),
            Self::SimpleString(s) | Self::Verbatim(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True when this is the literal +QUEUED acknowledgement a server sends
    /// for commands buffered inside MULTI.
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::SimpleString(s) if s == "QUEUED")
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_) | Self::BulkError(_))
    }

    /// The error message if this is an error value.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(msg) | Self::BulkError(msg) => Some(msg),
            _ => None,
        }
    }

    /// The type name as a static string, for protocol-mismatch messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SimpleString(_) => "simple_string",
            Self::Error(_) => "error",
            Self::Integer(_) => "integer",
            Self::BulkString(_) => "bulk_string",
            Self::Array(_) => "array",
            Self::Null => "null",
            Self::Double(_) => "double",
            Self::Boolean(_) => "boolean",
            Self::Map(_) => "map",
            Self::Set(_) => "set",
            Self::Verbatim(_) => "verbatim_string",
            Self::BigNumber(_) => "big_number",
            Self::BulkError(_) => "bulk_error",
            Self::Push(_) => "push",
        }
    }
}

/// Convenience constructor used throughout the tests.
impl From<&'static str> for RespValue {
    fn from(s: &'static str) -> Self {
        RespValue::BulkString(Bytes::from_static(s.as_bytes()))
    }
}

impl From<i64> for RespValue {
    fn from(i: i64) -> Self {
        RespValue::Integer(i)
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_str_covers_string_shapes() {
        assert_eq!(RespValue::SimpleString("OK".into()).as_str(), Some("OK"));
        assert_eq!(RespValue::from("hello").as_str(), Some("hello"));
        assert_eq!(RespValue::Verbatim("note".into()).as_str(), Some("note"));
        assert_eq!(RespValue::Integer(1).as_str(), None);
        assert_eq!(
            RespValue::BulkString(Bytes::from_static(&[0xff, 0xfe])).as_str(),
            None
        );
    }

    #[test]
    fn as_bytes_covers_string_shapes() {
        assert_eq!(RespValue::from("abc").as_bytes(), Some(b"abc".as_ref()));
        assert_eq!(
            RespValue::SimpleString("OK".into()).as_bytes(),
            Some(b"OK".as_ref())
        );
        assert_eq!(RespValue::Null.as_bytes(), None);
    }

    #[test]
    fn queued_detection() {
        assert!(RespValue::SimpleString("QUEUED".into()).is_queued());
        assert!(!RespValue::SimpleString("OK".into()).is_queued());
        assert!(!RespValue::from("QUEUED").is_queued());
    }

    #[test]
    fn error_message() {
        let v = RespValue::Error("ERR boom".into());
        assert!(v.is_error());
        assert_eq!(v.error_message(), Some("ERR boom"));

        let v = RespValue::BulkError("SYNTAX invalid".into());
        assert!(v.is_error());
        assert_eq!(v.error_message(), Some("SYNTAX invalid"));

        assert_eq!(RespValue::Integer(0).error_message(), None);
    }

    #[test]
    fn type_names() {
        assert_eq!(RespValue::Null.type_name(), "null");
        assert_eq!(RespValue::Map(vec![]).type_name(), "map");
        assert_eq!(RespValue::Push(vec![]).type_name(), "push");
        assert_eq!(RespValue::Double(0.0).type_name(), "double");
    }
}
