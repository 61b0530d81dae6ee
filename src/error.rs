use std::fmt;
use std::io;

/// Structured Redis error kinds for programmatic matching.
///
/// The server's error message is always carried verbatim alongside the
/// classified kind; classification never rewrites the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedisErrorKind {
    /// Generic ERR
    Err,
    /// WRONGTYPE Operation against a key holding the wrong kind of value
    WrongType,
    /// LOADING Redis is loading the dataset in memory
    Loading,
    /// READONLY You can't write against a read only replica
    ReadOnly,
    /// NOSCRIPT No matching script
    NoScript,
    /// BUSY Redis is busy running a script
    Busy,
    /// NOAUTH Authentication required
    NoAuth,
    /// EXECABORT Transaction discarded because of previous errors
    ExecAbort,
    /// TRYAGAIN
    TryAgain,
    /// Any other Redis error prefix
    Other(String),
}

impl RedisErrorKind {
    /// Classify a raw Redis error message (e.g. "WRONGTYPE Operation against…").
    pub fn from_error_msg(msg: &str) -> Self {
        if msg.starts_with("WRONGTYPE") {
            Self::WrongType
        } else if msg.starts_with("LOADING") {
            Self::Loading
        } else if msg.starts_with("READONLY") {
            Self::ReadOnly
        } else if msg.starts_with("NOSCRIPT") {
            Self::NoScript
        } else if msg.starts_with("BUSY") {
            Self::Busy
        } else if msg.starts_with("NOAUTH") {
            Self::NoAuth
        } else if msg.starts_with("EXECABORT") {
            Self::ExecAbort
        } else if msg.starts_with("TRYAGAIN") {
            Self::TryAgain
        } else if msg.starts_with("ERR") {
            Self::Err
        } else {
            let prefix = msg.split_whitespace().next().unwrap_or("UNKNOWN");
            Self::Other(prefix.to_string())
        }
    }
}

/// All error variants for redic.
#[derive(Debug)]
pub enum Error {
    /// TCP / IO level errors
    Connection(io::Error),
    /// RESP protocol parse errors
    Protocol(String),
    /// RESP parser needs more data — not a real error, used as control flow.
    Incomplete,
    /// Redis returned an error string; the message is verbatim.
    Redis {
        kind: RedisErrorKind,
        message: String,
    },
    /// Client-side argument shape error, raised by a filter before any I/O.
    Type(String),
    /// Operation timed out
    Timeout(String),
    /// Command name not present in the registry.
    UnknownCommand(String),
}

impl Error {
    /// Create a Redis error from a raw error message, auto-classifying the kind.
    pub fn redis(msg: impl Into<String>) -> Self {
        let message = msg.into();
        let kind = RedisErrorKind::from_error_msg(&message);
        Self::Redis { kind, message }
    }

    /// The verbatim server message, if this is a server error.
    pub fn redis_message(&self) -> Option<&str> {
        match self {
            Self::Redis { message, .. } => Some(message),
            _ => None,
        }
    }

    /// True when this is a WRONGTYPE server error.
    pub fn is_wrong_type(&self) -> bool {
        matches!(
            self,
            Self::Redis {
                kind: RedisErrorKind::WrongType,
                ..
            }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(e) => write!(f, "connection error: {e}"),
            Self::Protocol(msg) => write!(f, "protocol error: {msg}"),
            Self::Incomplete => write!(f, "incomplete RESP message"),
            Self::Redis { message, .. } => write!(f, "redis error: {message}"),
            Self::Type(msg) => write!(f, "type error: {msg}"),
            Self::Timeout(msg) => write!(f, "timeout: {msg}"),
            Self::UnknownCommand(name) => write!(f, "unknown command: {name}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Connection(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_err() {
        let kind = RedisErrorKind::from_error_msg("ERR unknown command 'FOO'");
        assert_eq!(kind, RedisErrorKind::Err);
    }

    #[test]
    fn kind_wrongtype() {
        let kind = RedisErrorKind::from_error_msg(
            "WRONGTYPE Operation against a key holding the wrong kind of value",
        );
        assert_eq!(kind, RedisErrorKind::WrongType);
    }

    #[test]
    fn kind_execabort() {
        let kind = RedisErrorKind::from_error_msg(
            "EXECABORT Transaction discarded because of previous errors.",
        );
        assert_eq!(kind, RedisErrorKind::ExecAbort);
    }

    #[test]
    fn kind_noauth() {
        let kind = RedisErrorKind::from_error_msg("NOAUTH Authentication required.");
        assert_eq!(kind, RedisErrorKind::NoAuth);
    }

    #[test]
    fn kind_other() {
        let kind = RedisErrorKind::from_error_msg("CUSTOMPREFIX something happened");
        assert_eq!(kind, RedisErrorKind::Other("CUSTOMPREFIX".to_string()));
    }

    #[test]
    fn redis_message_is_verbatim() {
        let err = Error::redis("WRONGTYPE Operation against a key holding the wrong kind of value");
        assert!(err.is_wrong_type());
        assert_eq!(
            err.redis_message(),
            Some("WRONGTYPE Operation against a key holding the wrong kind of value")
        );
        assert!(err.to_string().contains("wrong kind of value"));
    }

    #[test]
    fn display_variants() {
        let err = Error::Connection(io::Error::new(io::ErrorKind::Other, "refused"));
        assert!(err.to_string().contains("connection error"));

        let err = Error::Protocol("bad input".into());
        assert_eq!(err.to_string(), "protocol error: bad input");

        let err = Error::Type("expected array of keys".into());
        assert_eq!(err.to_string(), "type error: expected array of keys");

        let err = Error::Timeout("3s exceeded".into());
        assert_eq!(err.to_string(), "timeout: 3s exceeded");

        let err = Error::UnknownCommand("FROBNICATE".into());
        assert_eq!(err.to_string(), "unknown command: FROBNICATE");
    }

    #[test]
    fn io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::Other, "refused");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Connection(_)));
    }
}
