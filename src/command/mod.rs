//! The command catalog: one immutable registry mapping command names to
//! their wire token, argument filter, and response parser.
//!
//! Each family module registers its commands into the shared table at
//! construction time; after that the registry is read-only. Filters and
//! parsers are plain function pointers — pure, synchronous, and free of
//! any I/O — so the catalog is a data structure, not a class hierarchy.

pub mod arg;
pub mod reply;

mod bitmaps;
mod cluster;
mod connection;
mod geo;
mod hashes;
mod hyperloglog;
mod keys;
mod lists;
mod pubsub;
mod scripting;
mod server;
mod sets;
mod sorted_sets;
mod streams;
mod strings;
mod transactions;
mod vector_sets;

use std::collections::HashMap;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::resp::{Protocol, RespValue};

pub use arg::CmdArg;
pub use reply::Reply;

/// Argument filter: caller arguments in, flat wire arguments out.
pub type FilterFn = fn(Vec<CmdArg>) -> Result<Vec<Bytes>>;

/// Response parser: raw reply plus negotiated protocol in, parsed reply out.
pub type ParserFn = fn(RespValue, Protocol) -> Result<Reply>;

/// One command's mapping entry.
#[derive(Debug)]
pub struct CommandSpec {
    /// The token sent on the wire. Differs from the registry name for
    /// client-side aliases (DELETE→DEL) and underscore spellings
    /// (EVAL_RO's name is its own token, but OBJECT subcommands are not).
    pub token: &'static str,
    pub filter: FilterFn,
    pub parser: ParserFn,
}

pub(crate) type Table = HashMap<&'static str, CommandSpec>;

/// Insert one registration. Names are canonical uppercase.
pub(crate) fn put(
    table: &mut Table,
    name: &'static str,
    token: &'static str,
    filter: FilterFn,
    parser: ParserFn,
) {
    let prev = table.insert(
        name,
        CommandSpec {
            token,
            filter,
            parser,
        },
    );
    debug_assert!(prev.is_none(), "duplicate command registration: {name}");
}

/// The immutable command table, built once per client.
pub struct Registry {
    table: Table,
}

impl Registry {
    pub fn new() -> Self {
        let mut table = Table::with_capacity(256);
        bitmaps::register(&mut table);
        cluster::register(&mut table);
        connection::register(&mut table);
        geo::register(&mut table);
        hashes::register(&mut table);
        hyperloglog::register(&mut table);
        keys::register(&mut table);
        lists::register(&mut table);
        pubsub::register(&mut table);
        scripting::register(&mut table);
        server::register(&mut table);
        sets::register(&mut table);
        sorted_sets::register(&mut table);
        streams::register(&mut table);
        strings::register(&mut table);
        transactions::register(&mut table);
        vector_sets::register(&mut table);
        Registry { table }
    }

    /// Case-insensitive lookup; a miss is a client-side error raised
    /// before any bytes touch the wire.
    pub fn lookup(&self, name: &str) -> Result<&CommandSpec> {
        let canonical = name.to_ascii_uppercase();
        self.table
            .get(canonical.as_str())
            .ok_or_else(|| Error::UnknownCommand(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name.to_ascii_uppercase().as_str())
    }

    /// Run a command's filter: `(wire token, wire arguments)`.
    pub fn filter_arguments(
        &self,
        name: &str,
        args: Vec<CmdArg>,
    ) -> Result<(&'static str, Vec<Bytes>)> {
        let spec = self.lookup(name)?;
        let wire_args = (spec.filter)(args)?;
        Ok((spec.token, wire_args))
    }

    /// Run a command's response parser.
    pub fn parse_response(
        &self,
        name: &str,
        value: RespValue,
        protocol: Protocol,
    ) -> Result<Reply> {
        let spec = self.lookup(name)?;
        (spec.parser)(value, protocol)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = Registry::new();
        assert!(registry.lookup("get").is_ok());
        assert!(registry.lookup("GET").is_ok());
        assert!(registry.lookup("GeT").is_ok());
    }

    #[test]
    fn unknown_command_fails_before_io() {
        let registry = Registry::new();
        let err = registry.lookup("FROBNICATE").unwrap_err();
        assert!(matches!(err, Error::UnknownCommand(ref name) if name == "FROBNICATE"));
    }

    #[test]
    fn aliases_map_to_wire_tokens() {
        let registry = Registry::new();
        assert_eq!(registry.lookup("DELETE").unwrap().token, "DEL");
        assert_eq!(registry.lookup("EVALUATE").unwrap().token, "EVAL");
        assert_eq!(registry.lookup("EVALUATESHA").unwrap().token, "EVALSHA");
        assert_eq!(registry.lookup("GETMULTIPLE").unwrap().token, "MGET");
        assert_eq!(registry.lookup("SETTIMEOUT").unwrap().token, "EXPIRE");
        assert_eq!(registry.lookup("SUBSTR").unwrap().token, "GETRANGE");
    }

    #[test]
    fn underscore_spellings_keep_their_token() {
        let registry = Registry::new();
        assert_eq!(registry.lookup("EVAL_RO").unwrap().token, "EVAL_RO");
        assert_eq!(registry.lookup("SORT_RO").unwrap().token, "SORT_RO");
        assert_eq!(registry.lookup("BITFIELD_RO").unwrap().token, "BITFIELD_RO");
    }

    #[test]
    fn catalog_covers_every_family() {
        let registry = Registry::new();
        for name in [
            "PING", "SET", "BITCOUNT", "DEL", "HGETALL", "LPUSH", "SADD",
            "ZADD", "PFADD", "GEOADD", "XADD", "PUBLISH", "MULTI", "EVAL",
            "FAILOVER", "CLUSTER", "VADD",
        ] {
            assert!(registry.contains(name), "missing {name}");
        }
        assert!(registry.len() > 190, "catalog too small: {}", registry.len());
    }

    #[test]
    fn filter_and_parse_round_trip() {
        let registry = Registry::new();
        let (token, args) = registry
            .filter_arguments("echo", vec!["hello".into()])
            .unwrap();
        assert_eq!(token, "ECHO");
        assert_eq!(args, vec![Bytes::from_static(b"hello")]);

        let reply = registry
            .parse_response("echo", RespValue::from("hello"), Protocol::Resp2)
            .unwrap();
        assert_eq!(reply, Reply::Bytes(Bytes::from_static(b"hello")));
    }
}
