//! Server administration commands.

use bytes::Bytes;

use super::arg::{expand_options, flatten, opt, subcommand, take_trailing_map, Opt, OptKind};
use super::reply::{from_resp, identity, maybe_pairs};
use super::{put, CmdArg, Reply, Table};
use crate::error::{Error, Result};
use crate::resp::{Protocol, RespValue};

const ACL_SUBS: &[&str] = &[
    "CAT", "DELUSER", "DRYRUN", "GENPASS", "GETUSER", "LIST", "LOAD", "SAVE",
    "SETUSER", "USERS", "WHOAMI",
];
const COMMAND_SUBS: &[&str] = &["COUNT", "DOCS", "GETKEYS", "INFO", "LIST"];
const CONFIG_SUBS: &[&str] = &["GET", "RESETSTAT", "REWRITE", "SET"];
const DEBUG_SUBS: &[&str] = &["JMAP", "OBJECT", "SET-ACTIVE-EXPIRE", "SLEEP"];
const MEMORY_SUBS: &[&str] = &["DOCTOR", "PURGE", "STATS", "USAGE"];
const SLOWLOG_SUBS: &[&str] = &["GET", "HELP", "LEN", "RESET"];

fn acl_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    subcommand(ACL_SUBS, args)
}

/// Bare COMMAND is itself a valid command.
fn command_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    if args.is_empty() {
        return Ok(Vec::new());
    }
    subcommand(COMMAND_SUBS, args)
}

fn config_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    subcommand(CONFIG_SUBS, args)
}

fn debug_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    subcommand(DEBUG_SUBS, args)
}

fn memory_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    subcommand(MEMORY_SUBS, args)
}

fn slowlog_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    subcommand(SLOWLOG_SUBS, args)
}

/// FAILOVER [TO host port [FORCE]] [ABORT] [TIMEOUT ms] — FORCE is only
/// legal inside a TO clause, so it slots directly after it.
const FAILOVER_OPTS: &[Opt] = &[
    opt("to", "TO", OptKind::Value),
    opt("force", "FORCE", OptKind::Flag),
    opt("abort", "ABORT", OptKind::Flag),
    opt("timeout", "TIMEOUT", OptKind::Value),
];

fn failover_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    if !args.is_empty() {
        return Err(Error::Type(
            "FAILOVER takes an options map only".into(),
        ));
    }
    let mut out = Vec::with_capacity(6);
    if let Some(pairs) = options {
        expand_options(pairs, FAILOVER_OPTS, &mut out)?;
    }
    Ok(out)
}

/// SLOWLOG GET entries come back as positional arrays; label the fields
/// so callers need not count offsets. LEN and RESET replies pass through.
fn slowlog_reply(value: RespValue, _proto: Protocol) -> Result<Reply> {
    let RespValue::Array(entries) = value else {
        return from_resp(value);
    };
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let RespValue::Array(fields) = entry else {
            return Err(Error::Protocol(format!(
                "slowlog entry is not an array: {}",
                entry.type_name()
            )));
        };
        if fields.len() < 4 {
            return Err(Error::Protocol(format!(
                "slowlog entry too short: {} fields",
                fields.len()
            )));
        }
        let mut iter = fields.into_iter();
        let mut labeled = Vec::with_capacity(6);
        for label in ["id", "timestamp", "duration", "command"] {
            if let Some(field) = iter.next() {
                labeled.push((Bytes::from_static(label.as_bytes()), from_resp(field)?));
            }
        }
        // Redis 4+ appends the client address and name.
        for label in ["client_addr", "client_name"] {
            if let Some(field) = iter.next() {
                labeled.push((Bytes::from_static(label.as_bytes()), from_resp(field)?));
            }
        }
        out.push(Reply::Map(labeled));
    }
    Ok(Reply::Array(out))
}

pub(super) fn register(table: &mut Table) {
    put(table, "ACL", "ACL", acl_filter, identity);
    put(table, "BGREWRITEAOF", "BGREWRITEAOF", flatten, identity);
    put(table, "BGSAVE", "BGSAVE", flatten, identity);
    put(table, "COMMAND", "COMMAND", command_filter, identity);
    put(table, "CONFIG", "CONFIG", config_filter, maybe_pairs);
    put(table, "DBSIZE", "DBSIZE", flatten, identity);
    put(table, "DEBUG", "DEBUG", debug_filter, identity);
    put(table, "FAILOVER", "FAILOVER", failover_filter, identity);
    put(table, "FLUSHALL", "FLUSHALL", flatten, identity);
    put(table, "FLUSHDB", "FLUSHDB", flatten, identity);
    put(table, "INFO", "INFO", flatten, identity);
    put(table, "LASTSAVE", "LASTSAVE", flatten, identity);
    put(table, "LOLWUT", "LOLWUT", flatten, identity);
    put(table, "MEMORY", "MEMORY", memory_filter, maybe_pairs);
    put(table, "REPLICAOF", "REPLICAOF", flatten, identity);
    put(table, "SAVE", "SAVE", flatten, identity);
    put(table, "SHUTDOWN", "SHUTDOWN", flatten, identity);
    put(table, "SLAVEOF", "SLAVEOF", flatten, identity);
    put(table, "SLOWLOG", "SLOWLOG", slowlog_filter, slowlog_reply);
    put(table, "TIME", "TIME", flatten, identity);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(items: &[&str]) -> Vec<Bytes> {
        items
            .iter()
            .map(|s| Bytes::copy_from_slice(s.as_bytes()))
            .collect()
    }

    #[test]
    fn failover_to_with_force_and_timeout() {
        let out = failover_filter(vec![CmdArg::map([
            ("timeout", CmdArg::Int(5000)),
            ("force", CmdArg::Bool(true)),
            ("to", CmdArg::seq([CmdArg::Str("10.0.0.2".into()), CmdArg::Int(6379)])),
        ])])
        .unwrap();
        assert_eq!(
            out,
            wire(&["TO", "10.0.0.2", "6379", "FORCE", "TIMEOUT", "5000"])
        );
    }

    #[test]
    fn failover_abort() {
        let out = failover_filter(vec![CmdArg::map([("abort", true)])]).unwrap();
        assert_eq!(out, wire(&["ABORT"]));
    }

    #[test]
    fn failover_bare() {
        assert!(failover_filter(vec![]).unwrap().is_empty());
    }

    #[test]
    fn failover_rejects_positional_args() {
        assert!(matches!(
            failover_filter(vec!["10.0.0.2".into()]),
            Err(Error::Type(_))
        ));
    }

    #[test]
    fn bare_command_allowed() {
        assert!(command_filter(vec![]).unwrap().is_empty());
        assert_eq!(
            command_filter(vec!["count".into()]).unwrap(),
            wire(&["COUNT"])
        );
    }

    #[test]
    fn config_get_folds_pairs() {
        let value = RespValue::Array(vec![
            RespValue::from("maxmemory"),
            RespValue::from("100mb"),
        ]);
        let reply = maybe_pairs(value, Protocol::Resp2).unwrap();
        assert_eq!(
            reply.get(b"maxmemory").and_then(|r| r.as_str()),
            Some("100mb")
        );
    }

    #[test]
    fn slowlog_entries_labeled() {
        let entry = RespValue::Array(vec![
            RespValue::Integer(14),
            RespValue::Integer(1_309_448_221),
            RespValue::Integer(15),
            RespValue::Array(vec![RespValue::from("ping")]),
            RespValue::from("127.0.0.1:58217"),
            RespValue::from("worker"),
        ]);
        let reply =
            slowlog_reply(RespValue::Array(vec![entry]), Protocol::Resp2).unwrap();
        let Reply::Array(entries) = reply else {
            panic!("expected array");
        };
        let entry = &entries[0];
        assert_eq!(entry.get(b"id").and_then(|r| r.as_int()), Some(14));
        assert_eq!(entry.get(b"duration").and_then(|r| r.as_int()), Some(15));
        assert_eq!(
            entry.get(b"client_name").and_then(|r| r.as_str()),
            Some("worker")
        );
    }

    #[test]
    fn slowlog_len_passes_through() {
        assert_eq!(
            slowlog_reply(RespValue::Integer(4), Protocol::Resp2).unwrap(),
            Reply::Int(4)
        );
    }

    #[test]
    fn slowlog_malformed_entry_is_protocol_error() {
        let bad = RespValue::Array(vec![RespValue::Array(vec![RespValue::Integer(1)])]);
        assert!(matches!(
            slowlog_reply(bad, Protocol::Resp2),
            Err(Error::Protocol(_))
        ));
    }
}
