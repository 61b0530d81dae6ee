//! Generic key-space commands.

use bytes::Bytes;

use super::arg::{
    expand_options, flatten, next_arg, opt, push_flat, push_str, subcommand,
    take_trailing_map, Opt, OptKind,
};
use super::reply::{bool_reply, identity};
use super::{put, CmdArg, Table};
use crate::error::Result;

const OBJECT_SUBS: &[&str] = &["ENCODING", "FREQ", "HELP", "IDLETIME", "REFCOUNT"];

fn object_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    subcommand(OBJECT_SUBS, args)
}

const COPY_OPTS: &[Opt] = &[
    opt("db", "DB", OptKind::Value),
    opt("replace", "REPLACE", OptKind::Flag),
];

fn copy_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut out = flatten(args)?;
    if let Some(pairs) = options {
        expand_options(pairs, COPY_OPTS, &mut out)?;
    }
    Ok(out)
}

/// EXPIRE-family condition flags (Redis 7).
const EXPIRE_OPTS: &[Opt] = &[
    opt("nx", "NX", OptKind::Flag),
    opt("xx", "XX", OptKind::Flag),
    opt("gt", "GT", OptKind::Flag),
    opt("lt", "LT", OptKind::Flag),
];

fn expire_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut out = flatten(args)?;
    if let Some(pairs) = options {
        expand_options(pairs, EXPIRE_OPTS, &mut out)?;
    }
    Ok(out)
}

const RESTORE_OPTS: &[Opt] = &[
    opt("replace", "REPLACE", OptKind::Flag),
    opt("absttl", "ABSTTL", OptKind::Flag),
    opt("idletime", "IDLETIME", OptKind::Value),
    opt("freq", "FREQ", OptKind::Value),
];

fn restore_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut out = flatten(args)?;
    if let Some(pairs) = options {
        expand_options(pairs, RESTORE_OPTS, &mut out)?;
    }
    Ok(out)
}

/// SCAN: cursor plus the MATCH/COUNT/TYPE modifiers in that order.
pub(super) const SCAN_OPTS: &[Opt] = &[
    opt("match", "MATCH", OptKind::Value),
    opt("count", "COUNT", OptKind::Value),
    opt("type", "TYPE", OptKind::Value),
];

pub(super) fn scan_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut out = flatten(args)?;
    if let Some(pairs) = options {
        expand_options(pairs, SCAN_OPTS, &mut out)?;
    }
    Ok(out)
}

/// SORT's clause order is fixed: BY, LIMIT, GET (repeatable), ASC|DESC,
/// ALPHA, STORE. GET expands once per pattern, so it cannot go through
/// the generic option table.
fn sort_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut iter = args.into_iter();
    let key = next_arg(&mut iter, "key")?;
    let mut out = Vec::with_capacity(8);
    push_flat(&mut out, key)?;
    for extra in iter {
        push_flat(&mut out, extra)?;
    }
    let Some(mut pairs) = options else {
        return Ok(out);
    };

    let mut take = |name: &str| -> Option<CmdArg> {
        pairs
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|idx| pairs.remove(idx).1)
    };

    if let Some(by) = take("by") {
        push_str(&mut out, "BY");
        push_flat(&mut out, by)?;
    }
    if let Some(limit) = take("limit") {
        push_str(&mut out, "LIMIT");
        push_flat(&mut out, limit)?;
    }
    if let Some(get) = take("get") {
        match get {
            CmdArg::Seq(patterns) => {
                for pattern in patterns {
                    push_str(&mut out, "GET");
                    push_flat(&mut out, pattern)?;
                }
            }
            single => {
                push_str(&mut out, "GET");
                push_flat(&mut out, single)?;
            }
        }
    }
    if take("asc").is_some_and(|v| v.is_truthy()) {
        push_str(&mut out, "ASC");
    }
    if take("desc").is_some_and(|v| v.is_truthy()) {
        push_str(&mut out, "DESC");
    }
    if take("alpha").is_some_and(|v| v.is_truthy()) {
        push_str(&mut out, "ALPHA");
    }
    if let Some(dest) = take("store") {
        push_str(&mut out, "STORE");
        push_flat(&mut out, dest)?;
    }
    Ok(out)
}

pub(super) fn register(table: &mut Table) {
    put(table, "COPY", "COPY", copy_filter, bool_reply);
    put(table, "DEL", "DEL", flatten, identity);
    put(table, "DELETE", "DEL", flatten, identity);
    put(table, "DUMP", "DUMP", flatten, identity);
    put(table, "EXISTS", "EXISTS", flatten, identity);
    put(table, "EXPIRE", "EXPIRE", expire_filter, bool_reply);
    put(table, "SETTIMEOUT", "EXPIRE", expire_filter, bool_reply);
    put(table, "EXPIREAT", "EXPIREAT", expire_filter, bool_reply);
    put(table, "EXPIRETIME", "EXPIRETIME", flatten, identity);
    put(table, "KEYS", "KEYS", flatten, identity);
    put(table, "MOVE", "MOVE", flatten, bool_reply);
    put(table, "OBJECT", "OBJECT", object_filter, identity);
    put(table, "PERSIST", "PERSIST", flatten, bool_reply);
    put(table, "PEXPIRE", "PEXPIRE", expire_filter, bool_reply);
    put(table, "PEXPIREAT", "PEXPIREAT", expire_filter, bool_reply);
    put(table, "PEXPIRETIME", "PEXPIRETIME", flatten, identity);
    put(table, "PTTL", "PTTL", flatten, identity);
    put(table, "RANDOMKEY", "RANDOMKEY", flatten, identity);
    put(table, "RENAME", "RENAME", flatten, identity);
    put(table, "RENAMENX", "RENAMENX", flatten, bool_reply);
    put(table, "RESTORE", "RESTORE", restore_filter, identity);
    put(table, "SCAN", "SCAN", scan_filter, identity);
    put(table, "SORT", "SORT", sort_filter, identity);
    put(table, "SORT_RO", "SORT_RO", sort_filter, identity);
    put(table, "TOUCH", "TOUCH", flatten, identity);
    put(table, "TTL", "TTL", flatten, identity);
    put(table, "TYPE", "TYPE", flatten, identity);
    put(table, "UNLINK", "UNLINK", flatten, identity);
    put(table, "WAIT", "WAIT", flatten, identity);
}
