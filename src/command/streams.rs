//! Stream commands.
//!
//! XREAD and XREADGROUP take parallel keys/ids lists; a length mismatch
//! is caught client-side because the server's own complaint for it is
//! famously unhelpful.

use bytes::Bytes;

use super::arg::{
    expand_options, expect_seq, flatten, next_arg, opt, push_flat, push_str, subcommand,
    take_trailing_map, Opt, OptKind,
};
use super::reply::{identity, maybe_pairs};
use super::{put, CmdArg, Table};
use crate::error::{Error, Result};

const XADD_OPTS: &[Opt] = &[
    opt("nomkstream", "NOMKSTREAM", OptKind::Flag),
    opt("maxlen", "MAXLEN", OptKind::Value),
    opt("minid", "MINID", OptKind::Value),
    opt("limit", "LIMIT", OptKind::Value),
];

/// XADD key [NOMKSTREAM] [MAXLEN|MINID [~] n [LIMIT m]] id field value […]
/// — the trim clause sits between the key and the entry id, so the options
/// map rides second. An approximate trim passes `maxlen: ["~", n]`.
fn xadd_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let mut iter = args.into_iter().peekable();
    let mut out = Vec::with_capacity(8);
    let key = iter
        .next()
        .ok_or_else(|| Error::Type("missing required argument: key".into()))?;
    push_flat(&mut out, key)?;
    if matches!(iter.peek(), Some(CmdArg::Map(_))) {
        let Some(CmdArg::Map(pairs)) = iter.next() else {
            unreachable!()
        };
        expand_options(pairs, XADD_OPTS, &mut out)?;
    }
    let id = iter
        .next()
        .ok_or_else(|| Error::Type("missing required argument: id".into()))?;
    push_flat(&mut out, id)?;
    let mut wrote_fields = false;
    for arg in iter {
        wrote_fields = true;
        push_flat(&mut out, arg)?;
    }
    if !wrote_fields {
        return Err(Error::Type("missing required argument: fields".into()));
    }
    Ok(out)
}

const XTRIM_OPTS: &[Opt] = &[
    opt("maxlen", "MAXLEN", OptKind::Value),
    opt("minid", "MINID", OptKind::Value),
    opt("limit", "LIMIT", OptKind::Value),
];

fn xtrim_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut out = flatten(args)?;
    if let Some(pairs) = options {
        expand_options(pairs, XTRIM_OPTS, &mut out)?;
    }
    Ok(out)
}

/// Emit the parallel STREAMS tail shared by XREAD/XREADGROUP.
fn push_streams(out: &mut Vec<Bytes>, keys: CmdArg, ids: CmdArg) -> Result<()> {
    let keys = expect_seq(keys, "keys")?;
    let ids = expect_seq(ids, "ids")?;
    if keys.is_empty() {
        return Err(Error::Type("keys must not be empty".into()));
    }
    if keys.len() != ids.len() {
        return Err(Error::Type(format!(
            "keys and ids must pair up: {} keys, {} ids",
            keys.len(),
            ids.len()
        )));
    }
    push_str(out, "STREAMS");
    for key in keys {
        push_flat(out, key)?;
    }
    for id in ids {
        push_flat(out, id)?;
    }
    Ok(())
}

/// XREAD [COUNT n] [BLOCK ms] STREAMS key… id…
fn xread_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut iter = args.into_iter();
    let keys = next_arg(&mut iter, "keys")?;
    let ids = next_arg(&mut iter, "ids")?;
    let mut out = Vec::with_capacity(8);
    if let Some(pairs) = options {
        expand_options(
            pairs,
            &[
                opt("count", "COUNT", OptKind::Value),
                opt("block", "BLOCK", OptKind::Value),
            ],
            &mut out,
        )?;
    }
    push_streams(&mut out, keys, ids)?;
    Ok(out)
}

/// XREADGROUP GROUP g c [COUNT n] [BLOCK ms] [NOACK] STREAMS key… id…
fn xreadgroup_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut iter = args.into_iter();
    let group = next_arg(&mut iter, "group")?;
    let consumer = next_arg(&mut iter, "consumer")?;
    let keys = next_arg(&mut iter, "keys")?;
    let ids = next_arg(&mut iter, "ids")?;
    let mut out = Vec::with_capacity(10);
    push_str(&mut out, "GROUP");
    push_flat(&mut out, group)?;
    push_flat(&mut out, consumer)?;
    if let Some(pairs) = options {
        expand_options(
            pairs,
            &[
                opt("count", "COUNT", OptKind::Value),
                opt("block", "BLOCK", OptKind::Value),
                opt("noack", "NOACK", OptKind::Flag),
            ],
            &mut out,
        )?;
    }
    push_streams(&mut out, keys, ids)?;
    Ok(out)
}

const XAUTOCLAIM_OPTS: &[Opt] = &[
    opt("count", "COUNT", OptKind::Value),
    opt("justid", "JUSTID", OptKind::Flag),
];

fn xautoclaim_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut out = flatten(args)?;
    if let Some(pairs) = options {
        expand_options(pairs, XAUTOCLAIM_OPTS, &mut out)?;
    }
    Ok(out)
}

const XGROUP_SUBS: &[&str] = &["CREATE", "CREATECONSUMER", "DELCONSUMER", "DESTROY", "SETID"];
const XINFO_SUBS: &[&str] = &["CONSUMERS", "GROUPS", "STREAM"];

fn xgroup_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    subcommand(XGROUP_SUBS, args)
}

fn xinfo_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    subcommand(XINFO_SUBS, args)
}

pub(super) fn register(table: &mut Table) {
    put(table, "XACK", "XACK", flatten, identity);
    put(table, "XADD", "XADD", xadd_filter, identity);
    put(table, "XAUTOCLAIM", "XAUTOCLAIM", xautoclaim_filter, identity);
    put(table, "XDEL", "XDEL", flatten, identity);
    put(table, "XGROUP", "XGROUP", xgroup_filter, identity);
    // XINFO STREAM answers flat field/value pairs under RESP2.
    put(table, "XINFO", "XINFO", xinfo_filter, maybe_pairs);
    put(table, "XLEN", "XLEN", flatten, identity);
    put(table, "XPENDING", "XPENDING", flatten, identity);
    put(table, "XRANGE", "XRANGE", flatten, identity);
    put(table, "XREAD", "XREAD", xread_filter, identity);
    put(table, "XREADGROUP", "XREADGROUP", xreadgroup_filter, identity);
    put(table, "XREVRANGE", "XREVRANGE", flatten, identity);
    put(table, "XTRIM", "XTRIM", xtrim_filter, identity);
}
