//! String commands.

use bytes::Bytes;

use super::arg::{
    expand_options, flatten, next_arg, opt, push_flat, take_trailing_map, Opt, OptKind,
};
use super::reply::{bool_reply, double_reply, from_resp, identity, mismatch};
use super::{put, CmdArg, Reply, Table};
use crate::error::{Error, Result};
use crate::resp::{Protocol, RespValue};

/// SET's server-mandated keyword order. Expiry modifiers come first, then
/// the existence conditions, then GET.
const SET_OPTS: &[Opt] = &[
    opt("ex", "EX", OptKind::Value),
    opt("px", "PX", OptKind::Value),
    opt("exat", "EXAT", OptKind::Value),
    opt("pxat", "PXAT", OptKind::Value),
    opt("keepttl", "KEEPTTL", OptKind::Flag),
    opt("nx", "NX", OptKind::Flag),
    opt("xx", "XX", OptKind::Flag),
    opt("get", "GET", OptKind::Flag),
];

fn set_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut iter = args.into_iter();
    let key = next_arg(&mut iter, "key")?;
    let value = next_arg(&mut iter, "value")?;
    let mut out = Vec::with_capacity(8);
    push_flat(&mut out, key)?;
    push_flat(&mut out, value)?;
    if let Some(pairs) = options {
        expand_options(pairs, SET_OPTS, &mut out)?;
    }
    Ok(out)
}

/// SET acknowledges with +OK, declines an NX/XX condition with nil, and
/// hands back the previous value under GET. The first two normalize to a
/// boolean; the third passes through as bytes.
fn set_reply(value: RespValue, _proto: Protocol) -> Result<Reply> {
    match value {
        RespValue::SimpleString(s) if s == "OK" => Ok(Reply::Bool(true)),
        RespValue::Null => Ok(Reply::Bool(false)),
        RespValue::BulkString(b) => Ok(Reply::Bytes(b)),
        RespValue::Error(msg) | RespValue::BulkError(msg) => Err(Error::redis(msg)),
        other => Err(mismatch("SET-shaped", &other)),
    }
}

const GETEX_OPTS: &[Opt] = &[
    opt("ex", "EX", OptKind::Value),
    opt("px", "PX", OptKind::Value),
    opt("exat", "EXAT", OptKind::Value),
    opt("pxat", "PXAT", OptKind::Value),
    opt("persist", "PERSIST", OptKind::Flag),
];

fn getex_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut out = flatten(args)?;
    if let Some(pairs) = options {
        expand_options(pairs, GETEX_OPTS, &mut out)?;
    }
    Ok(out)
}

const LCS_OPTS: &[Opt] = &[
    opt("len", "LEN", OptKind::Flag),
    opt("idx", "IDX", OptKind::Flag),
    opt("minmatchlen", "MINMATCHLEN", OptKind::Value),
    opt("withmatchlen", "WITHMATCHLEN", OptKind::Flag),
];

fn lcs_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut out = flatten(args)?;
    if let Some(pairs) = options {
        expand_options(pairs, LCS_OPTS, &mut out)?;
    }
    Ok(out)
}

/// LCS answers a bulk string, a length, or (with IDX) a match-structure
/// map; RESP2 sends the map flat.
fn lcs_reply(value: RespValue, proto: Protocol) -> Result<Reply> {
    match value {
        RespValue::Array(_) | RespValue::Map(_) => super::reply::maybe_pairs(value, proto),
        other => from_resp(other),
    }
}

pub(super) fn register(table: &mut Table) {
    put(table, "APPEND", "APPEND", flatten, identity);
    put(table, "DECR", "DECR", flatten, identity);
    put(table, "DECRBY", "DECRBY", flatten, identity);
    put(table, "GET", "GET", flatten, identity);
    put(table, "GETDEL", "GETDEL", flatten, identity);
    put(table, "GETEX", "GETEX", getex_filter, identity);
    put(table, "GETRANGE", "GETRANGE", flatten, identity);
    put(table, "SUBSTR", "GETRANGE", flatten, identity);
    put(table, "GETSET", "GETSET", flatten, identity);
    put(table, "INCR", "INCR", flatten, identity);
    put(table, "INCRBY", "INCRBY", flatten, identity);
    put(table, "INCRBYFLOAT", "INCRBYFLOAT", flatten, double_reply);
    put(table, "LCS", "LCS", lcs_filter, lcs_reply);
    put(table, "MGET", "MGET", flatten, identity);
    put(table, "GETMULTIPLE", "MGET", flatten, identity);
    put(table, "MSET", "MSET", flatten, identity);
    put(table, "MSETNX", "MSETNX", flatten, bool_reply);
    put(table, "PSETEX", "PSETEX", flatten, identity);
    put(table, "SET", "SET", set_filter, set_reply);
    put(table, "SETEX", "SETEX", flatten, identity);
    put(table, "SETNX", "SETNX", flatten, bool_reply);
    put(table, "SETRANGE", "SETRANGE", flatten, identity);
    put(table, "STRLEN", "STRLEN", flatten, identity);
}
