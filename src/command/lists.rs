//! List commands. The MOVE/INSERT/MPOP filters validate their direction
//! keywords client-side so a typo fails before touching the wire.

use bytes::Bytes;

use super::arg::{
    expand_options, expect_seq, flatten, kind_name, next_arg, opt, push_flat, push_int,
    push_str, take_trailing_map, Opt, OptKind,
};
use super::reply::identity;
use super::{put, CmdArg, Table};
use crate::error::{Error, Result};

/// Validate and uppercase a positional keyword (LEFT|RIGHT, BEFORE|AFTER).
fn keyword(arg: CmdArg, allowed: &[&'static str], what: &str) -> Result<&'static str> {
    let Some(word) = arg.as_keyword() else {
        return Err(Error::Type(format!(
            "{what} must be a string, got {}",
            kind_name(&arg)
        )));
    };
    let upper = word.to_ascii_uppercase();
    allowed
        .iter()
        .find(|k| **k == upper)
        .copied()
        .ok_or_else(|| Error::Type(format!("{what} must be one of {allowed:?}, got {word}")))
}

/// LMOVE src dst LEFT|RIGHT LEFT|RIGHT (BLMOVE adds a trailing timeout).
fn lmove_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let mut iter = args.into_iter();
    let mut out = Vec::with_capacity(5);
    push_flat(&mut out, next_arg(&mut iter, "source")?)?;
    push_flat(&mut out, next_arg(&mut iter, "destination")?)?;
    let from = keyword(next_arg(&mut iter, "wherefrom")?, &["LEFT", "RIGHT"], "wherefrom")?;
    let to = keyword(next_arg(&mut iter, "whereto")?, &["LEFT", "RIGHT"], "whereto")?;
    push_str(&mut out, from);
    push_str(&mut out, to);
    for rest in iter {
        push_flat(&mut out, rest)?;
    }
    Ok(out)
}

fn linsert_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let mut iter = args.into_iter();
    let mut out = Vec::with_capacity(4);
    push_flat(&mut out, next_arg(&mut iter, "key")?)?;
    let place = keyword(next_arg(&mut iter, "where")?, &["BEFORE", "AFTER"], "where")?;
    push_str(&mut out, place);
    push_flat(&mut out, next_arg(&mut iter, "pivot")?)?;
    push_flat(&mut out, next_arg(&mut iter, "element")?)?;
    Ok(out)
}

/// Shared LMPOP/ZMPOP emission: numkeys keys… DIRECTION [COUNT n], with an
/// optional leading timeout for the blocking variants.
pub(super) fn mpop_filter(
    args: Vec<CmdArg>,
    directions: &[&'static str],
    blocking: bool,
) -> Result<Vec<Bytes>> {
    let mut args = args;
    let options = take_trailing_map(&mut args);
    let mut iter = args.into_iter();
    let mut out = Vec::with_capacity(6);
    if blocking {
        push_flat(&mut out, next_arg(&mut iter, "timeout")?)?;
    }
    let keys = expect_seq(next_arg(&mut iter, "keys")?, "keys")?;
    if keys.is_empty() {
        return Err(Error::Type("keys must not be empty".into()));
    }
    push_int(&mut out, keys.len() as i64);
    for key in keys {
        push_flat(&mut out, key)?;
    }
    let dir = keyword(next_arg(&mut iter, "direction")?, directions, "direction")?;
    push_str(&mut out, dir);
    if let Some(pairs) = options {
        expand_options(pairs, &[opt("count", "COUNT", OptKind::Value)], &mut out)?;
    }
    Ok(out)
}

fn lmpop_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    mpop_filter(args, &["LEFT", "RIGHT"], false)
}

fn blmpop_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    mpop_filter(args, &["LEFT", "RIGHT"], true)
}

const LPOS_OPTS: &[Opt] = &[
    opt("rank", "RANK", OptKind::Value),
    opt("count", "COUNT", OptKind::Value),
    opt("maxlen", "MAXLEN", OptKind::Value),
];

fn lpos_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut out = flatten(args)?;
    if let Some(pairs) = options {
        expand_options(pairs, LPOS_OPTS, &mut out)?;
    }
    Ok(out)
}

pub(super) fn register(table: &mut Table) {
    put(table, "BLMOVE", "BLMOVE", lmove_filter, identity);
    put(table, "BLMPOP", "BLMPOP", blmpop_filter, identity);
    put(table, "BLPOP", "BLPOP", flatten, identity);
    put(table, "BRPOP", "BRPOP", flatten, identity);
    put(table, "BRPOPLPUSH", "BRPOPLPUSH", flatten, identity);
    put(table, "LINDEX", "LINDEX", flatten, identity);
    put(table, "LINSERT", "LINSERT", linsert_filter, identity);
    put(table, "LLEN", "LLEN", flatten, identity);
    put(table, "LMOVE", "LMOVE", lmove_filter, identity);
    put(table, "LMPOP", "LMPOP", lmpop_filter, identity);
    put(table, "LPOP", "LPOP", flatten, identity);
    put(table, "LPOS", "LPOS", lpos_filter, identity);
    put(table, "LPUSH", "LPUSH", flatten, identity);
    put(table, "LPUSHX", "LPUSHX", flatten, identity);
    put(table, "LRANGE", "LRANGE", flatten, identity);
    put(table, "LREM", "LREM", flatten, identity);
    put(table, "LSET", "LSET", flatten, identity);
    put(table, "LTRIM", "LTRIM", flatten, identity);
    put(table, "RPOP", "RPOP", flatten, identity);
    put(table, "RPOPLPUSH", "RPOPLPUSH", flatten, identity);
    put(table, "RPUSH", "RPUSH", flatten, identity);
    put(table, "RPUSHX", "RPUSHX", flatten, identity);
}
