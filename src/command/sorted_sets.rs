//! Sorted-set commands.
//!
//! The wire wants `score member` pairs while callers naturally hold
//! `member → score` maps, so the ZADD filter reverses each pair. Replies
//! carrying member/score data normalize to a map under both protocols;
//! the wire's score representation (strings under RESP2, doubles under
//! RESP3) is kept as delivered.

use bytes::Bytes;

use super::arg::{
    expand_options, expect_seq, flatten, next_arg, opt, push_flat, push_int,
    take_trailing_map, Opt, OptKind,
};
use super::lists::mpop_filter;
use super::reply::{double_reply, identity, maybe_scores, scores_map};
use super::sets::intercard_filter;
use super::{put, CmdArg, Table};
use crate::error::{Error, Result};

const ZADD_FLAGS: &[Opt] = &[
    opt("nx", "NX", OptKind::Flag),
    opt("xx", "XX", OptKind::Flag),
    opt("gt", "GT", OptKind::Flag),
    opt("lt", "LT", OptKind::Flag),
    opt("ch", "CH", OptKind::Flag),
    opt("incr", "INCR", OptKind::Flag),
];

/// ZADD key [flags] score member […] — flags may arrive as a map right
/// after the key, and member→score maps are reversed into the wire's
/// score-first order.
fn zadd_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let mut iter = args.into_iter().peekable();
    let mut out = Vec::with_capacity(8);
    let key = iter
        .next()
        .ok_or_else(|| Error::Type("missing required argument: key".into()))?;
    push_flat(&mut out, key)?;
    if matches!(iter.peek(), Some(CmdArg::Map(pairs)) if is_flag_map(pairs)) {
        let Some(CmdArg::Map(pairs)) = iter.next() else {
            unreachable!()
        };
        expand_options(pairs, ZADD_FLAGS, &mut out)?;
    }
    for arg in iter {
        match arg {
            CmdArg::Map(pairs) => {
                for (member, score) in pairs {
                    push_flat(&mut out, score)?;
                    out.push(Bytes::from(member.into_bytes()));
                }
            }
            other => push_flat(&mut out, other)?,
        }
    }
    Ok(out)
}

fn is_flag_map(pairs: &[(String, CmdArg)]) -> bool {
    pairs.iter().all(|(k, _)| {
        ZADD_FLAGS
            .iter()
            .any(|flag| k.eq_ignore_ascii_case(flag.key))
    })
}

const ZRANGE_OPTS: &[Opt] = &[
    opt("byscore", "BYSCORE", OptKind::Flag),
    opt("bylex", "BYLEX", OptKind::Flag),
    opt("rev", "REV", OptKind::Flag),
    opt("limit", "LIMIT", OptKind::Value),
    opt("withscores", "WITHSCORES", OptKind::Flag),
];

fn zrange_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut out = flatten(args)?;
    if let Some(pairs) = options {
        expand_options(pairs, ZRANGE_OPTS, &mut out)?;
    }
    Ok(out)
}

/// ZRANGESTORE takes the same clause tail minus WITHSCORES.
fn zrangestore_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut out = flatten(args)?;
    if let Some(pairs) = options {
        expand_options(pairs, &ZRANGE_OPTS[..4], &mut out)?;
    }
    Ok(out)
}

const ZSETOP_OPTS: &[Opt] = &[
    opt("weights", "WEIGHTS", OptKind::Value),
    opt("aggregate", "AGGREGATE", OptKind::Value),
    opt("withscores", "WITHSCORES", OptKind::Flag),
];

/// ZDIFF/ZINTER/ZUNION: numkeys keys… [WEIGHTS…] [AGGREGATE…] [WITHSCORES].
fn zsetop_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut iter = args.into_iter();
    let keys = expect_seq(next_arg(&mut iter, "keys")?, "keys")?;
    let mut out = Vec::with_capacity(keys.len() + 4);
    push_int(&mut out, keys.len() as i64);
    for key in keys {
        push_flat(&mut out, key)?;
    }
    if let Some(pairs) = options {
        expand_options(pairs, ZSETOP_OPTS, &mut out)?;
    }
    Ok(out)
}

/// Store variants lead with the destination key.
fn zsetopstore_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut iter = args.into_iter();
    let dest = next_arg(&mut iter, "destination")?;
    let keys = expect_seq(next_arg(&mut iter, "keys")?, "keys")?;
    let mut out = Vec::with_capacity(keys.len() + 5);
    push_flat(&mut out, dest)?;
    push_int(&mut out, keys.len() as i64);
    for key in keys {
        push_flat(&mut out, key)?;
    }
    if let Some(pairs) = options {
        expand_options(pairs, &ZSETOP_OPTS[..2], &mut out)?;
    }
    Ok(out)
}

fn zmpop_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    mpop_filter(args, &["MIN", "MAX"], false)
}

fn bzmpop_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    mpop_filter(args, &["MIN", "MAX"], true)
}

fn zrandmember_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut out = flatten(args)?;
    if let Some(pairs) = options {
        expand_options(
            pairs,
            &[opt("withscores", "WITHSCORES", OptKind::Flag)],
            &mut out,
        )?;
    }
    Ok(out)
}

const BYSCORE_OPTS: &[Opt] = &[
    opt("withscores", "WITHSCORES", OptKind::Flag),
    opt("limit", "LIMIT", OptKind::Value),
];

fn zrangebyscore_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut out = flatten(args)?;
    if let Some(pairs) = options {
        expand_options(pairs, BYSCORE_OPTS, &mut out)?;
    }
    Ok(out)
}

fn zrangebylex_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut out = flatten(args)?;
    if let Some(pairs) = options {
        expand_options(pairs, &[opt("limit", "LIMIT", OptKind::Value)], &mut out)?;
    }
    Ok(out)
}

fn zscan_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut out = flatten(args)?;
    if let Some(pairs) = options {
        expand_options(
            pairs,
            &[
                opt("match", "MATCH", OptKind::Value),
                opt("count", "COUNT", OptKind::Value),
            ],
            &mut out,
        )?;
    }
    Ok(out)
}

pub(super) fn register(table: &mut Table) {
    put(table, "BZMPOP", "BZMPOP", bzmpop_filter, identity);
    put(table, "BZPOPMAX", "BZPOPMAX", flatten, identity);
    put(table, "BZPOPMIN", "BZPOPMIN", flatten, identity);
    put(table, "ZADD", "ZADD", zadd_filter, identity);
    put(table, "ZCARD", "ZCARD", flatten, identity);
    put(table, "ZCOUNT", "ZCOUNT", flatten, identity);
    put(table, "ZDIFF", "ZDIFF", zsetop_filter, maybe_scores);
    put(table, "ZDIFFSTORE", "ZDIFFSTORE", zsetopstore_filter, identity);
    put(table, "ZINCRBY", "ZINCRBY", flatten, double_reply);
    put(table, "ZINTER", "ZINTER", zsetop_filter, maybe_scores);
    put(table, "ZINTERCARD", "ZINTERCARD", intercard_filter, identity);
    put(table, "ZINTERSTORE", "ZINTERSTORE", zsetopstore_filter, identity);
    put(table, "ZLEXCOUNT", "ZLEXCOUNT", flatten, identity);
    put(table, "ZMPOP", "ZMPOP", zmpop_filter, identity);
    put(table, "ZMSCORE", "ZMSCORE", flatten, identity);
    put(table, "ZPOPMAX", "ZPOPMAX", flatten, scores_map);
    put(table, "ZPOPMIN", "ZPOPMIN", flatten, scores_map);
    put(table, "ZRANDMEMBER", "ZRANDMEMBER", zrandmember_filter, maybe_scores);
    put(table, "ZRANGE", "ZRANGE", zrange_filter, maybe_scores);
    put(table, "ZRANGEBYLEX", "ZRANGEBYLEX", zrangebylex_filter, identity);
    put(table, "ZRANGEBYSCORE", "ZRANGEBYSCORE", zrangebyscore_filter, maybe_scores);
    put(table, "ZRANGESTORE", "ZRANGESTORE", zrangestore_filter, identity);
    put(table, "ZRANK", "ZRANK", flatten, identity);
    put(table, "ZREM", "ZREM", flatten, identity);
    put(table, "ZREMRANGEBYLEX", "ZREMRANGEBYLEX", flatten, identity);
    put(table, "ZREMRANGEBYRANK", "ZREMRANGEBYRANK", flatten, identity);
    put(table, "ZREMRANGEBYSCORE", "ZREMRANGEBYSCORE", flatten, identity);
    put(table, "ZREVRANGE", "ZREVRANGE", zrandmember_filter, maybe_scores);
    put(table, "ZREVRANGEBYLEX", "ZREVRANGEBYLEX", zrangebylex_filter, identity);
    put(table, "ZREVRANGEBYSCORE", "ZREVRANGEBYSCORE", zrangebyscore_filter, maybe_scores);
    put(table, "ZREVRANK", "ZREVRANK", flatten, identity);
    put(table, "ZSCAN", "ZSCAN", zscan_filter, identity);
    put(table, "ZSCORE", "ZSCORE", flatten, double_reply);
    put(table, "ZUNION", "ZUNION", zsetop_filter, maybe_scores);
    put(table, "ZUNIONSTORE", "ZUNIONSTORE", zsetopstore_filter, identity);
}
