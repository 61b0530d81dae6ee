//! Hash commands. HGETALL is the canonical shape-normalization case: flat
//! RESP2 pairs and native RESP3 maps both come back as an ordered map.

use bytes::Bytes;

use super::arg::{expand_options, flatten, opt, take_trailing_map, Opt, OptKind};
use super::reply::{bool_reply, double_reply, identity, maybe_scores, pairs_map};
use super::{put, CmdArg, Table};
use crate::error::Result;

/// HSCAN accepts the common cursor modifiers plus NOVALUES, which must
/// trail them.
const HSCAN_OPTS: &[Opt] = &[
    opt("match", "MATCH", OptKind::Value),
    opt("count", "COUNT", OptKind::Value),
    opt("novalues", "NOVALUES", OptKind::Flag),
];

fn hscan_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut out = flatten(args)?;
    if let Some(pairs) = options {
        expand_options(pairs, HSCAN_OPTS, &mut out)?;
    }
    Ok(out)
}

fn hrandfield_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut out = flatten(args)?;
    if let Some(pairs) = options {
        expand_options(
            pairs,
            &[opt("withvalues", "WITHVALUES", OptKind::Flag)],
            &mut out,
        )?;
    }
    Ok(out)
}

pub(super) fn register(table: &mut Table) {
    put(table, "HDEL", "HDEL", flatten, identity);
    put(table, "HEXISTS", "HEXISTS", flatten, bool_reply);
    put(table, "HGET", "HGET", flatten, identity);
    put(table, "HGETALL", "HGETALL", flatten, pairs_map);
    put(table, "HINCRBY", "HINCRBY", flatten, identity);
    put(table, "HINCRBYFLOAT", "HINCRBYFLOAT", flatten, double_reply);
    put(table, "HKEYS", "HKEYS", flatten, identity);
    put(table, "HLEN", "HLEN", flatten, identity);
    put(table, "HMGET", "HMGET", flatten, identity);
    put(table, "HMSET", "HMSET", flatten, identity);
    // RESP3 WITHVALUES nests field/value pairs; fold those, leave plain
    // field lists alone.
    put(table, "HRANDFIELD", "HRANDFIELD", hrandfield_filter, maybe_scores);
    put(table, "HSCAN", "HSCAN", hscan_filter, identity);
    put(table, "HSET", "HSET", flatten, identity);
    put(table, "HSETNX", "HSETNX", flatten, bool_reply);
    put(table, "HSTRLEN", "HSTRLEN", flatten, identity);
    put(table, "HVALS", "HVALS", flatten, identity);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Registry;
    use crate::resp::{Protocol, RespValue};

    fn wire(items: &[&str]) -> Vec<Bytes> {
        items
            .iter()
            .map(|s| Bytes::copy_from_slice(s.as_bytes()))
            .collect()
    }

    #[test]
    fn hset_folds_field_map() {
        let out = flatten(vec![
            "user:1".into(),
            CmdArg::map([("name", "Alice"), ("age", "30")]),
        ])
        .unwrap();
        assert_eq!(out, wire(&["user:1", "name", "Alice", "age", "30"]));
    }

    #[test]
    fn hgetall_same_shape_under_both_protocols() {
        let registry = Registry::new();

        let resp2 = RespValue::Array(vec![
            RespValue::from("name"),
            RespValue::from("Alice"),
            RespValue::from("age"),
            RespValue::from("30"),
        ]);
        let resp3 = RespValue::Map(vec![
            (RespValue::from("name"), RespValue::from("Alice")),
            (RespValue::from("age"), RespValue::from("30")),
        ]);

        let a = registry
            .parse_response("HGETALL", resp2, Protocol::Resp2)
            .unwrap();
        let b = registry
            .parse_response("HGETALL", resp3, Protocol::Resp3)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.get(b"age").and_then(|r| r.as_str()), Some("30"));
    }

    #[test]
    fn hscan_novalues_trails_modifiers() {
        let out = hscan_filter(vec![
            "h".into(),
            0i64.into(),
            CmdArg::map([
                ("novalues", CmdArg::Bool(true)),
                ("count", CmdArg::Int(10)),
                ("match", CmdArg::Str("f*".into())),
            ]),
        ])
        .unwrap();
        assert_eq!(
            out,
            wire(&["h", "0", "MATCH", "f*", "COUNT", "10", "NOVALUES"])
        );
    }

    #[test]
    fn hrandfield_withvalues() {
        let out = hrandfield_filter(vec![
            "h".into(),
            2i64.into(),
            CmdArg::map([("withvalues", true)]),
        ])
        .unwrap();
        assert_eq!(out, wire(&["h", "2", "WITHVALUES"]));
    }
}
