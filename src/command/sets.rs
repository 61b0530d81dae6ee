//! Set commands.

use bytes::Bytes;

use super::arg::{
    expand_options, expect_seq, flatten, next_arg, opt, push_flat, push_int,
    take_trailing_map, OptKind,
};
use super::reply::{bool_reply, identity, member_array};
use super::{put, CmdArg, Table};
use crate::error::{Error, Result};

/// SINTERCARD/ZINTERCARD emission: numkeys keys… [LIMIT n].
pub(super) fn intercard_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut iter = args.into_iter();
    let keys = expect_seq(next_arg(&mut iter, "keys")?, "keys")?;
    if keys.is_empty() {
        return Err(Error::Type("keys must not be empty".into()));
    }
    let mut out = Vec::with_capacity(keys.len() + 3);
    push_int(&mut out, keys.len() as i64);
    for key in keys {
        push_flat(&mut out, key)?;
    }
    if let Some(pairs) = options {
        expand_options(pairs, &[opt("limit", "LIMIT", OptKind::Value)], &mut out)?;
    }
    Ok(out)
}

fn sscan_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
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
    put(table, "SADD", "SADD", flatten, identity);
    put(table, "SCARD", "SCARD", flatten, identity);
    put(table, "SDIFF", "SDIFF", flatten, member_array);
    put(table, "SDIFFSTORE", "SDIFFSTORE", flatten, identity);
    put(table, "SINTER", "SINTER", flatten, member_array);
    put(table, "SINTERCARD", "SINTERCARD", intercard_filter, identity);
    put(table, "SINTERSTORE", "SINTERSTORE", flatten, identity);
    put(table, "SISMEMBER", "SISMEMBER", flatten, bool_reply);
    put(table, "SMEMBERS", "SMEMBERS", flatten, member_array);
    put(table, "SMISMEMBER", "SMISMEMBER", flatten, identity);
    put(table, "SMOVE", "SMOVE", flatten, bool_reply);
    put(table, "SPOP", "SPOP", flatten, member_array);
    put(table, "SRANDMEMBER", "SRANDMEMBER", flatten, member_array);
    put(table, "SREM", "SREM", flatten, identity);
    put(table, "SSCAN", "SSCAN", sscan_filter, identity);
    put(table, "SUNION", "SUNION", flatten, member_array);
    put(table, "SUNIONSTORE", "SUNIONSTORE", flatten, identity);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Reply;
    use crate::resp::{Protocol, RespValue};

    fn wire(items: &[&str]) -> Vec<Bytes> {
        items
            .iter()
            .map(|s| Bytes::copy_from_slice(s.as_bytes()))
            .collect()
    }

    #[test]
    fn sintercard_with_limit() {
        let out = intercard_filter(vec![
            CmdArg::seq(["s1", "s2"]),
            CmdArg::map([("limit", CmdArg::Int(10))]),
        ])
        .unwrap();
        assert_eq!(out, wire(&["2", "s1", "s2", "LIMIT", "10"]));
    }

    #[test]
    fn sintercard_without_limit() {
        let out = intercard_filter(vec![CmdArg::seq(["s1", "s2", "s3"])]).unwrap();
        assert_eq!(out, wire(&["3", "s1", "s2", "s3"]));
    }

    #[test]
    fn smembers_normalizes_resp3_set() {
        let value = RespValue::Set(vec![RespValue::from("a"), RespValue::from("b")]);
        let reply = member_array(value, Protocol::Resp3).unwrap();
        assert!(matches!(reply, Reply::Array(ref items) if items.len() == 2));
    }

    #[test]
    fn spop_single_passes_bulk_through() {
        let reply = member_array(RespValue::from("winner"), Protocol::Resp2).unwrap();
        assert_eq!(reply, Reply::Bytes(Bytes::from_static(b"winner")));
    }

    #[test]
    fn sadd_variadic_flattening() {
        let nested = flatten(vec!["s".into(), CmdArg::seq(["a", "b"])]).unwrap();
        let flat = flatten(vec!["s".into(), "a".into(), "b".into()]).unwrap();
        assert_eq!(nested, flat);
    }
}
