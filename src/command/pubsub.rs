//! Pub/sub commands: argument mapping and reply normalization only. The
//! push-message event loop lives above this layer.

use bytes::Bytes;

use super::arg::{flatten, subcommand};
use super::reply::{from_resp, identity, pairs_map};
use super::{put, CmdArg, Reply, Table};
use crate::error::Result;
use crate::resp::{Protocol, RespValue};

const PUBSUB_SUBS: &[&str] = &["CHANNELS", "NUMPAT", "NUMSUB", "SHARDCHANNELS", "SHARDNUMSUB"];

fn pubsub_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    subcommand(PUBSUB_SUBS, args)
}

/// NUMSUB/SHARDNUMSUB answer channel/count pairs — flat under RESP2, a
/// native map under RESP3. The other subcommands answer plain lists or a
/// single integer, recognizable by the absence of integers at the value
/// positions, and pass through untouched.
fn pubsub_reply(value: RespValue, proto: Protocol) -> Result<Reply> {
    let countish = match &value {
        RespValue::Array(items) => {
            !items.is_empty()
                && items.len() % 2 == 0
                && items
                    .iter()
                    .skip(1)
                    .step_by(2)
                    .all(|v| matches!(v, RespValue::Integer(_)))
                && items.iter().step_by(2).all(|k| k.as_bytes().is_some())
        }
        RespValue::Map(_) => true,
        _ => false,
    };
    if countish {
        pairs_map(value, proto)
    } else {
        from_resp(value)
    }
}

pub(super) fn register(table: &mut Table) {
    put(table, "PSUBSCRIBE", "PSUBSCRIBE", flatten, identity);
    put(table, "PUBLISH", "PUBLISH", flatten, identity);
    put(table, "PUBSUB", "PUBSUB", pubsub_filter, pubsub_reply);
    put(table, "PUNSUBSCRIBE", "PUNSUBSCRIBE", flatten, identity);
    put(table, "SPUBLISH", "SPUBLISH", flatten, identity);
    put(table, "SUBSCRIBE", "SUBSCRIBE", flatten, identity);
    put(table, "UNSUBSCRIBE", "UNSUBSCRIBE", flatten, identity);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numsub_pairs_fold() {
        let value = RespValue::Array(vec![
            RespValue::from("news"),
            RespValue::Integer(3),
            RespValue::from("chat"),
            RespValue::Integer(1),
        ]);
        let reply = pubsub_reply(value, Protocol::Resp2).unwrap();
        assert_eq!(reply.get(b"news").and_then(|r| r.as_int()), Some(3));
    }

    #[test]
    fn channels_list_stays_flat() {
        // Two channels — even length, but no integer values to fold on.
        let value = RespValue::Array(vec![RespValue::from("news"), RespValue::from("chat")]);
        let reply = pubsub_reply(value, Protocol::Resp2).unwrap();
        assert!(matches!(reply, Reply::Array(ref items) if items.len() == 2));
    }

    #[test]
    fn numpat_integer_passes_through() {
        let reply = pubsub_reply(RespValue::Integer(7), Protocol::Resp2).unwrap();
        assert_eq!(reply, Reply::Int(7));
    }

    #[test]
    fn subscribe_maps_channels_only() {
        let out = flatten(vec![CmdArg::seq(["ch1", "ch2"])]).unwrap();
        assert_eq!(
            out,
            vec![Bytes::from_static(b"ch1"), Bytes::from_static(b"ch2")]
        );
    }
}
