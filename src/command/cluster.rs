//! CLUSTER container command — argument mapping only; slot routing is a
//! concern for a cluster-aware client built on top.

use bytes::Bytes;

use super::arg::subcommand;
use super::reply::identity;
use super::{put, CmdArg, Table};
use crate::error::Result;

const CLUSTER_SUBS: &[&str] = &[
    "ADDSLOTS", "ADDSLOTSRANGE", "BUMPEPOCH", "COUNTKEYSINSLOT", "DELSLOTS",
    "DELSLOTSRANGE", "FAILOVER", "FORGET", "GETKEYSINSLOT", "INFO", "KEYSLOT",
    "LINKS", "MEET", "MYID", "NODES", "REPLICAS", "RESET", "SETSLOT", "SHARDS",
    "SLAVES", "SLOTS",
];

fn cluster_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    subcommand(CLUSTER_SUBS, args)
}

pub(super) fn register(table: &mut Table) {
    put(table, "CLUSTER", "CLUSTER", cluster_filter, identity);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addslotsrange_flattens_ranges() {
        let out = cluster_filter(vec![
            "addslotsrange".into(),
            CmdArg::seq([0i64, 5460i64]),
        ])
        .unwrap();
        assert_eq!(
            out,
            vec![
                Bytes::from_static(b"ADDSLOTSRANGE"),
                Bytes::from_static(b"0"),
                Bytes::from_static(b"5460"),
            ]
        );
    }

    #[test]
    fn unknown_subcommand_rejected() {
        assert!(cluster_filter(vec!["reroute".into()]).is_err());
    }
}
