//! HyperLogLog commands.

use super::arg::flatten;
use super::reply::{bool_reply, identity};
use super::{put, Table};

pub(super) fn register(table: &mut Table) {
    put(table, "PFADD", "PFADD", flatten, bool_reply);
    put(table, "PFCOUNT", "PFCOUNT", flatten, identity);
    put(table, "PFMERGE", "PFMERGE", flatten, identity);
}

#[cfg(test)]
mod tests {
    use super::super::{CmdArg, Reply};
    use super::*;
    use crate::resp::{Protocol, RespValue};
    use bytes::Bytes;

    #[test]
    fn pfadd_reports_register_change_as_bool() {
        let reply = bool_reply(RespValue::Integer(1), Protocol::Resp2).unwrap();
        assert_eq!(reply, Reply::Bool(true));
    }

    #[test]
    fn pfcount_variadic() {
        let out = flatten(vec![CmdArg::seq(["hll1", "hll2"])]).unwrap();
        assert_eq!(out, vec![Bytes::from_static(b"hll1"), Bytes::from_static(b"hll2")]);
    }
}
