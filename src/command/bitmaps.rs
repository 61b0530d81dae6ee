//! Bitmap commands. All positional; the BITFIELD sub-operation list is
//! flattened as the caller supplies it.

use super::arg::flatten;
use super::reply::identity;
use super::{put, Table};

pub(super) fn register(table: &mut Table) {
    put(table, "BITCOUNT", "BITCOUNT", flatten, identity);
    put(table, "BITFIELD", "BITFIELD", flatten, identity);
    put(table, "BITFIELD_RO", "BITFIELD_RO", flatten, identity);
    put(table, "BITOP", "BITOP", flatten, identity);
    put(table, "BITPOS", "BITPOS", flatten, identity);
    put(table, "GETBIT", "GETBIT", flatten, identity);
    put(table, "SETBIT", "SETBIT", flatten, identity);
}
