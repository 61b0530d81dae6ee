//! Transaction commands. The registry entries only cover the wire mapping;
//! the queue of deferred parsers lives in the client dispatcher.

use super::arg::flatten;
use super::reply::identity;
use super::{put, Table};

pub(super) fn register(table: &mut Table) {
    put(table, "DISCARD", "DISCARD", flatten, identity);
    put(table, "EXEC", "EXEC", flatten, identity);
    put(table, "MULTI", "MULTI", flatten, identity);
    put(table, "UNWATCH", "UNWATCH", flatten, identity);
    put(table, "WATCH", "WATCH", flatten, identity);
}
