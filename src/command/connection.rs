//! Connection-management commands.

use super::arg::{flatten, subcommand};
use super::reply::{identity, maybe_pairs};
use super::{put, CmdArg, Table};
use crate::error::Result;

use bytes::Bytes;

const CLIENT_SUBS: &[&str] = &[
    "GETNAME", "ID", "INFO", "KILL", "LIST", "NO-EVICT", "NO-TOUCH", "PAUSE",
    "REPLY", "SETINFO", "SETNAME", "UNPAUSE",
];

fn client_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    subcommand(CLIENT_SUBS, args)
}

pub(super) fn register(table: &mut Table) {
    put(table, "AUTH", "AUTH", flatten, identity);
    put(table, "CLIENT", "CLIENT", client_filter, identity);
    put(table, "ECHO", "ECHO", flatten, identity);
    // HELLO answers with the server property map; RESP2 sends it flat.
    put(table, "HELLO", "HELLO", flatten, maybe_pairs);
    put(table, "PING", "PING", flatten, identity);
    put(table, "QUIT", "QUIT", flatten, identity);
    put(table, "RESET", "RESET", flatten, identity);
    put(table, "SELECT", "SELECT", flatten, identity);
    put(table, "SWAPDB", "SWAPDB", flatten, identity);
}
