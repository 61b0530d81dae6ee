//! Scripting and function commands.

use bytes::Bytes;

use super::arg::{expect_seq, flatten, next_arg, push_flat, push_int, subcommand};
use super::reply::identity;
use super::{put, CmdArg, Table};
use crate::error::Result;

/// EVAL script keys args — the keys sequence supplies numkeys; callers who
/// prefer the raw wire shape can pass numkeys as an integer instead.
fn eval_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let mut iter = args.into_iter();
    let script = next_arg(&mut iter, "script")?;
    let mut out = Vec::with_capacity(4);
    push_flat(&mut out, script)?;
    match iter.next() {
        Some(CmdArg::Seq(keys)) => {
            push_int(&mut out, keys.len() as i64);
            for key in keys {
                push_flat(&mut out, key)?;
            }
            if let Some(extra) = iter.next() {
                for arg in expect_seq(extra, "args")? {
                    push_flat(&mut out, arg)?;
                }
            }
        }
        Some(numkeys) => {
            // Raw positional form: numkeys key… arg…
            push_flat(&mut out, numkeys)?;
            for arg in iter.by_ref() {
                push_flat(&mut out, arg)?;
            }
        }
        None => push_int(&mut out, 0),
    }
    Ok(out)
}

const FUNCTION_SUBS: &[&str] = &[
    "DELETE", "DUMP", "FLUSH", "KILL", "LIST", "LOAD", "RESTORE", "STATS",
];
const SCRIPT_SUBS: &[&str] = &["EXISTS", "FLUSH", "KILL", "LOAD"];

fn function_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    subcommand(FUNCTION_SUBS, args)
}

fn script_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    subcommand(SCRIPT_SUBS, args)
}

pub(super) fn register(table: &mut Table) {
    put(table, "EVAL", "EVAL", eval_filter, identity);
    put(table, "EVALUATE", "EVAL", eval_filter, identity);
    put(table, "EVALSHA", "EVALSHA", eval_filter, identity);
    put(table, "EVALUATESHA", "EVALSHA", eval_filter, identity);
    put(table, "EVALSHA_RO", "EVALSHA_RO", eval_filter, identity);
    put(table, "EVAL_RO", "EVAL_RO", eval_filter, identity);
    put(table, "FCALL", "FCALL", eval_filter, identity);
    put(table, "FCALL_RO", "FCALL_RO", eval_filter, identity);
    put(table, "FUNCTION", "FUNCTION", function_filter, identity);
    put(table, "SCRIPT", "SCRIPT", script_filter, identity);
}
