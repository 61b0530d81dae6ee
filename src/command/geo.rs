//! Geospatial commands.

use bytes::Bytes;

use super::arg::{expand_options, flatten, opt, take_trailing_map, Opt, OptKind};
use super::reply::{double_reply, identity};
use super::{put, CmdArg, Table};
use crate::error::Result;

const GEOADD_OPTS: &[Opt] = &[
    opt("nx", "NX", OptKind::Flag),
    opt("xx", "XX", OptKind::Flag),
    opt("ch", "CH", OptKind::Flag),
];

/// GEOADD key [NX|XX] [CH] lon lat member […] — the condition map rides
/// right after the key, ahead of the coordinate triples.
fn geoadd_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let mut iter = args.into_iter().peekable();
    let mut out = Vec::with_capacity(6);
    if let Some(key) = iter.next() {
        super::arg::push_flat(&mut out, key)?;
    }
    if matches!(iter.peek(), Some(CmdArg::Map(_))) {
        let Some(CmdArg::Map(pairs)) = iter.next() else {
            unreachable!()
        };
        expand_options(pairs, GEOADD_OPTS, &mut out)?;
    }
    for arg in iter {
        super::arg::push_flat(&mut out, arg)?;
    }
    Ok(out)
}

/// GEOSEARCH's clause order: origin, shape, ordering, COUNT [ANY], then
/// the WITH… attribute flags.
const GEOSEARCH_OPTS: &[Opt] = &[
    opt("frommember", "FROMMEMBER", OptKind::Value),
    opt("fromlonlat", "FROMLONLAT", OptKind::Value),
    opt("byradius", "BYRADIUS", OptKind::Value),
    opt("bybox", "BYBOX", OptKind::Value),
    opt("asc", "ASC", OptKind::Flag),
    opt("desc", "DESC", OptKind::Flag),
    opt("count", "COUNT", OptKind::Value),
    opt("any", "ANY", OptKind::Flag),
    opt("withcoord", "WITHCOORD", OptKind::Flag),
    opt("withdist", "WITHDIST", OptKind::Flag),
    opt("withhash", "WITHHASH", OptKind::Flag),
];

fn geosearch_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut out = flatten(args)?;
    if let Some(pairs) = options {
        expand_options(pairs, GEOSEARCH_OPTS, &mut out)?;
    }
    Ok(out)
}

const GEOSEARCHSTORE_OPTS: &[Opt] = &[
    opt("frommember", "FROMMEMBER", OptKind::Value),
    opt("fromlonlat", "FROMLONLAT", OptKind::Value),
    opt("byradius", "BYRADIUS", OptKind::Value),
    opt("bybox", "BYBOX", OptKind::Value),
    opt("asc", "ASC", OptKind::Flag),
    opt("desc", "DESC", OptKind::Flag),
    opt("count", "COUNT", OptKind::Value),
    opt("any", "ANY", OptKind::Flag),
    opt("storedist", "STOREDIST", OptKind::Flag),
];

fn geosearchstore_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut out = flatten(args)?;
    if let Some(pairs) = options {
        expand_options(pairs, GEOSEARCHSTORE_OPTS, &mut out)?;
    }
    Ok(out)
}

pub(super) fn register(table: &mut Table) {
    put(table, "GEOADD", "GEOADD", geoadd_filter, identity);
    put(table, "GEODIST", "GEODIST", flatten, double_reply);
    put(table, "GEOHASH", "GEOHASH", flatten, identity);
    put(table, "GEOPOS", "GEOPOS", flatten, identity);
    put(table, "GEOSEARCH", "GEOSEARCH", geosearch_filter, identity);
    put(table, "GEOSEARCHSTORE", "GEOSEARCHSTORE", geosearchstore_filter, identity);
}
