//! Vector-set commands.
//!
//! Attribute payloads travel as a single JSON-text argument. A caller
//! handing over a mapping gets it serialized here; a pre-serialized
//! string passes through byte-for-byte.

use bytes::Bytes;
use serde_json::{Map as JsonMap, Number, Value as JsonValue};

use super::arg::{
    expand_options, flatten, kind_name, next_arg, opt, push_flat, push_int, push_str,
    take_trailing_map, Opt, OptKind,
};
use super::reply::{bool_reply, identity, maybe_scores};
use super::{put, CmdArg, Table};
use crate::error::{Error, Result};

fn json_value(arg: CmdArg) -> Result<JsonValue> {
    match arg {
        CmdArg::Int(i) => Ok(JsonValue::Number(i.into())),
        CmdArg::Float(f) => Number::from_f64(f)
            .map(JsonValue::Number)
            .ok_or_else(|| Error::Type("non-finite float in attribute value".into())),
        CmdArg::Bool(b) => Ok(JsonValue::Bool(b)),
        CmdArg::Str(s) => Ok(JsonValue::String(s)),
        CmdArg::Bytes(b) => match std::str::from_utf8(&b) {
            Ok(s) => Ok(JsonValue::String(s.to_string())),
            Err(_) => Err(Error::Type("attribute bytes are not UTF-8".into())),
        },
        CmdArg::Seq(items) => Ok(JsonValue::Array(
            items.into_iter().map(json_value).collect::<Result<_>>()?,
        )),
        CmdArg::Map(pairs) => {
            let mut obj = JsonMap::with_capacity(pairs.len());
            for (k, v) in pairs {
                obj.insert(k, json_value(v)?);
            }
            Ok(JsonValue::Object(obj))
        }
    }
}

/// Mapping → JSON text; strings pass through unchanged.
fn attr_wire(arg: CmdArg) -> Result<Bytes> {
    match arg {
        CmdArg::Map(_) | CmdArg::Seq(_) => {
            let json = serde_json::to_string(&json_value(arg)?)
                .map_err(|e| Error::Type(format!("attribute serialization failed: {e}")))?;
            Ok(Bytes::from(json.into_bytes()))
        }
        CmdArg::Str(s) => Ok(Bytes::from(s.into_bytes())),
        CmdArg::Bytes(b) => Ok(b),
        other => Err(Error::Type(format!(
            "attributes must be a mapping or JSON text, got {}",
            kind_name(&other)
        ))),
    }
}

fn push_vector(out: &mut Vec<Bytes>, vector: Vec<CmdArg>) -> Result<()> {
    push_str(out, "VALUES");
    push_int(out, vector.len() as i64);
    for component in vector {
        push_flat(out, component)?;
    }
    Ok(())
}

const VADD_TAIL_OPTS: &[Opt] = &[
    opt("cas", "CAS", OptKind::Flag),
    opt("noquant", "NOQUANT", OptKind::Flag),
    opt("q8", "Q8", OptKind::Flag),
    opt("bin", "BIN", OptKind::Flag),
    opt("ef", "EF", OptKind::Value),
];

/// VADD key [REDUCE dim] VALUES n v… element [CAS] [quant] [EF n]
/// [SETATTR json] [M n].
fn vadd_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut iter = args.into_iter();
    let key = next_arg(&mut iter, "key")?;
    let vector = match next_arg(&mut iter, "vector")? {
        CmdArg::Seq(items) => items,
        other => {
            return Err(Error::Type(format!(
                "vector must be a sequence, got {}",
                kind_name(&other)
            )))
        }
    };
    let element = next_arg(&mut iter, "element")?;

    let mut out = Vec::with_capacity(vector.len() + 8);
    push_flat(&mut out, key)?;
    let mut pairs = options.unwrap_or_default();
    let mut take = |name: &str| -> Option<CmdArg> {
        pairs
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|idx| pairs.remove(idx).1)
    };
    if let Some(dim) = take("reduce") {
        push_str(&mut out, "REDUCE");
        push_flat(&mut out, dim)?;
    }
    push_vector(&mut out, vector)?;
    push_flat(&mut out, element)?;
    let attrs = take("setattr");
    let numlinks = take("m");
    expand_options(pairs, VADD_TAIL_OPTS, &mut out)?;
    if let Some(attrs) = attrs {
        push_str(&mut out, "SETATTR");
        out.push(attr_wire(attrs)?);
    }
    if let Some(numlinks) = numlinks {
        push_str(&mut out, "M");
        push_flat(&mut out, numlinks)?;
    }
    Ok(out)
}

const VSIM_OPTS: &[Opt] = &[
    opt("withscores", "WITHSCORES", OptKind::Flag),
    opt("count", "COUNT", OptKind::Value),
    opt("ef", "EF", OptKind::Value),
    opt("filter", "FILTER", OptKind::Value),
];

/// VSIM key (ELE element | VALUES n v…) [WITHSCORES] [COUNT n] [EF n]
/// [FILTER expr] — a sequence query is a raw vector, anything scalar is
/// an element name.
fn vsim_filter(mut args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let options = take_trailing_map(&mut args);
    let mut iter = args.into_iter();
    let key = next_arg(&mut iter, "key")?;
    let query = next_arg(&mut iter, "query")?;
    let mut out = Vec::with_capacity(8);
    push_flat(&mut out, key)?;
    match query {
        CmdArg::Seq(vector) => push_vector(&mut out, vector)?,
        element => {
            push_str(&mut out, "ELE");
            push_flat(&mut out, element)?;
        }
    }
    if let Some(pairs) = options {
        expand_options(pairs, VSIM_OPTS, &mut out)?;
    }
    Ok(out)
}

fn vsetattr_filter(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let mut iter = args.into_iter();
    let mut out = Vec::with_capacity(3);
    push_flat(&mut out, next_arg(&mut iter, "key")?)?;
    push_flat(&mut out, next_arg(&mut iter, "element")?)?;
    out.push(attr_wire(next_arg(&mut iter, "attributes")?)?);
    Ok(out)
}

pub(super) fn register(table: &mut Table) {
    put(table, "VADD", "VADD", vadd_filter, bool_reply);
    put(table, "VCARD", "VCARD", flatten, identity);
    put(table, "VDIM", "VDIM", flatten, identity);
    put(table, "VEMB", "VEMB", flatten, identity);
    put(table, "VGETATTR", "VGETATTR", flatten, identity);
    put(table, "VREM", "VREM", flatten, bool_reply);
    put(table, "VSETATTR", "VSETATTR", vsetattr_filter, bool_reply);
    put(table, "VSIM", "VSIM", vsim_filter, maybe_scores);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(items: &[&str]) -> Vec<Bytes> {
        items
            .iter()
            .map(|s| Bytes::copy_from_slice(s.as_bytes()))
            .collect()
    }

    #[test]
    fn vadd_values_block() {
        let out = vadd_filter(vec![
            "vs".into(),
            CmdArg::seq([0.1f64, 0.2f64, 0.3f64]),
            "elem".into(),
        ])
        .unwrap();
        assert_eq!(
            out,
            wire(&["vs", "VALUES", "3", "0.1", "0.2", "0.3", "elem"])
        );
    }

    #[test]
    fn vadd_reduce_precedes_values() {
        let out = vadd_filter(vec![
            "vs".into(),
            CmdArg::seq([0.5f64]),
            "e".into(),
            CmdArg::map([("reduce", CmdArg::Int(2)), ("cas", CmdArg::Bool(true))]),
        ])
        .unwrap();
        assert_eq!(
            out,
            wire(&["vs", "REDUCE", "2", "VALUES", "1", "0.5", "e", "CAS"])
        );
    }

    #[test]
    fn vsetattr_serializes_mapping() {
        let out = vsetattr_filter(vec![
            "vs".into(),
            "e".into(),
            CmdArg::map([("genre", CmdArg::Str("jazz".into())), ("year", CmdArg::Int(1959))]),
        ])
        .unwrap();
        assert_eq!(out[0], Bytes::from_static(b"vs"));
        assert_eq!(out[1], Bytes::from_static(b"e"));
        let json: serde_json::Value = serde_json::from_slice(&out[2]).unwrap();
        assert_eq!(json["genre"], "jazz");
        assert_eq!(json["year"], 1959);
    }

    #[test]
    fn vsetattr_passes_serialized_text_through() {
        let out = vsetattr_filter(vec![
            "vs".into(),
            "e".into(),
            r#"{"genre":"jazz"}"#.into(),
        ])
        .unwrap();
        assert_eq!(out[2], Bytes::from_static(br#"{"genre":"jazz"}"#));
    }

    #[test]
    fn vsetattr_rejects_scalar_attrs() {
        let err =
            vsetattr_filter(vec!["vs".into(), "e".into(), CmdArg::Int(1)]).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn vsim_element_query() {
        let out = vsim_filter(vec![
            "vs".into(),
            "elem".into(),
            CmdArg::map([("count", CmdArg::Int(5)), ("withscores", CmdArg::Bool(true))]),
        ])
        .unwrap();
        assert_eq!(
            out,
            wire(&["vs", "ELE", "elem", "WITHSCORES", "COUNT", "5"])
        );
    }

    #[test]
    fn vsim_vector_query() {
        let out = vsim_filter(vec!["vs".into(), CmdArg::seq([0.1f64, 0.9f64])]).unwrap();
        assert_eq!(out, wire(&["vs", "VALUES", "2", "0.1", "0.9"]));
    }

    #[test]
    fn non_finite_attribute_rejected() {
        let err = attr_wire(CmdArg::map([("x", CmdArg::Float(f64::NAN))])).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }
}
