//! Caller-side argument values and the shared filter building blocks.
//!
//! Every argument filter consumes a `Vec<CmdArg>` and produces the flat,
//! ordered list of wire scalars (`Vec<Bytes>`) the server expects. The
//! helpers here cover the recurring normalization patterns: variadic
//! flattening, key/value pair folding, and ordered option-map expansion.

use bytes::Bytes;
use itoa::Buffer;

use crate::error::{Error, Result};

/// A caller-supplied command argument.
///
/// Filters pattern-match on this tagged union instead of probing runtime
/// types: scalars go to the wire as-is, sequences are flattened in place,
/// and mappings are folded or expanded per command.
#[derive(Debug, Clone, PartialEq)]
pub enum CmdArg {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Bytes(Bytes),
    /// An ordered sequence standing in for multiple positional arguments.
    Seq(Vec<CmdArg>),
    /// An insertion-ordered mapping (field→value pairs or an options map).
    Map(Vec<(String, CmdArg)>),
}

impl CmdArg {
    /// Build a mapping argument from key/value pairs, preserving order.
    pub fn map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<CmdArg>,
    {
        CmdArg::Map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Build a sequence argument.
    pub fn seq<V: Into<CmdArg>>(items: impl IntoIterator<Item = V>) -> Self {
        CmdArg::Seq(items.into_iter().map(Into::into).collect())
    }

    /// Truthiness used by option-map expansion: only an explicit `false`
    /// suppresses a recognized key.
    pub fn is_truthy(&self) -> bool {
        match self {
            CmdArg::Bool(b) => *b,
            _ => true,
        }
    }

    /// Convert a scalar into its wire form. Sequences and mappings are
    /// not wire-transmissible and must be handled by the filter first.
    pub fn into_wire(self) -> Result<Bytes> {
        match self {
            CmdArg::Int(i) => {
                let mut buf = Buffer::new();
                Ok(Bytes::copy_from_slice(buf.format(i).as_bytes()))
            }
            CmdArg::Float(f) => Ok(Bytes::from(format_float(f).into_bytes())),
            CmdArg::Str(s) => Ok(Bytes::from(s.into_bytes())),
            CmdArg::Bytes(b) => Ok(b),
            CmdArg::Bool(_) => Err(Error::Type(
                "boolean is not a wire scalar; use an options map flag".into(),
            )),
            CmdArg::Seq(_) => Err(Error::Type("unexpected sequence argument".into())),
            CmdArg::Map(_) => Err(Error::Type("unexpected mapping argument".into())),
        }
    }

    /// Read a scalar as a UTF-8 string (for subcommand keywords).
    pub fn as_keyword(&self) -> Option<&str> {
        match self {
            CmdArg::Str(s) => Some(s),
            CmdArg::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }
}

/// Redis prints scores and increments without a trailing `.0`.
fn format_float(f: f64) -> String {
    if f == f64::INFINITY {
        "+inf".to_string()
    } else if f == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        let mut s = f.to_string();
        if s.ends_with(".0") {
            s.truncate(s.len() - 2);
        }
        s
    }
}

impl From<i64> for CmdArg {
    fn from(i: i64) -> Self {
        CmdArg::Int(i)
    }
}

impl From<i32> for CmdArg {
    fn from(i: i32) -> Self {
        CmdArg::Int(i as i64)
    }
}

impl From<u64> for CmdArg {
    fn from(i: u64) -> Self {
        CmdArg::Int(i as i64)
    }
}

impl From<f64> for CmdArg {
    fn from(f: f64) -> Self {
        CmdArg::Float(f)
    }
}

impl From<bool> for CmdArg {
    fn from(b: bool) -> Self {
        CmdArg::Bool(b)
    }
}

impl From<&str> for CmdArg {
    fn from(s: &str) -> Self {
        CmdArg::Str(s.to_string())
    }
}

impl From<String> for CmdArg {
    fn from(s: String) -> Self {
        CmdArg::Str(s)
    }
}

impl From<Bytes> for CmdArg {
    fn from(b: Bytes) -> Self {
        CmdArg::Bytes(b)
    }
}

impl From<&[u8]> for CmdArg {
    fn from(b: &[u8]) -> Self {
        CmdArg::Bytes(Bytes::copy_from_slice(b))
    }
}

impl<T: Into<CmdArg>> From<Vec<T>> for CmdArg {
    fn from(items: Vec<T>) -> Self {
        CmdArg::Seq(items.into_iter().map(Into::into).collect())
    }
}

// ── Filter building blocks ─────────────────────────────────────────

/// Push a literal keyword token.
pub fn push_str(out: &mut Vec<Bytes>, s: &str) {
    out.push(Bytes::copy_from_slice(s.as_bytes()));
}

/// Push an integer as its decimal wire form.
pub fn push_int(out: &mut Vec<Bytes>, i: i64) {
    let mut buf = Buffer::new();
    out.push(Bytes::copy_from_slice(buf.format(i).as_bytes()));
}

/// Push one argument, expanding sequences in place (preserving order)
/// and folding mappings into alternating key/value runs.
pub fn push_flat(out: &mut Vec<Bytes>, arg: CmdArg) -> Result<()> {
    match arg {
        CmdArg::Seq(items) => {
            for item in items {
                push_flat(out, item)?;
            }
            Ok(())
        }
        CmdArg::Map(pairs) => {
            for (key, value) in pairs {
                push_str(out, &key);
                push_flat(out, value)?;
            }
            Ok(())
        }
        scalar => {
            out.push(scalar.into_wire()?);
            Ok(())
        }
    }
}

/// The workhorse generic filter: flatten everything.
///
/// Covers variadic collapsing (`DEL(["a","b"]) ≡ DEL("a","b")`) and
/// key/value pair folding (`MSET({k: v})`) in one pass.
pub fn flatten(args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        push_flat(&mut out, arg)?;
    }
    Ok(out)
}

/// How a recognized option-map key expands on the wire.
#[derive(Clone, Copy)]
pub enum OptKind {
    /// Keyword only (`NX`, `WITHSCORES`); emitted when the value is truthy.
    Flag,
    /// Keyword followed by its value(s) (`EX 10`, `LIMIT 0 5`).
    Value,
}

/// One recognized key of a command's options map.
pub struct Opt {
    pub key: &'static str,
    pub token: &'static str,
    pub kind: OptKind,
}

pub const fn opt(key: &'static str, token: &'static str, kind: OptKind) -> Opt {
    Opt { key, token, kind }
}

/// Expand an options map against a fixed keyword order.
///
/// Keywords are emitted in `spec` order regardless of map insertion order —
/// the server mandates the ordering, so this is a correctness requirement,
/// not style. Unrecognized keys are ignored; falsy values suppress the key.
pub fn expand_options(
    mut pairs: Vec<(String, CmdArg)>,
    spec: &[Opt],
    out: &mut Vec<Bytes>,
) -> Result<()> {
    for opt in spec {
        let Some(idx) = pairs
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(opt.key))
        else {
            continue;
        };
        let (_, value) = pairs.remove(idx);
        if !value.is_truthy() {
            continue;
        }
        match opt.kind {
            OptKind::Flag => push_str(out, opt.token),
            OptKind::Value => {
                push_str(out, opt.token);
                push_flat(out, value)?;
            }
        }
    }
    Ok(())
}

/// Pop a trailing options map off the argument list, if present.
pub fn take_trailing_map(args: &mut Vec<CmdArg>) -> Option<Vec<(String, CmdArg)>> {
    if matches!(args.last(), Some(CmdArg::Map(_))) {
        match args.pop() {
            Some(CmdArg::Map(pairs)) => Some(pairs),
            _ => unreachable!(),
        }
    } else {
        None
    }
}

/// Take the next argument or raise a client-side arity error.
pub fn next_arg(args: &mut std::vec::IntoIter<CmdArg>, what: &str) -> Result<CmdArg> {
    args.next()
        .ok_or_else(|| Error::Type(format!("missing required argument: {what}")))
}

/// Interpret an argument as a sequence of keys, raising a client-side
/// type error for anything else. Used by commands that take an explicit
/// keys array (`XREAD`, `LMPOP`, `SINTERCARD`, …) where a malformed shape
/// would otherwise produce an ambiguous wire failure.
pub fn expect_seq(arg: CmdArg, what: &str) -> Result<Vec<CmdArg>> {
    match arg {
        CmdArg::Seq(items) => Ok(items),
        other => Err(Error::Type(format!(
            "{what} must be a sequence, got {}",
            kind_name(&other)
        ))),
    }
}

/// Filter body for container commands (CLIENT, CONFIG, OBJECT, …): the
/// first argument is the subcommand keyword, validated client-side against
/// the known set, uppercased, and followed by the remaining arguments.
pub fn subcommand(allowed: &'static [&'static str], args: Vec<CmdArg>) -> Result<Vec<Bytes>> {
    let mut iter = args.into_iter();
    let first = next_arg(&mut iter, "subcommand")?;
    let Some(keyword) = first.as_keyword() else {
        return Err(Error::Type(format!(
            "subcommand must be a string, got {}",
            kind_name(&first)
        )));
    };
    let upper = keyword.to_ascii_uppercase();
    let Some(token) = allowed.iter().find(|t| **t == upper) else {
        return Err(Error::Type(format!("unknown subcommand: {keyword}")));
    };
    let mut out = Vec::with_capacity(iter.len() + 1);
    push_str(&mut out, token);
    for arg in iter {
        push_flat(&mut out, arg)?;
    }
    Ok(out)
}

pub(crate) fn kind_name(arg: &CmdArg) -> &'static str {
    match arg {
        CmdArg::Int(_) => "integer",
        CmdArg::Float(_) => "float",
        CmdArg::Bool(_) => "boolean",
        CmdArg::Str(_) => "string",
        CmdArg::Bytes(_) => "bytes",
        CmdArg::Seq(_) => "sequence",
        CmdArg::Map(_) => "mapping",
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn wire(items: &[&str]) -> Vec<Bytes> {
        items
            .iter()
            .map(|s| Bytes::copy_from_slice(s.as_bytes()))
            .collect()
    }

    #[test]
    fn scalars_to_wire() {
        assert_eq!(CmdArg::Int(42).into_wire().unwrap(), Bytes::from_static(b"42"));
        assert_eq!(CmdArg::Int(-7).into_wire().unwrap(), Bytes::from_static(b"-7"));
        assert_eq!(
            CmdArg::Str("hi".into()).into_wire().unwrap(),
            Bytes::from_static(b"hi")
        );
        assert_eq!(
            CmdArg::Float(1.5).into_wire().unwrap(),
            Bytes::from_static(b"1.5")
        );
        // No trailing .0 on whole floats — Redis prints scores this way.
        assert_eq!(
            CmdArg::Float(10.0).into_wire().unwrap(),
            Bytes::from_static(b"10")
        );
        assert_eq!(
            CmdArg::Float(f64::NEG_INFINITY).into_wire().unwrap(),
            Bytes::from_static(b"-inf")
        );
    }

    #[test]
    fn non_scalars_rejected() {
        assert!(CmdArg::Bool(true).into_wire().is_err());
        assert!(CmdArg::seq(["a"]).into_wire().is_err());
        assert!(CmdArg::map([("a", 1i64)]).into_wire().is_err());
    }

    #[test]
    fn flatten_passes_scalars() {
        let out = flatten(vec!["a".into(), 1i64.into()]).unwrap();
        assert_eq!(out, wire(&["a", "1"]));
    }

    #[test]
    fn flatten_expands_sequence_in_order() {
        // DEL(["a","b","c"]) ≡ DEL("a","b","c")
        let nested = flatten(vec![CmdArg::seq(["a", "b", "c"])]).unwrap();
        let flat = flatten(vec!["a".into(), "b".into(), "c".into()]).unwrap();
        assert_eq!(nested, flat);
        assert_eq!(nested, wire(&["a", "b", "c"]));
    }

    #[test]
    fn flatten_folds_mapping_preserving_order() {
        let out = flatten(vec![
            "key".into(),
            CmdArg::map([("f1", "v1"), ("f2", "v2")]),
        ])
        .unwrap();
        assert_eq!(out, wire(&["key", "f1", "v1", "f2", "v2"]));
    }

    #[test]
    fn flatten_nested_sequences() {
        let out = flatten(vec![CmdArg::seq([
            CmdArg::seq(["a", "b"]),
            CmdArg::Str("c".into()),
        ])])
        .unwrap();
        assert_eq!(out, wire(&["a", "b", "c"]));
    }

    #[test]
    fn expand_options_emits_spec_order() {
        const SPEC: &[Opt] = &[
            opt("ex", "EX", OptKind::Value),
            opt("nx", "NX", OptKind::Flag),
        ];
        // Map insertion order is nx-first; the emitted order must be EX … NX.
        let mut out = Vec::new();
        expand_options(
            vec![
                ("nx".to_string(), CmdArg::Bool(true)),
                ("ex".to_string(), CmdArg::Int(10)),
            ],
            SPEC,
            &mut out,
        )
        .unwrap();
        assert_eq!(out, wire(&["EX", "10", "NX"]));
    }

    #[test]
    fn expand_options_skips_falsy_and_unknown() {
        const SPEC: &[Opt] = &[
            opt("nx", "NX", OptKind::Flag),
            opt("xx", "XX", OptKind::Flag),
        ];
        let mut out = Vec::new();
        expand_options(
            vec![
                ("nx".to_string(), CmdArg::Bool(false)),
                ("xx".to_string(), CmdArg::Bool(true)),
                ("bogus".to_string(), CmdArg::Int(1)),
            ],
            SPEC,
            &mut out,
        )
        .unwrap();
        assert_eq!(out, wire(&["XX"]));
    }

    #[test]
    fn expand_options_value_sequences() {
        const SPEC: &[Opt] = &[opt("limit", "LIMIT", OptKind::Value)];
        let mut out = Vec::new();
        expand_options(
            vec![("limit".to_string(), CmdArg::seq([0i64, 5i64]))],
            SPEC,
            &mut out,
        )
        .unwrap();
        assert_eq!(out, wire(&["LIMIT", "0", "5"]));
    }

    #[test]
    fn expand_options_key_case_insensitive() {
        const SPEC: &[Opt] = &[opt("count", "COUNT", OptKind::Value)];
        let mut out = Vec::new();
        expand_options(
            vec![("COUNT".to_string(), CmdArg::Int(3))],
            SPEC,
            &mut out,
        )
        .unwrap();
        assert_eq!(out, wire(&["COUNT", "3"]));
    }

    #[test]
    fn trailing_map_taken_only_when_last() {
        let mut args: Vec<CmdArg> = vec!["k".into(), CmdArg::map([("nx", true)])];
        let map = take_trailing_map(&mut args).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(args.len(), 1);

        let mut args: Vec<CmdArg> = vec!["k".into(), "v".into()];
        assert!(take_trailing_map(&mut args).is_none());
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn expect_seq_raises_client_side_type_error() {
        let err = expect_seq("notaseq".into(), "keys").unwrap_err();
        assert!(matches!(err, Error::Type(_)));
        assert!(err.to_string().contains("keys"));
    }

    #[test]
    fn subcommand_validates_and_uppercases() {
        const SUBS: &[&str] = &["GET", "SET", "RESETSTAT"];
        let out = subcommand(SUBS, vec!["get".into(), "maxmemory".into()]).unwrap();
        assert_eq!(out, wire(&["GET", "maxmemory"]));

        let err = subcommand(SUBS, vec!["bogus".into()]).unwrap_err();
        assert!(matches!(err, Error::Type(_)));

        let err = subcommand(SUBS, vec![]).unwrap_err();
        assert!(matches!(err, Error::Type(_)));
    }

    #[test]
    fn keyword_access() {
        assert_eq!(CmdArg::Str("load".into()).as_keyword(), Some("load"));
        assert_eq!(CmdArg::Int(1).as_keyword(), None);
    }
}
