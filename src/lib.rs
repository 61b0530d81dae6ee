//! # redic
//!
//! A Redis client whose heart is a flat catalog of per-command adapters:
//! for every supported command, an *argument filter* that normalizes
//! idiomatic caller input (variadic lists, nested sequences, option maps)
//! into the flat wire argument list, and a *response parser* that shapes
//! the raw RESP reply into a typed [`command::reply::Reply`].
//!
//! The filters and parsers are pure functions — no I/O, no shared state —
//! and can be used standalone through [`command::Registry`]. The
//! [`client::Client`] wires them to an async TCP transport, including
//! pipeline batching and MULTI/EXEC queued-reply handling.

pub mod client;
pub mod command;
pub mod config;
pub mod connection;
pub mod error;
pub mod resp;

pub use client::{Client, Pipeline};
pub use command::arg::CmdArg;
pub use command::reply::Reply;
pub use command::Registry;
pub use config::ConnectionConfig;
pub use error::{Error, Result};
pub use resp::Protocol;
