//! The command dispatcher.
//!
//! `execute` is the single funnel: registry lookup, argument filtering,
//! one wire round trip, response parsing. MULTI/EXEC bookkeeping and
//! pipeline batching both sit on top of the same catalog entries.

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

use crate::command::{CmdArg, ParserFn, Registry, Reply};
use crate::config::ConnectionConfig;
use crate::connection::RedisConnection;
use crate::error::{Error, Result};
use crate::resp::{writer, Protocol, RespValue};

#[derive(Default)]
struct TxnState {
    active: bool,
    /// Parsers deferred while commands sit queued server-side, in issue
    /// order; applied to the EXEC aggregate.
    queued: Vec<ParserFn>,
}

/// An async Redis client over one connection.
pub struct Client {
    connection: AsyncMutex<RedisConnection>,
    registry: Registry,
    protocol: Protocol,
    txn: Mutex<TxnState>,
}

impl Client {
    pub async fn connect(config: ConnectionConfig) -> Result<Self> {
        let protocol = config.protocol;
        let connection = RedisConnection::connect(&config).await?;
        Ok(Self {
            connection: AsyncMutex::new(connection),
            registry: Registry::new(),
            protocol,
            txn: Mutex::new(TxnState::default()),
        })
    }

    pub async fn connect_url(url: &str) -> Result<Self> {
        Self::connect(ConnectionConfig::from_url(url)?).await
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Dispatch one command by name.
    ///
    /// Lookup misses and filter rejections surface before any bytes are
    /// written. Inside a transaction the reply must be the literal
    /// `+QUEUED`; the real parser is deferred until EXEC.
    pub async fn execute(&self, name: &str, args: Vec<CmdArg>) -> Result<Reply> {
        let canonical = name.to_ascii_uppercase();
        match canonical.as_str() {
            "MULTI" => return self.multi().await,
            "EXEC" => return self.exec().await,
            "DISCARD" => return self.discard().await,
            _ => {}
        }

        let spec = self.registry.lookup(&canonical)?;
        let wire_args = (spec.filter)(args)?;
        debug!(command = %canonical, args = wire_args.len(), "dispatch");

        let in_txn = self.txn.lock().active;
        let value = {
            let mut conn = self.connection.lock().await;
            conn.round_trip(spec.token, &wire_args).await?
        };

        if in_txn {
            if value.is_queued() {
                self.txn.lock().queued.push(spec.parser);
                return Ok(Reply::Status("QUEUED".into()));
            }
            // The server refused to queue (bad arity, OOM, …); nothing to
            // defer, the queue itself is unchanged.
            if let Some(msg) = value.error_message() {
                return Err(Error::redis(msg.to_string()));
            }
            return Err(Error::Protocol(format!(
                "expected QUEUED inside MULTI, got {}",
                value.type_name()
            )));
        }
        (spec.parser)(value, self.protocol)
    }

    /// Open a transaction. Subsequent `execute` calls queue server-side
    /// until EXEC or DISCARD.
    pub async fn multi(&self) -> Result<Reply> {
        {
            let mut txn = self.txn.lock();
            if txn.active {
                return Err(Error::Type("MULTI calls cannot be nested".into()));
            }
            txn.active = true;
            txn.queued.clear();
        }
        let result = {
            let mut conn = self.connection.lock().await;
            conn.round_trip("MULTI", &[]).await
        };
        match result {
            Ok(value) => match value.error_message() {
                Some(msg) => {
                    self.txn.lock().active = false;
                    Err(Error::redis(msg.to_string()))
                }
                None => crate::command::reply::from_resp(value),
            },
            Err(e) => {
                self.txn.lock().active = false;
                Err(e)
            }
        }
    }

    /// Run the queued transaction, applying each deferred parser to its
    /// slot of the aggregate reply. A nil aggregate means a WATCH guard
    /// fired and the queue was thrown away server-side.
    pub async fn exec(&self) -> Result<Reply> {
        let parsers = {
            let mut txn = self.txn.lock();
            if !txn.active {
                return Err(Error::Type("EXEC without MULTI".into()));
            }
            txn.active = false;
            std::mem::take(&mut txn.queued)
        };
        let value = {
            let mut conn = self.connection.lock().await;
            conn.round_trip("EXEC", &[]).await?
        };
        match value {
            RespValue::Null => Ok(Reply::Nil),
            RespValue::Error(msg) | RespValue::BulkError(msg) => Err(Error::redis(msg)),
            RespValue::Array(items) => {
                if items.len() != parsers.len() {
                    return Err(Error::Protocol(format!(
                        "EXEC returned {} replies for {} queued commands",
                        items.len(),
                        parsers.len()
                    )));
                }
                let mut replies = Vec::with_capacity(items.len());
                for (item, parser) in items.into_iter().zip(parsers) {
                    replies.push(parser(item, self.protocol)?);
                }
                Ok(Reply::Array(replies))
            }
            other => Err(Error::Protocol(format!(
                "expected EXEC aggregate, got {}",
                other.type_name()
            ))),
        }
    }

    /// Abandon the open transaction and clear the deferred parsers.
    pub async fn discard(&self) -> Result<Reply> {
        {
            let mut txn = self.txn.lock();
            if !txn.active {
                return Err(Error::Type("DISCARD without MULTI".into()));
            }
            txn.active = false;
            txn.queued.clear();
        }
        let value = {
            let mut conn = self.connection.lock().await;
            conn.round_trip("DISCARD", &[]).await?
        };
        crate::command::reply::from_resp(value)
    }

    /// Start building a pipelined batch.
    pub fn pipeline(&self) -> Pipeline<'_> {
        Pipeline {
            client: self,
            commands: Vec::new(),
        }
    }

    // ── Typed conveniences over `execute` ──────────────────────────

    pub async fn ping(&self) -> Result<Reply> {
        self.execute("PING", Vec::new()).await
    }

    pub async fn echo(&self, message: impl Into<CmdArg>) -> Result<Reply> {
        self.execute("ECHO", vec![message.into()]).await
    }

    pub async fn get(&self, key: impl Into<CmdArg>) -> Result<Reply> {
        self.execute("GET", vec![key.into()]).await
    }

    pub async fn set(
        &self,
        key: impl Into<CmdArg>,
        value: impl Into<CmdArg>,
    ) -> Result<Reply> {
        self.execute("SET", vec![key.into(), value.into()]).await
    }

    pub async fn del(&self, keys: impl Into<CmdArg>) -> Result<Reply> {
        self.execute("DEL", vec![keys.into()]).await
    }

    pub async fn exists(&self, keys: impl Into<CmdArg>) -> Result<Reply> {
        self.execute("EXISTS", vec![keys.into()]).await
    }

    pub async fn incr(&self, key: impl Into<CmdArg>) -> Result<Reply> {
        self.execute("INCR", vec![key.into()]).await
    }

    pub async fn expire(&self, key: impl Into<CmdArg>, seconds: i64) -> Result<Reply> {
        self.execute("EXPIRE", vec![key.into(), seconds.into()]).await
    }

    pub async fn ttl(&self, key: impl Into<CmdArg>) -> Result<Reply> {
        self.execute("TTL", vec![key.into()]).await
    }

    pub async fn hset(
        &self,
        key: impl Into<CmdArg>,
        fields: impl Into<CmdArg>,
    ) -> Result<Reply> {
        self.execute("HSET", vec![key.into(), fields.into()]).await
    }

    pub async fn hget(
        &self,
        key: impl Into<CmdArg>,
        field: impl Into<CmdArg>,
    ) -> Result<Reply> {
        self.execute("HGET", vec![key.into(), field.into()]).await
    }

    pub async fn hgetall(&self, key: impl Into<CmdArg>) -> Result<Reply> {
        self.execute("HGETALL", vec![key.into()]).await
    }

    pub async fn lpush(
        &self,
        key: impl Into<CmdArg>,
        values: impl Into<CmdArg>,
    ) -> Result<Reply> {
        self.execute("LPUSH", vec![key.into(), values.into()]).await
    }

    pub async fn rpush(
        &self,
        key: impl Into<CmdArg>,
        values: impl Into<CmdArg>,
    ) -> Result<Reply> {
        self.execute("RPUSH", vec![key.into(), values.into()]).await
    }

    pub async fn lrange(
        &self,
        key: impl Into<CmdArg>,
        start: i64,
        stop: i64,
    ) -> Result<Reply> {
        self.execute("LRANGE", vec![key.into(), start.into(), stop.into()])
            .await
    }

    pub async fn sadd(
        &self,
        key: impl Into<CmdArg>,
        members: impl Into<CmdArg>,
    ) -> Result<Reply> {
        self.execute("SADD", vec![key.into(), members.into()]).await
    }

    pub async fn smembers(&self, key: impl Into<CmdArg>) -> Result<Reply> {
        self.execute("SMEMBERS", vec![key.into()]).await
    }

    pub async fn zadd(
        &self,
        key: impl Into<CmdArg>,
        members: impl Into<CmdArg>,
    ) -> Result<Reply> {
        self.execute("ZADD", vec![key.into(), members.into()]).await
    }

    pub async fn zrange(
        &self,
        key: impl Into<CmdArg>,
        start: i64,
        stop: i64,
    ) -> Result<Reply> {
        self.execute("ZRANGE", vec![key.into(), start.into(), stop.into()])
            .await
    }

    pub async fn publish(
        &self,
        channel: impl Into<CmdArg>,
        message: impl Into<CmdArg>,
    ) -> Result<Reply> {
        self.execute("PUBLISH", vec![channel.into(), message.into()])
            .await
    }

    pub async fn watch(&self, keys: impl Into<CmdArg>) -> Result<Reply> {
        self.execute("WATCH", vec![keys.into()]).await
    }

    pub async fn unwatch(&self) -> Result<Reply> {
        self.execute("UNWATCH", Vec::new()).await
    }
}

/// A buffered batch of commands written in one flush and read back as N
/// replies, each parsed by its own catalog entry.
pub struct Pipeline<'a> {
    client: &'a Client,
    commands: Vec<(String, Vec<Bytes>, ParserFn)>,
}

impl Pipeline<'_> {
    /// Append a command. The filter runs immediately, so shape errors
    /// surface at build time rather than mid-flight.
    ///
    /// MULTI/EXEC/DISCARD are refused: they would open a server-side
    /// transaction the client's queue bookkeeping never sees. Use
    /// [`Client::multi`] and friends instead.
    pub fn cmd(mut self, name: &str, args: Vec<CmdArg>) -> Result<Self> {
        let canonical = name.to_ascii_uppercase();
        if matches!(canonical.as_str(), "MULTI" | "EXEC" | "DISCARD") {
            return Err(Error::Type(format!("{canonical} cannot be pipelined")));
        }
        let spec = self.client.registry.lookup(&canonical)?;
        let wire_args = (spec.filter)(args)?;
        self.commands
            .push((spec.token.to_string(), wire_args, spec.parser));
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Flush the batch and collect the replies in issue order.
    pub async fn execute(self) -> Result<Vec<Reply>> {
        if self.commands.is_empty() {
            return Ok(Vec::new());
        }
        let frames: Vec<(String, Vec<Bytes>)> = self
            .commands
            .iter()
            .map(|(token, args, _)| (token.clone(), args.clone()))
            .collect();
        let batch = writer::encode_pipeline(&frames);
        debug!(commands = self.commands.len(), bytes = batch.len(), "pipeline flush");

        // Drain every reply before parsing: bailing out mid-batch would
        // leave unread frames on the socket and desync the connection.
        let raw = {
            let mut conn = self.client.connection.lock().await;
            conn.send_raw(&batch).await?;
            let mut raw = Vec::with_capacity(self.commands.len());
            for _ in 0..self.commands.len() {
                raw.push(conn.read_response().await?);
            }
            raw
        };
        let mut replies = Vec::with_capacity(raw.len());
        for (value, (_, _, parser)) in raw.into_iter().zip(&self.commands) {
            replies.push(parser(value, self.client.protocol)?);
        }
        Ok(replies)
    }
}
