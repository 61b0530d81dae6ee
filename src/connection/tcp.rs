//! Async TCP transport: connect, handshake, send frames, read replies.
//!
//! The connection owns a growable read buffer; replies are decoded
//! incrementally, so a frame split across TCP segments is simply retried
//! once more bytes arrive.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace};

use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::resp::{parser, writer, Protocol, RespValue};

/// Default cap on the read buffer (64 MiB). A reply larger than this is
/// treated as a protocol fault rather than an allocation request.
pub const DEFAULT_MAX_BUF_SIZE: usize = 64 * 1024 * 1024;

const READ_CHUNK: usize = 16 * 1024;

/// One established connection to a Redis server.
#[derive(Debug)]
pub struct RedisConnection {
    stream: TcpStream,
    buf: BytesMut,
    max_buf_size: usize,
    read_timeout: Option<Duration>,
}

impl RedisConnection {
    /// Connect, then run the handshake the config asks for: HELLO 3 for
    /// RESP3, AUTH under RESP2, and SELECT for a non-zero db.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let addr = config.addr();
        debug!(%addr, "connecting");
        let connect = TcpStream::connect(&addr);
        let stream = if config.connect_timeout_ms > 0 {
            tokio::time::timeout(Duration::from_millis(config.connect_timeout_ms), connect)
                .await
                .map_err(|_| Error::Timeout(format!("connect to {addr} timed out")))??
        } else {
            connect.await?
        };
        stream.set_nodelay(true)?;

        let read_timeout = match config.read_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        let mut conn = Self {
            stream,
            buf: BytesMut::with_capacity(READ_CHUNK),
            max_buf_size: config.max_buffer_size,
            read_timeout,
        };
        conn.handshake(config).await?;
        debug!(%addr, "connected");
        Ok(conn)
    }

    async fn handshake(&mut self, config: &ConnectionConfig) -> Result<()> {
        match config.protocol {
            Protocol::Resp3 => {
                let mut args = vec![Bytes::from_static(b"3")];
                if let Some(password) = &config.password {
                    args.push(Bytes::from_static(b"AUTH"));
                    let username = config.username.as_deref().unwrap_or("default");
                    args.push(Bytes::copy_from_slice(username.as_bytes()));
                    args.push(Bytes::copy_from_slice(password.as_bytes()));
                }
                let reply = self.round_trip("HELLO", &args).await?;
                check_handshake_reply("HELLO", reply)?;
            }
            Protocol::Resp2 => {
                if let Some(password) = &config.password {
                    let mut args = Vec::with_capacity(2);
                    if let Some(username) = &config.username {
                        args.push(Bytes::copy_from_slice(username.as_bytes()));
                    }
                    args.push(Bytes::copy_from_slice(password.as_bytes()));
                    let reply = self.round_trip("AUTH", &args).await?;
                    check_handshake_reply("AUTH", reply)?;
                }
            }
        }
        if config.db > 0 {
            let mut dbuf = itoa::Buffer::new();
            let args = [Bytes::copy_from_slice(dbuf.format(config.db).as_bytes())];
            let reply = self.round_trip("SELECT", &args).await?;
            check_handshake_reply("SELECT", reply)?;
        }
        Ok(())
    }

    /// Send one command frame and wait for its reply.
    pub async fn round_trip(&mut self, token: &str, args: &[Bytes]) -> Result<RespValue> {
        let frame = writer::encode_command(token, args);
        self.send_raw(&frame).await?;
        self.read_response().await
    }

    /// Write pre-encoded bytes (one frame or a pipelined batch).
    pub async fn send_raw(&mut self, frame: &[u8]) -> Result<()> {
        self.stream.write_all(frame).await?;
        Ok(())
    }

    /// Read one complete RESP value, pulling more bytes off the socket as
    /// needed.
    ///
    /// The frame boundary is found with the allocation-free
    /// [`parser::frame_len`] scan, then the frame is split off and frozen
    /// in one step so the decoder's `Bytes::slice` calls share that single
    /// buffer. A partial frame stays in place and only the length check
    /// reruns once more bytes arrive.
    pub async fn read_response(&mut self) -> Result<RespValue> {
        loop {
            if !self.buf.is_empty() {
                match parser::frame_len(&self.buf) {
                    Ok(len) => {
                        trace!(len, "decoded reply frame");
                        let frame = self.buf.split_to(len).freeze();
                        let (value, _) = parser::parse(&frame)?;
                        return Ok(value);
                    }
                    Err(Error::Incomplete) => {}
                    Err(e) => return Err(e),
                }
            }
            if self.buf.len() >= self.max_buf_size {
                return Err(Error::Protocol(format!(
                    "reply exceeds read buffer limit of {} bytes",
                    self.max_buf_size
                )));
            }

            let n = match self.read_timeout {
                Some(timeout) => {
                    tokio::time::timeout(timeout, self.stream.read_buf(&mut self.buf))
                        .await
                        .map_err(|_| Error::Timeout("read timed out".into()))??
                }
                None => self.stream.read_buf(&mut self.buf).await?,
            };
            if n == 0 {
                return Err(Error::Connection(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed by server",
                )));
            }
        }
    }
}

fn check_handshake_reply(stage: &str, reply: RespValue) -> Result<()> {
    match reply.error_message() {
        Some(msg) => {
            debug!(stage, %msg, "handshake rejected");
            Err(Error::redis(msg.to_string()))
        }
        None => Ok(()),
    }
}

// ── Tests ──────────────────────────────────────────────────────────
