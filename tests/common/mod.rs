//! Scripted mock-server harness shared by the integration tests.
//!
//! Each entry in the script is the full wire response to one incoming
//! write burst, so a test declares the server side of the conversation
//! up front and drives the client against it — no live Redis involved.

use redic::{Client, ConnectionConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub async fn spawn_server(responses: Vec<&'static [u8]>) -> ConnectionConfig {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut scratch = [0u8; 16384];
        for response in responses {
            let n = socket.read(&mut scratch).await.unwrap();
            if n == 0 {
                return;
            }
            socket.write_all(response).await.unwrap();
        }
    });
    ConnectionConfig {
        host: addr.ip().to_string(),
        port: addr.port(),
        ..ConnectionConfig::default()
    }
}

/// Connect a default-config (RESP2, no auth) client to a scripted server.
pub async fn scripted_client(responses: Vec<&'static [u8]>) -> Client {
    let config = spawn_server(responses).await;
    Client::connect(config).await.unwrap()
}
