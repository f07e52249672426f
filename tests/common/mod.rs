//! Hand-rolled event-stream vendor for timing and connection tests
//!
//! wiremock hands back the whole body at once, so tests that care about pacing
//! or about the client hanging up talk to a bare TCP listener instead.

#![allow(dead_code)]

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

const SSE_HEADERS: &[u8] =
    b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n";

/// Consume one HTTP request (headers plus `content-length` body)
async fn read_request(socket: &mut TcpStream) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let body_len = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                return Ok(());
            }
        }
    }
}

/// Serve one request, writing each event after `gap`, then close
pub async fn spawn_paced_sse(events: Vec<String>, gap: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await.unwrap();
        socket.write_all(SSE_HEADERS).await.unwrap();
        socket.flush().await.unwrap();

        for event in events {
            tokio::time::sleep(gap).await;
            socket.write_all(event.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
        }
        let _ = socket.shutdown().await;
    });

    url
}

/// Serve one request that never finishes: `first` is written, then keep-alive
/// comments until the client goes away. The receiver fires once writes fail.
pub async fn spawn_endless_sse(first: String) -> (String, oneshot::Receiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let (hung_up_tx, hung_up_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await.unwrap();
        socket.write_all(SSE_HEADERS).await.unwrap();
        socket.write_all(first.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();

        loop {
            tokio::time::sleep(Duration::from_millis(50)).await;
            if socket.write_all(b": keep-alive\n\n").await.is_err() || socket.flush().await.is_err() {
                let _ = hung_up_tx.send(());
                return;
            }
        }
    });

    (url, hung_up_rx)
}
