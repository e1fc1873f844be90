//! Minimal HTTP/1.1 server standing in for a seed's photo API.
//!
//! Each connection serves exactly one `GET` and closes.  Routes are fixed
//! when the server is spawned; every requested path is recorded so tests
//! can assert what the client asked for.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, Duration};

/// How long a stalling reply holds its connection open.
const STALL: Duration = Duration::from_secs(30);

/// Scripted answer for one path.
#[derive(Clone)]
pub enum Reply {
    /// `200 OK` with this body.
    Ok(Vec<u8>),
    /// `404 Not Found`.
    NotFound,
    /// `200 OK` announcing more bytes than are sent, then the connection
    /// is closed.
    Truncated(Vec<u8>),
    /// Reads the request and never answers.
    Silent,
    /// `200 OK` announcing more bytes than are sent, then the connection
    /// stays open without sending anything else.
    StallsAfter(Vec<u8>),
}

impl Reply {
    pub fn text(body: &str) -> Self {
        Reply::Ok(body.as_bytes().to_vec())
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    /// Binds `127.0.0.1:0` and serves `routes` until the runtime shuts down.
    pub async fn spawn(routes: Vec<(&str, Reply)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test server");
        let addr = listener.local_addr().expect("test server addr");
        let routes: Arc<HashMap<String, Reply>> = Arc::new(
            routes
                .into_iter()
                .map(|(path, reply)| (path.to_string(), reply))
                .collect(),
        );
        let requests = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = Arc::clone(&routes);
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let _ = serve_one(stream, &routes, &log).await;
                });
            }
        });

        Self { addr, requests }
    }

    /// `http://127.0.0.1:<port>`
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Paths requested so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn serve_one(
    mut stream: TcpStream,
    routes: &HashMap<String, Reply>,
    log: &Mutex<Vec<String>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf);
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    log.lock().unwrap().push(path.clone());

    match routes.get(&path) {
        Some(Reply::Ok(body)) => {
            write_head(&mut stream, "200 OK", body.len()).await?;
            stream.write_all(body).await?;
        }
        Some(Reply::Truncated(body)) => {
            write_head(&mut stream, "200 OK", body.len() + 1024).await?;
            stream.write_all(body).await?;
        }
        Some(Reply::Silent) => {
            sleep(STALL).await;
            return Ok(());
        }
        Some(Reply::StallsAfter(body)) => {
            write_head(&mut stream, "200 OK", body.len() + 1024).await?;
            stream.write_all(body).await?;
            stream.flush().await?;
            sleep(STALL).await;
            return Ok(());
        }
        Some(Reply::NotFound) | None => {
            write_head(&mut stream, "404 Not Found", 0).await?;
        }
    }
    stream.flush().await?;
    stream.shutdown().await
}

async fn write_head(stream: &mut TcpStream, status: &str, len: usize) -> std::io::Result<()> {
    let head = format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/octet-stream\r\ncontent-length: {len}\r\nconnection: close\r\n\r\n"
    );
    stream.write_all(head.as_bytes()).await
}
