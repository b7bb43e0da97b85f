//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use tracelink::config::{ServiceConfig, ServiceRole};
use tracelink::trace::MemorySink;
use tracelink::{ServiceServer, Shutdown};

/// A running pair of services sharing one span sink.
pub struct Stack {
    pub user_url: String,
    pub catalog_url: String,
    pub spans: Arc<MemorySink>,
    pub shutdown: Shutdown,
}

/// Serve `config` on an ephemeral port. Returns the base URL.
pub async fn spawn_service(
    mut config: ServiceConfig,
    sink: Arc<MemorySink>,
    shutdown: &Shutdown,
) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let server = ServiceServer::new(config, sink).unwrap();
    let stop = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, stop).await;
    });
    format!("http://{}", addr)
}

/// Start the user service against `catalog_url`.
pub async fn start_user_service(
    catalog_url: &str,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (String, Arc<MemorySink>, Shutdown) {
    let sink = Arc::new(MemorySink::new());
    let shutdown = Shutdown::new();
    let mut config = ServiceConfig::for_role(ServiceRole::User);
    config.downstream.catalog_url = catalog_url.to_string();
    configure(&mut config);
    let url = spawn_service(config, sink.clone(), &shutdown).await;
    (url, sink, shutdown)
}

/// Start catalog and user services wired together.
pub async fn start_stack() -> Stack {
    let spans = Arc::new(MemorySink::new());
    let shutdown = Shutdown::new();

    let catalog_url = spawn_service(
        ServiceConfig::for_role(ServiceRole::Catalog),
        spans.clone(),
        &shutdown,
    )
    .await;

    let mut user = ServiceConfig::for_role(ServiceRole::User);
    user.downstream.catalog_url = catalog_url.clone();
    let user_url = spawn_service(user, spans.clone(), &shutdown).await;

    Stack {
        user_url,
        catalog_url,
        spans,
        shutdown,
    }
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Raw requests seen by a programmable backend.
pub type Seen = Arc<Mutex<Vec<String>>>;

/// Start a raw-TCP backend on an ephemeral port. `f` produces the status and
/// JSON body for each request and may sleep to simulate a slow peer.
pub async fn start_programmable_backend<F, Fut>(f: F) -> (SocketAddr, Seen)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let log = seen.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let log = log.clone();
                    tokio::spawn(async move {
                        let head = read_head(&mut socket).await;
                        log.lock().unwrap().push(head);

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });
    (addr, seen)
}

async fn read_head(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Header value from a raw request head, matched case-insensitively.
pub fn header_value(head: &str, name: &str) -> Option<String> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().to_string())
    })
}
