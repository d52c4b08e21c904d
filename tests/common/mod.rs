//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use edge_rewrite::config::EdgeConfig;
use edge_rewrite::store::{import, keys, ConfigEntry, MemoryStore};
use edge_rewrite::{HttpServer, Shutdown};

/// Start a mock origin on an ephemeral port.
///
/// `f` maps the request target (path and query) to a status. Every response
/// echoes the target as its body and carries an `x-amz-server-side-encryption`
/// header the way a storage bucket would.
pub async fn start_origin<F>(f: F) -> SocketAddr
where
    F: Fn(&str) -> u16 + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let (read, mut write) = socket.into_split();
                        let mut lines = BufReader::new(read).lines();

                        let Ok(Some(request_line)) = lines.next_line().await else {
                            return;
                        };
                        let target = request_line
                            .split_whitespace()
                            .nth(1)
                            .unwrap_or("/")
                            .to_string();
                        let mut request_id = String::new();
                        while let Ok(Some(line)) = lines.next_line().await {
                            if line.is_empty() {
                                break;
                            }
                            if let Some((name, value)) = line.split_once(':') {
                                if name.eq_ignore_ascii_case("x-request-id") {
                                    request_id = value.trim().to_string();
                                }
                            }
                        }

                        let status = f(&target);
                        let status_text = match status {
                            200 => "200 OK",
                            403 => "403 Forbidden",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nx-amz-server-side-encryption: AES256\r\nx-origin-request-id: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            target.len(),
                            request_id,
                            target
                        );
                        let _ = write.write_all(response.as_bytes()).await;
                        let _ = write.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing is listening on.
pub async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Default route table with every origin pointed at the given addresses.
pub fn config(static_origin: SocketAddr, api_origin: SocketAddr) -> EdgeConfig {
    let mut config = EdgeConfig::default();
    for origin in &mut config.origins {
        let addr = if origin.name == "api" { api_origin } else { static_origin };
        origin.url = format!("http://{}", addr);
    }
    config
}

/// Deployment store entries with the site version published.
pub fn store() -> Arc<MemoryStore> {
    let mut entries = import::default_entries();
    entries.push(ConfigEntry::new(keys::SITE_VERSION, "v1.0.0"));
    Arc::new(MemoryStore::new(entries))
}

/// Run the edge server on an ephemeral port.
pub async fn start_edge(config: EdgeConfig, store: Arc<MemoryStore>) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(&config, store).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    (addr, shutdown)
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
