//! Minimal HTTP/1.1 endpoint layer.
//!
//! Three fixed JSON routes for a localhost dashboard do not warrant a server
//! framework; requests are parsed off the socket directly. Every response
//! carries `Cache-Control: no-store` so freshness decisions stay with the
//! snapshot service instead of some intermediary cache.

use crate::core::Payload;
use crate::service::SnapshotService;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// Hard cap on the request head. Bodies are ignored, so anything a client
/// sends past this is never needed.
const MAX_HEAD_BYTES: usize = 8 * 1024;

pub struct ApiServer {
    listener: TcpListener,
    service: Arc<SnapshotService>,
}

impl ApiServer {
    pub async fn bind(addr: &str, service: Arc<SnapshotService>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        Ok(ApiServer { listener, service })
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to read local address")
    }

    /// Accept loop; one spawned task per connection.
    pub async fn run(self) -> Result<()> {
        info!("Listening on {}", self.local_addr()?);
        loop {
            let (stream, peer) = self
                .listener
                .accept()
                .await
                .context("Failed to accept connection")?;
            let service = self.service.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, service).await {
                    debug!("Connection from {} failed: {:#}", peer, e);
                }
            });
        }
    }
}

async fn handle_connection(mut stream: TcpStream, service: Arc<SnapshotService>) -> Result<()> {
    let head = read_head(&mut stream).await?;
    let response = match parse_request_line(&head) {
        Some((method, path)) => route(method, path, &service).await,
        None => json_response(400, "Bad Request", br#"{"message":"Bad request"}"#.to_vec()),
    };
    stream
        .write_all(&response)
        .await
        .context("Failed to write response")?;
    stream.shutdown().await.context("Failed to close stream")?;
    Ok(())
}

async fn read_head(stream: &mut TcpStream) -> Result<String> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream
            .read(&mut chunk)
            .await
            .context("Failed to read request")?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") || buf.len() >= MAX_HEAD_BYTES {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Method and path of the request line; the query string is not part of
/// routing.
fn parse_request_line(head: &str) -> Option<(&str, &str)> {
    let line = head.lines().next()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let target = parts.next()?;
    let path = target.split('?').next()?;
    Some((method, path))
}

async fn route(method: &str, path: &str, service: &SnapshotService) -> Vec<u8> {
    match (method, path) {
        ("GET", "/api/data") => payload_response(service.current().await),
        ("POST", "/api/refresh") => payload_response(service.refresh().await),
        ("GET", "/api/health") => json_response(200, "OK", br#"{"status":"ok"}"#.to_vec()),
        _ => json_response(404, "Not Found", br#"{"message":"Not found"}"#.to_vec()),
    }
}

fn payload_response(result: Result<Payload>) -> Vec<u8> {
    let body = result.and_then(|payload| {
        serde_json::to_vec(&payload).context("Failed to serialize payload")
    });
    match body {
        Ok(body) => json_response(200, "OK", body),
        Err(e) => {
            warn!("Request failed: {:#}", e);
            json_response(
                500,
                "Internal Server Error",
                br#"{"message":"Internal server error"}"#.to_vec(),
            )
        }
    }
}

fn json_response(status: u16, reason: &str, body: Vec<u8>) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: application/json; charset=utf-8\r\n\
         Cache-Control: no-store\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(&body);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::PayloadBuilder;
    use crate::store::MemoryStore;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingBuilder {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl PayloadBuilder for CountingBuilder {
        async fn build_payload(&self) -> Result<Payload> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(anyhow!("provider unreachable"));
            }
            Ok(Payload {
                last_updated: Utc::now(),
                funds: vec![],
                plans: vec![],
            })
        }
    }

    async fn spawn_server(fail: bool) -> (String, Arc<CountingBuilder>) {
        let builder = Arc::new(CountingBuilder {
            calls: AtomicUsize::new(0),
            fail,
        });
        let service = Arc::new(SnapshotService::new(
            builder.clone(),
            Arc::new(MemoryStore::new()),
        ));
        let server = ApiServer::bind("127.0.0.1:0", service).await.unwrap();
        let url = format!("http://{}", server.local_addr().unwrap());
        tokio::spawn(server.run());
        (url, builder)
    }

    #[tokio::test]
    async fn test_health() {
        let (url, _) = spawn_server(false).await;
        let response = reqwest::get(format!("{url}/api/health")).await.unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers()["cache-control"].to_str().unwrap(),
            "no-store"
        );
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "application/json; charset=utf-8"
        );
        assert_eq!(response.text().await.unwrap(), r#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn test_data_serves_payload_and_caches_it() {
        let (url, builder) = spawn_server(false).await;

        let first = reqwest::get(format!("{url}/api/data")).await.unwrap();
        assert_eq!(first.status(), 200);
        let payload: Payload = first.json().await.unwrap();
        assert!(payload.funds.is_empty());

        let second = reqwest::get(format!("{url}/api/data")).await.unwrap();
        assert_eq!(second.status(), 200);
        assert_eq!(builder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refresh_rebuilds_every_time() {
        let (url, builder) = spawn_server(false).await;
        let client = reqwest::Client::new();

        for _ in 0..2 {
            let response = client
                .post(format!("{url}/api/refresh"))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), 200);
        }
        assert_eq!(builder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_query_strings_are_ignored_for_routing() {
        let (url, _) = spawn_server(false).await;
        let response = reqwest::get(format!("{url}/api/data?verbose=1")).await.unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_unknown_routes_and_methods_get_404() {
        let (url, _) = spawn_server(false).await;
        let client = reqwest::Client::new();

        let response = reqwest::get(format!("{url}/nope")).await.unwrap();
        assert_eq!(response.status(), 404);
        assert_eq!(
            response.text().await.unwrap(),
            r#"{"message":"Not found"}"#
        );

        // Refresh is POST-only, data is GET-only.
        let response = client.post(format!("{url}/api/data")).send().await.unwrap();
        assert_eq!(response.status(), 404);
        let response = reqwest::get(format!("{url}/api/refresh")).await.unwrap();
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_build_failure_maps_to_500() {
        let (url, _) = spawn_server(true).await;
        let response = reqwest::get(format!("{url}/api/data")).await.unwrap();

        assert_eq!(response.status(), 500);
        assert_eq!(
            response.text().await.unwrap(),
            r#"{"message":"Internal server error"}"#
        );
    }
}
