//! HTTP client for the remote document store
//!
//! Documents are addressed as `{base_url}/{path}`:
//! - `GET` returns the document as JSON, `404` when it does not exist
//! - `PUT ?merge=true|false` writes the JSON body

use super::{DocumentStore, WriteOptions};
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

#[derive(Clone)]
pub struct HttpDocumentStore {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpDocumentStore {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Build from configuration; `None` when no remote URL is configured
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>> {
        config
            .remote_url
            .as_deref()
            .map(|url| Self::new(url, config.remote_token.clone(), config.request_timeout()))
            .transpose()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn read_doc(&self, path: &str) -> Result<Option<Value>> {
        let response = self.request(reqwest::Method::GET, path).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(AppError::remote_store(format!(
                "reading {} returned {}",
                path, status
            ))),
        }
    }

    async fn write_doc(&self, path: &str, value: Value, options: WriteOptions) -> Result<()> {
        let response = self
            .request(reqwest::Method::PUT, path)
            .query(&[("merge", options.merge)])
            .json(&value)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::remote_store(format!(
                "writing {} returned {}",
                path, status
            )));
        }

        tracing::debug!("Wrote document {} (merge: {})", path, options.merge);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and hand back the request head
    async fn serve_once(response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut request = Vec::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{}/v1/", addr), handle)
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let store = HttpDocumentStore::new("https://docs.example.com/v1/", None, Duration::from_secs(1))
            .unwrap();
        assert_eq!(
            store.url("/identity/u1/settings/main"),
            "https://docs.example.com/v1/identity/u1/settings/main"
        );
    }

    #[test]
    fn test_from_config_without_url() {
        let config = AppConfig::new("/tmp".into());
        assert!(HttpDocumentStore::from_config(&config).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_missing_document() {
        let (base, server) =
            serve_once("HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                .await;
        let store = HttpDocumentStore::new(&base, Some("t0ken".to_string()), Duration::from_secs(5))
            .unwrap();

        let doc = store.read_doc("identity/u1/shifts/2024-01").await.unwrap();
        assert!(doc.is_none());

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /v1/identity/u1/shifts/2024-01 "));
        assert!(request.to_lowercase().contains("authorization: bearer t0ken"));
    }

    #[tokio::test]
    async fn test_read_existing_document() {
        let (base, _server) = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 13\r\nconnection: close\r\n\r\n{\"shifts\":[]}",
        )
        .await;
        let store = HttpDocumentStore::new(&base, None, Duration::from_secs(5)).unwrap();

        let doc = store.read_doc("identity/u1/shifts/2024-01").await.unwrap();
        assert_eq!(doc, Some(serde_json::json!({"shifts": []})));
    }

    #[tokio::test]
    async fn test_server_error_is_store_unavailable() {
        let (base, _server) = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;
        let store = HttpDocumentStore::new(&base, None, Duration::from_secs(5)).unwrap();

        let result = store.read_doc("identity/u1/settings/main").await;
        assert!(matches!(
            result,
            Err(AppError::StoreUnavailable {
                backend: "durable",
                ..
            })
        ));
    }
}
