//! Transport seam
//!
//! The transport is an external collaborator: it turns a locator into raw
//! bytes and raises on unrecoverable failure. Clients translate its failures
//! into the engine error model (404 means the entity is absent, everything
//! else is a transport failure).

use albumfetch_base::{EngineError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, locator: &str) -> Result<Bytes>;
}

/// hyper-backed transport for `http`/`https` locators.
#[derive(Default)]
pub struct HttpTransport {
    headers: HashMap<String, String>,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, locator: &str) -> Result<Bytes> {
        let uri: hyper::Uri = locator
            .parse()
            .map_err(|e| EngineError::transport(format!("invalid locator {}: {}", locator, e)))?;
        let res = albumfetch_utils::get(uri, &self.headers)
            .await
            .map_err(|e| EngineError::transport(format!("request to {} failed: {}", locator, e)))?;
        if res.status == 404 {
            return Err(EngineError::not_found(format!("{} returned 404", locator)));
        }
        if !albumfetch_utils::http_status_is_ok(res.status) {
            return Err(EngineError::transport(format!(
                "request to {} failed with status {}",
                locator, res.status
            )));
        }
        Ok(res.body.unwrap_or_default())
    }
}

/// In-memory transport serving canned pages; the standard test double and
/// demo backend. Tracks per-locator hit counts and supports fault injection.
#[derive(Default)]
pub struct MemoryTransport {
    pages: HashMap<String, Bytes>,
    failing: HashSet<String>,
    hits: Mutex<HashMap<String, usize>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, locator: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.pages.insert(locator.into(), body.into());
        self
    }

    /// Make every request for this locator fail with a transport error.
    pub fn failing(mut self, locator: impl Into<String>) -> Self {
        self.failing.insert(locator.into());
        self
    }

    /// Number of times a locator has been requested.
    pub fn hits(&self, locator: &str) -> usize {
        *self.hits.lock().unwrap().get(locator).unwrap_or(&0)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn get(&self, locator: &str) -> Result<Bytes> {
        {
            let mut hits = self.hits.lock().unwrap();
            *hits.entry(locator.to_string()).or_insert(0) += 1;
        }
        if self.failing.contains(locator) {
            return Err(EngineError::transport(format!(
                "injected failure for {}",
                locator
            )));
        }
        self.pages
            .get(locator)
            .cloned()
            .ok_or_else(|| EngineError::not_found(format!("{} has no content", locator)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use albumfetch_base::ErrorKind;

    #[tokio::test]
    async fn test_memory_transport_serves_and_counts() {
        let transport = MemoryTransport::new().insert("a", "hello");
        assert_eq!(transport.get("a").await.unwrap(), Bytes::from("hello"));
        assert_eq!(transport.get("a").await.unwrap(), Bytes::from("hello"));
        assert_eq!(transport.hits("a"), 2);
        assert_eq!(transport.hits("b"), 0);
    }

    #[tokio::test]
    async fn test_memory_transport_missing_is_not_found() {
        let transport = MemoryTransport::new();
        let err = transport.get("nowhere").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_memory_transport_fault_injection() {
        let transport = MemoryTransport::new().insert("a", "x").failing("a");
        let err = transport.get("a").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transport);
        assert_eq!(transport.hits("a"), 1);
    }

    #[tokio::test]
    async fn test_http_transport_rejects_bad_locator() {
        let transport = HttpTransport::new();
        let err = transport.get("not a locator").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transport);
    }
}
