//! Test doubles for the network seam.
//!
//! `MockNetwork` serves canned responses and counts calls so tests can
//! assert cache precedence as "zero network calls".

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{StatusCode, Url, header};
use shelter_client::{FetchResponse, Network};
use shelter_core::Error;

#[derive(Debug, Clone)]
struct MockRoute {
    status: u16,
    content_type: String,
    body: Vec<u8>,
    final_url: Option<String>,
}

/// In-memory `Network` implementation with canned routes.
#[derive(Default)]
pub struct MockNetwork {
    routes: HashMap<String, MockRoute>,
    failures: HashSet<String>,
    offline: bool,
    calls: AtomicUsize,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `status`/`content_type`/`body` for the given URL.
    pub fn route(mut self, url: &str, status: u16, content_type: &str, body: &[u8]) -> Self {
        self.routes.insert(
            url.to_string(),
            MockRoute { status, content_type: content_type.to_string(), body: body.to_vec(), final_url: None },
        );
        self
    }

    /// Like `route`, but report a different final URL, as after a redirect.
    pub fn redirect(mut self, url: &str, final_url: &str, status: u16, content_type: &str, body: &[u8]) -> Self {
        self.routes.insert(
            url.to_string(),
            MockRoute {
                status,
                content_type: content_type.to_string(),
                body: body.to_vec(),
                final_url: Some(final_url.to_string()),
            },
        );
        self
    }

    /// Fail this URL at the transport level.
    pub fn fail(mut self, url: &str) -> Self {
        self.failures.insert(url.to_string());
        self
    }

    /// Fail every request at the transport level.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Number of `get` calls observed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn get(&self, url: &Url) -> Result<FetchResponse, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.offline || self.failures.contains(url.as_str()) {
            return Err(Error::Network(format!("simulated transport failure for {url}")));
        }

        let route = self
            .routes
            .get(url.as_str())
            .ok_or_else(|| Error::Network(format!("no mock route for {url}")))?;

        let final_url = match &route.final_url {
            Some(f) => Url::parse(f).expect("mock final url must parse"),
            None => url.clone(),
        };

        Ok(FetchResponse {
            url: url.clone(),
            final_url,
            status: StatusCode::from_u16(route.status).expect("mock status must be valid"),
            content_type: Some(route.content_type.clone()),
            bytes: Bytes::from(route.body.clone()),
            headers: header::HeaderMap::new(),
            fetch_ms: 0,
        })
    }
}
