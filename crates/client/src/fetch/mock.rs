//! Scripted network for tests and offline demos.
//!
//! Routes are keyed by absolute URL. Unrouted URLs answer 404, the way an
//! origin would for a missing file. Every call is counted.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;

use super::Network;
use depot_core::{Error, Headers, Request, Response};

#[derive(Debug, Clone)]
enum Reply {
    Respond { status: u16, headers: Headers, body: Bytes },
    Fail(String),
}

#[derive(Debug, Default)]
pub struct MockNetwork {
    routes: Mutex<HashMap<String, Reply>>,
    counts: Mutex<HashMap<String, usize>>,
    calls: AtomicUsize,
    offline: AtomicBool,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with `status` and a body.
    pub fn respond(&self, url: &str, status: u16, body: impl Into<Bytes>) -> &Self {
        self.respond_with_headers(url, status, Headers::new(), body)
    }

    pub fn respond_with_headers(&self, url: &str, status: u16, headers: Headers, body: impl Into<Bytes>) -> &Self {
        self.routes()
            .insert(url.to_string(), Reply::Respond { status, headers, body: body.into() });
        self
    }

    /// Fail every request for `url` with a network error.
    pub fn fail(&self, url: &str) -> &Self {
        self.routes()
            .insert(url.to_string(), Reply::Fail(format!("connection reset fetching {url}")));
        self
    }

    /// Fail every request while set, regardless of routes.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Total number of fetches.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of fetches for one URL.
    pub fn calls_for(&self, url: &str) -> usize {
        self.counts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    fn routes(&self) -> std::sync::MutexGuard<'_, HashMap<String, Reply>> {
        self.routes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url.as_str().to_string();
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .counts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(url.clone())
            .or_default() += 1;

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline fetching {url}")));
        }

        let reply = self.routes().get(&url).cloned();
        match reply {
            Some(Reply::Respond { status, headers, body }) => Ok(Response::new(status, reason(status), headers, body)),
            Some(Reply::Fail(msg)) => Err(Error::Network(msg)),
            None => Ok(Response::text(404, "Not Found", "Not Found")),
        }
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        304 => "Not Modified",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "",
    }
}
