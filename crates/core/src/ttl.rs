//! Store-time stamping and staleness checks for TTL-bound entries.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use crate::http::Response;

/// Header carrying the store time in epoch milliseconds.
pub const STORED_AT_HEADER: &str = "sw-cached-at";

/// Source of the current time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self { now: Arc::new(AtomicI64::new(start_millis)) }
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(millis(by), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Copy of `response` carrying a store-time stamp of `now_millis`.
///
/// The input is left untouched.
pub fn stamp_now(response: &Response, now_millis: i64) -> Response {
    let mut stamped = response.duplicate();
    stamped.headers.set(STORED_AT_HEADER, now_millis.to_string());
    stamped
}

/// Store time of a stamped response.
pub fn stored_at(response: &Response) -> Option<i64> {
    response
        .headers
        .get(STORED_AT_HEADER)
        .and_then(|v| v.trim().parse::<i64>().ok())
}

/// `now - stored_at <= max_age`. An entry without a readable stamp is stale.
pub fn is_fresh(response: &Response, max_age: Duration, now_millis: i64) -> bool {
    match stored_at(response) {
        Some(at) => now_millis.saturating_sub(at) <= millis(max_age),
        None => false,
    }
}

/// Whole milliseconds in `d`, saturating at `i64::MAX`.
fn millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}
