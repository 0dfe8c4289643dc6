//! Timing for remote calls.
//!
//! A [`RequestTimer`] starts when created and emits a `tracing` event with
//! the elapsed time when dropped, so every exchange is logged even when the
//! caller returns early through `?`.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::http::HttpMethod;

/// RAII timer for a single HTTP exchange.
pub struct RequestTimer<'a> {
    start: Instant,
    method: HttpMethod,
    url: &'a str,
}

impl<'a> RequestTimer<'a> {
    pub fn new(method: HttpMethod, url: &'a str) -> Self {
        Self {
            start: Instant::now(),
            method,
            url,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for RequestTimer<'_> {
    fn drop(&mut self) {
        debug!(
            event = "Http",
            phase = "Completed",
            method = %self.method,
            url = self.url,
            elapsed_ms = self.elapsed().as_secs_f64() * 1000.0
        );
    }
}
