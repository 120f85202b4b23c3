//! Shared HTTP Client Module
//!
//! Provides global, lazy-initialized HTTP clients with connection pooling,
//! so repeated analyses and sheet calls reuse TLS sessions instead of
//! building a client per request.

use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

/// Global HTTP client for generative model calls
///
/// - 120s ceiling; each request also carries the configured deadline
/// - small idle pool, requests are one at a time per user action
pub static GEMINI_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(120))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .build()
        .expect("Failed to create Gemini HTTP client")
});

/// Global HTTP client for spreadsheet API calls
pub static SHEETS_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(5)
        .pool_idle_timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to create Sheets HTTP client")
});

/// Get the global generative model HTTP client
#[inline]
pub fn gemini_client() -> &'static Client {
    &GEMINI_CLIENT
}

/// Get the global spreadsheet HTTP client
#[inline]
pub fn sheets_client() -> &'static Client {
    &SHEETS_CLIENT
}
