use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

const APP_USER_AGENT: &str = "AshLauncher/0.1.0";

/// Shared client for downloads and the auth relay.
///
/// Only the connect phase is bounded here; auth requests add their own
/// per-call timeout and downloads may legitimately run for minutes.
pub fn build_http_client(connect_timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(connect_timeout)
        .build()
}
