use crate::fetcher::{errors::FetchError, pipeline::process_response, types::FeedResponse};
use once_cell::sync::Lazy;
use reqwest::{
    Client, ClientBuilder,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use std::time::Duration;
use tracing::{instrument, warn};
use url::Url;

const MAX_BODY_SIZE: u64 = 10 * 1024 * 1024; // 10MB

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/113.0.0.0 Safari/537.36";

/// Content types that cannot be a feed document. Everything else is let
/// through; plenty of servers label XML feeds as text/html or text/plain.
const BINARY_CONTENT_TYPES: [&str; 7] = [
    "image/",
    "audio/",
    "video/",
    "font/",
    "application/octet-stream",
    "application/pdf",
    "application/zip",
];

/// The header profile a desktop Chrome sends on navigation. Several feed
/// hosts serve 403s to anything that does not look like a browser.
/// Accept-Encoding is deliberately absent: reqwest manages it so that
/// transparent gzip/brotli/deflate decompression stays enabled.
fn browser_profile() -> HeaderMap {
    let pairs: [(&str, &str); 13] = [
        (
            "accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
        ),
        ("accept-language", "en-US,en;q=0.9"),
        ("cache-control", "max-age=0"),
        ("connection", "keep-alive"),
        (
            "sec-ch-ua",
            "\"Google Chrome\";v=\"113\", \"Chromium\";v=\"113\", \"Not-A.Brand\";v=\"24\"",
        ),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", "\"macOS\""),
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "none"),
        ("sec-fetch-user", "?1"),
        ("upgrade-insecure-requests", "1"),
        ("referer", "https://www.google.com/"),
    ];

    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}

fn build_client(accept_invalid_certs: bool) -> Client {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(15))
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .default_headers(browser_profile())
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
        .expect("Failed to build HTTP client")
}

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| build_client(false));

/// Client for hosts on the TLS exception list. Certificate verification is
/// off, which is why it is only ever selected through the configured
/// per-host allow-list.
static LENIENT_TLS_CLIENT: Lazy<Client> = Lazy::new(|| build_client(true));

/// Suffix match against the exception list: `feedburner.com` covers both
/// the apex host and `feeds.feedburner.com`.
pub fn host_is_tls_exempt(host: &str, tls_exempt_hosts: &[String]) -> bool {
    let host = host.to_ascii_lowercase();
    tls_exempt_hosts.iter().any(|entry| {
        let entry = entry.trim().to_ascii_lowercase();
        !entry.is_empty() && (host == entry || host.ends_with(&format!(".{entry}")))
    })
}

fn select_client(url: &Url, tls_exempt_hosts: &[String]) -> &'static Client {
    let exempt = url
        .host_str()
        .is_some_and(|host| host_is_tls_exempt(host, tls_exempt_hosts));
    if exempt {
        warn!(url = %url, "fetching with certificate verification disabled");
        &LENIENT_TLS_CLIENT
    } else {
        &HTTP_CLIENT
    }
}

#[instrument(skip_all, fields(url = %url))]
pub async fn fetch(url: &str, tls_exempt_hosts: &[String]) -> Result<FeedResponse, FetchError> {
    let parsed_url = Url::parse(url)?;
    let client = select_client(&parsed_url, tls_exempt_hosts);
    fetch_with(client, parsed_url).await
}

/// The fetch body, parameterized over the client so tests can swap in one
/// with different timeouts.
pub async fn fetch_with(client: &Client, url: Url) -> Result<FeedResponse, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(FetchError::from_reqwest_error)?;

    // Check content length before downloading
    if let Some(content_length) = response.content_length()
        && content_length > MAX_BODY_SIZE
    {
        return Err(FetchError::InvalidPayload(format!(
            "body too large ({content_length} bytes)"
        )));
    }

    let final_url = response.url().clone();
    let status = response.status();

    if !status.is_success() {
        return Err(FetchError::HttpStatus(status));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .unwrap_or("application/xml")
        .to_string();

    let lowered = content_type.to_ascii_lowercase();
    if BINARY_CONTENT_TYPES.iter().any(|p| lowered.starts_with(p)) {
        return Err(FetchError::InvalidPayload(format!(
            "binary content-type: {content_type}"
        )));
    }

    let body_bytes = response
        .bytes()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;

    // Check body size after download (in case Content-Length was missing)
    if body_bytes.len() as u64 > MAX_BODY_SIZE {
        return Err(FetchError::InvalidPayload(format!(
            "body too large ({} bytes)",
            body_bytes.len()
        )));
    }

    process_response(final_url, status, content_type, body_bytes)
}
