//! Source tag derivation from the feed URL.

use url::Url;

use crate::config::FeedSource;

const UNKNOWN_SOURCE: &str = "unknown";

/// Host suffixes with well-known tags, checked after the configured table.
const FIXED_TAGS: [(&str, &str); 4] = [
    ("theverge.com", "verge"),
    ("wired.com", "wired"),
    ("techcrunch.com", "techcrunch"),
    ("feedburner.com", "feedburner"),
];

/// Derives the source tag for a feed URL.
///
/// Configured sources win, matched by host with a leading `www.` ignored on
/// both sides. Then the fixed host table, then the first dot-label of the
/// host itself. Anything without a usable host is tagged `unknown`.
pub fn feed_source(url: &str, sources: &[FeedSource]) -> String {
    let Some(host) = bare_host(url) else {
        return UNKNOWN_SOURCE.to_string();
    };

    for source in sources {
        if bare_host(&source.url).is_some_and(|candidate| candidate == host) {
            return source.id.clone();
        }
    }

    for (suffix, tag) in FIXED_TAGS {
        if host == suffix || host.ends_with(&format!(".{suffix}")) {
            return tag.to_string();
        }
    }

    match host.split('.').next() {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => UNKNOWN_SOURCE.to_string(),
    }
}

fn bare_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}
