//! Regex recovery tier for documents the XML parser rejects.
//!
//! This never fails: the worst case is a valid feed with zero items. The
//! recovered data is deliberately low-confidence; publication dates are
//! synthesized at extraction time and the description only names the
//! source URL.

use chrono::{SecondsFormat, Utc};
use regex::Regex;
use std::sync::LazyLock;

use crate::parser::model::{ParsedFeedDocument, RawFeed, RawItem};

static TITLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title>([^<]+)</title>").unwrap());

static ITEM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<item>.*?<title>([^<]+)</title>.*?<link>([^<]+)</link>.*?</item>").unwrap()
});

pub fn extract(body: &str, url: &str) -> ParsedFeedDocument {
    let title = TITLE_REGEX
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| url.to_string());

    let items = ITEM_REGEX
        .captures_iter(body)
        .filter_map(|caps| {
            let title = caps.get(1)?.as_str().to_string();
            let link = caps.get(2)?.as_str().to_string();
            Some(RawItem {
                title: Some(title),
                link: Some(link),
                pub_date: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
                ..RawItem::default()
            })
        })
        .collect();

    ParsedFeedDocument::KeyedItems {
        key: "item".to_string(),
        feed: RawFeed {
            title: Some(title),
            description: Some(format!("Feed from {url}")),
            link: Some(url.to_string()),
            items,
            ..RawFeed::default()
        },
    }
}
