//! Collapses every parsed document shape into the canonical feed schema.
//!
//! The parser is lossless and keeps synonymous fields apart; this module
//! resolves them with fixed priority orders, enforces per-feed id
//! uniqueness, and tags the feed and every item with a source label.

pub mod model;
pub mod source;

pub use model::{CanonicalFeed, CanonicalItem};
pub use source::feed_source;

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{SecondsFormat, Utc};
use regex::Regex;

use crate::config::FeedSource;
use crate::parser::{ParsedFeedDocument, RawItem};

const DEFAULT_FEED_TITLE: &str = "Unknown Feed";
const DEFAULT_ITEM_TITLE: &str = "Untitled Item";
const DEFAULT_AUTHOR: &str = "Unknown";

static IMG_SRC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img[^>]+src="([^">]+)""#).unwrap());

/// Maps a parsed document onto the canonical schema: envelope per shape,
/// synonym fields resolved first match wins, ids unique within the feed.
pub fn normalize(
    doc: ParsedFeedDocument,
    source_url: &str,
    sources: &[FeedSource],
) -> CanonicalFeed {
    let source = feed_source(source_url, sources);
    let (title, description, link, raw_items) = match doc {
        ParsedFeedDocument::RssChannel(feed) | ParsedFeedDocument::BareChannel(feed) => {
            (feed.title, feed.description, feed.link, feed.items)
        }
        ParsedFeedDocument::AtomFeed(feed) => (
            feed.title,
            feed.subtitle.or(feed.description),
            feed.link,
            feed.items,
        ),
        ParsedFeedDocument::KeyedItems { feed, .. } => {
            (feed.title, feed.description, feed.link, feed.items)
        }
        ParsedFeedDocument::ItemSequence(items) => (None, None, None, items),
    };

    CanonicalFeed {
        title: title.unwrap_or_else(|| DEFAULT_FEED_TITLE.to_string()),
        description: description.unwrap_or_default(),
        link: link.unwrap_or_else(|| source_url.to_string()),
        items: normalize_items(raw_items, &source),
        source,
    }
}

fn normalize_items(raw_items: Vec<RawItem>, source: &str) -> Vec<CanonicalItem> {
    let now = Utc::now();
    let now_rfc3339 = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    let now_millis = now.timestamp_millis();
    let mut seen_ids = HashSet::new();
    raw_items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            canonicalize(item, index, now_millis, &now_rfc3339, source, &mut seen_ids)
        })
        .collect()
}

fn canonicalize(
    item: RawItem,
    index: usize,
    now_millis: i64,
    now_rfc3339: &str,
    source: &str,
    seen_ids: &mut HashSet<String>,
) -> CanonicalItem {
    // Resolved before the content fields below are moved out of `item`.
    let thumbnail = resolve_thumbnail(&item);

    let base_id = item
        .guid
        .or(item.id)
        .or_else(|| item.link.clone())
        .unwrap_or_else(|| format!("item-{index}-{now_millis}"));
    let id = unique_id(base_id, index, seen_ids);

    let content = first_non_empty([
        item.content_encoded,
        item.content,
        item.content_snippet,
        item.description,
        item.summary,
    ])
    .unwrap_or_default();

    let pub_date = first_non_empty([item.pub_date, item.iso_date, item.published, item.updated])
        .unwrap_or_else(|| now_rfc3339.to_string());

    let author = first_non_empty([item.creator, item.author_name, item.author])
        .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());

    CanonicalItem {
        id,
        title: item
            .title
            .unwrap_or_else(|| DEFAULT_ITEM_TITLE.to_string()),
        content,
        link: item.link.unwrap_or_default(),
        pub_date,
        author,
        categories: item.categories,
        thumbnail,
        source: source.to_string(),
    }
}

/// Guarantees ids are pairwise distinct within one feed. Duplicates get a
/// numeric suffix starting at the item's own position, which keeps the
/// result deterministic across repeated fetches of the same document.
fn unique_id(base: String, index: usize, seen: &mut HashSet<String>) -> String {
    if seen.insert(base.clone()) {
        return base;
    }
    let mut suffix = index;
    loop {
        let candidate = format!("{base}-{suffix}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        suffix += 1;
    }
}

fn first_non_empty<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
}

/// media:content, then media:thumbnail, then enclosure, then the first
/// `<img src>` inside whichever content field would be rendered.
fn resolve_thumbnail(item: &RawItem) -> Option<String> {
    if let Some(media) = &item.media_content {
        return Some(media.url.clone());
    }
    if let Some(media) = &item.media_thumbnail {
        return Some(media.url.clone());
    }
    if let Some(media) = &item.enclosure {
        return Some(media.url.clone());
    }
    let html = item
        .content_encoded
        .as_deref()
        .or(item.content.as_deref())
        .or(item.description.as_deref())?;
    let caps = IMG_SRC_REGEX.captures(html)?;
    Some(caps[1].to_string())
}
