pub mod fallback;
pub mod fields;
pub mod model;

pub use model::{FeedShape, MediaRef, ParseError, ParsedFeedDocument, RawFeed, RawItem};

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use roxmltree::{Document, Node, ParsingOptions};
use scraper::Html;
use std::sync::LazyLock;

use fields::{FeedField, ItemField, classify_feed_field, classify_item_field, is_dialect_ns};

/// Item element names probed, in order, when the envelope is not a
/// recognized dialect.
pub const ITEM_KEYS: [&str; 4] = ["entry", "item", "post", "article"];

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

pub fn parse(body: &str) -> Result<ParsedFeedDocument, ParseError> {
    // DTDs are allowed for the internal entity subsets podcast feeds carry;
    // roxmltree never resolves external entities.
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(body, options)?;
    let root = doc.root_element();

    let shape = detect_shape(root).ok_or_else(|| ParseError::MalformedXml {
        message: format!(
            "unrecognized feed document with root <{}>",
            root.tag_name().name()
        ),
    })?;

    Ok(match shape {
        FeedShape::RssChannel => {
            let channel =
                first_child_element(root, "channel").ok_or_else(|| ParseError::MalformedXml {
                    message: "rss document has no channel".to_string(),
                })?;
            ParsedFeedDocument::RssChannel(read_feed(channel, "item"))
        }
        FeedShape::AtomFeed => ParsedFeedDocument::AtomFeed(read_feed(root, "entry")),
        FeedShape::BareChannel => {
            let channel = if root.tag_name().name() == "channel" {
                root
            } else {
                first_child_element(root, "channel").unwrap_or(root)
            };
            let mut feed = read_feed(channel, "item");
            if channel != root {
                // RSS 1.0 places items beside the channel, not inside it
                collect_items(root, "item", &mut feed.items);
            }
            ParsedFeedDocument::BareChannel(feed)
        }
        FeedShape::KeyedItems(key) => ParsedFeedDocument::KeyedItems {
            key: key.to_string(),
            feed: read_feed(root, key),
        },
        FeedShape::ItemSequence => ParsedFeedDocument::ItemSequence(vec![read_item(root)]),
    })
}

/// The single place document layout is decided. Rules run in a fixed
/// priority order; the first hit wins, and `None` means the document is
/// not a feed we recognize (the caller surfaces that as malformed).
pub fn detect_shape(root: Node<'_, '_>) -> Option<FeedShape> {
    let root_name = root.tag_name().name();

    // 1. RSS 2.0: <rss> wrapping a <channel>. An <rss> root without a
    //    channel is malformed rather than a candidate for later rules.
    if root_name == "rss" {
        return has_child_element(root, "channel").then_some(FeedShape::RssChannel);
    }

    // 2. Atom: a <feed> root
    if root_name == "feed" {
        return Some(FeedShape::AtomFeed);
    }

    // 3. A bare <channel> root, or a wrapper like rdf:RDF holding one
    if root_name == "channel" || has_child_element(root, "channel") {
        return Some(FeedShape::BareChannel);
    }

    // 4. Unknown envelope with a recognizable repeated item element
    for key in ITEM_KEYS {
        if has_child_element(root, key) {
            return Some(FeedShape::KeyedItems(key));
        }
    }

    // 5. The document itself is an item
    if root_name == "item" || root_name == "entry" {
        return Some(FeedShape::ItemSequence);
    }

    None
}

fn read_feed(envelope: Node<'_, '_>, item_name: &str) -> RawFeed {
    let mut feed = RawFeed::default();
    let mut saw_alternate_link = false;

    for child in envelope.children().filter(|c| c.is_element()) {
        if is_dialect_element(child, item_name) {
            feed.items.push(read_item(child));
            continue;
        }

        let tag = child.tag_name();
        let Some(field) = classify_feed_field(tag.namespace(), tag.name()) else {
            continue;
        };

        match field {
            FeedField::Title => fill(&mut feed.title, element_text(child)),
            FeedField::Description => fill(&mut feed.description, content_text(child)),
            FeedField::Subtitle => fill(&mut feed.subtitle, element_text(child)),
            FeedField::Link => offer_link(&mut feed.link, &mut saw_alternate_link, child),
            FeedField::Icon => fill(&mut feed.icon, element_text(child)),
            FeedField::Logo => fill(&mut feed.logo, element_text(child)),
            FeedField::Updated => fill(&mut feed.updated, element_text(child)),
            FeedField::Generator => fill(&mut feed.generator, element_text(child)),
            FeedField::Language => fill(&mut feed.language, element_text(child)),
            FeedField::ItunesAuthor => fill(&mut feed.itunes_author, element_text(child)),
            FeedField::ItunesSummary => fill(&mut feed.itunes_summary, content_text(child)),
            FeedField::ItunesImage => fill(
                &mut feed.itunes_image,
                attr_value(child, "href")
                    .or_else(|| attr_value(child, "url"))
                    .or_else(|| element_text(child)),
            ),
            FeedField::ItunesCategory => {
                collect_itunes_categories(child, &mut feed.itunes_categories)
            }
        }
    }

    feed
}

fn collect_items(parent: Node<'_, '_>, item_name: &str, out: &mut Vec<RawItem>) {
    for child in parent
        .children()
        .filter(|c| is_dialect_element(*c, item_name))
    {
        out.push(read_item(child));
    }
}

fn read_item(node: Node<'_, '_>) -> RawItem {
    let mut item = RawItem::default();
    let mut saw_alternate_link = false;

    for child in node.children().filter(|c| c.is_element()) {
        let tag = child.tag_name();
        let Some(field) = classify_item_field(tag.namespace(), tag.name()) else {
            continue;
        };

        match field {
            ItemField::Guid => fill(&mut item.guid, element_text(child)),
            ItemField::Id => fill(&mut item.id, element_text(child)),
            ItemField::Title => fill(&mut item.title, element_text(child)),
            ItemField::Link => offer_link(&mut item.link, &mut saw_alternate_link, child),
            ItemField::ContentEncoded => fill(&mut item.content_encoded, content_text(child)),
            ItemField::Content => fill(&mut item.content, content_text(child)),
            ItemField::Description => fill(&mut item.description, content_text(child)),
            ItemField::Summary => fill(&mut item.summary, content_text(child)),
            ItemField::PubDate => fill(&mut item.pub_date, element_text(child)),
            ItemField::Published => fill(&mut item.published, element_text(child)),
            ItemField::Updated => fill(&mut item.updated, element_text(child)),
            ItemField::Creator => fill(&mut item.creator, element_text(child)),
            ItemField::Author => read_author(child, &mut item),
            ItemField::Category => {
                if let Some(category) = category_value(child) {
                    item.categories.push(category);
                }
            }
            ItemField::Enclosure => fill(&mut item.enclosure, media_ref(child)),
            ItemField::MediaContent => fill(&mut item.media_content, media_ref(child)),
            ItemField::MediaThumbnail => fill(&mut item.media_thumbnail, media_ref(child)),
            ItemField::MediaDescription => fill(&mut item.media_description, content_text(child)),
            ItemField::MediaGroup => fold_media_group(child, &mut item),
            ItemField::ItunesDuration => fill(&mut item.itunes_duration, element_text(child)),
            ItemField::ItunesEpisode => fill(&mut item.itunes_episode, element_text(child)),
            ItemField::ItunesSeason => fill(&mut item.itunes_season, element_text(child)),
            ItemField::ItunesExplicit => fill(&mut item.itunes_explicit, element_text(child)),
        }
    }

    item.content_snippet = derive_snippet(&item);
    item.iso_date = derive_iso_date(&item);
    item
}

/// Media RSS allows grouping alternates under <media:group>; fold the
/// group's members into the item itself.
fn fold_media_group(group: Node<'_, '_>, item: &mut RawItem) {
    for child in group.children().filter(|c| c.is_element()) {
        let tag = child.tag_name();
        match classify_item_field(tag.namespace(), tag.name()) {
            Some(ItemField::MediaContent) => fill(&mut item.media_content, media_ref(child)),
            Some(ItemField::MediaThumbnail) => fill(&mut item.media_thumbnail, media_ref(child)),
            Some(ItemField::MediaDescription) => {
                fill(&mut item.media_description, content_text(child))
            }
            _ => {}
        }
    }
}

fn read_author(node: Node<'_, '_>, item: &mut RawItem) {
    // Atom nests <name> inside <author>; RSS 2.0 authors are plain text
    if let Some(name) = first_child_element(node, "name").and_then(element_text) {
        fill(&mut item.author_name, Some(name));
    } else {
        fill(&mut item.author, element_text(node));
    }
}

/// itunes:category elements nest and keep their value in a text attribute.
fn collect_itunes_categories(node: Node<'_, '_>, out: &mut Vec<String>) {
    for category in node.descendants().filter(|n| {
        n.is_element()
            && n.tag_name().namespace() == Some(fields::NS_ITUNES)
            && n.tag_name().name() == "category"
    }) {
        if let Some(text) = attr_value(category, "text").or_else(|| element_text(category)) {
            out.push(text);
        }
    }
}

fn is_dialect_element(node: Node<'_, '_>, local: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local
        && is_dialect_ns(node.tag_name().namespace())
}

fn first_child_element<'a, 'input>(
    node: Node<'a, 'input>,
    local: &str,
) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| is_dialect_element(*child, local))
}

fn has_child_element(node: Node<'_, '_>, local: &str) -> bool {
    first_child_element(node, local).is_some()
}

/// Repeated fields keep their first non-empty occurrence.
fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

/// Atom documents carry several <link> elements; prefer rel="alternate"
/// (or an unqualified link) over rel="self" and friends, falling back to
/// whichever came first.
fn offer_link(slot: &mut Option<String>, saw_alternate: &mut bool, node: Node<'_, '_>) {
    let Some(value) = link_value(node) else {
        return;
    };
    if *saw_alternate {
        return;
    }
    let alternate = matches!(node.attribute("rel"), None | Some("alternate"));
    if slot.is_none() || alternate {
        *slot = Some(value);
        *saw_alternate = alternate;
    }
}

fn link_value(node: Node<'_, '_>) -> Option<String> {
    attr_value(node, "href").or_else(|| element_text(node))
}

fn category_value(node: Node<'_, '_>) -> Option<String> {
    attr_value(node, "term").or_else(|| element_text(node))
}

fn media_ref(node: Node<'_, '_>) -> Option<MediaRef> {
    let url = attr_value(node, "url").or_else(|| attr_value(node, "href"))?;
    let length = node
        .attribute("length")
        .or_else(|| node.attribute("fileSize"))
        .and_then(|raw| raw.trim().parse().ok());
    Some(MediaRef {
        url,
        mime_type: attr_value(node, "type"),
        length,
    })
}

fn attr_value(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Concatenated direct text and CDATA children, trimmed. roxmltree keeps
/// adjacent text and CDATA as separate nodes, so `Node::text` alone would
/// drop everything after the first one.
fn element_text(node: Node<'_, '_>) -> Option<String> {
    let mut out = String::new();
    for child in node.children().filter(|c| c.is_text()) {
        if let Some(text) = child.text() {
            out.push_str(text);
        }
    }
    let trimmed = out.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Like `element_text`, but an Atom type="xhtml" construct keeps its markup
/// as child elements; gather their text when the direct text is empty.
fn content_text(node: Node<'_, '_>) -> Option<String> {
    element_text(node).or_else(|| {
        let gathered: String = node
            .descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect();
        let trimmed = gathered.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn derive_snippet(item: &RawItem) -> Option<String> {
    let source = item
        .content_encoded
        .as_deref()
        .or(item.content.as_deref())
        .or(item.description.as_deref())
        .or(item.summary.as_deref())?;
    let fragment = Html::parse_fragment(source);
    let text: String = fragment.root_element().text().collect();
    let collapsed = WHITESPACE_REGEX.replace_all(text.trim(), " ").to_string();
    (!collapsed.is_empty()).then_some(collapsed)
}

fn derive_iso_date(item: &RawItem) -> Option<String> {
    [
        item.pub_date.as_deref(),
        item.published.as_deref(),
        item.updated.as_deref(),
    ]
    .into_iter()
    .flatten()
    .find_map(parse_feed_date)
}

/// Feed dates are RFC 2822 in RSS and RFC 3339 in Atom; accept either and
/// render in UTC with millisecond precision.
fn parse_feed_date(raw: &str) -> Option<String> {
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|date| {
            date.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true)
        })
}
