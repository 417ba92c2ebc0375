//! Declarative field tables: which XML elements feed which raw fields.
//!
//! Dialect elements (RSS 2.0, RSS 1.0, Atom) are matched by local name in
//! any of the dialect namespaces, because Atom and RSS 1.0 put their whole
//! vocabulary in a default namespace. Extension elements (itunes, media,
//! dc, content) are matched by namespace URI so that prefixed documents
//! resolve correctly no matter which prefix they declare.

pub const NS_ATOM: &str = "http://www.w3.org/2005/Atom";
pub const NS_RSS10: &str = "http://purl.org/rss/1.0/";
pub const NS_ITUNES: &str = "http://www.itunes.com/dtds/podcast-1.0.dtd";
pub const NS_MEDIA: &str = "http://search.yahoo.com/mrss/";
pub const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
pub const NS_CONTENT: &str = "http://purl.org/rss/1.0/modules/content/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedField {
    Title,
    Description,
    Subtitle,
    Link,
    Icon,
    Logo,
    Updated,
    Generator,
    Language,
    ItunesAuthor,
    ItunesSummary,
    ItunesImage,
    ItunesCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Guid,
    Id,
    Title,
    Link,
    ContentEncoded,
    Content,
    Description,
    Summary,
    PubDate,
    Published,
    Updated,
    Creator,
    Author,
    Category,
    Enclosure,
    MediaContent,
    MediaThumbnail,
    MediaDescription,
    MediaGroup,
    ItunesDuration,
    ItunesEpisode,
    ItunesSeason,
    ItunesExplicit,
}

/// One row of a field table. `namespace: None` means "any dialect
/// namespace"; `Some(uri)` requires that exact extension namespace.
pub struct FieldRule<F: 'static> {
    pub namespace: Option<&'static str>,
    pub local: &'static str,
    pub field: F,
}

const fn rule<F>(namespace: Option<&'static str>, local: &'static str, field: F) -> FieldRule<F> {
    FieldRule {
        namespace,
        local,
        field,
    }
}

pub const FEED_FIELDS: &[FieldRule<FeedField>] = &[
    rule(None, "title", FeedField::Title),
    rule(None, "description", FeedField::Description),
    rule(None, "subtitle", FeedField::Subtitle),
    rule(None, "link", FeedField::Link),
    rule(None, "icon", FeedField::Icon),
    rule(None, "logo", FeedField::Logo),
    rule(None, "updated", FeedField::Updated),
    rule(None, "generator", FeedField::Generator),
    rule(None, "language", FeedField::Language),
    rule(Some(NS_ITUNES), "author", FeedField::ItunesAuthor),
    rule(Some(NS_ITUNES), "summary", FeedField::ItunesSummary),
    rule(Some(NS_ITUNES), "image", FeedField::ItunesImage),
    rule(Some(NS_ITUNES), "category", FeedField::ItunesCategory),
];

pub const ITEM_FIELDS: &[FieldRule<ItemField>] = &[
    rule(None, "guid", ItemField::Guid),
    rule(None, "id", ItemField::Id),
    rule(None, "title", ItemField::Title),
    rule(None, "link", ItemField::Link),
    rule(Some(NS_CONTENT), "encoded", ItemField::ContentEncoded),
    rule(None, "content", ItemField::Content),
    rule(None, "description", ItemField::Description),
    rule(None, "summary", ItemField::Summary),
    rule(None, "pubDate", ItemField::PubDate),
    rule(None, "published", ItemField::Published),
    rule(None, "updated", ItemField::Updated),
    rule(Some(NS_DC), "creator", ItemField::Creator),
    rule(None, "creator", ItemField::Creator),
    rule(None, "author", ItemField::Author),
    rule(None, "category", ItemField::Category),
    rule(None, "enclosure", ItemField::Enclosure),
    rule(Some(NS_MEDIA), "content", ItemField::MediaContent),
    rule(Some(NS_MEDIA), "thumbnail", ItemField::MediaThumbnail),
    rule(Some(NS_MEDIA), "description", ItemField::MediaDescription),
    rule(Some(NS_MEDIA), "group", ItemField::MediaGroup),
    rule(Some(NS_ITUNES), "duration", ItemField::ItunesDuration),
    rule(Some(NS_ITUNES), "episode", ItemField::ItunesEpisode),
    rule(Some(NS_ITUNES), "season", ItemField::ItunesSeason),
    rule(Some(NS_ITUNES), "explicit", ItemField::ItunesExplicit),
];

pub fn is_dialect_ns(ns: Option<&str>) -> bool {
    matches!(ns, None | Some(NS_ATOM) | Some(NS_RSS10))
}

fn lookup<F: Copy>(rules: &[FieldRule<F>], ns: Option<&str>, local: &str) -> Option<F> {
    rules
        .iter()
        .find(|rule| {
            rule.local == local
                && match rule.namespace {
                    Some(required) => ns == Some(required),
                    None => is_dialect_ns(ns),
                }
        })
        .map(|rule| rule.field)
}

pub fn classify_feed_field(ns: Option<&str>, local: &str) -> Option<FeedField> {
    lookup(FEED_FIELDS, ns, local)
}

pub fn classify_item_field(ns: Option<&str>, local: &str) -> Option<ItemField> {
    lookup(ITEM_FIELDS, ns, local)
}
