use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed xml: {message}")]
    MalformedXml { message: String },
}

impl From<roxmltree::Error> for ParseError {
    fn from(err: roxmltree::Error) -> Self {
        Self::MalformedXml {
            message: err.to_string(),
        }
    }
}

/// A media pointer from `<enclosure>`, `<media:content>` or
/// `<media:thumbnail>`. Only recorded when a url attribute is present.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRef {
    pub url: String,
    pub mime_type: Option<String>,
    pub length: Option<u64>,
}

/// One feed entry, kept lossless: synonymous fields (description/summary,
/// pubDate/published/updated and so on) are each stored under their own
/// name. Resolving them into one canonical value is the normalizer's job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawItem {
    pub guid: Option<String>,
    pub id: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub content_encoded: Option<String>,
    pub content: Option<String>,
    /// Plain-text rendering of the best content field, whitespace collapsed.
    pub content_snippet: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub pub_date: Option<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
    /// RFC 3339 rendering of the first parseable date field.
    pub iso_date: Option<String>,
    pub creator: Option<String>,
    pub author: Option<String>,
    pub author_name: Option<String>,
    pub categories: Vec<String>,
    pub enclosure: Option<MediaRef>,
    pub media_content: Option<MediaRef>,
    pub media_thumbnail: Option<MediaRef>,
    pub media_description: Option<String>,
    pub itunes_duration: Option<String>,
    pub itunes_episode: Option<String>,
    pub itunes_season: Option<String>,
    pub itunes_explicit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub subtitle: Option<String>,
    pub link: Option<String>,
    pub icon: Option<String>,
    pub logo: Option<String>,
    pub updated: Option<String>,
    pub generator: Option<String>,
    pub language: Option<String>,
    pub itunes_author: Option<String>,
    pub itunes_summary: Option<String>,
    pub itunes_image: Option<String>,
    pub itunes_categories: Vec<String>,
    pub items: Vec<RawItem>,
}

/// Which of the recognized document layouts a feed uses. Detection order
/// matters and is fixed; see `detect_shape`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedShape {
    RssChannel,
    AtomFeed,
    BareChannel,
    KeyedItems(&'static str),
    ItemSequence,
}

/// Parser output: the raw feed tagged with the document shape it came in.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedFeedDocument {
    /// `<rss>` root wrapping a `<channel>`.
    RssChannel(RawFeed),
    /// Atom `<feed>` root with `<entry>` items.
    AtomFeed(RawFeed),
    /// A bare `<channel>` root, or a wrapper such as `rdf:RDF` holding one.
    BareChannel(RawFeed),
    /// Unrecognized envelope that still carries a repeated item element;
    /// `key` records which element name matched. The regex fallback also
    /// produces this variant.
    KeyedItems { key: String, feed: RawFeed },
    /// The document itself is a single item with no feed envelope.
    ItemSequence(Vec<RawItem>),
}

impl ParsedFeedDocument {
    pub fn shape_name(&self) -> &'static str {
        match self {
            Self::RssChannel(_) => "rss-channel",
            Self::AtomFeed(_) => "atom-feed",
            Self::BareChannel(_) => "bare-channel",
            Self::KeyedItems { .. } => "keyed-items",
            Self::ItemSequence(_) => "item-sequence",
        }
    }

    pub fn item_count(&self) -> usize {
        match self {
            Self::RssChannel(feed)
            | Self::AtomFeed(feed)
            | Self::BareChannel(feed)
            | Self::KeyedItems { feed, .. } => feed.items.len(),
            Self::ItemSequence(items) => items.len(),
        }
    }
}
