//! Dialect dispatch.
//!
//! A decoded document is classified once by its root element and lifted into
//! a typed [`FeedDocument`]. Everything downstream matches on the variant
//! instead of probing the tree for fields.

use crate::feed::Element;

use super::content::Node;

/// A feed document, one variant per supported dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedDocument {
    Atom(AtomFeed),
    Rss2(RssChannel),
    Rdf(RdfFeed),
    Unknown,
}

/// Which dialect a [`FeedDocument`] was recognized as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Atom,
    Rss2,
    Rdf,
    Unknown,
}

impl FeedDocument {
    /// Classifies a decoded root element.
    ///
    /// `feed` is Atom, `rss` with a `channel` is RSS 2.0, `rdf:RDF` is RSS 1.0;
    /// anything else is [`FeedDocument::Unknown`].
    pub fn from_root(root: &Element) -> Self {
        match root.name.as_str() {
            "feed" => FeedDocument::Atom(AtomFeed::from_element(root)),
            "rss" => match root.child("channel") {
                Some(channel) => FeedDocument::Rss2(RssChannel::from_element(channel)),
                None => FeedDocument::Unknown,
            },
            "rdf:RDF" => FeedDocument::Rdf(RdfFeed::from_element(root)),
            other => {
                tracing::debug!(root = %other, "Unrecognized feed root element");
                FeedDocument::Unknown
            }
        }
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            FeedDocument::Atom(_) => Dialect::Atom,
            FeedDocument::Rss2(_) => Dialect::Rss2,
            FeedDocument::Rdf(_) => Dialect::Rdf,
            FeedDocument::Unknown => Dialect::Unknown,
        }
    }
}

// ============================================================================
// Media RSS
// ============================================================================

/// Attributes of a `media:thumbnail` / `media:content` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaAttrs {
    pub url: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
}

impl MediaAttrs {
    fn from_element(element: &Element) -> Self {
        Self {
            url: element.attr("url").map(str::to_owned),
            width: element.attr("width").map(str::to_owned),
            height: element.attr("height").map(str::to_owned),
        }
    }
}

/// The media-extension location an item uses, in priority order.
///
/// Only the first location present on the item is kept; a `media:group`
/// without a thumbnail still shadows the other two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    Group(Option<MediaAttrs>),
    Thumbnail(MediaAttrs),
    Content(MediaAttrs),
}

impl MediaSource {
    fn from_item(item: &Element) -> Option<Self> {
        if let Some(group) = item.child("media:group") {
            return Some(MediaSource::Group(
                group.child("media:thumbnail").map(MediaAttrs::from_element),
            ));
        }
        if let Some(thumbnail) = item.child("media:thumbnail") {
            return Some(MediaSource::Thumbnail(MediaAttrs::from_element(thumbnail)));
        }
        item.child("media:content")
            .map(|content| MediaSource::Content(MediaAttrs::from_element(content)))
    }

    pub fn attrs(&self) -> Option<&MediaAttrs> {
        match self {
            MediaSource::Group(attrs) => attrs.as_ref(),
            MediaSource::Thumbnail(attrs) | MediaSource::Content(attrs) => Some(attrs),
        }
    }
}

/// All values of a possibly repeated text field, trimmed, empties dropped.
fn texts_of(element: &Element, name: &str) -> Vec<String> {
    element
        .children_named(name)
        .map(|e| e.text().trim().to_owned())
        .filter(|t| !t.is_empty())
        .collect()
}

fn node_of(element: &Element, name: &str) -> Option<Node> {
    element.child(name).and_then(Node::from_element)
}

// ============================================================================
// Atom
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomFeed {
    pub title: Option<String>,
    pub id: Option<String>,
    pub icon: Option<String>,
    pub links: Vec<AtomLink>,
    pub entries: Vec<AtomEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomLink {
    pub rel: Option<String>,
    pub href: Option<String>,
    pub mime_type: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomAuthor {
    pub names: Vec<String>,
    pub uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtomContent {
    /// `type="xhtml"` content, re-serialized as markup.
    Xhtml(String),
    Node(Node),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomEntry {
    pub id: Option<String>,
    pub title: Option<Node>,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub author: Option<AtomAuthor>,
    pub content: Option<AtomContent>,
    pub summary: Option<Node>,
    pub links: Vec<AtomLink>,
    pub media: Option<MediaSource>,
}

impl AtomLink {
    fn from_element(element: &Element) -> Self {
        Self {
            rel: element.attr("rel").map(str::to_owned),
            href: element.attr("href").map(str::to_owned),
            mime_type: element.attr("type").map(str::to_owned),
            title: element.attr("title").map(str::to_owned),
        }
    }

    pub fn is_alternate(&self) -> bool {
        self.rel.as_deref() == Some("alternate")
    }
}

impl AtomFeed {
    fn from_element(feed: &Element) -> Self {
        Self {
            title: feed.child_text("title"),
            id: feed.child_text("id"),
            icon: feed.child_text("icon"),
            links: feed.children_named("link").map(AtomLink::from_element).collect(),
            entries: feed.children_named("entry").map(AtomEntry::from_element).collect(),
        }
    }

    /// `href` of the first link with the given relation.
    pub fn link_with_rel(&self, rel: &str) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel.as_deref() == Some(rel))
            .and_then(|l| l.href.as_deref())
    }
}

impl AtomEntry {
    fn from_element(entry: &Element) -> Self {
        let content = entry.child("content").and_then(|content| {
            if content.attr("type") == Some("xhtml") {
                Some(AtomContent::Xhtml(content.inner_markup()))
            } else {
                Node::from_element(content).map(AtomContent::Node)
            }
        });
        let author = entry.child("author").map(|author| AtomAuthor {
            names: texts_of(author, "name"),
            uri: author.child_text("uri"),
        });

        Self {
            id: entry.child_text("id"),
            title: node_of(entry, "title"),
            published: entry.child_text("published"),
            updated: entry.child_text("updated"),
            author,
            content,
            summary: node_of(entry, "summary"),
            links: entry.children_named("link").map(AtomLink::from_element).collect(),
            media: MediaSource::from_item(entry),
        }
    }
}

// ============================================================================
// RSS 2.0
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RssChannel {
    pub link: Option<String>,
    pub title: Option<String>,
    /// Channel artwork; for mirror feeds this is the owner's profile picture.
    pub image_url: Option<String>,
    pub items: Vec<RssItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RssItem {
    pub link: Option<String>,
    pub title: Option<Node>,
    pub pub_date: Option<String>,
    pub dc_date: Option<String>,
    pub updated: Option<String>,
    pub description: Option<Node>,
    pub content_encoded: Option<Node>,
    pub creators: Vec<String>,
    pub author: Option<String>,
    pub media: Option<MediaSource>,
    pub enclosure_url: Option<String>,
}

impl RssChannel {
    fn from_element(channel: &Element) -> Self {
        Self {
            link: channel.child_text("link"),
            title: channel.child_text("title"),
            image_url: channel.child("image").and_then(|image| image.child_text("url")),
            items: channel.children_named("item").map(RssItem::from_element).collect(),
        }
    }
}

impl RssItem {
    fn from_element(item: &Element) -> Self {
        Self {
            link: item.child_text("link"),
            title: node_of(item, "title"),
            pub_date: item.child_text("pubDate"),
            dc_date: item.child_text("dc:date"),
            updated: item.child_text("a10:updated"),
            description: node_of(item, "description"),
            content_encoded: node_of(item, "content:encoded"),
            creators: texts_of(item, "dc:creator"),
            author: item.child_text("author"),
            media: MediaSource::from_item(item),
            enclosure_url: item
                .child("enclosure")
                .and_then(|e| e.attr("url"))
                .map(str::to_owned),
        }
    }

    /// The body node: `content:encoded` when present, else `description`.
    pub fn body(&self) -> Option<&Node> {
        self.content_encoded.as_ref().or(self.description.as_ref())
    }
}

// ============================================================================
// RSS 1.0 (RDF)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RdfFeed {
    pub link: Option<String>,
    pub title: Option<String>,
    pub items: Vec<RdfItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RdfItem {
    pub link: Option<String>,
    pub title: Option<Node>,
    pub date: Option<String>,
    pub creators: Vec<String>,
    pub description: Option<Node>,
}

impl RdfFeed {
    fn from_element(rdf: &Element) -> Self {
        let channel = rdf.child("channel");
        Self {
            link: channel.and_then(|c| c.child_text("link")),
            title: channel.and_then(|c| c.child_text("title")),
            items: rdf
                .children_named("item")
                .map(|item| RdfItem {
                    link: item.child_text("link"),
                    title: node_of(item, "title"),
                    date: item.child_text("dc:date"),
                    creators: texts_of(item, "dc:creator"),
                    description: node_of(item, "description"),
                })
                .collect(),
        }
    }
}
