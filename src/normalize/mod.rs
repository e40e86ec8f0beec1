//! Feed normalization engine.
//!
//! Turns a decoded feed document into the ordered list of posts the host
//! displays:
//!
//! - **Dispatch**: [`FeedDocument::from_root`] classifies Atom, RSS 2.0 and
//!   RSS 1.0 documents
//! - **URLs**: [`url`] canonicalizes the mirror's alias host and strips
//!   tracking queries so the same post is never listed twice
//! - **Content**: [`content`] flattens markup embedded in text fields
//! - **Authors**: [`author`] detects reposts and recovers the original
//!   poster's identity and avatar
//! - **Attachments**: [`attachment`] finds media, video and outbound links
//!
//! The engine does no I/O and holds no state between calls. Everything that
//! varies per call, including whether reposts are kept, arrives through
//! [`Options`].
//!
//! # Example
//!
//! ```
//! use xfeed::feed::parse_document;
//! use xfeed::normalize::{normalize, FeedDocument, Options};
//!
//! let xml = r#"<rss version="2.0"><channel>
//!     <link>https://xcancel.com/user</link>
//!     <item><link>https://rss.xcancel.com/user/status/1#m</link></item>
//! </channel></rss>"#;
//! let root = parse_document(xml).unwrap();
//! let items = normalize(&FeedDocument::from_root(&root), &Options::default());
//! assert_eq!(items[0].uri, "https://xcancel.com/user/status/1#m");
//! ```

pub mod attachment;
pub mod author;
pub mod content;
pub mod date;
pub mod dialect;
pub mod html;
pub mod url;

mod atom;
mod rdf;
mod rss;
mod types;

use chrono::{DateTime, Utc};

pub use content::Node;
pub use dialect::{Dialect, FeedDocument};
pub use types::{Annotation, AspectSize, Attachment, Identity, NormalizedItem};

/// Per-call normalization settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Keep reposts (`RT by @owner: ...` items). When off they are dropped.
    pub include_reposts: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            include_reposts: true,
        }
    }
}

/// Normalizes a document, using the current time for undated items.
pub fn normalize(document: &FeedDocument, options: &Options) -> Vec<NormalizedItem> {
    normalize_at(document, options, Utc::now())
}

/// Normalizes a document with an explicit invocation time.
///
/// Output depends only on the arguments, so repeated calls with the same
/// document, options and `now` return identical items.
pub fn normalize_at(
    document: &FeedDocument,
    options: &Options,
    now: DateTime<Utc>,
) -> Vec<NormalizedItem> {
    let items = match document {
        FeedDocument::Atom(feed) => atom::extract_items(feed, now),
        FeedDocument::Rss2(channel) => rss::extract_items(channel, options, now),
        FeedDocument::Rdf(feed) => rdf::extract_items(feed, now),
        FeedDocument::Unknown => Vec::new(),
    };
    tracing::debug!(
        dialect = ?document.dialect(),
        items = items.len(),
        include_reposts = options.include_reposts,
        "Normalized feed document"
    );
    items
}
