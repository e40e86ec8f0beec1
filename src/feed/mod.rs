//! Feed I/O: decoding, fetching and verification.
//!
//! - **Decoding**: [`parse_document`] turns feed XML into an [`Element`] tree
//! - **Fetching**: [`FeedClient`] retrieves mirror feeds with retries and
//!   conditional GET
//! - **Verification**: [`verification_for`] derives the name, icon and site
//!   of a subscription
//!
//! # Example
//!
//! ```ignore
//! use xfeed::feed::{feed_url, load_all, FeedClient, DEFAULT_TIMEOUT, USER_AGENT};
//!
//! let client = FeedClient::new(USER_AGENT, DEFAULT_TIMEOUT)?;
//! let urls = vec![feed_url("https://xcancel.com", "rustlang")];
//! let results = load_all(&client, urls, &Options::default()).await;
//! ```

mod document;
mod fetcher;
mod verify;

pub use document::{parse_document, DocumentError, Element, XmlNode};
pub use fetcher::{
    feed_url, load_all, FeedClient, FetchError, FetchOutcome, LoadResult, DEFAULT_TIMEOUT,
    USER_AGENT,
};
pub use verify::{verification_for, FaviconLookup, FeedVerification, IconLookup, VerifyError};

use crate::normalize::{normalize, FeedDocument, NormalizedItem, Options};

/// Decodes and normalizes a feed held in memory.
///
/// # Errors
///
/// [`DocumentError`] when `xml` is not a well-formed document.
pub fn normalize_xml(xml: &str, options: &Options) -> Result<Vec<NormalizedItem>, DocumentError> {
    let root = parse_document(xml)?;
    Ok(normalize(&FeedDocument::from_root(&root), options))
}
