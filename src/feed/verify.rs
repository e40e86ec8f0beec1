//! Feed verification metadata: the name, icon and site the host shows for a
//! subscription.

use serde::Serialize;
use thiserror::Error;

use crate::normalize::url::{canonicalize_host, origin_prefix};
use crate::normalize::FeedDocument;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// The document is not Atom, RSS 2.0 or RSS 1.0.
    #[error("Unknown feed format")]
    UnknownFormat,
}

/// What the host needs to present a subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedVerification {
    pub display_name: Option<String>,
    pub icon: Option<String>,
    pub base_url: Option<String>,
}

/// Resolves a site's icon when the feed does not name one.
pub trait IconLookup {
    /// `site_url` is an origin such as `https://example.com`.
    fn lookup(&self, site_url: &str) -> Option<String>;
}

/// Assumes the conventional `/favicon.ico` location.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaviconLookup;

impl IconLookup for FaviconLookup {
    fn lookup(&self, site_url: &str) -> Option<String> {
        Some(format!("{}/favicon.ico", site_url.trim_end_matches('/')))
    }
}

/// Computes verification metadata for a decoded feed.
///
/// - Atom: site from the `alternate` link; icon from the feed's `icon`, else
///   looked up for the alternate site, else for the `self` link's site
/// - RSS 2.0: site from the channel link; icon from the channel image, which
///   for mirror feeds is the account's profile picture
/// - RSS 1.0: site from the channel link; icon looked up for that site
///
/// # Errors
///
/// [`VerifyError::UnknownFormat`] for documents of no known dialect.
pub fn verification_for(
    document: &FeedDocument,
    icons: &dyn IconLookup,
) -> Result<FeedVerification, VerifyError> {
    match document {
        FeedDocument::Atom(feed) => {
            let base_url = feed.link_with_rel("alternate").map(str::to_owned);
            let icon = feed.icon.clone().or_else(|| {
                base_url
                    .as_deref()
                    .or_else(|| feed.link_with_rel("self"))
                    .and_then(|url| icons.lookup(origin_prefix(url)))
            });
            Ok(FeedVerification {
                display_name: feed.title.clone(),
                icon,
                base_url,
            })
        }
        FeedDocument::Rss2(channel) => Ok(FeedVerification {
            display_name: channel.title.clone(),
            icon: channel.image_url.clone(),
            base_url: channel
                .link
                .as_deref()
                .map(|link| canonicalize_host(link).into_owned()),
        }),
        FeedDocument::Rdf(feed) => Ok(FeedVerification {
            display_name: feed.title.clone(),
            icon: feed
                .link
                .as_deref()
                .and_then(|url| icons.lookup(origin_prefix(url))),
            base_url: feed.link.clone(),
        }),
        FeedDocument::Unknown => Err(VerifyError::UnknownFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::parse_document;
    use pretty_assertions::assert_eq;

    fn verify(xml: &str) -> Result<FeedVerification, VerifyError> {
        let document = FeedDocument::from_root(&parse_document(xml).unwrap());
        verification_for(&document, &FaviconLookup)
    }

    #[test]
    fn test_rss_uses_channel_image() {
        let result = verify(
            r#"<rss><channel>
                <title> pierceboggan / X </title>
                <link>https://rss.xcancel.com/pierceboggan</link>
                <image><url>https://pbs.twimg.com/profile_images/1/J2bo_400x400.jpg</url></image>
            </channel></rss>"#,
        )
        .unwrap();
        assert_eq!(
            result,
            FeedVerification {
                display_name: Some("pierceboggan / X".into()),
                icon: Some("https://pbs.twimg.com/profile_images/1/J2bo_400x400.jpg".into()),
                base_url: Some("https://xcancel.com/pierceboggan".into()),
            }
        );
    }

    #[test]
    fn test_atom_prefers_feed_icon() {
        let result = verify(
            r#"<feed><title>Blog</title><icon>https://e.com/icon.png</icon>
               <link rel="alternate" href="https://e.com/blog"/></feed>"#,
        )
        .unwrap();
        assert_eq!(result.icon.as_deref(), Some("https://e.com/icon.png"));
        assert_eq!(result.base_url.as_deref(), Some("https://e.com/blog"));
    }

    #[test]
    fn test_atom_looks_up_icon_for_site() {
        let result = verify(
            r#"<feed><title>Blog</title><link rel="self" href="https://feeds.e.com/atom"/></feed>"#,
        )
        .unwrap();
        assert_eq!(result.icon.as_deref(), Some("https://feeds.e.com/favicon.ico"));
        assert_eq!(result.base_url, None);
    }

    #[test]
    fn test_rdf_looks_up_icon() {
        let result = verify(
            r#"<rdf:RDF><channel><title>Slashdot</title><link>https://slashdot.org/</link></channel></rdf:RDF>"#,
        )
        .unwrap();
        assert_eq!(result.icon.as_deref(), Some("https://slashdot.org/favicon.ico"));
        assert_eq!(result.display_name.as_deref(), Some("Slashdot"));
    }

    #[test]
    fn test_unknown_format() {
        assert_eq!(verify("<html/>"), Err(VerifyError::UnknownFormat));
    }
}
