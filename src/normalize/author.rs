//! Author identity resolution and repost detection for mirror feeds.
//!
//! On the mirror a profile feed mixes the owner's own posts with posts the
//! owner reposted. Reposts keep the original poster as `dc:creator`, so the
//! identity is rebuilt from that field and the owner is credited through an
//! annotation instead.

use std::sync::LazyLock;

use regex::Regex;

use super::html::find_profile_avatar;
use super::types::{Annotation, Identity};
use super::url::{leading_segments, owner_handle};

/// `RT by @handle: original text`
#[allow(clippy::expect_used)]
static REPOST_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^RT by (@\w+):\s*").expect("valid regex"));

/// Returns the reposting account (with its `@`) when the title marks a repost.
pub fn detect_repost(title: &str) -> Option<&str> {
    REPOST_TITLE
        .captures(title)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Annotation crediting the account that reposted an item.
pub fn repost_annotation(reposter: &str, feed_url: Option<&str>) -> Annotation {
    Annotation {
        text: format!("{reposter} Reposted"),
        related_uri: feed_url.map(str::to_owned),
    }
}

/// Joins repeated author fields the way hosts display co-authors.
pub fn join_names(names: &[String]) -> Option<String> {
    let joined = names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    (!joined.is_empty()).then_some(joined)
}

/// Channel-level facts needed to resolve a post's author.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelContext<'a> {
    /// Canonical profile URL of the feed owner.
    pub feed_url: Option<&'a str>,
    /// The owner's profile picture, from the channel image.
    pub channel_image: Option<&'a str>,
}

impl ChannelContext<'_> {
    fn owner(&self) -> Option<&str> {
        self.feed_url.and_then(owner_handle)
    }
}

/// Builds the identity of a mirror post from its creator field.
///
/// * display name: the creator without its leading `@`
/// * handle: the creator with exactly one leading `@`
/// * profile URI: the first path segment of the canonical post URL
/// * avatar: the channel image for the owner's own posts, otherwise whatever
///   profile picture the post's markup carries
pub fn resolve_post_author(
    creator: &str,
    item_url: &str,
    channel: &ChannelContext<'_>,
    raw_html: Option<&str>,
) -> Identity {
    let creator = creator.trim();
    let display_name = creator.strip_prefix('@').unwrap_or(creator);
    let handle = format!("@{display_name}");

    let is_owner = channel
        .owner()
        .is_some_and(|owner| owner.eq_ignore_ascii_case(display_name));
    let avatar_uri = if is_owner {
        channel.channel_image.map(str::to_owned)
    } else {
        raw_html.and_then(find_profile_avatar)
    };

    Identity {
        display_name: display_name.to_owned(),
        handle: Some(handle),
        profile_uri: leading_segments(item_url, 4).map(str::to_owned),
        avatar_uri,
    }
}
