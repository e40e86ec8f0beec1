//! Atom 1.0 extraction.

use chrono::{DateTime, Utc};

use super::attachment::{image_links, media_from_attrs};
use super::author::join_names;
use super::date::resolve_timestamp;
use super::dialect::{AtomContent, AtomEntry, AtomFeed};
use super::types::{Identity, NormalizedItem};
use super::url::canonical_url;

pub(super) fn extract_items(feed: &AtomFeed, now: DateTime<Utc>) -> Vec<NormalizedItem> {
    feed.entries
        .iter()
        .filter_map(|entry| extract_entry(entry, now))
        .collect()
}

/// Picks the entry's permalink: the `alternate` link, else the first link.
/// A lone link counts only when it has no `rel` or is `alternate`. Entries
/// without a usable link fall back to an absolute `id`.
fn entry_url(entry: &AtomEntry) -> Option<&str> {
    let from_links = match entry.links.as_slice() {
        [] => None,
        [only] => (only.rel.is_none() || only.is_alternate())
            .then_some(only.href.as_deref())
            .flatten(),
        links => links
            .iter()
            .find(|l| l.is_alternate())
            .or_else(|| links.first())
            .and_then(|l| l.href.as_deref()),
    };

    from_links.or_else(|| {
        entry
            .id
            .as_deref()
            .filter(|id| id.starts_with("http://") || id.starts_with("https://"))
    })
}

fn extract_entry(entry: &AtomEntry, now: DateTime<Utc>) -> Option<NormalizedItem> {
    let Some(url) = entry_url(entry) else {
        tracing::debug!(id = ?entry.id, "Skipping Atom entry without link");
        return None;
    };

    let timestamp = resolve_timestamp(
        &[entry.published.as_deref(), entry.updated.as_deref()],
        now,
    );
    let mut result = NormalizedItem::new(canonical_url(url), timestamp);

    result.title = entry.title.as_ref().map(|t| t.render(false));
    result.body = match &entry.content {
        Some(AtomContent::Xhtml(markup)) => Some(markup.clone()),
        Some(AtomContent::Node(node)) => Some(node.render(true)),
        None => entry.summary.as_ref().map(|s| s.render(true)),
    };

    result.author = entry.author.as_ref().and_then(|author| {
        let mut identity = Identity::with_name(join_names(&author.names)?);
        identity.profile_uri = author.uri.clone();
        Some(identity)
    });

    // Several links: image-typed ones are attachments. Otherwise Media RSS.
    result.attachments = if entry.links.len() > 1 {
        image_links(&entry.links)
    } else {
        entry
            .media
            .as_ref()
            .and_then(|media| media.attrs())
            .and_then(media_from_attrs)
            .into_iter()
            .collect()
    };

    Some(result)
}
