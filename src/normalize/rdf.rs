//! RSS 1.0 (RDF) extraction.

use chrono::{DateTime, Utc};

use super::author::join_names;
use super::date::resolve_timestamp;
use super::dialect::{RdfFeed, RdfItem};
use super::types::{Identity, NormalizedItem};
use super::url::canonical_url;

pub(super) fn extract_items(feed: &RdfFeed, now: DateTime<Utc>) -> Vec<NormalizedItem> {
    feed.items
        .iter()
        .filter_map(|item| extract_item(item, feed.link.as_deref(), now))
        .collect()
}

fn extract_item(item: &RdfItem, feed_url: Option<&str>, now: DateTime<Utc>) -> Option<NormalizedItem> {
    // dc:date is mandatory in RSS 1.0; items without it are malformed.
    let Some(date) = item.date.as_deref() else {
        tracing::debug!(link = ?item.link, "Skipping RDF item without dc:date");
        return None;
    };
    let Some(link) = item.link.as_deref() else {
        tracing::debug!("Skipping RDF item without link");
        return None;
    };

    let mut result = NormalizedItem::new(canonical_url(link), resolve_timestamp(&[Some(date)], now));
    result.title = item.title.as_ref().map(|t| t.render(false));
    result.body = item.description.as_ref().map(|d| d.render(true));
    result.author = join_names(&item.creators).map(|name| Identity {
        profile_uri: feed_url.map(str::to_owned),
        ..Identity::with_name(name)
    });

    Some(result)
}
