//! RSS 2.0 extraction, the mirror's primary format.

use chrono::{DateTime, Utc};

use super::attachment::{link_attachment, media_attachments};
use super::author::{detect_repost, join_names, repost_annotation, resolve_post_author, ChannelContext};
use super::date::resolve_timestamp;
use super::dialect::{RssChannel, RssItem};
use super::types::NormalizedItem;
use super::url::{canonical_url, canonicalize_host};
use super::Options;

pub(super) fn extract_items(
    channel: &RssChannel,
    options: &Options,
    now: DateTime<Utc>,
) -> Vec<NormalizedItem> {
    let feed_url = channel
        .link
        .as_deref()
        .map(|link| canonicalize_host(link).into_owned());
    let context = ChannelContext {
        feed_url: feed_url.as_deref(),
        channel_image: channel.image_url.as_deref(),
    };

    channel
        .items
        .iter()
        .filter_map(|item| extract_item(item, &context, options, now))
        .collect()
}

fn extract_item(
    item: &RssItem,
    channel: &ChannelContext<'_>,
    options: &Options,
    now: DateTime<Utc>,
) -> Option<NormalizedItem> {
    let Some(link) = item.link.as_deref() else {
        tracing::debug!("Skipping RSS item without link");
        return None;
    };
    let uri = canonical_url(link);

    let title = item.title.as_ref().map(|t| t.render(false));
    let reposter = title.as_deref().and_then(detect_repost);
    if reposter.is_some() && !options.include_reposts {
        tracing::debug!(uri = %uri, "Dropping repost");
        return None;
    }

    let timestamp = resolve_timestamp(
        &[
            item.pub_date.as_deref(),
            item.dc_date.as_deref(),
            item.updated.as_deref(),
        ],
        now,
    );

    let body_node = item.body();
    let raw_html = body_node.and_then(|n| n.as_text());

    // Post-style items: the body carries the text, the title only repeats it.
    let mut result = NormalizedItem::new(uri, timestamp);
    result.body = body_node.map(|n| n.render(true));

    let creator = join_names(&item.creators).or_else(|| item.author.clone());
    result.author = creator
        .map(|creator| resolve_post_author(&creator, &result.uri, channel, raw_html));

    if let Some(reposter) = reposter {
        result
            .annotations
            .push(repost_annotation(reposter, channel.feed_url));
    }

    result.attachments = media_attachments(
        &result.uri,
        raw_html,
        item.media.as_ref(),
        item.enclosure_url.as_deref(),
    );
    if let Some(feed_url) = channel.feed_url {
        result
            .attachments
            .extend(link_attachment(&result.uri, feed_url, raw_html));
    }

    Some(result)
}
