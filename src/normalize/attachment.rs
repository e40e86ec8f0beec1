//! Attachment discovery for feed items.

use super::dialect::{AtomLink, MediaAttrs, MediaSource};
use super::html::{decode_ampersands, find_external_link, find_video_thumbnail, image_sources};
use super::types::{AspectSize, Attachment};
use super::url::origin_prefix;

/// Title given to the link that stands in for a video.
pub const VIDEO_LINK_TITLE: &str = "Video";

/// Image attachment from a `media:thumbnail` / `media:content` element.
pub fn media_from_attrs(attrs: &MediaAttrs) -> Option<Attachment> {
    let url = decode_ampersands(attrs.url.as_deref()?);
    let aspect_size = match (attrs.width.as_deref(), attrs.height.as_deref()) {
        (Some(width), Some(height)) => match (width.trim().parse::<u32>(), height.trim().parse::<u32>()) {
            (Ok(width), Ok(height)) => Some(AspectSize { width, height }),
            _ => None,
        },
        _ => None,
    };
    Some(Attachment::Media {
        url,
        mime_type: Some(Attachment::IMAGE_MIME.to_owned()),
        aspect_size,
        caption: None,
    })
}

/// The media-class attachments of an RSS item, first applicable source only:
///
/// 1. a video marker in the markup becomes a link to the status page
/// 2. the media-extension location the item carries
/// 3. the enclosure
/// 4. every `<img>` in the markup
pub fn media_attachments(
    item_url: &str,
    raw_html: Option<&str>,
    media: Option<&MediaSource>,
    enclosure_url: Option<&str>,
) -> Vec<Attachment> {
    if let Some(video) = raw_html.and_then(find_video_thumbnail) {
        let status_page = item_url.split('#').next().unwrap_or(item_url);
        return vec![Attachment::Link {
            url: status_page.to_owned(),
            title: Some(VIDEO_LINK_TITLE.to_owned()),
            preview_image: video.thumbnail_url,
        }];
    }

    if let Some(source) = media {
        return source.attrs().and_then(media_from_attrs).into_iter().collect();
    }

    if let Some(url) = enclosure_url {
        return vec![Attachment::Media {
            url: url.to_owned(),
            mime_type: None,
            aspect_size: None,
            caption: None,
        }];
    }

    raw_html
        .map(image_sources)
        .unwrap_or_default()
        .into_iter()
        .map(Attachment::image)
        .collect()
}

/// The outbound link of an item, if it has one.
///
/// When the item lives on another site than the feed (a link blog), the item
/// itself is the link. Otherwise the first anchor leaving both the feed's site
/// and the mirror is used.
pub fn link_attachment(item_url: &str, feed_url: &str, raw_html: Option<&str>) -> Option<Attachment> {
    if origin_prefix(item_url) != origin_prefix(feed_url) {
        return Some(Attachment::link(item_url));
    }
    raw_html
        .and_then(|html| find_external_link(html, feed_url))
        .map(Attachment::link)
}

/// Atom `link` elements typed as images, promoted to media attachments.
pub fn image_links(links: &[AtomLink]) -> Vec<Attachment> {
    links
        .iter()
        .filter(|link| {
            link.mime_type
                .as_deref()
                .is_some_and(|t| t.starts_with("image/"))
        })
        .filter_map(|link| {
            let url = link.href.as_deref()?;
            Some(Attachment::Media {
                url: url.to_owned(),
                mime_type: Some(Attachment::IMAGE_MIME.to_owned()),
                aspect_size: None,
                caption: link.title.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ITEM: &str = "https://xcancel.com/SpaceX/status/2018440335140024383#m";
    const FEED: &str = "https://xcancel.com/SpaceX";

    fn attrs(url: &str, width: Option<&str>, height: Option<&str>) -> MediaAttrs {
        MediaAttrs {
            url: Some(url.into()),
            width: width.map(Into::into),
            height: height.map(Into::into),
        }
    }

    #[test]
    fn test_media_from_attrs_with_aspect() {
        assert_eq!(
            media_from_attrs(&attrs("https://e.com/a.jpg?a=1&amp;b=2", Some("640"), Some("480"))),
            Some(Attachment::Media {
                url: "https://e.com/a.jpg?a=1&b=2".into(),
                mime_type: Some("image".into()),
                aspect_size: Some(AspectSize { width: 640, height: 480 }),
                caption: None,
            })
        );
    }

    #[test]
    fn test_media_from_attrs_needs_both_dimensions() {
        let Some(Attachment::Media { aspect_size, .. }) =
            media_from_attrs(&attrs("https://e.com/a.jpg", Some("640"), None))
        else {
            panic!("expected media");
        };
        assert_eq!(aspect_size, None);
        assert_eq!(media_from_attrs(&MediaAttrs::default()), None);
    }

    #[test]
    fn test_video_wins_over_everything() {
        let html = r#"<img src="https://pbs.twimg.com/amplify_video_thumb/77/img/t.jpg"/>"#;
        let source = MediaSource::Thumbnail(attrs("https://e.com/t.jpg", None, None));
        assert_eq!(
            media_attachments(ITEM, Some(html), Some(&source), Some("https://e.com/e.mp4")),
            vec![Attachment::Link {
                url: "https://xcancel.com/SpaceX/status/2018440335140024383".into(),
                title: Some("Video".into()),
                preview_image: Some("https://pbs.twimg.com/amplify_video_thumb/77/img/t.jpg".into()),
            }]
        );
    }

    #[test]
    fn test_media_source_before_enclosure_and_images() {
        let source = MediaSource::Content(attrs("https://e.com/c.jpg", None, None));
        let html = r#"<img src="https://e.com/inline.jpg">"#;
        assert_eq!(
            media_attachments(ITEM, Some(html), Some(&source), Some("https://e.com/e.mp3")),
            vec![Attachment::image("https://e.com/c.jpg")]
        );
    }

    #[test]
    fn test_empty_group_yields_nothing() {
        let html = r#"<img src="https://e.com/inline.jpg">"#;
        assert!(media_attachments(ITEM, Some(html), Some(&MediaSource::Group(None)), None).is_empty());
    }

    #[test]
    fn test_enclosure_has_no_mime_type() {
        assert_eq!(
            media_attachments(ITEM, None, None, Some("https://e.com/e.mp3")),
            vec![Attachment::Media {
                url: "https://e.com/e.mp3".into(),
                mime_type: None,
                aspect_size: None,
                caption: None,
            }]
        );
    }

    #[test]
    fn test_image_tags_fallback() {
        let html = r#"<p>x</p><img src="https://pbs.twimg.com/media/A.jpg" style="max-width:250px;" /><img src="https://pbs.twimg.com/media/B.jpg?x=1&amp;y=2">"#;
        assert_eq!(
            media_attachments(ITEM, Some(html), None, None),
            vec![
                Attachment::image("https://pbs.twimg.com/media/A.jpg"),
                Attachment::image("https://pbs.twimg.com/media/B.jpg?x=1&y=2"),
            ]
        );
    }

    #[test]
    fn test_link_blog_item_links_to_itself() {
        assert_eq!(
            link_attachment("https://blog.example.com/post", FEED, None),
            Some(Attachment::link("https://blog.example.com/post"))
        );
    }

    #[test]
    fn test_link_from_content() {
        let html = r#"<p>on <a href="https://teddit.net/r/GithubCopilot/">teddit.net/r/GithubCopilot/</a> :)</p>"#;
        assert_eq!(
            link_attachment(ITEM, FEED, Some(html)),
            Some(Attachment::link("https://teddit.net/r/GithubCopilot/"))
        );
        assert_eq!(link_attachment(ITEM, FEED, Some("<p>no links</p>")), None);
    }

    #[test]
    fn test_image_links() {
        let links = vec![
            AtomLink {
                rel: Some("alternate".into()),
                href: Some("https://e.com/post".into()),
                mime_type: Some("text/html".into()),
                title: None,
            },
            AtomLink {
                rel: Some("enclosure".into()),
                href: Some("https://e.com/pic.png".into()),
                mime_type: Some("image/png".into()),
                title: Some("A picture".into()),
            },
        ];
        assert_eq!(
            image_links(&links),
            vec![Attachment::Media {
                url: "https://e.com/pic.png".into(),
                mime_type: Some("image".into()),
                aspect_size: None,
                caption: Some("A picture".into()),
            }]
        );
    }
}
