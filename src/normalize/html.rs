//! Best-effort scans over raw HTML carried in item descriptions.
//!
//! These are lexical heuristics tuned to the markup the mirror emits, not an
//! HTML parser: attribute values must be quoted, tags are not validated, and
//! anything inside comments or scripts is scanned like any other text.

use std::sync::LazyLock;

use regex::Regex;

use super::url::{is_mirror_url, origin_prefix};

/// Marker path segment of the mirror's video thumbnails.
#[allow(clippy::expect_used)]
static VIDEO_THUMB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"amplify_video_thumb/\d+").expect("valid regex"));

#[allow(clippy::expect_used)]
static VIDEO_THUMB_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"src=["']([^"']*amplify_video_thumb[^"']*)["']"#).expect("valid regex")
});

/// `src` of an `<img>` tag; the tag must carry at least one attribute.
#[allow(clippy::expect_used)]
static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<img\s+[^>]*src=["']([^"']+)["'][^>]*>"#).expect("valid regex")
});

#[allow(clippy::expect_used)]
static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img\b[^>]*>").expect("valid regex"));

#[allow(clippy::expect_used)]
static SRC_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bsrc=["']([^"']+)["']"#).expect("valid regex"));

/// Circular crop the mirror applies to profile pictures.
#[allow(clippy::expect_used)]
static ROUND_AVATAR_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)border-radius\s*:\s*50%").expect("valid regex"));

#[allow(clippy::expect_used)]
static HREF_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href=["']([^"']+)["']"#).expect("valid regex"));

/// Path segment of profile pictures on the upstream media CDN.
const PROFILE_IMAGE_SEGMENT: &str = "/profile_images/";

/// Undoes the `&amp;` encoding feeds leave in attribute values.
pub fn decode_ampersands(url: &str) -> String {
    url.replace("&amp;", "&")
}

/// Detection result for a post carrying a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoThumbnail {
    /// Poster frame for the video, when its tag could be located.
    pub thumbnail_url: Option<String>,
}

/// Looks for the mirror's video-thumbnail marker.
///
/// The video source itself lives on the status page and is not resolved here.
pub fn find_video_thumbnail(html: &str) -> Option<VideoThumbnail> {
    if !VIDEO_THUMB.is_match(html) {
        return None;
    }
    let thumbnail_url = VIDEO_THUMB_SRC
        .captures(html)
        .map(|caps| decode_ampersands(&caps[1]));
    Some(VideoThumbnail { thumbnail_url })
}

/// All `<img>` sources in document order, ampersands decoded.
pub fn image_sources(html: &str) -> Vec<String> {
    IMG_SRC
        .captures_iter(html)
        .map(|caps| decode_ampersands(&caps[1]))
        .collect()
}

/// First absolute link in `html` that leaves both the feed's site and the
/// mirror.
///
/// Mirror links are references to other posts (quotes, replies) rather than
/// content worth previewing, so they never qualify.
pub fn find_external_link(html: &str, feed_url: &str) -> Option<String> {
    if html.is_empty() || feed_url.is_empty() {
        return None;
    }
    let feed_origin = origin_prefix(feed_url);

    HREF_ATTR
        .captures_iter(html)
        .map(|caps| caps.get(1).map_or("", |m| m.as_str()))
        .filter(|href| href.starts_with("http://") || href.starts_with("https://"))
        .find(|href| origin_prefix(href) != feed_origin && !is_mirror_url(href))
        .map(str::to_owned)
}

/// Recovers the original poster's avatar from a reposted item's markup.
///
/// The first `<img>` that is either styled as a circle or served from the
/// profile-image path wins.
pub fn find_profile_avatar(html: &str) -> Option<String> {
    IMG_TAG.find_iter(html).find_map(|tag| {
        let tag = tag.as_str();
        let src = SRC_ATTR.captures(tag)?.get(1)?.as_str();
        (ROUND_AVATAR_STYLE.is_match(tag) || src.contains(PROFILE_IMAGE_SEGMENT))
            .then(|| decode_ampersands(src))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_video_marker_with_thumbnail() {
        let html = r#"<p>clip</p><img src="https://pbs.twimg.com/amplify_video_thumb/1888/img/a.jpg?name=small&amp;format=jpg"/>"#;
        assert_eq!(
            find_video_thumbnail(html),
            Some(VideoThumbnail {
                thumbnail_url: Some(
                    "https://pbs.twimg.com/amplify_video_thumb/1888/img/a.jpg?name=small&format=jpg"
                        .into()
                ),
            })
        );
    }

    #[test]
    fn test_video_marker_without_src() {
        let html = "<p>see amplify_video_thumb/42 for details</p>";
        assert_eq!(
            find_video_thumbnail(html),
            Some(VideoThumbnail { thumbnail_url: None })
        );
    }

    #[test]
    fn test_no_video_marker() {
        assert_eq!(find_video_thumbnail(r#"<img src="https://pbs.twimg.com/media/a.jpg">"#), None);
    }

    #[test]
    fn test_image_sources_in_order() {
        let html = r#"<img src="https://a.com/1.jpg" /><p>x</p><img style="max-width:250px" src='https://a.com/2.jpg?a=1&amp;b=2'>"#;
        assert_eq!(
            image_sources(html),
            vec!["https://a.com/1.jpg".to_string(), "https://a.com/2.jpg?a=1&b=2".to_string()]
        );
    }

    #[test]
    fn test_image_sources_empty() {
        assert!(image_sources("<p>nothing here</p>").is_empty());
    }

    #[test]
    fn test_external_link_found() {
        let content = r#"<p>SpaceX has acquired xAI → <a href="http://spacex.com/updates#xai-joins-spacex">spacex.com/updates#xai-joins…</a></p>"#;
        assert_eq!(
            find_external_link(content, "https://rss.xcancel.com/SpaceX").as_deref(),
            Some("http://spacex.com/updates#xai-joins-spacex")
        );
    }

    #[test]
    fn test_external_link_ignores_mirror_links() {
        let content = r#"<p>Check this out: <a href="https://xcancel.com/some/status">link</a></p>"#;
        assert_eq!(find_external_link(content, "https://rss.xcancel.com/SpaceX"), None);
    }

    #[test]
    fn test_external_link_ignores_same_domain() {
        let content = r#"<p><a href="https://blog.example.org/post/2">older</a></p>"#;
        assert_eq!(find_external_link(content, "https://blog.example.org/feed"), None);
    }

    #[test]
    fn test_external_link_first_qualifying_wins() {
        let content = r#"<a href="/relative">r</a><a href="https://xcancel.com/a">m</a><a href="https://one.example/">1</a><a href="https://two.example/">2</a>"#;
        assert_eq!(
            find_external_link(content, "https://xcancel.com/user").as_deref(),
            Some("https://one.example/")
        );
    }

    #[test]
    fn test_avatar_round_style() {
        let content = r#"<img style="border-radius:50%;margin-right:8px" width="48" height="48" src="https://pbs.twimg.com/profile_images/123/avatar.jpg"/><p>Content</p>"#;
        assert_eq!(
            find_profile_avatar(content).as_deref(),
            Some("https://pbs.twimg.com/profile_images/123/avatar.jpg")
        );
    }

    #[test]
    fn test_avatar_profile_images_path() {
        let content = r#"<img width="40" src="https://pbs.twimg.com/profile_images/456/pic.jpg"><p>Content</p>"#;
        assert_eq!(
            find_profile_avatar(content).as_deref(),
            Some("https://pbs.twimg.com/profile_images/456/pic.jpg")
        );
    }

    #[test]
    fn test_avatar_absent() {
        let content = r#"<p>Just text</p><img src="https://example.com/media/image.jpg">"#;
        assert_eq!(find_profile_avatar(content), None);
    }

    #[test]
    fn test_avatar_decodes_ampersands() {
        let content = r#"<img style="border-radius:50%" src="https://pbs.twimg.com/profile_images/123/avatar.jpg?format=jpg&amp;name=48x48"/>"#;
        assert_eq!(
            find_profile_avatar(content).as_deref(),
            Some("https://pbs.twimg.com/profile_images/123/avatar.jpg?format=jpg&name=48x48")
        );
    }

    #[test]
    fn test_avatar_skips_media_before_profile_image() {
        let content = r#"<img src="https://pbs.twimg.com/media/x.jpg"><img src="https://pbs.twimg.com/profile_images/9/p.jpg">"#;
        assert_eq!(
            find_profile_avatar(content).as_deref(),
            Some("https://pbs.twimg.com/profile_images/9/p.jpg")
        );
    }
}
