use chrono::{DateTime, Utc};
use serde::Serialize;

// ============================================================================
// Normalized Output
// ============================================================================

/// One post, normalized for the host.
///
/// `uri` is always the canonical item URL: tracking parameters removed and
/// the mirror's alias host collapsed, so the same post fetched through either
/// host compares equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedItem {
    pub uri: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Identity>,
    /// Discovery order: media (or video link) first, then the external link.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

impl NormalizedItem {
    pub fn new(uri: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            uri,
            timestamp,
            title: None,
            body: None,
            author: None,
            attachments: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn media(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments
            .iter()
            .filter(|a| matches!(a, Attachment::Media { .. }))
    }

    pub fn links(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments
            .iter()
            .filter(|a| matches!(a, Attachment::Link { .. }))
    }
}

/// Who wrote a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub display_name: String,
    /// Always prefixed with a single `@` when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_uri: Option<String>,
}

impl Identity {
    pub fn with_name(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Self::default()
        }
    }
}

/// Width and height reported by a media-extension element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AspectSize {
    pub width: u32,
    pub height: u32,
}

/// Something attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Attachment {
    Media {
        url: String,
        /// `"image"` for media found in extension fields or `<img>` tags;
        /// unset for enclosures, whose type is not inspected.
        #[serde(skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        aspect_size: Option<AspectSize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Link {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        preview_image: Option<String>,
    },
}

impl Attachment {
    pub const IMAGE_MIME: &'static str = "image";

    /// Media attachment typed as an image.
    pub fn image(url: impl Into<String>) -> Self {
        Attachment::Media {
            url: url.into(),
            mime_type: Some(Self::IMAGE_MIME.to_owned()),
            aspect_size: None,
            caption: None,
        }
    }

    /// Link attachment without title or preview.
    pub fn link(url: impl Into<String>) -> Self {
        Attachment::Link {
            url: url.into(),
            title: None,
            preview_image: None,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Attachment::Media { url, .. } | Attachment::Link { url, .. } => url,
        }
    }
}

/// A note shown above a post, e.g. who reposted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_uri: Option<String>,
}
