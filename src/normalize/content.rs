//! Flattening of markup that feeds embed directly in title and description
//! elements.
//!
//! Publishers routinely put unescaped `<p>` and `<a>` elements inside fields
//! that should only hold text. The decoder turns those into nested elements;
//! this module converts them into a [`Node`] and renders the node back to
//! either plain text or minimal HTML.

use crate::feed::Element;

/// Recursive content shape recognized inside a text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A field holding only text (including escaped or CDATA HTML).
    Text(String),
    /// A field carrying one or more `<p>` children, one entry per paragraph.
    Paragraph(Vec<Node>),
    /// A field carrying one or more `<a>` children, one entry per anchor.
    /// `href` is only known when the field holds a single anchor.
    Link {
        href: Option<String>,
        children: Vec<Node>,
    },
}

impl Node {
    /// Converts a decoded element into a content node.
    ///
    /// Returns `None` for shapes other than text, paragraphs or anchors;
    /// callers treat that the same as an absent field.
    pub fn from_element(element: &Element) -> Option<Node> {
        let paragraphs: Vec<&Element> = element.children_named("p").collect();
        if !paragraphs.is_empty() {
            return Some(Node::Paragraph(
                paragraphs.into_iter().map(Node::from_child).collect(),
            ));
        }

        let anchors: Vec<&Element> = element.children_named("a").collect();
        if !anchors.is_empty() {
            let href = match anchors.as_slice() {
                [only] => only.attr("href").map(str::to_owned),
                _ => None,
            };
            return Some(Node::Link {
                href,
                children: anchors.into_iter().map(Node::from_child).collect(),
            });
        }

        if !element.has_element_children() {
            return Some(Node::Text(element.text()));
        }

        tracing::debug!(
            element = %element.name,
            children = ?element.elements().map(|e| e.name.as_str()).collect::<Vec<_>>(),
            "Unrecognized content node shape"
        );
        None
    }

    fn from_child(element: &Element) -> Node {
        Node::from_element(element).unwrap_or_else(|| Node::Text(String::new()))
    }

    /// The raw text of a [`Node::Text`], untrimmed.
    ///
    /// This is the HTML blob the scanners in [`super::html`] work on.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Renders the node as plain text, or as minimal HTML when `allow_html`
    /// is set.
    pub fn render(&self, allow_html: bool) -> String {
        match self {
            Node::Text(text) => text.trim().to_owned(),
            Node::Paragraph(children) => children
                .iter()
                .map(|child| {
                    let inner = child.render(allow_html);
                    if allow_html {
                        format!("<p>{inner}</p>\n")
                    } else {
                        inner
                    }
                })
                .collect(),
            Node::Link { href, children } => children
                .iter()
                .map(|child| {
                    let inner = child.render(allow_html);
                    match href {
                        Some(href) if allow_html => format!("<a href=\"{href}\">{inner}</a>"),
                        _ => inner,
                    }
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::parse_document;
    use pretty_assertions::assert_eq;

    fn node(xml: &str) -> Option<Node> {
        Node::from_element(&parse_document(xml).unwrap())
    }

    #[test]
    fn test_plain_text_is_trimmed() {
        let n = node("<title>  Hello world \n</title>").unwrap();
        assert_eq!(n.render(false), "Hello world");
        assert_eq!(n.as_text(), Some("  Hello world \n"));
    }

    #[test]
    fn test_paragraphs_plain_and_html() {
        let n = node("<description><p>One</p><p>Two</p></description>").unwrap();
        assert_eq!(n.render(false), "OneTwo");
        assert_eq!(n.render(true), "<p>One</p>\n<p>Two</p>\n");
    }

    #[test]
    fn test_single_anchor_keeps_href_in_html() {
        let n = node(r#"<title><a href="https://example.com/x">Link text</a></title>"#).unwrap();
        assert_eq!(
            n,
            Node::Link {
                href: Some("https://example.com/x".into()),
                children: vec![Node::Text("Link text".into())],
            }
        );
        assert_eq!(n.render(true), r#"<a href="https://example.com/x">Link text</a>"#);
        assert_eq!(n.render(false), "Link text");
    }

    #[test]
    fn test_multiple_anchors_render_text_only() {
        let n = node(r#"<t><a href="https://a.com">A</a><a href="https://b.com">B</a></t>"#).unwrap();
        assert_eq!(n.render(true), "AB");
    }

    #[test]
    fn test_paragraph_containing_anchor() {
        let n = node(r#"<d><p><a href="https://e.com">e</a></p></d>"#).unwrap();
        assert_eq!(n.render(true), "<p><a href=\"https://e.com\">e</a></p>\n");
    }

    #[test]
    fn test_unrecognized_shape_is_none() {
        assert_eq!(node("<d><div>block</div></d>"), None);
        assert_eq!(node("<d><span/></d>"), None);
    }
}
