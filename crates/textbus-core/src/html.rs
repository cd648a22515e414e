//! HTML ingestion.
//!
//! Initial content arrives as an HTML string. We let `html5ever` do the
//! browser-grade tokenizing and tree construction, then copy the `<body>`
//! subtree into our own [`Dom`] arena. Comments, doctypes and processing
//! instructions are dropped.

use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, parse_document};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::dom::{Dom, NodeId};

/// Parse an HTML string into a fresh [`Dom`].
///
/// Returns the arena and a fragment node holding the body content. Malformed
/// markup is repaired by the parser, never rejected.
pub fn parse_html(html: &str) -> (Dom, NodeId) {
    let rc = parse_document(RcDom::default(), ParseOpts::default()).one(html);

    let mut dom = Dom::new();
    let root = dom.create_fragment();
    if let Some(body) = find_body(&rc.document) {
        for child in body.children.borrow().iter() {
            import_node(&mut dom, root, child);
        }
    }
    tracing::trace!(target: "textbus::parse", nodes = dom.len(), "imported html");
    (dom, root)
}

fn find_body(handle: &Handle) -> Option<Handle> {
    if let NodeData::Element { name, .. } = &handle.data {
        if &*name.local == "body" {
            return Some(handle.clone());
        }
    }
    handle.children.borrow().iter().find_map(find_body)
}

fn import_node(dom: &mut Dom, parent: NodeId, handle: &Handle) {
    match &handle.data {
        NodeData::Text { contents } => {
            let contents = contents.borrow();
            let text = dom.create_text(&contents);
            dom.append_child(parent, text);
        }
        NodeData::Element { name, attrs, .. } => {
            let element = dom.create_element(&name.local);
            for attr in attrs.borrow().iter() {
                dom.set_attribute(element, &attr.name.local, &attr.value);
            }
            for child in handle.children.borrow().iter() {
                import_node(dom, element, child);
            }
            dom.append_child(parent, element);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body_content() {
        let (dom, root) = parse_html("<p>Hello <strong>world</strong></p><!-- gone -->");
        assert_eq!(dom.inner_html(root), "<p>Hello <strong>world</strong></p>");
    }

    #[test]
    fn test_parse_attributes_and_styles() {
        let (dom, root) = parse_html(r#"<p style="margin-left: 10px; color: red" class="a">x</p>"#);
        let p = dom.children(root)[0];
        assert_eq!(dom.style(p, "margin-left"), Some("10px"));
        assert_eq!(dom.style(p, "color"), Some("red"));
        assert!(dom.element(p).is_some_and(|el| el.has_class("a")));
    }

    #[test]
    fn test_parse_repairs_malformed_markup() {
        let (dom, root) = parse_html("<p><b>unclosed");
        assert_eq!(dom.inner_html(root), "<p><b>unclosed</b></p>");
    }
}
