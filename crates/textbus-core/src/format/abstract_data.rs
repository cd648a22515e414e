//! Structural snapshot of what an element needs to satisfy a formatter.

use std::collections::{BTreeMap, BTreeSet};

use smol_str::SmolStr;

use crate::dom::{Dom, NodeId};

/// Tag, attributes, styles and classes a formatter cares about.
///
/// Produced by [`Formatter::read`](crate::Formatter::read) from existing DOM
/// or synthesized by a commander. Ordered collections keep equality and
/// iteration deterministic. Values are built once with the `with_*` methods
/// and compared or cloned afterwards, never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatAbstractData {
    pub tag: Option<SmolStr>,
    pub attrs: BTreeMap<SmolStr, String>,
    pub styles: BTreeMap<SmolStr, String>,
    pub classes: BTreeSet<SmolStr>,
}

impl FormatAbstractData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, tag: impl Into<SmolStr>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_style(mut self, name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        self.styles.insert(name.into(), value.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<SmolStr>) -> Self {
        self.classes.insert(class.into());
        self
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn style(&self, name: &str) -> Option<&str> {
        self.styles.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tag.is_none() && self.attrs.is_empty() && self.styles.is_empty() && self.classes.is_empty()
    }

    /// Full snapshot of an element: tag, every attribute, style and class.
    ///
    /// Formatters narrow this down to their own concern in `read`.
    pub fn from_element(dom: &Dom, node: NodeId) -> Self {
        let Some(el) = dom.element(node) else {
            return Self::default();
        };
        Self {
            tag: Some(SmolStr::new(el.tag())),
            attrs: el
                .attributes()
                .map(|(k, v)| (SmolStr::new(k), v.to_string()))
                .collect(),
            styles: el
                .styles()
                .map(|(k, v)| (SmolStr::new(k), v.to_string()))
                .collect(),
            classes: el.classes().map(SmolStr::new).collect(),
        }
    }

    /// Write the attributes, classes and styles of this snapshot onto an
    /// element. The tag is not touched.
    pub fn apply_to(&self, dom: &mut Dom, node: NodeId) {
        let Some(el) = dom.element_mut(node) else {
            return;
        };
        for (name, value) in &self.attrs {
            el.set_attribute(name, value);
        }
        for class in &self.classes {
            el.add_class(class);
        }
        for (name, value) in &self.styles {
            el.set_style(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_element() {
        let mut dom = Dom::new();
        let img = dom.create_element("img");
        dom.set_attribute(img, "src", "a.png");
        dom.set_attribute(img, "style", "width: 10px");
        dom.set_attribute(img, "class", "inline");

        let data = FormatAbstractData::from_element(&dom, img);
        assert_eq!(data.tag(), Some("img"));
        assert_eq!(data.attr("src"), Some("a.png"));
        assert_eq!(data.style("width"), Some("10px"));
        assert!(data.classes.contains("inline"));
    }

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a = FormatAbstractData::new()
            .with_style("margin-top", "1px")
            .with_style("margin-left", "2px");
        let b = FormatAbstractData::new()
            .with_style("margin-left", "2px")
            .with_style("margin-top", "1px");
        assert_eq!(a, b);
    }

    #[test]
    fn test_apply_to_element() {
        let mut dom = Dom::new();
        let span = dom.create_element("span");
        FormatAbstractData::new()
            .with_style("color", "red")
            .with_attr("title", "t")
            .apply_to(&mut dom, span);
        assert_eq!(dom.to_html(span), r#"<span title="t" style="color: red"></span>"#);
    }
}
