//! Arena-backed DOM surface.
//!
//! The editor never treats the DOM as authoritative: it is re-derived from the
//! view tree on every render. This module provides the minimal element/text/
//! fragment model the renderer writes into, the formatters read from, and the
//! selection bridge walks. Platform layers (see `textbus-browser`) mirror it
//! into a live document.
//!
//! Nodes are never freed individually. A render builds a fresh [`Dom`], so
//! detached nodes only live as long as the render that produced them.

use smol_str::SmolStr;

/// Elements that never have children and serialize without a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Check whether a tag name is a void element.
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Identity of a node within one [`Dom`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Arena index of this node.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Tag, attributes, classes and inline styles of an element.
///
/// `class` and `style` attributes are split out on write so formatters can
/// query individual classes and style properties.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementData {
    tag: SmolStr,
    attrs: Vec<(SmolStr, String)>,
    classes: Vec<SmolStr>,
    styles: Vec<(SmolStr, String)>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: SmolStr::new(tag.to_ascii_lowercase()),
            ..Default::default()
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Get an attribute. `class` and `style` are reassembled from their parts.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Plain attributes in insertion order, excluding `class` and `style`.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set an attribute. `style` replaces the parsed style list, `class`
    /// replaces the class list.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "style" => self.styles = parse_style(value),
            "class" => {
                self.classes = value.split_whitespace().map(SmolStr::new).collect();
            }
            _ => match self.attrs.iter_mut().find(|(k, _)| *k == name) {
                Some((_, v)) => *v = value.to_string(),
                None => self.attrs.push((SmolStr::new(name), value.to_string())),
            },
        }
    }

    pub fn remove_attribute(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| k != name);
    }

    /// Get an inline style property (kebab-case name).
    pub fn style(&self, name: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn styles(&self) -> impl Iterator<Item = (&str, &str)> {
        self.styles.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set an inline style property. An empty value removes it.
    pub fn set_style(&mut self, name: &str, value: &str) {
        if value.is_empty() {
            self.remove_style(name);
            return;
        }
        match self.styles.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.styles.push((SmolStr::new(name), value.to_string())),
        }
    }

    pub fn remove_style(&mut self, name: &str) {
        self.styles.retain(|(k, _)| k != name);
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|c| c.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(SmolStr::new(class));
        }
    }
}

/// Parse a `style` attribute into `(property, value)` pairs.
///
/// Property names are lowercased; declarations without a colon or with an
/// empty value are skipped.
pub fn parse_style(style: &str) -> Vec<(SmolStr, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some((SmolStr::new(name), value.to_string()))
        })
        .collect()
}

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(ElementData),
    Text(String),
    /// A document fragment: a parentless host whose children move on append.
    Fragment,
}

#[derive(Debug, Clone)]
struct DomNode {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An arena of DOM nodes.
#[derive(Debug, Clone, Default)]
pub struct Dom {
    nodes: Vec<DomNode>,
}

impl Dom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes ever created in this arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check whether an id belongs to this arena.
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(DomNode {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element(ElementData::new(tag)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.push(NodeKind::Fragment)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(id.index())?.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(id.index())?.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(ElementData::tag)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id.index())?.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.text(id).is_some()
    }

    pub fn is_fragment(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Fragment)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Position of a node among its parent's children.
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Ancestors from the parent upwards.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |n| self.parent(*n))
    }

    /// All descendants in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Remove a node from its parent. The node and its subtree stay valid.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|c| *c != id);
        }
    }

    /// Append `child` to `parent`. Appending a fragment moves its children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Insert `child` before `reference`, or at the end when `reference` is
    /// `None` or not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        debug_assert!(
            parent != child && !self.ancestors(parent).any(|a| a == child),
            "inserting a node into its own subtree"
        );
        let moved: Vec<NodeId> = if self.is_fragment(child) {
            std::mem::take(&mut self.nodes[child.index()].children)
        } else {
            self.detach(child);
            vec![child]
        };

        let mut at = reference
            .and_then(|r| self.children(parent).iter().position(|c| *c == r))
            .unwrap_or(self.children(parent).len());
        for node in moved {
            self.nodes[node.index()].parent = Some(parent);
            self.nodes[parent.index()].children.insert(at, node);
            at += 1;
        }
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attribute(name)
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.set_attribute(name, value);
        }
    }

    pub fn style(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.style(name)
    }

    pub fn set_style(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            el.set_style(name, value);
        }
    }

    /// Serialize a node including itself. Fragments serialize their children.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Serialize only the children of a node.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_node(*child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Text(text) => out.push_str(&html_escape::encode_text(text)),
            NodeKind::Fragment => {
                for child in self.children(id) {
                    self.write_node(*child, out);
                }
            }
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(el.tag());
                for (name, value) in el.attributes() {
                    push_attr(out, name, value);
                }
                if !el.classes.is_empty() {
                    push_attr(out, "class", &el.classes.join(" "));
                }
                if !el.styles.is_empty() {
                    let style = el
                        .styles()
                        .map(|(k, v)| format!("{k}: {v}"))
                        .collect::<Vec<_>>()
                        .join("; ");
                    push_attr(out, "style", &style);
                }
                out.push('>');
                if is_void_element(el.tag()) {
                    return;
                }
                for child in self.children(id) {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(el.tag());
                out.push('>');
            }
        }
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&html_escape::encode_double_quoted_attribute(value));
    out.push('"');
}
