//! View tree -> DOM rendering.
//!
//! Every render builds a fresh [`Dom`] and a [`VirtualNodeMap`] tagging each
//! produced node with the view and content span it came from. The map is a
//! reverse lookup for the selection bridge, never ownership.
//!
//! # Fragments
//!
//! 1. Valid block formats fold (highest priority outermost) into the
//!    fragment's container. Without block formats the fragment is
//!    transparent and its content renders into the parent's slot.
//! 2. Valid inline ranges are split until they nest: a range crossing the end
//!    of an enclosing one is cut at that end and the tail re-queued.
//! 3. Ranges with identical spans fold together; nested spans render inside
//!    their parent's slot; gaps render raw content.
//! 4. An empty container gets a `<br>` placeholder so it can hold a caret.
//!
//! # Singles
//!
//! A bare element of the single's tag, with every Valid format folded onto
//! it starting from that element.

use std::collections::HashMap;

use crate::dom::{Dom, NodeId};
use crate::format::{FormatRange, FormatterKind, FormatterRef, Priority, fold_formats};

use super::{Content, ViewId, ViewKind, ViewTree};

/// What a tagged DOM node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VirtualRole {
    /// Block element of a fragment; `start..end` spans its whole content.
    Container,
    /// Inline format element over `start..end` of `fragment`.
    Format,
    /// Text slice `start..end` of `fragment`.
    Text,
    /// Element of a single sitting at `start` in `fragment`.
    Single,
    /// `<br>` filling an empty container.
    Placeholder,
}

/// Virtual node tag: the abstract origin of one rendered DOM node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualNode {
    /// The view whose render produced the node.
    pub owner: ViewId,
    /// The fragment whose content coordinates `start` and `end` are in.
    pub fragment: ViewId,
    pub start: usize,
    pub end: usize,
    pub role: VirtualRole,
}

/// Side table from DOM node to [`VirtualNode`], in render order.
#[derive(Debug, Clone, Default)]
pub struct VirtualNodeMap {
    tags: HashMap<NodeId, VirtualNode>,
    order: Vec<NodeId>,
}

impl VirtualNodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: NodeId, tag: VirtualNode) {
        if self.tags.insert(node, tag).is_none() {
            self.order.push(node);
        }
    }

    pub fn get(&self, node: NodeId) -> Option<&VirtualNode> {
        self.tags.get(&node)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Tagged nodes in render (document) order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &VirtualNode)> {
        self.order
            .iter()
            .filter_map(|n| self.tags.get(n).map(|tag| (*n, tag)))
    }

    /// Every node produced for `owner`, in render order.
    pub fn nodes_for(&self, owner: ViewId) -> impl Iterator<Item = NodeId> + '_ {
        self.iter()
            .filter(move |(_, tag)| tag.owner == owner)
            .map(|(n, _)| n)
    }

    /// Innermost container element of a fragment, if it rendered one.
    pub fn container_slot(&self, fragment: ViewId) -> Option<NodeId> {
        self.iter()
            .filter(|(_, tag)| tag.owner == fragment && tag.role == VirtualRole::Container)
            .map(|(n, _)| n)
            .last()
    }
}

/// A rendered view: a fresh DOM whose `host` fragment holds the output.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub dom: Dom,
    pub host: NodeId,
    pub vnodes: VirtualNodeMap,
}

impl RenderOutput {
    /// Serialized HTML of the host's content.
    pub fn html(&self) -> String {
        self.dom.inner_html(self.host)
    }
}

/// One Valid inline range queued for rendering.
#[derive(Clone)]
struct InlineSpan {
    start: usize,
    end: usize,
    priority: Priority,
    formatter: FormatterRef,
    range: FormatRange,
}

impl InlineSpan {
    /// Render order: start ascending, end descending, priority descending.
    fn key(&self) -> (usize, std::cmp::Reverse<usize>, std::cmp::Reverse<Priority>) {
        (
            self.start,
            std::cmp::Reverse(self.end),
            std::cmp::Reverse(self.priority),
        )
    }
}

/// Spans sharing one `[start, end)`, folded together, with nested groups.
struct SpanGroup {
    start: usize,
    end: usize,
    formats: Vec<(FormatterRef, FormatRange)>,
    children: Vec<SpanGroup>,
}

/// Renders a [`ViewTree`] into a fresh [`Dom`].
pub struct Renderer<'a> {
    tree: &'a ViewTree,
    placeholder: bool,
    dom: Dom,
    vnodes: VirtualNodeMap,
}

impl<'a> Renderer<'a> {
    pub fn new(tree: &'a ViewTree) -> Self {
        Self {
            tree,
            placeholder: true,
            dom: Dom::new(),
            vnodes: VirtualNodeMap::new(),
        }
    }

    /// Whether empty block containers get a `<br>` placeholder.
    pub fn with_placeholder(mut self, placeholder: bool) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Render the whole tree.
    pub fn render(self) -> RenderOutput {
        let root = self.tree.root();
        self.render_view(root)
    }

    /// Render one view into its own host fragment. A single whose fold
    /// produces nothing leaves the host empty.
    pub fn render_view(mut self, id: ViewId) -> RenderOutput {
        let host = self.dom.create_fragment();
        self.view(id, host);
        tracing::trace!(
            target: "textbus::render",
            view = ?id,
            nodes = self.dom.len(),
            tagged = self.vnodes.len(),
            "rendered view"
        );
        RenderOutput {
            dom: self.dom,
            host,
            vnodes: self.vnodes,
        }
    }

    fn view(&mut self, id: ViewId, slot: NodeId) {
        let tree = self.tree;
        match tree.get(id).map(|n| &n.kind) {
            Some(ViewKind::Fragment(_)) => self.fragment(id, slot),
            Some(ViewKind::Single(_)) => self.single(id, slot),
            None => {
                tracing::warn!(target: "textbus::render", view = ?id, "skipping unknown view");
            }
        }
    }

    fn tag(&mut self, node: NodeId, tag: VirtualNode) {
        self.vnodes.insert(node, tag);
    }

    fn single(&mut self, id: ViewId, slot: NodeId) {
        let tree = self.tree;
        let Ok(single) = tree.single(id) else {
            return;
        };
        let fragment = tree.parent(id).unwrap_or(id);
        let start = tree.find(id).unwrap_or_default();

        let bare = self.dom.create_element(single.tag_name());
        let formats = single.matrix.all_applicable();
        let Some(folded) = fold_formats(&mut self.dom, formats, Some(bare)) else {
            return;
        };
        self.dom.append_child(slot, folded.root);
        for node in folded.chain {
            self.tag(
                node,
                VirtualNode {
                    owner: id,
                    fragment,
                    start,
                    end: start + 1,
                    role: VirtualRole::Single,
                },
            );
        }
    }

    fn fragment(&mut self, id: ViewId, parent_slot: NodeId) {
        let tree = self.tree;
        let Ok(frag) = tree.fragment(id) else {
            return;
        };
        let len = frag.content_length();

        let blocks = frag.matrix.applicable(FormatterKind::Block);
        let container = fold_formats(&mut self.dom, blocks, None);
        let slot = match &container {
            Some(folded) => {
                self.dom.append_child(parent_slot, folded.root);
                for &node in &folded.chain {
                    self.tag(
                        node,
                        VirtualNode {
                            owner: id,
                            fragment: id,
                            start: 0,
                            end: len,
                            role: VirtualRole::Container,
                        },
                    );
                }
                folded.slot
            }
            None => parent_slot,
        };

        let groups = nest(laminate(inline_spans(tree, id)));
        self.range(id, slot, 0, len, &groups);

        if container.is_some() && len == 0 && self.placeholder {
            let br = self.dom.create_element("br");
            self.dom.append_child(slot, br);
            self.tag(
                br,
                VirtualNode {
                    owner: id,
                    fragment: id,
                    start: 0,
                    end: 0,
                    role: VirtualRole::Placeholder,
                },
            );
        }
    }

    /// Render `[start, end)` of a fragment into `slot`, wrapping `groups`.
    fn range(&mut self, id: ViewId, slot: NodeId, start: usize, end: usize, groups: &[SpanGroup]) {
        let mut cursor = start;
        for group in groups {
            if cursor < group.start {
                self.content(id, slot, cursor, group.start);
            }
            let formats = group.formats.iter().map(|(f, r)| (f, r));
            let inner = match fold_formats(&mut self.dom, formats, None) {
                Some(folded) => {
                    self.dom.append_child(slot, folded.root);
                    for node in folded.chain {
                        self.tag(
                            node,
                            VirtualNode {
                                owner: id,
                                fragment: id,
                                start: group.start,
                                end: group.end,
                                role: VirtualRole::Format,
                            },
                        );
                    }
                    folded.slot
                }
                None => slot,
            };
            self.range(id, inner, group.start, group.end, &group.children);
            cursor = group.end;
        }
        if cursor < end {
            self.content(id, slot, cursor, end);
        }
    }

    /// Raw content of `[start, end)`: text slices and child views.
    fn content(&mut self, id: ViewId, slot: NodeId, start: usize, end: usize) {
        let tree = self.tree;
        let Ok(frag) = tree.fragment(id) else {
            return;
        };
        let mut offset = 0;
        for content in frag.contents() {
            let len = content.len();
            let (lo, hi) = (start.max(offset), end.min(offset + len));
            if lo < hi {
                match content {
                    Content::Text(text) => {
                        let slice: String =
                            text.chars().skip(lo - offset).take(hi - lo).collect();
                        let node = self.dom.create_text(&slice);
                        self.dom.append_child(slot, node);
                        self.tag(
                            node,
                            VirtualNode {
                                owner: id,
                                fragment: id,
                                start: lo,
                                end: hi,
                                role: VirtualRole::Text,
                            },
                        );
                    }
                    Content::View(child) => self.view(*child, slot),
                }
            }
            offset += len;
            if offset >= end {
                break;
            }
        }
    }
}

/// Convenience for rendering the whole tree.
pub fn render_tree(tree: &ViewTree, placeholder: bool) -> RenderOutput {
    Renderer::new(tree).with_placeholder(placeholder).render()
}

fn inline_spans(tree: &ViewTree, id: ViewId) -> Vec<InlineSpan> {
    let Ok(frag) = tree.fragment(id) else {
        return Vec::new();
    };
    frag.matrix
        .applicable(FormatterKind::Inline)
        .into_iter()
        .filter(|(_, r)| !r.is_empty())
        .map(|(f, r)| InlineSpan {
            start: r.start_index,
            end: r.end_index,
            priority: f.priority(),
            formatter: f.clone(),
            range: r.clone(),
        })
        .collect()
}

/// Split crossing spans until every pair is nested or disjoint. Output is in
/// render order.
fn laminate(spans: Vec<InlineSpan>) -> Vec<InlineSpan> {
    // Reverse-sorted so `pop` yields the next span in render order.
    let mut pending = spans;
    pending.sort_by(|a, b| b.key().cmp(&a.key()));

    let mut out = Vec::with_capacity(pending.len());
    let mut open: Vec<usize> = Vec::new();
    while let Some(mut span) = pending.pop() {
        while open.last().is_some_and(|&end| end <= span.start) {
            open.pop();
        }
        if let Some(&end) = open.last() {
            if end < span.end {
                let mut tail = span.clone();
                tail.start = end;
                span.end = end;
                pending.push(tail);
                pending.sort_by(|a, b| b.key().cmp(&a.key()));
            }
        }
        open.push(span.end);
        out.push(span);
    }
    out
}

/// Group identical spans and nest the groups. Input must be laminar and in
/// render order.
fn nest(spans: Vec<InlineSpan>) -> Vec<SpanGroup> {
    let mut roots: Vec<SpanGroup> = Vec::new();
    let mut stack: Vec<SpanGroup> = Vec::new();

    fn close(stack: &mut Vec<SpanGroup>, roots: &mut Vec<SpanGroup>) {
        if let Some(done) = stack.pop() {
            match stack.last_mut() {
                Some(parent) => parent.children.push(done),
                None => roots.push(done),
            }
        }
    }

    for span in spans {
        if let Some(top) = stack.last_mut() {
            if top.start == span.start && top.end == span.end {
                top.formats.push((span.formatter, span.range));
                continue;
            }
        }
        while stack
            .last()
            .is_some_and(|top| !(top.start <= span.start && span.end <= top.end))
        {
            close(&mut stack, &mut roots);
        }
        stack.push(SpanGroup {
            start: span.start,
            end: span.end,
            formats: vec![(span.formatter, span.range)],
            children: Vec::new(),
        });
    }
    while !stack.is_empty() {
        close(&mut stack, &mut roots);
    }
    roots
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use insta::assert_snapshot;

    use super::*;
    use crate::format::{FormatAbstractData, FormatEffect};
    use crate::formatters::{FormatterRegistry, InlineTagFormatter};
    use crate::html::parse_html;
    use crate::view::parse::parse_view_tree;

    fn round_trip(html: &str) -> String {
        let (dom, root) = parse_html(html);
        let registry = FormatterRegistry::with_defaults().unwrap();
        let tree = parse_view_tree(&dom, root, &registry);
        render_tree(&tree, true).html()
    }

    #[test]
    fn test_render_paragraph_with_bold() {
        assert_snapshot!(round_trip("<p>ab<strong>cd</strong>e</p>"), @"<p>ab<strong>cd</strong>e</p>");
    }

    #[test]
    fn test_render_stacks_by_priority() {
        // Bold (InlineTag) wraps outward; color (InlineStyle) lands on it.
        assert_snapshot!(
            round_trip(r#"<p><span style="color: red"><strong>x</strong></span></p>"#),
            @r#"<p><strong style="color: red">x</strong></p>"#
        );
    }

    #[test]
    fn test_render_crossing_ranges_nest() {
        assert_snapshot!(
            round_trip("<p><strong>ab<em>c</em></strong><em>d</em></p>"),
            @"<p><strong>ab<em>c</em></strong><em>d</em></p>"
        );
    }

    #[test]
    fn test_render_block_styles_on_container() {
        assert_snapshot!(
            round_trip(r#"<p style="text-align: center; margin-left: 10px">x</p>"#),
            @r#"<p style="text-align: center; margin: 0 0 10px 0">x</p>"#
        );
    }

    #[test]
    fn test_render_lists_and_tables() {
        assert_snapshot!(
            round_trip("<ul><li>a</li><li>b</li></ul>"),
            @"<ul><li>a</li><li>b</li></ul>"
        );
        assert_snapshot!(
            round_trip(r#"<table border="1"><tbody><tr><td>x</td></tr></tbody></table>"#),
            @r#"<table border="1"><tbody><tr><td>x</td></tr></tbody></table>"#
        );
    }

    #[test]
    fn test_render_singles_and_placeholder() {
        assert_snapshot!(
            round_trip(r#"<p>a<img src="x.png">b</p><p></p>"#),
            @r#"<p>a<img src="x.png">b</p><p><br></p>"#
        );
    }

    #[test]
    fn test_laminate_splits_crossing_span() {
        let bold: FormatterRef = Rc::new(InlineTagFormatter::bold().unwrap());
        let italic: FormatterRef = Rc::new(InlineTagFormatter::italic().unwrap());
        let mut tree = ViewTree::new();
        let p = tree.create_fragment();
        tree.append(tree.root(), Content::View(p)).unwrap();
        tree.append(p, Content::Text("abcdef".into())).unwrap();
        tree.apply(p, &bold, FormatRange::valid(0, 4, FormatAbstractData::new().with_tag("strong")), true)
            .unwrap();
        tree.apply(p, &italic, FormatRange::valid(2, 6, FormatAbstractData::new().with_tag("em")), true)
            .unwrap();

        let spans: Vec<(usize, usize, &str)> = laminate(inline_spans(&tree, p))
            .iter()
            .map(|s| (s.start, s.end, if s.formatter.name() == "bold" { "b" } else { "i" }))
            .collect();
        assert_eq!(spans, vec![(0, 4, "b"), (2, 4, "i"), (4, 6, "i")]);

        let out = render_tree(&tree, true);
        assert_eq!(out.html(), "<strong>ab<em>cd</em></strong><em>ef</em>");
    }

    #[test]
    fn test_every_node_tagged() {
        let (dom, root) = parse_html(r#"<p>a<strong>b</strong><img src="i"></p><p></p>"#);
        let registry = FormatterRegistry::with_defaults().unwrap();
        let tree = parse_view_tree(&dom, root, &registry);
        let out = render_tree(&tree, true);

        for node in out.dom.descendants(out.host) {
            assert!(out.vnodes.get(node).is_some(), "untagged {node:?}");
        }

        let p = tree.fragment(tree.root()).unwrap().child_views().next().unwrap();
        let strong_text = out
            .vnodes
            .iter()
            .find(|(n, tag)| tag.role == VirtualRole::Text && out.dom.text(*n) == Some("b"))
            .map(|(_, tag)| *tag)
            .unwrap();
        assert_eq!((strong_text.fragment, strong_text.start, strong_text.end), (p, 1, 2));
        assert!(out.vnodes.container_slot(p).is_some());
    }

    #[test]
    fn test_inherit_ranges_not_rendered() {
        let bold: FormatterRef = Rc::new(InlineTagFormatter::bold().unwrap());
        let mut tree = ViewTree::new();
        tree.append(tree.root(), Content::Text("xy".into())).unwrap();
        tree.apply(tree.root(), &bold, FormatRange::new(0, 2, FormatEffect::Inherit, None), true)
            .unwrap();
        assert_eq!(render_tree(&tree, true).html(), "xy");
    }
}
