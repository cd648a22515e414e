//! DOM -> view tree ingestion.
//!
//! Block elements become child fragments, void elements become singles, and
//! every other element is transparent: its content flows into the enclosing
//! fragment while the formatters it matches contribute ranges over the span
//! it covered. What counts as formatting is decided entirely by the
//! registered formatters' `match_element` and `read`.

use crate::dom::{Dom, NodeId, NodeKind, is_void_element};
use crate::format::{FormatAbstractData, FormatEffect, FormatRange, FormatterKind, FormatterRef};
use crate::formatters::FormatterRegistry;

use super::{Content, ViewId, ViewTree};

/// Elements that open a fragment of their own.
pub const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "li", "ul", "ol",
    "table", "tbody", "thead", "tfoot", "tr", "td", "th",
];

pub fn is_block_element(tag: &str) -> bool {
    BLOCK_ELEMENTS.contains(&tag)
}

/// Whether the sibling at `index` (if any) is a block element.
fn is_block_at(dom: &Dom, siblings: &[NodeId], index: Option<usize>) -> bool {
    index
        .and_then(|i| siblings.get(i))
        .and_then(|&id| dom.tag(id))
        .is_some_and(is_block_element)
}

/// Build a view tree from the children of `root`.
///
/// Never fails: elements no formatter recognises simply contribute their
/// content without formatting.
pub fn parse_view_tree(dom: &Dom, root: NodeId, registry: &FormatterRegistry) -> ViewTree {
    let mut parser = Parser {
        dom,
        registry,
        tree: ViewTree::new(),
    };
    let top = parser.tree.root();
    let mut pending = Vec::new();
    parser.fill(top, root, 1, &mut pending);
    parser.commit(top, pending);
    tracing::debug!(target: "textbus::format", views = parser.tree.len(), "parsed view tree");
    parser.tree
}

/// A matched formatter waiting for its fragment's content to be complete.
struct Pending {
    formatter: FormatterRef,
    start: usize,
    end: usize,
    state: FormatEffect,
    data: Option<FormatAbstractData>,
    /// Nesting depth of the matched element; deeper elements win.
    depth: usize,
}

struct Parser<'a> {
    dom: &'a Dom,
    registry: &'a FormatterRegistry,
    tree: ViewTree,
}

impl Parser<'_> {
    fn length(&self, fragment: ViewId) -> usize {
        self.tree
            .fragment(fragment)
            .map(|f| f.content_length())
            .unwrap_or_default()
    }

    fn fill(&mut self, fragment: ViewId, node: NodeId, depth: usize, pending: &mut Vec<Pending>) {
        let dom = self.dom;
        let children = dom.children(node);
        for (index, &child) in children.iter().enumerate() {
            match dom.kind(child) {
                NodeKind::Text(text) => {
                    // Whitespace next to a block is source formatting
                    if text.trim().is_empty()
                        && (text.contains('\n')
                            || is_block_at(dom, children, index.checked_sub(1))
                            || is_block_at(dom, children, Some(index + 1)))
                    {
                        continue;
                    }
                    self.append(fragment, Content::Text(text.clone()));
                }
                NodeKind::Element(el) if is_void_element(el.tag()) => {
                    self.single(fragment, child);
                }
                NodeKind::Element(el) if is_block_element(el.tag()) => {
                    self.block(fragment, child);
                }
                NodeKind::Element(_) => {
                    let start = self.length(fragment);
                    self.fill(fragment, child, depth + 1, pending);
                    let end = self.length(fragment);
                    self.collect(child, start, end, depth, pending);
                }
                NodeKind::Fragment => self.fill(fragment, child, depth, pending),
            }
        }
    }

    fn append(&mut self, fragment: ViewId, content: Content) {
        if let Err(err) = self.tree.append(fragment, content) {
            tracing::warn!(target: "textbus::format", ?err, "dropped content during parse");
        }
    }

    fn block(&mut self, parent: ViewId, node: NodeId) {
        let fragment = self.tree.create_fragment();
        self.append(parent, Content::View(fragment));
        let mut pending = Vec::new();
        self.fill(fragment, node, 1, &mut pending);
        let len = self.length(fragment);
        self.collect(node, 0, len, 0, &mut pending);
        self.commit(fragment, pending);
    }

    fn single(&mut self, parent: ViewId, node: NodeId) {
        let Some(tag) = self.dom.tag(node) else {
            return;
        };
        let single = self.tree.create_single(tag);
        for formatter in self.registry.iter() {
            if formatter.match_element(self.dom, node) != FormatEffect::Valid {
                continue;
            }
            let range = FormatRange::valid(0, 1, formatter.read(self.dom, node));
            if let Err(err) = self.tree.apply(single, formatter, range, true) {
                tracing::warn!(target: "textbus::format", ?err, "failed to format single");
            }
        }
        self.append(parent, Content::View(single));
    }

    /// Record every formatter that recognises `node` over `[start, end)`.
    fn collect(
        &self,
        node: NodeId,
        start: usize,
        end: usize,
        depth: usize,
        pending: &mut Vec<Pending>,
    ) {
        for formatter in self.registry.iter() {
            let state = formatter.match_element(self.dom, node);
            if state == FormatEffect::Invalid {
                continue;
            }
            let data = (state == FormatEffect::Valid).then(|| formatter.read(self.dom, node));
            tracing::trace!(
                target: "textbus::format",
                formatter = formatter.name(),
                ?state,
                start,
                end,
                "matched element"
            );
            pending.push(Pending {
                formatter: formatter.clone(),
                start,
                end,
                state,
                data,
                depth,
            });
        }
    }

    /// Merge collected ranges outermost first, so inner elements override.
    /// Block formatters always span the whole fragment.
    fn commit(&mut self, fragment: ViewId, mut pending: Vec<Pending>) {
        let len = self.length(fragment);
        pending.sort_by_key(|p| p.depth);
        for p in pending {
            let (start, end) = match p.formatter.kind() {
                FormatterKind::Block => (0, len),
                FormatterKind::Inline => (p.start, p.end),
            };
            let range = FormatRange::new(start, end, p.state, p.data);
            if let Err(err) = self.tree.apply(fragment, &p.formatter, range, true) {
                tracing::warn!(target: "textbus::format", ?err, "failed to apply parsed format");
            }
        }
    }
}
