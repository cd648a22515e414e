use crate::dom::{Dom, NodeId};
use crate::view::render::{RenderOutput, VirtualNode, VirtualNodeMap, VirtualRole};
use crate::view::{ViewId, ViewTree};

use super::{AbstractPosition, NativePosition, NativeRange, TbRange};

/// Maps native positions in one render onto the view tree and back.
///
/// Valid only for the render it was built from: every render produces a
/// fresh DOM and virtual node map.
#[derive(Debug, Clone, Copy)]
pub struct SelectionBridge<'a> {
    tree: &'a ViewTree,
    dom: &'a Dom,
    vnodes: &'a VirtualNodeMap,
    host: NodeId,
}

impl<'a> SelectionBridge<'a> {
    pub fn new(tree: &'a ViewTree, output: &'a RenderOutput) -> Self {
        Self {
            tree,
            dom: &output.dom,
            vnodes: &output.vnodes,
            host: output.host,
        }
    }

    /// Retarget an element position whose child at `offset` is a text node
    /// onto that text node at offset 0.
    ///
    /// Containers holding only a `<br>` otherwise report element offsets that
    /// all collapse to the start of the fragment.
    pub fn fix_up(&self, pos: NativePosition) -> NativePosition {
        if !self.dom.contains(pos.node) || self.dom.is_text(pos.node) {
            return pos;
        }
        match self.dom.children(pos.node).get(pos.offset) {
            Some(&child) if self.dom.is_text(child) => {
                tracing::trace!(target: "textbus::selection", ?pos, "retarget to text child");
                NativePosition::new(child, 0)
            }
            _ => pos,
        }
    }

    /// Native -> abstract. `None` when the node is not part of this render.
    pub fn to_abstract(&self, pos: NativePosition) -> Option<AbstractPosition> {
        if !self.dom.contains(pos.node) {
            tracing::warn!(target: "textbus::selection", ?pos, "position outside the rendered document");
            return None;
        }
        let pos = self.fix_up(pos);

        let resolved = if self.dom.is_text(pos.node) {
            match self.vnodes.get(pos.node) {
                Some(tag) => Some(AbstractPosition::new(
                    tag.fragment,
                    tag.start + pos.offset.min(tag.end - tag.start),
                )),
                None => self.nearest_tagged(pos.node),
            }
        } else {
            let children = self.dom.children(pos.node);
            match (children.get(pos.offset), children.last()) {
                (Some(&child), _) => self.before(child),
                (None, Some(&last)) => self.after(last),
                (None, None) => self.inside_empty(pos.node),
            }
        };
        tracing::trace!(target: "textbus::selection", ?pos, ?resolved, "native to abstract");
        resolved
    }

    /// Abstract -> native.
    ///
    /// Prefers a text node whose span holds the offset, then an element
    /// boundary at the offset, then the end of the fragment's container.
    pub fn to_native(&self, pos: AbstractPosition) -> Option<NativePosition> {
        let text = self.vnodes.iter().find(|(_, tag)| {
            tag.role == VirtualRole::Text
                && tag.fragment == pos.fragment
                && tag.start <= pos.offset
                && pos.offset <= tag.end
        });
        if let Some((node, tag)) = text {
            return Some(NativePosition::new(node, pos.offset - tag.start));
        }

        for (node, tag) in self.vnodes.iter() {
            let boundary = match tag.role {
                VirtualRole::Format | VirtualRole::Single if tag.fragment == pos.fragment => {
                    if tag.start == pos.offset {
                        self.boundary(node, 0)
                    } else if tag.end == pos.offset {
                        self.boundary(node, 1)
                    } else {
                        None
                    }
                }
                VirtualRole::Container if self.tree.parent(tag.owner) == Some(pos.fragment) => {
                    match self.tree.find(tag.owner) {
                        Some(at) if at == pos.offset => self.boundary(node, 0),
                        Some(at) if at + 1 == pos.offset => self.boundary(node, 1),
                        _ => None,
                    }
                }
                VirtualRole::Placeholder if tag.fragment == pos.fragment && pos.offset == 0 => {
                    self.boundary(node, 0)
                }
                _ => None,
            };
            if boundary.is_some() {
                return boundary;
            }
        }

        let slot = self.vnodes.container_slot(pos.fragment).or_else(|| {
            (pos.fragment == self.tree.root()).then_some(self.host)
        });
        match slot {
            Some(slot) => Some(NativePosition::new(slot, self.dom.children(slot).len())),
            None => {
                tracing::warn!(target: "textbus::selection", ?pos, "no native position for abstract position");
                None
            }
        }
    }

    pub fn range_to_abstract(&self, range: &NativeRange) -> Option<TbRange> {
        let start = self.to_abstract(range.start)?;
        let end = self.to_abstract(range.end)?;
        Some(TbRange::new(start, end).with_raw(*range).normalized(self.tree))
    }

    pub fn range_to_native(&self, range: &TbRange) -> Option<NativeRange> {
        Some(NativeRange::new(
            self.to_native(range.start)?,
            self.to_native(range.end)?,
        ))
    }

    /// Position in the parent before (`after == 0`) or after the node.
    fn boundary(&self, node: NodeId, after: usize) -> Option<NativePosition> {
        let parent = self.dom.parent(node)?;
        let index = self.dom.child_index(node)?;
        Some(NativePosition::new(parent, index + after))
    }

    /// Position of a child view within its parent fragment.
    fn view_offset(&self, view: ViewId) -> Option<(ViewId, usize)> {
        Some((self.tree.parent(view)?, self.tree.find(view)?))
    }

    fn before(&self, node: NodeId) -> Option<AbstractPosition> {
        let Some(tag) = self.vnodes.get(node) else {
            return match self.first_tagged_descendant(node) {
                Some(inner) => self.before(inner),
                None => self.nearest_tagged(node),
            };
        };
        Some(match tag.role {
            VirtualRole::Text | VirtualRole::Format | VirtualRole::Single => {
                AbstractPosition::new(tag.fragment, tag.start)
            }
            VirtualRole::Container => match self.view_offset(tag.owner) {
                Some((parent, at)) => AbstractPosition::new(parent, at),
                None => AbstractPosition::new(tag.owner, 0),
            },
            VirtualRole::Placeholder => AbstractPosition::new(tag.fragment, 0),
        })
    }

    fn after(&self, node: NodeId) -> Option<AbstractPosition> {
        let Some(tag) = self.vnodes.get(node) else {
            return match self.last_tagged_descendant(node) {
                Some(inner) => self.after(inner),
                None => self.nearest_tagged(node),
            };
        };
        Some(match tag.role {
            VirtualRole::Text | VirtualRole::Format | VirtualRole::Single => {
                AbstractPosition::new(tag.fragment, tag.end)
            }
            VirtualRole::Container => match self.view_offset(tag.owner) {
                Some((parent, at)) => AbstractPosition::new(parent, at + 1),
                None => AbstractPosition::new(tag.owner, tag.end),
            },
            VirtualRole::Placeholder => AbstractPosition::new(tag.fragment, 0),
        })
    }

    /// An element with no children.
    fn inside_empty(&self, node: NodeId) -> Option<AbstractPosition> {
        if node == self.host {
            return Some(AbstractPosition::new(self.tree.root(), 0));
        }
        match self.vnodes.get(node) {
            Some(tag) => Some(start_of(tag)),
            None => self.nearest_tagged(node),
        }
    }

    /// Walk up to the nearest tagged ancestor and take its start.
    fn nearest_tagged(&self, node: NodeId) -> Option<AbstractPosition> {
        for ancestor in self.dom.ancestors(node) {
            if let Some(tag) = self.vnodes.get(ancestor) {
                return Some(start_of(tag));
            }
            if ancestor == self.host {
                return Some(AbstractPosition::new(self.tree.root(), 0));
            }
        }
        tracing::warn!(target: "textbus::selection", ?node, "no tagged ancestor");
        None
    }

    fn first_tagged_descendant(&self, node: NodeId) -> Option<NodeId> {
        self.dom
            .descendants(node)
            .into_iter()
            .find(|n| self.vnodes.get(*n).is_some())
    }

    fn last_tagged_descendant(&self, node: NodeId) -> Option<NodeId> {
        self.dom
            .descendants(node)
            .into_iter()
            .rev()
            .find(|n| self.vnodes.get(*n).is_some())
    }
}

fn start_of(tag: &VirtualNode) -> AbstractPosition {
    match tag.role {
        VirtualRole::Container => AbstractPosition::new(tag.owner, 0),
        _ => AbstractPosition::new(tag.fragment, tag.start),
    }
}
