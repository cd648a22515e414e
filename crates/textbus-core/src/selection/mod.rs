//! Selection model.
//!
//! Native positions address the rendered [`Dom`](crate::dom::Dom); abstract
//! positions address fragment content. The [`SelectionBridge`] converts
//! between the two after every render.

mod bridge;
pub mod cursor;

pub use bridge::SelectionBridge;
pub use cursor::{
    CaretBlink, CaretStyle, CursorRect, FontMetrics, compute_line_height, place_caret,
};

use std::cmp::Ordering;

use crate::dom::NodeId;
use crate::view::{ViewId, ViewTree};

/// A point in the rendered DOM: a node and an offset into it (characters for
/// text nodes, child index for elements).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativePosition {
    pub node: NodeId,
    pub offset: usize,
}

impl NativePosition {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A native selection range. `start` is the anchor and may come after `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeRange {
    pub start: NativePosition,
    pub end: NativePosition,
}

impl NativeRange {
    pub fn new(start: NativePosition, end: NativePosition) -> Self {
        Self { start, end }
    }

    pub fn collapsed(at: NativePosition) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// A point in the view tree: an offset into a fragment's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AbstractPosition {
    pub fragment: ViewId,
    pub offset: usize,
}

impl AbstractPosition {
    pub fn new(fragment: ViewId, offset: usize) -> Self {
        Self { fragment, offset }
    }
}

/// Document-order comparison of two abstract positions.
pub fn compare_positions(tree: &ViewTree, a: &AbstractPosition, b: &AbstractPosition) -> Ordering {
    let mut pa = tree.path(a.fragment);
    pa.push(a.offset);
    let mut pb = tree.path(b.fragment);
    pb.push(b.offset);
    pa.cmp(&pb)
}

/// An abstract selection range, with the native range it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TbRange {
    pub start: AbstractPosition,
    pub end: AbstractPosition,
    pub raw_range: Option<NativeRange>,
}

impl TbRange {
    pub fn new(start: AbstractPosition, end: AbstractPosition) -> Self {
        Self {
            start,
            end,
            raw_range: None,
        }
    }

    pub fn collapsed(at: AbstractPosition) -> Self {
        Self::new(at, at)
    }

    pub fn with_raw(mut self, raw: NativeRange) -> Self {
        self.raw_range = Some(raw);
        self
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Same range with `start` before `end` in document order.
    pub fn normalized(mut self, tree: &ViewTree) -> Self {
        if compare_positions(tree, &self.start, &self.end) == Ordering::Greater {
            std::mem::swap(&mut self.start, &mut self.end);
        }
        self
    }
}

/// Where the current interaction is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPhase {
    #[default]
    Idle,
    Selecting {
        collapsed: bool,
    },
    /// A command ran against the current ranges.
    Applied,
}

/// Selection of the current interaction. Recomputed on every selection
/// event; never persisted past one edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TbSelection {
    ranges: Vec<TbRange>,
    phase: SelectionPhase,
}

impl TbSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ranges(&self) -> &[TbRange] {
        &self.ranges
    }

    pub fn first(&self) -> Option<&TbRange> {
        self.ranges.first()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn phase(&self) -> SelectionPhase {
        self.phase
    }

    pub fn is_collapsed(&self) -> bool {
        self.ranges.iter().all(TbRange::is_collapsed)
    }

    /// Replace the ranges from a fresh selection read. No ranges means no
    /// selection: back to idle.
    pub fn update(&mut self, ranges: Vec<TbRange>) {
        self.ranges = ranges;
        self.phase = if self.ranges.is_empty() {
            SelectionPhase::Idle
        } else {
            SelectionPhase::Selecting {
                collapsed: self.is_collapsed(),
            }
        };
    }

    /// A command has run. Ranges are kept so the caller can restore them.
    pub fn mark_applied(&mut self) {
        if !self.ranges.is_empty() {
            self.phase = SelectionPhase::Applied;
        }
    }

    /// End of the interaction.
    pub fn finish(&mut self) {
        self.phase = SelectionPhase::Idle;
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
        self.phase = SelectionPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Content;

    #[test]
    fn test_phase_lifecycle() {
        let mut tree = ViewTree::new();
        tree.append(tree.root(), Content::Text("abc".into())).unwrap();
        let root = tree.root();

        let mut selection = TbSelection::new();
        assert_eq!(selection.phase(), SelectionPhase::Idle);

        selection.update(vec![TbRange::collapsed(AbstractPosition::new(root, 1))]);
        assert_eq!(selection.phase(), SelectionPhase::Selecting { collapsed: true });

        selection.update(vec![TbRange::new(
            AbstractPosition::new(root, 0),
            AbstractPosition::new(root, 2),
        )]);
        assert_eq!(selection.phase(), SelectionPhase::Selecting { collapsed: false });

        selection.mark_applied();
        assert_eq!(selection.phase(), SelectionPhase::Applied);
        selection.finish();
        assert_eq!(selection.phase(), SelectionPhase::Idle);
        assert_eq!(selection.ranges().len(), 1);

        selection.update(Vec::new());
        assert_eq!(selection.phase(), SelectionPhase::Idle);
        selection.mark_applied();
        assert_eq!(selection.phase(), SelectionPhase::Idle);
    }

    #[test]
    fn test_normalize_backward_range() {
        let mut tree = ViewTree::new();
        let p = tree.create_fragment();
        let q = tree.create_fragment();
        tree.append(tree.root(), Content::View(p)).unwrap();
        tree.append(tree.root(), Content::View(q)).unwrap();
        tree.append(p, Content::Text("one".into())).unwrap();
        tree.append(q, Content::Text("two".into())).unwrap();

        let backward = TbRange::new(AbstractPosition::new(q, 1), AbstractPosition::new(p, 2));
        let forward = backward.clone().normalized(&tree);
        assert_eq!(forward.start, AbstractPosition::new(p, 2));
        assert_eq!(forward.end, AbstractPosition::new(q, 1));

        // A parent offset before a child view sorts before the child's content.
        let before_q = AbstractPosition::new(tree.root(), 1);
        assert_eq!(
            compare_positions(&tree, &before_q, &AbstractPosition::new(q, 0)),
            Ordering::Less
        );
        assert_eq!(
            compare_positions(&tree, &AbstractPosition::new(tree.root(), 2), &forward.end),
            Ordering::Greater
        );
    }
}
