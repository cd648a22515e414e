//! Editing commands.
//!
//! A [`Commander`] reads the current [`TbSelection`] and mutates the view
//! tree's format matrices. It never touches the DOM: the editor re-renders
//! after every successful command, in the same turn.
//!
//! Commands must not be run from inside a render. Nothing enforces this; the
//! editor simply never renders while a command holds the tree.

mod block;
mod image;
mod inline;
mod select;
mod table;
mod text;

pub use block::{ListCommander, MarginCommander};
pub use image::{ImageCommander, ImageResolver};
pub use inline::{InlineCommander, StyleCommander};
pub use select::SelectAllCommander;
pub use table::TableCommander;
pub use text::{DeleteCommander, InsertTextCommander};

use crate::dom::{Dom, NodeId};
use crate::error::{EditorError, Result};
use crate::format::{
    FormatAbstractData, FormatEffect, FormatRange, FormatterKind, FormatterRef, RenderMode,
};
use crate::formatters::FormatterRegistry;
use crate::selection::{TbRange, TbSelection};
use crate::view::{Content, ViewId, ViewTree};

/// Everything a command may read or change.
pub struct CommandContext<'a> {
    pub tree: &'a mut ViewTree,
    pub selection: &'a mut TbSelection,
    pub registry: &'a FormatterRegistry,
}

impl CommandContext<'_> {
    /// Ranges of the current selection, normalized to document order.
    pub fn ranges(&self) -> Vec<TbRange> {
        self.selection
            .ranges()
            .iter()
            .map(|r| r.clone().normalized(self.tree))
            .collect()
    }

    /// Like [`ranges`](Self::ranges) but an empty selection is an error.
    pub fn require_ranges(&self) -> Result<Vec<TbRange>> {
        let ranges = self.ranges();
        if ranges.is_empty() {
            return Err(EditorError::NoSelection);
        }
        Ok(ranges)
    }

    pub fn formatter(&self, name: &str) -> Result<FormatterRef> {
        self.registry.require(name).cloned()
    }
}

/// An executable editing command.
pub trait Commander {
    fn name(&self) -> &str;

    /// Whether a successful run pushes an undo snapshot.
    fn record_history(&self) -> bool {
        true
    }

    /// Mutate the tree for the current selection.
    ///
    /// `overlap` is true when the selection mixes formatted and unformatted
    /// content: the command applies to all of it. Otherwise a selection that
    /// is already fully formatted is toggled off.
    fn command(&self, ctx: &mut CommandContext<'_>, overlap: bool) -> Result<()>;

    /// Express `state` in DOM, for commands that double as formatters.
    fn render(
        &self,
        state: FormatEffect,
        existing: Option<NodeId>,
        dom: &mut Dom,
    ) -> Option<RenderMode> {
        let _ = (state, existing, dom);
        None
    }
}

/// A run of one fragment's content inside a selection range.
///
/// Runs never include child fragments; singles and text only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedSpan {
    pub fragment: ViewId,
    pub start: usize,
    pub end: usize,
}

impl SelectedSpan {
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

fn position_path(tree: &ViewTree, fragment: ViewId, offset: usize) -> Vec<usize> {
    let mut path = tree.path(fragment);
    path.push(offset);
    path
}

/// The offsets of a fragment (at `base`, holding `len` units) lying between
/// two position paths, as `lo..=hi`.
fn clip(base: &[usize], len: usize, start: &[usize], end: &[usize]) -> Option<(usize, usize)> {
    let at = |offset: usize| {
        let mut path = base.to_vec();
        path.push(offset);
        path
    };
    let below = |path: &[usize]| path.len() > base.len() && path.starts_with(base);

    let lo = if at(0).as_slice() >= start {
        0
    } else if below(start) {
        let k = start[base.len()];
        // A start inside a child view excludes the view itself.
        if start.len() == base.len() + 1 { k } else { k + 1 }
    } else {
        return None;
    };
    let hi = if at(len).as_slice() <= end {
        len
    } else if below(end) {
        end[base.len()]
    } else {
        return None;
    };
    (lo <= hi).then_some((lo, hi))
}

/// Every fragment touched by `range` with the span of its own content that
/// lies inside, parents before children. Spans may be empty.
fn touched(tree: &ViewTree, range: &TbRange) -> Vec<SelectedSpan> {
    let range = range.clone().normalized(tree);
    let start = position_path(tree, range.start.fragment, range.start.offset);
    let end = position_path(tree, range.end.fragment, range.end.offset);
    tree.fragments(tree.root())
        .into_iter()
        .filter_map(|id| {
            let len = tree.content_length(id).ok()?;
            let (lo, hi) = clip(&tree.path(id), len, &start, &end)?;
            Some(SelectedSpan {
                fragment: id,
                start: lo,
                end: hi,
            })
        })
        .collect()
}

/// The inline runs a range covers.
///
/// A collapsed range yields one collapsed span at the caret. Otherwise each
/// touched fragment contributes its selected content split around child
/// fragments; empty runs are left out.
///
/// Spans are grouped by fragment, parents before children: all of a
/// fragment's runs, including those after a child fragment, come before the
/// child's runs.
pub fn selected_spans(tree: &ViewTree, range: &TbRange) -> Vec<SelectedSpan> {
    let range = range.clone().normalized(tree);
    if range.is_collapsed() {
        return vec![SelectedSpan {
            fragment: range.start.fragment,
            start: range.start.offset,
            end: range.start.offset,
        }];
    }
    let mut spans = Vec::new();
    for span in touched(tree, &range) {
        let Ok(fragment) = tree.fragment(span.fragment) else {
            continue;
        };
        let mut cursor = span.start;
        let mut offset = 0;
        for content in fragment.contents() {
            if let Content::View(child) = content {
                if tree.is_fragment(*child) && offset >= span.start && offset < span.end {
                    if cursor < offset {
                        spans.push(SelectedSpan {
                            fragment: span.fragment,
                            start: cursor,
                            end: offset,
                        });
                    }
                    cursor = offset + 1;
                }
            }
            offset += content.len();
        }
        if cursor < span.end {
            spans.push(SelectedSpan {
                fragment: span.fragment,
                start: cursor,
                end: span.end,
            });
        }
    }
    spans
}

/// Nearest fragment at or above `id` carrying a Valid block format.
pub fn enclosing_block(tree: &ViewTree, id: ViewId) -> Option<ViewId> {
    std::iter::once(id).chain(tree.ancestors(id)).find(|v| {
        tree.matrix(*v)
            .map(|m| !m.applicable(FormatterKind::Block).is_empty())
            .unwrap_or(false)
    })
}

/// The block containers a range touches, in document order, without
/// duplicates.
///
/// Each leaf fragment (one with no child fragments) inside the range maps to
/// its nearest block-formatted ancestor, or to itself when there is none.
pub fn selected_blocks(tree: &ViewTree, range: &TbRange) -> Vec<ViewId> {
    let range = range.clone().normalized(tree);
    let leaves: Vec<ViewId> = if range.is_collapsed() {
        vec![range.start.fragment]
    } else {
        touched(tree, &range)
            .into_iter()
            .map(|span| span.fragment)
            .filter(|id| {
                tree.fragment(*id)
                    .map(|f| !f.child_views().any(|c| tree.is_fragment(c)))
                    .unwrap_or(false)
            })
            .collect()
    };
    let mut blocks: Vec<ViewId> = Vec::new();
    for leaf in leaves {
        let block = enclosing_block(tree, leaf).unwrap_or(leaf);
        if !blocks.contains(&block) {
            blocks.push(block);
        }
    }
    blocks
}

/// Cover a fragment's whole content with one block range.
pub(crate) fn set_block(
    tree: &mut ViewTree,
    formatter: &FormatterRef,
    id: ViewId,
    data: FormatAbstractData,
) -> Result<()> {
    let len = tree.content_length(id)?;
    tree.apply(id, formatter, FormatRange::valid(0, len, data), true)
}

/// Remove a block format from a fragment.
pub(crate) fn clear_block(tree: &mut ViewTree, formatter: &FormatterRef, id: ViewId) -> Result<()> {
    let len = tree.content_length(id)?;
    tree.apply(
        id,
        formatter,
        FormatRange::new(0, len, FormatEffect::Invalid, None),
        true,
    )
}
