//! The formatter contract.
//!
//! A formatter is a policy object mapping between DOM representation and
//! abstract formatting intent for one concern (bold, margin, list, ...).

use std::fmt;
use std::rc::Rc;

use crate::dom::{Dom, NodeId};

use super::{FormatAbstractData, FormatEffect};

/// Whether a formatter describes a span of content or a whole container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatterKind {
    /// Applies to sub-ranges of a fragment's content.
    Inline,
    /// Applies to a fragment as a whole, spanning `[0, len)`.
    Block,
}

/// Render priority, ascending.
///
/// Formatters fold in descending priority: the highest priority produces the
/// outermost element and lower priorities render closer to the leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Attributes set directly on a leaf element (image source).
    Attribute,
    /// Inline CSS on a span or on the element it lands in.
    InlineStyle,
    /// Inline wrapper tags (`strong`, `em`).
    InlineTag,
    /// CSS on a block container (margin, alignment).
    BlockStyle,
    /// Structural block wrappers (`ul`, `table`).
    Block,
    /// The container's own tag (`p`, `li`, `td`).
    Default,
}

/// How a formatter expresses itself in the render fold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// This element replaces everything accumulated so far and becomes both
    /// root and slot.
    Replace(NodeId),
    /// Append this element inside the current slot and continue inside it.
    ChildSlot(NodeId),
}

/// Input to [`Formatter::render`].
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub state: FormatEffect,
    pub abstract_data: Option<&'a FormatAbstractData>,
    /// The innermost element produced so far, if any.
    pub existing: Option<NodeId>,
}

/// One formatting concern.
///
/// `render` returning `None` means the formatter mutated `existing` in place
/// and added no DOM layer; doing that without an existing element is a bug in
/// the formatter and aborts the render.
pub trait Formatter: fmt::Debug {
    /// Unique name within a registry. Matrices key their entries by it.
    fn name(&self) -> &str;

    fn kind(&self) -> FormatterKind;

    fn priority(&self) -> Priority;

    /// Decide whether a DOM element already expresses this concern.
    fn match_element(&self, dom: &Dom, node: NodeId) -> FormatEffect;

    /// Decide whether abstract data already expresses this concern.
    fn match_data(&self, data: &FormatAbstractData) -> FormatEffect;

    /// Extract only what this formatter cares about. Never mutates the DOM.
    fn read(&self, dom: &Dom, node: NodeId) -> FormatAbstractData;

    /// Express abstract state as DOM.
    fn render(&self, dom: &mut Dom, ctx: RenderContext<'_>) -> Option<RenderMode>;
}

/// Shared handle to a formatter. Formatters are immutable policies, so the
/// same handle is shared by every matrix that uses it.
pub type FormatterRef = Rc<dyn Formatter>;

/// Result of folding a chain of formatters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folded {
    pub root: NodeId,
    pub slot: NodeId,
    /// Every element in the final chain, outermost first.
    pub chain: Vec<NodeId>,
}

/// Fold formatters into a DOM chain.
///
/// `formats` must already be in descending priority order. Starting from
/// `start` (a bare element, or nothing), each step transforms the accumulated
/// chain as described on [`RenderMode`]. Returns `None` when nothing was
/// produced.
pub fn fold_formats<'a, I>(dom: &mut Dom, formats: I, start: Option<NodeId>) -> Option<Folded>
where
    I: IntoIterator<Item = (&'a FormatterRef, &'a super::FormatRange)>,
{
    let mut root = start;
    let mut slot = start;
    let mut chain: Vec<NodeId> = start.into_iter().collect();

    for (formatter, range) in formats {
        let ctx = RenderContext {
            state: range.state,
            abstract_data: range.render_data(),
            existing: slot,
        };
        match formatter.render(dom, ctx) {
            Some(RenderMode::Replace(el)) => {
                root = Some(el);
                slot = Some(el);
                chain.clear();
                chain.push(el);
            }
            Some(RenderMode::ChildSlot(el)) => {
                match slot {
                    Some(parent) => dom.append_child(parent, el),
                    None => root = Some(el),
                }
                slot = Some(el);
                chain.push(el);
            }
            None => {
                assert!(
                    slot.is_some(),
                    "formatter `{}` rendered in place without an element to render into",
                    formatter.name()
                );
            }
        }
    }

    Some(Folded {
        root: root?,
        slot: slot?,
        chain,
    })
}
