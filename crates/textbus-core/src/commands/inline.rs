//! Inline toggles and style values.

use smol_str::SmolStr;

use super::{
    CommandContext, Commander, SelectedSpan, clear_block, selected_blocks, selected_spans,
    set_block,
};
use crate::dom::{Dom, NodeId};
use crate::error::Result;
use crate::format::{
    Coverage, FormatAbstractData, FormatEffect, FormatRange, FormatterKind, FormatterRef,
    RenderMode,
};
use crate::view::ViewTree;

/// Toggles an inline tag formatter such as bold over the selection.
#[derive(Debug, Clone)]
pub struct InlineCommander {
    formatter: SmolStr,
    tag: SmolStr,
}

impl InlineCommander {
    pub fn new(formatter: impl Into<SmolStr>, tag: impl Into<SmolStr>) -> Self {
        Self {
            formatter: formatter.into(),
            tag: tag.into(),
        }
    }

    pub fn bold() -> Self {
        Self::new("bold", "strong")
    }

    pub fn italic() -> Self {
        Self::new("italic", "em")
    }

    pub fn underline() -> Self {
        Self::new("underline", "u")
    }

    pub fn strike_through() -> Self {
        Self::new("strike-through", "s")
    }

    pub fn formatter(&self) -> &str {
        &self.formatter
    }
}

fn fully_covered(tree: &ViewTree, name: &str, spans: &[SelectedSpan]) -> bool {
    !spans.is_empty()
        && spans.iter().all(|s| {
            tree.matrix(s.fragment)
                .map(|m| m.coverage(name, s.start, s.end) == Coverage::Full)
                .unwrap_or(false)
        })
}

fn remove_spans(
    tree: &mut ViewTree,
    formatter: &FormatterRef,
    spans: &[SelectedSpan],
) -> Result<()> {
    for span in spans.iter().filter(|s| !s.is_collapsed()) {
        let removal = FormatRange::new(span.start, span.end, FormatEffect::Invalid, None);
        tree.apply(span.fragment, formatter, removal, true)?;
    }
    Ok(())
}

impl Commander for InlineCommander {
    fn name(&self) -> &str {
        &self.formatter
    }

    fn command(&self, ctx: &mut CommandContext<'_>, overlap: bool) -> Result<()> {
        let formatter = ctx.formatter(&self.formatter)?;
        for range in ctx.require_ranges()? {
            let spans = selected_spans(ctx.tree, &range);
            if !overlap && fully_covered(ctx.tree, &self.formatter, &spans) {
                tracing::debug!(target: "textbus::command", name = %self.formatter, spans = spans.len(), "toggle off");
                remove_spans(ctx.tree, &formatter, &spans)?;
                continue;
            }
            tracing::debug!(target: "textbus::command", name = %self.formatter, spans = spans.len(), "apply");
            let data = FormatAbstractData::new().with_tag(self.tag.clone());
            for span in spans.iter().filter(|s| !s.is_collapsed()) {
                let range = FormatRange::valid(span.start, span.end, data.clone());
                ctx.tree.apply(span.fragment, &formatter, range, false)?;
            }
        }
        Ok(())
    }

    fn render(
        &self,
        state: FormatEffect,
        _existing: Option<NodeId>,
        dom: &mut Dom,
    ) -> Option<RenderMode> {
        match state {
            FormatEffect::Valid => Some(RenderMode::ChildSlot(dom.create_element(&self.tag))),
            FormatEffect::Invalid | FormatEffect::Inherit => None,
        }
    }
}

/// Sets one CSS property to a value over the selection.
///
/// Inline properties apply to the selected runs; block properties such as
/// `text-align` apply to the whole of each selected block.
#[derive(Debug, Clone)]
pub struct StyleCommander {
    property: SmolStr,
    value: String,
}

impl StyleCommander {
    pub fn new(property: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    fn data(&self) -> FormatAbstractData {
        FormatAbstractData::new().with_style(self.property.clone(), self.value.clone())
    }

    fn has_value(&self, tree: &ViewTree, span: &SelectedSpan) -> bool {
        let Ok(matrix) = tree.matrix(span.fragment) else {
            return false;
        };
        matrix.coverage(&self.property, span.start, span.end) == Coverage::Full
            && matrix
                .range_at(&self.property, span.start)
                .and_then(|r| r.abstract_data.as_ref())
                .and_then(|d| d.style(&self.property))
                == Some(self.value.as_str())
    }
}

impl Commander for StyleCommander {
    fn name(&self) -> &str {
        &self.property
    }

    fn command(&self, ctx: &mut CommandContext<'_>, overlap: bool) -> Result<()> {
        let formatter = ctx.formatter(&self.property)?;
        for range in ctx.require_ranges()? {
            if formatter.kind() == FormatterKind::Block {
                let blocks = selected_blocks(ctx.tree, &range);
                let all_set = blocks.iter().all(|b| {
                    ctx.tree
                        .matrix(*b)
                        .ok()
                        .and_then(|m| m.range_at(&self.property, 0))
                        .and_then(|r| r.abstract_data.as_ref())
                        .and_then(|d| d.style(&self.property))
                        == Some(self.value.as_str())
                });
                for block in blocks {
                    if !overlap && all_set {
                        clear_block(ctx.tree, &formatter, block)?;
                    } else {
                        set_block(ctx.tree, &formatter, block, self.data())?;
                    }
                }
                continue;
            }

            let spans = selected_spans(ctx.tree, &range);
            let all_set = !spans.is_empty() && spans.iter().all(|s| self.has_value(ctx.tree, s));
            if !overlap && all_set {
                remove_spans(ctx.tree, &formatter, &spans)?;
                continue;
            }
            for span in spans.iter().filter(|s| !s.is_collapsed()) {
                let range = FormatRange::valid(span.start, span.end, self.data());
                ctx.tree.apply(span.fragment, &formatter, range, true)?;
            }
        }
        tracing::debug!(target: "textbus::command", property = %self.property, value = %self.value, "style applied");
        Ok(())
    }
}
