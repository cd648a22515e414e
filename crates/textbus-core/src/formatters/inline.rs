//! Inline wrapper tags: bold, italic, underline, strike-through.

use smol_str::SmolStr;

use super::{MatchRule, StyleValues};
use crate::dom::{Dom, NodeId};
use crate::error::Result;
use crate::format::{
    FormatAbstractData, FormatEffect, Formatter, FormatterKind, Priority, RenderContext,
    RenderMode,
};

/// A formatter expressed by wrapping content in one inline tag.
///
/// Reads normalise to a tag the rule accepts: `<b>` stays `<b>`, while a
/// `<span style="font-weight: bold">` reads as the canonical `<strong>`.
#[derive(Debug, Clone)]
pub struct InlineTagFormatter {
    name: SmolStr,
    tag: SmolStr,
    rule: MatchRule,
}

impl InlineTagFormatter {
    pub fn new(name: impl Into<SmolStr>, tag: impl Into<SmolStr>, rule: MatchRule) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            rule,
        }
    }

    pub fn bold() -> Result<Self> {
        let rule = MatchRule::new()
            .tags("strong|b")?
            .style(
                "font-weight",
                StyleValues::one_of(["bold", "bolder", "500", "600", "700", "800", "900"]),
            )
            .exclude_style(
                "font-weight",
                StyleValues::one_of(["normal", "lighter", "100", "200", "300", "400"]),
            )
            .no_in_tags("h[1-6]|th")?;
        Ok(Self::new("bold", "strong", rule))
    }

    pub fn italic() -> Result<Self> {
        let rule = MatchRule::new()
            .tags("em|i")?
            .style("font-style", StyleValues::one_of(["italic", "oblique"]))
            .exclude_style("font-style", StyleValues::one_of(["normal"]));
        Ok(Self::new("italic", "em", rule))
    }

    pub fn underline() -> Result<Self> {
        let rule = MatchRule::new()
            .tags("u")?
            .style("text-decoration", StyleValues::one_of(["underline"]));
        Ok(Self::new("underline", "u", rule))
    }

    pub fn strike_through() -> Result<Self> {
        let rule = MatchRule::new()
            .tags("s|strike|del")?
            .style("text-decoration", StyleValues::one_of(["line-through"]));
        Ok(Self::new("strike-through", "s", rule))
    }

    /// The tag rendered for freshly applied formatting.
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl Formatter for InlineTagFormatter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> FormatterKind {
        FormatterKind::Inline
    }

    fn priority(&self) -> Priority {
        Priority::InlineTag
    }

    fn match_element(&self, dom: &Dom, node: NodeId) -> FormatEffect {
        self.rule.match_element(dom, node)
    }

    fn match_data(&self, data: &FormatAbstractData) -> FormatEffect {
        self.rule.match_data(data)
    }

    fn read(&self, dom: &Dom, node: NodeId) -> FormatAbstractData {
        match dom.tag(node) {
            Some(tag) if self.rule.matches_tag(tag) => FormatAbstractData::new().with_tag(tag),
            _ => FormatAbstractData::new().with_tag(self.tag.clone()),
        }
    }

    fn render(&self, dom: &mut Dom, ctx: RenderContext<'_>) -> Option<RenderMode> {
        let tag = ctx
            .abstract_data
            .and_then(FormatAbstractData::tag)
            .unwrap_or(self.tag.as_str());
        Some(RenderMode::ChildSlot(dom.create_element(tag)))
    }
}
