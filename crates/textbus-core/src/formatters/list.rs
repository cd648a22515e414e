//! Ordered and unordered lists.

use super::MatchRule;
use crate::dom::{Dom, NodeId};
use crate::error::Result;
use crate::format::{
    FormatAbstractData, FormatEffect, Formatter, FormatterKind, Priority, RenderContext,
    RenderMode,
};

#[derive(Debug, Clone)]
pub struct ListFormatter {
    rule: MatchRule,
}

impl ListFormatter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            rule: MatchRule::new().tags("ul|ol")?,
        })
    }
}

impl Formatter for ListFormatter {
    fn name(&self) -> &str {
        "list"
    }

    fn kind(&self) -> FormatterKind {
        FormatterKind::Block
    }

    fn priority(&self) -> Priority {
        Priority::Block
    }

    fn match_element(&self, dom: &Dom, node: NodeId) -> FormatEffect {
        self.rule.match_element(dom, node)
    }

    fn match_data(&self, data: &FormatAbstractData) -> FormatEffect {
        self.rule.match_data(data)
    }

    fn read(&self, dom: &Dom, node: NodeId) -> FormatAbstractData {
        match dom.tag(node) {
            Some(tag) => FormatAbstractData::new().with_tag(tag),
            None => FormatAbstractData::new(),
        }
    }

    fn render(&self, dom: &mut Dom, ctx: RenderContext<'_>) -> Option<RenderMode> {
        let tag = ctx.abstract_data.and_then(FormatAbstractData::tag).unwrap_or("ul");
        Some(RenderMode::Replace(dom.create_element(tag)))
    }
}
