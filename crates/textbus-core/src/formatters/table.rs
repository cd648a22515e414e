//! Tables.

use super::MatchRule;
use crate::dom::{Dom, NodeId};
use crate::error::Result;
use crate::format::{
    FormatAbstractData, FormatEffect, Formatter, FormatterKind, Priority, RenderContext,
    RenderMode,
};

const TABLE_ATTRS: [&str; 4] = ["border", "cellpadding", "cellspacing", "width"];

/// The outer `<table>` of a table fragment. Rows and cells are block
/// fragments of their own.
#[derive(Debug, Clone)]
pub struct TableFormatter {
    rule: MatchRule,
}

impl TableFormatter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            rule: MatchRule::new().tags("table")?,
        })
    }
}

impl Formatter for TableFormatter {
    fn name(&self) -> &str {
        "table"
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
        let mut data = FormatAbstractData::new().with_tag("table");
        for name in TABLE_ATTRS {
            if let Some(value) = dom.attribute(node, name) {
                data = data.with_attr(name, value);
            }
        }
        data
    }

    fn render(&self, dom: &mut Dom, ctx: RenderContext<'_>) -> Option<RenderMode> {
        let table = dom.create_element("table");
        if let Some(data) = ctx.abstract_data {
            for name in TABLE_ATTRS {
                if let Some(value) = data.attr(name) {
                    dom.set_attribute(table, name, value);
                }
            }
        }
        Some(RenderMode::Replace(table))
    }
}
