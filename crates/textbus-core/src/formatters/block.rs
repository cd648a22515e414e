//! The container tag of a block fragment.

use super::MatchRule;
use crate::dom::{Dom, NodeId};
use crate::error::Result;
use crate::format::{
    FormatAbstractData, FormatEffect, Formatter, FormatterKind, Priority, RenderContext,
    RenderMode,
};

/// Tags a block fragment can render as.
pub const BLOCK_TAG_PATTERN: &str =
    "p|div|h[1-6]|blockquote|pre|li|tbody|thead|tfoot|tr|td|th";

/// Attributes carried through on cells.
const CELL_ATTRS: [&str; 2] = ["colspan", "rowspan"];

/// Gives a fragment its own tag (`p`, `h1`, `li`, `td`, ...).
#[derive(Debug, Clone)]
pub struct BlockTagFormatter {
    rule: MatchRule,
}

impl BlockTagFormatter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            rule: MatchRule::new().tags(BLOCK_TAG_PATTERN)?,
        })
    }
}

impl Formatter for BlockTagFormatter {
    fn name(&self) -> &str {
        "block"
    }

    fn kind(&self) -> FormatterKind {
        FormatterKind::Block
    }

    fn priority(&self) -> Priority {
        Priority::Default
    }

    fn match_element(&self, dom: &Dom, node: NodeId) -> FormatEffect {
        self.rule.match_element(dom, node)
    }

    fn match_data(&self, data: &FormatAbstractData) -> FormatEffect {
        self.rule.match_data(data)
    }

    fn read(&self, dom: &Dom, node: NodeId) -> FormatAbstractData {
        let Some(tag) = dom.tag(node) else {
            return FormatAbstractData::new();
        };
        CELL_ATTRS
            .iter()
            .filter_map(|name| dom.attribute(node, name).map(|v| (*name, v)))
            .fold(FormatAbstractData::new().with_tag(tag), |data, (name, value)| {
                data.with_attr(name, value)
            })
    }

    fn render(&self, dom: &mut Dom, ctx: RenderContext<'_>) -> Option<RenderMode> {
        let tag = ctx.abstract_data.and_then(FormatAbstractData::tag).unwrap_or("p");
        let el = dom.create_element(tag);
        if let Some(data) = ctx.abstract_data {
            for (name, value) in &data.attrs {
                dom.set_attribute(el, name, value);
            }
        }
        Some(RenderMode::Replace(el))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_round_trip() {
        let block = BlockTagFormatter::new().unwrap();
        let mut dom = Dom::new();
        let td = dom.create_element("td");
        dom.set_attribute(td, "colspan", "2");
        dom.set_attribute(td, "data-x", "ignored");

        assert_eq!(block.match_element(&dom, td), FormatEffect::Valid);
        let data = block.read(&dom, td);
        assert_eq!(data, FormatAbstractData::new().with_tag("td").with_attr("colspan", "2"));

        let ctx = RenderContext {
            state: FormatEffect::Valid,
            abstract_data: Some(&data),
            existing: None,
        };
        let Some(RenderMode::Replace(el)) = block.render(&mut dom, ctx) else {
            panic!("block tags replace");
        };
        assert_eq!(dom.to_html(el), r#"<td colspan="2"></td>"#);
    }

    #[test]
    fn test_non_block_tags() {
        let block = BlockTagFormatter::new().unwrap();
        for tag in ["span", "ul", "table", "strong", "header"] {
            assert_eq!(
                block.match_data(&FormatAbstractData::new().with_tag(tag)),
                FormatEffect::Invalid,
                "{tag}"
            );
        }
        assert_eq!(
            block.match_data(&FormatAbstractData::new().with_tag("h3")),
            FormatEffect::Valid
        );
    }
}
