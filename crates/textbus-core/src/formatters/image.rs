//! Image attributes on `<img>` singles.

use super::MatchRule;
use crate::dom::{Dom, NodeId};
use crate::error::Result;
use crate::format::{
    FormatAbstractData, FormatEffect, Formatter, FormatterKind, Priority, RenderContext,
    RenderMode,
};

const IMAGE_ATTRS: [&str; 4] = ["src", "alt", "width", "height"];

/// Sets `src`, `alt`, `width` and `height` on the single's own element.
///
/// Renders from cache data when present, so a resolved URL reaches the DOM
/// while the abstract data keeps the source as written.
#[derive(Debug, Clone)]
pub struct ImageFormatter {
    rule: MatchRule,
}

impl ImageFormatter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            rule: MatchRule::new().tags("img")?,
        })
    }
}

impl Formatter for ImageFormatter {
    fn name(&self) -> &str {
        "image"
    }

    fn kind(&self) -> FormatterKind {
        FormatterKind::Inline
    }

    fn priority(&self) -> Priority {
        Priority::Attribute
    }

    fn match_element(&self, dom: &Dom, node: NodeId) -> FormatEffect {
        self.rule.match_element(dom, node)
    }

    fn match_data(&self, data: &FormatAbstractData) -> FormatEffect {
        self.rule.match_data(data)
    }

    fn read(&self, dom: &Dom, node: NodeId) -> FormatAbstractData {
        let mut data = FormatAbstractData::new().with_tag("img");
        for name in IMAGE_ATTRS {
            if let Some(value) = dom.attribute(node, name) {
                data = data.with_attr(name, value);
            }
        }
        data
    }

    fn render(&self, dom: &mut Dom, ctx: RenderContext<'_>) -> Option<RenderMode> {
        let (el, mode) = match ctx.existing {
            Some(el) if dom.tag(el) == Some("img") => (el, None),
            _ => {
                let el = dom.create_element("img");
                (el, Some(RenderMode::Replace(el)))
            }
        };
        if let Some(data) = ctx.abstract_data {
            for name in IMAGE_ATTRS {
                if let Some(value) = data.attr(name) {
                    dom.set_attribute(el, name, value);
                }
            }
        }
        mode
    }
}
