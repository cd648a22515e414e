//! Single-property CSS formatters (color, font-size, text-align, ...).

use smol_str::SmolStr;

use super::{MatchRule, StyleValues};
use crate::dom::{Dom, NodeId};
use crate::format::{
    FormatAbstractData, FormatEffect, Formatter, FormatterKind, Priority, RenderContext,
    RenderMode,
};

/// Expresses one CSS property.
///
/// Renders onto the element produced so far when there is one, otherwise
/// wraps content in a `<span>`.
#[derive(Debug, Clone)]
pub struct StyleFormatter {
    property: SmolStr,
    kind: FormatterKind,
    rule: MatchRule,
}

impl StyleFormatter {
    /// Inline property applied to sub-ranges of content.
    pub fn inline(property: &str) -> Self {
        Self::with_kind(property, FormatterKind::Inline)
    }

    /// Block property applied to a whole container.
    pub fn block(property: &str) -> Self {
        Self::with_kind(property, FormatterKind::Block)
    }

    fn with_kind(property: &str, kind: FormatterKind) -> Self {
        Self {
            property: SmolStr::new(property),
            kind,
            rule: MatchRule::new().style(property, StyleValues::Any),
        }
    }

    pub fn property(&self) -> &str {
        &self.property
    }
}

impl Formatter for StyleFormatter {
    fn name(&self) -> &str {
        &self.property
    }

    fn kind(&self) -> FormatterKind {
        self.kind
    }

    fn priority(&self) -> Priority {
        match self.kind {
            FormatterKind::Inline => Priority::InlineStyle,
            FormatterKind::Block => Priority::BlockStyle,
        }
    }

    fn match_element(&self, dom: &Dom, node: NodeId) -> FormatEffect {
        self.rule.match_element(dom, node)
    }

    fn match_data(&self, data: &FormatAbstractData) -> FormatEffect {
        self.rule.match_data(data)
    }

    fn read(&self, dom: &Dom, node: NodeId) -> FormatAbstractData {
        match dom.style(node, &self.property) {
            Some(value) => FormatAbstractData::new().with_style(self.property.clone(), value),
            None => FormatAbstractData::new(),
        }
    }

    fn render(&self, dom: &mut Dom, ctx: RenderContext<'_>) -> Option<RenderMode> {
        let value = ctx
            .abstract_data
            .and_then(|d| d.style(&self.property))
            .unwrap_or_default();
        match ctx.existing {
            Some(el) => {
                dom.set_style(el, &self.property, value);
                None
            }
            None => {
                let span = dom.create_element("span");
                dom.set_style(span, &self.property, value);
                Some(RenderMode::ChildSlot(span))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_in_place_or_span() {
        let color = StyleFormatter::inline("color");
        let data = FormatAbstractData::new().with_style("color", "red");
        let mut dom = Dom::new();

        let ctx = RenderContext {
            state: FormatEffect::Valid,
            abstract_data: Some(&data),
            existing: None,
        };
        let Some(RenderMode::ChildSlot(span)) = color.render(&mut dom, ctx) else {
            panic!("expected span fallback");
        };
        assert_eq!(dom.to_html(span), r#"<span style="color: red"></span>"#);

        let strong = dom.create_element("strong");
        let ctx = RenderContext {
            existing: Some(strong),
            ..ctx
        };
        assert_eq!(color.render(&mut dom, ctx), None);
        assert_eq!(dom.to_html(strong), r#"<strong style="color: red"></strong>"#);
    }

    #[test]
    fn test_read_only_own_property() {
        let align = StyleFormatter::block("text-align");
        let mut dom = Dom::new();
        let p = dom.create_element("p");
        dom.set_attribute(p, "style", "text-align: center; color: blue");

        assert_eq!(align.match_element(&dom, p), FormatEffect::Valid);
        assert_eq!(
            align.read(&dom, p),
            FormatAbstractData::new().with_style("text-align", "center")
        );
        assert_eq!(align.priority(), Priority::BlockStyle);
    }
}
