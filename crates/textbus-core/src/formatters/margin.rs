//! Block margins.

use super::{MatchRule, StyleValues};
use crate::dom::{Dom, NodeId};
use crate::format::{
    FormatAbstractData, FormatEffect, Formatter, FormatterKind, Priority, RenderContext,
    RenderMode,
};

const SIDES: [&str; 4] = ["margin-top", "margin-right", "margin-bottom", "margin-left"];

/// Reads the four margin longhands (and the `margin` shorthand, expanded in
/// CSS order) and writes them back as a single `margin` shorthand.
///
/// The shorthand is assembled as `top right left bottom`, missing sides as
/// `0`. Note this is not CSS order: a value read back from rendered output
/// lands on a different side when left and bottom differ.
#[derive(Debug, Clone)]
pub struct MarginFormatter {
    rule: MatchRule,
}

impl MarginFormatter {
    pub fn new() -> Self {
        let rule = SIDES
            .iter()
            .chain(std::iter::once(&"margin"))
            .fold(MatchRule::new(), |rule, side| rule.style(*side, StyleValues::Any));
        Self { rule }
    }
}

impl Default for MarginFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble the rendered shorthand from abstract data.
pub fn margin_shorthand(data: &FormatAbstractData) -> String {
    ["margin-top", "margin-right", "margin-left", "margin-bottom"]
        .iter()
        .map(|side| data.style(side).filter(|v| !v.is_empty()).unwrap_or("0"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Expand a `margin` shorthand into `[top, right, bottom, left]`.
fn expand_shorthand(value: &str) -> Option<[&str; 4]> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    match parts.as_slice() {
        &[all] => Some([all; 4]),
        &[v, h] => Some([v, h, v, h]),
        &[t, h, b] => Some([t, h, b, h]),
        &[t, r, b, l] => Some([t, r, b, l]),
        _ => None,
    }
}

impl Formatter for MarginFormatter {
    fn name(&self) -> &str {
        "margin"
    }

    fn kind(&self) -> FormatterKind {
        FormatterKind::Block
    }

    fn priority(&self) -> Priority {
        Priority::BlockStyle
    }

    fn match_element(&self, dom: &Dom, node: NodeId) -> FormatEffect {
        self.rule.match_element(dom, node)
    }

    fn match_data(&self, data: &FormatAbstractData) -> FormatEffect {
        self.rule.match_data(data)
    }

    fn read(&self, dom: &Dom, node: NodeId) -> FormatAbstractData {
        let mut data = FormatAbstractData::new();
        if let Some(sides) = dom.style(node, "margin").and_then(expand_shorthand) {
            for (name, value) in SIDES.iter().zip(sides) {
                data = data.with_style(*name, value);
            }
        }
        for name in SIDES {
            if let Some(value) = dom.style(node, name) {
                data = data.with_style(name, value);
            }
        }
        data
    }

    fn render(&self, dom: &mut Dom, ctx: RenderContext<'_>) -> Option<RenderMode> {
        let margin = ctx.abstract_data.map(margin_shorthand).unwrap_or_default();
        match ctx.existing {
            Some(el) => {
                dom.set_style(el, "margin", &margin);
                None
            }
            None => {
                let span = dom.create_element("span");
                dom.set_style(span, "margin", &margin);
                Some(RenderMode::ChildSlot(span))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_left_shorthand_order() {
        let data = FormatAbstractData::new().with_style("margin-left", "10px");
        assert_eq!(margin_shorthand(&data), "0 0 10px 0");

        let margin = MarginFormatter::new();
        let mut dom = Dom::new();
        let ctx = RenderContext {
            state: FormatEffect::Valid,
            abstract_data: Some(&data),
            existing: None,
        };
        let Some(RenderMode::ChildSlot(span)) = margin.render(&mut dom, ctx) else {
            panic!("margin falls back to a span");
        };
        assert_eq!(dom.style(span, "margin"), Some("0 0 10px 0"));
    }

    #[test]
    fn test_render_in_place() {
        let data = FormatAbstractData::new()
            .with_style("margin-top", "1px")
            .with_style("margin-bottom", "4px");
        let margin = MarginFormatter::new();
        let mut dom = Dom::new();
        let p = dom.create_element("p");
        let ctx = RenderContext {
            state: FormatEffect::Valid,
            abstract_data: Some(&data),
            existing: Some(p),
        };
        assert_eq!(margin.render(&mut dom, ctx), None);
        assert_eq!(dom.to_html(p), r#"<p style="margin: 1px 0 0 4px"></p>"#);
    }

    #[test]
    fn test_read_longhands_and_shorthand() {
        let margin = MarginFormatter::new();
        let mut dom = Dom::new();
        let p = dom.create_element("p");
        dom.set_attribute(p, "style", "margin: 1px 2px; margin-left: 9px; color: red");

        assert_eq!(margin.match_element(&dom, p), FormatEffect::Valid);
        assert_eq!(
            margin.read(&dom, p),
            FormatAbstractData::new()
                .with_style("margin-top", "1px")
                .with_style("margin-right", "2px")
                .with_style("margin-bottom", "1px")
                .with_style("margin-left", "9px")
        );

        let plain = dom.create_element("p");
        assert_eq!(margin.match_element(&dom, plain), FormatEffect::Invalid);
        assert!(margin.read(&dom, plain).is_empty());
    }
}
