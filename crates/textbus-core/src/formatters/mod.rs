//! Built-in formatters and the registry that owns them.
//!
//! Matching is declarative: each formatter carries a [`MatchRule`] listing
//! the tags and style values that express its concern, style values that
//! contradict it, and ancestor tags under which it is implied.

mod block;
mod image;
mod inline;
mod list;
mod margin;
mod style;
mod table;

pub use block::BlockTagFormatter;
pub use image::ImageFormatter;
pub use inline::InlineTagFormatter;
pub use list::ListFormatter;
pub use margin::MarginFormatter;
pub use style::StyleFormatter;
pub use table::TableFormatter;

use std::rc::Rc;

use regex::Regex;
use smol_str::SmolStr;

use crate::config::EditorConfig;
use crate::dom::{Dom, NodeId};
use crate::error::{EditorError, Result};
use crate::format::{FormatAbstractData, FormatEffect, FormatterRef};

/// Accepted values for one style property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleValues {
    /// Any non-empty value.
    Any,
    OneOf(Vec<SmolStr>),
}

impl StyleValues {
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        StyleValues::OneOf(values.into_iter().map(Into::into).collect())
    }

    fn accepts(&self, value: &str) -> bool {
        match self {
            StyleValues::Any => !value.is_empty(),
            StyleValues::OneOf(values) => values.iter().any(|v| v.eq_ignore_ascii_case(value)),
        }
    }
}

/// Declarative matcher shared by the built-in formatters.
///
/// Evaluation order: an ancestor matching `no_in_tags` gives `Inherit`, an
/// excluded style gives `Invalid`, a matching tag or style gives `Valid`,
/// anything else is `Invalid`.
#[derive(Debug, Clone, Default)]
pub struct MatchRule {
    tags: Option<Regex>,
    styles: Vec<(SmolStr, StyleValues)>,
    exclude_styles: Vec<(SmolStr, StyleValues)>,
    no_in_tags: Option<Regex>,
}

impl MatchRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags expressing the concern, as an anchored regex alternation.
    pub fn tags(mut self, pattern: &str) -> Result<Self> {
        self.tags = Some(compile(pattern)?);
        Ok(self)
    }

    pub fn style(mut self, name: impl Into<SmolStr>, values: StyleValues) -> Self {
        self.styles.push((name.into(), values));
        self
    }

    pub fn exclude_style(mut self, name: impl Into<SmolStr>, values: StyleValues) -> Self {
        self.exclude_styles.push((name.into(), values));
        self
    }

    /// Ancestor tags under which the concern is already implied.
    pub fn no_in_tags(mut self, pattern: &str) -> Result<Self> {
        self.no_in_tags = Some(compile(pattern)?);
        Ok(self)
    }

    pub fn matches_tag(&self, tag: &str) -> bool {
        self.tags.as_ref().is_some_and(|re| re.is_match(tag))
    }

    pub fn match_element(&self, dom: &Dom, node: NodeId) -> FormatEffect {
        let Some(el) = dom.element(node) else {
            return FormatEffect::Invalid;
        };
        if let Some(re) = &self.no_in_tags {
            let implied = dom
                .ancestors(node)
                .any(|a| dom.tag(a).is_some_and(|t| re.is_match(t)));
            if implied {
                return FormatEffect::Inherit;
            }
        }
        self.evaluate(Some(el.tag()), |name| el.style(name))
    }

    /// Same as [`match_element`](Self::match_element) minus the ancestor
    /// check, which abstract data cannot answer.
    pub fn match_data(&self, data: &FormatAbstractData) -> FormatEffect {
        self.evaluate(data.tag(), |name| data.style(name))
    }

    fn evaluate<'a>(&self, tag: Option<&str>, style: impl Fn(&str) -> Option<&'a str>) -> FormatEffect {
        let hit = |rules: &[(SmolStr, StyleValues)]| {
            rules
                .iter()
                .any(|(name, values)| style(name.as_str()).is_some_and(|v| values.accepts(v)))
        };
        if hit(&self.exclude_styles) {
            return FormatEffect::Invalid;
        }
        if tag.is_some_and(|t| self.matches_tag(t)) || hit(&self.styles) {
            return FormatEffect::Valid;
        }
        FormatEffect::Invalid
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|source| EditorError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Names of the formatters registered by [`FormatterRegistry::with_defaults`].
pub const DEFAULT_FORMATTERS: &[&str] = &[
    "bold",
    "italic",
    "underline",
    "strike-through",
    "color",
    "background-color",
    "font-size",
    "font-family",
    "letter-spacing",
    "text-align",
    "margin",
    "block",
    "list",
    "table",
    "image",
];

/// Caller-owned set of formatters, consulted during ingestion and by
/// commanders looking up the formatter they apply.
#[derive(Debug, Clone, Default)]
pub struct FormatterRegistry {
    formatters: Vec<FormatterRef>,
}

impl FormatterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in formatter.
    pub fn with_defaults() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Rc::new(InlineTagFormatter::bold()?));
        registry.register(Rc::new(InlineTagFormatter::italic()?));
        registry.register(Rc::new(InlineTagFormatter::underline()?));
        registry.register(Rc::new(InlineTagFormatter::strike_through()?));
        for property in [
            "color",
            "background-color",
            "font-size",
            "font-family",
            "letter-spacing",
        ] {
            registry.register(Rc::new(StyleFormatter::inline(property)));
        }
        registry.register(Rc::new(StyleFormatter::block("text-align")));
        registry.register(Rc::new(MarginFormatter::new()));
        registry.register(Rc::new(BlockTagFormatter::new()?));
        registry.register(Rc::new(ListFormatter::new()?));
        registry.register(Rc::new(TableFormatter::new()?));
        registry.register(Rc::new(ImageFormatter::new()?));
        Ok(registry)
    }

    /// Built-in formatters narrowed to `config.formatters` when that list is
    /// non-empty. Unknown names are an error.
    pub fn from_config(config: &EditorConfig) -> Result<Self> {
        let defaults = Self::with_defaults()?;
        if config.formatters.is_empty() {
            return Ok(defaults);
        }
        let mut registry = Self::new();
        for name in &config.formatters {
            let formatter = defaults
                .get(name)
                .ok_or_else(|| EditorError::MissingFormatter(name.clone()))?;
            registry.register(formatter.clone());
        }
        Ok(registry)
    }

    /// Add a formatter, replacing any existing one with the same name.
    pub fn register(&mut self, formatter: FormatterRef) {
        tracing::trace!(target: "textbus::format", name = formatter.name(), "register formatter");
        match self
            .formatters
            .iter_mut()
            .find(|f| f.name() == formatter.name())
        {
            Some(slot) => *slot = formatter,
            None => self.formatters.push(formatter),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FormatterRef> {
        self.formatters.iter().find(|f| f.name() == name)
    }

    /// Like [`get`](Self::get) but an absent formatter is an error.
    pub fn require(&self, name: &str) -> Result<&FormatterRef> {
        self.get(name)
            .ok_or_else(|| EditorError::MissingFormatter(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormatterRef> {
        self.formatters.iter()
    }

    pub fn len(&self) -> usize {
        self.formatters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formatters.is_empty()
    }
}
