//! Toolbar boundary.
//!
//! Toolbar widgets are external. The core asks each handler's [`Matcher`]
//! about every selected range, reduces the per-range [`MatchDelta`]s into
//! one, and hands it to [`Handler::update_status`]. Executing a handler runs
//! its [`Commander`].

use smol_str::SmolStr;

use crate::commands::{Commander, enclosing_block, selected_blocks, selected_spans};
use crate::format::{Coverage, FormatAbstractData, FormatterKind};
use crate::formatters::FormatterRegistry;
use crate::selection::TbRange;
use crate::view::ViewTree;

/// Read-only view of the editor handed to matchers.
#[derive(Clone, Copy)]
pub struct EditorContext<'a> {
    pub tree: &'a ViewTree,
    pub registry: &'a FormatterRegistry,
}

/// Format state of one range, or of a whole selection once reduced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchDelta {
    /// The range starts and ends in the same fragment.
    pub in_single_container: bool,
    /// The format covers all of the range.
    pub overlap: bool,
    /// The format covers some of the range.
    pub contain: bool,
    /// The handler cannot act on the range.
    pub disable: bool,
    /// Data of the format at the start of the range.
    pub abstract_data: Option<FormatAbstractData>,
}

impl MatchDelta {
    /// The selection mixes formatted and unformatted content.
    pub fn is_mixed(&self) -> bool {
        self.contain && !self.overlap
    }

    /// Combine two deltas: AND for `in_single_container` and `overlap`, OR
    /// for `contain` and `disable`. Abstract data survives only when both
    /// sides agree.
    pub fn merge(self, other: MatchDelta) -> MatchDelta {
        MatchDelta {
            in_single_container: self.in_single_container && other.in_single_container,
            overlap: self.overlap && other.overlap,
            contain: self.contain || other.contain,
            disable: self.disable || other.disable,
            abstract_data: if self.abstract_data == other.abstract_data {
                self.abstract_data
            } else {
                None
            },
        }
    }

    /// Reduce the deltas of every selected range. `None` for no ranges.
    pub fn reduce(deltas: impl IntoIterator<Item = MatchDelta>) -> Option<MatchDelta> {
        deltas.into_iter().reduce(MatchDelta::merge)
    }
}

pub trait Matcher {
    fn query_state(&self, ctx: &EditorContext<'_>, range: &TbRange) -> MatchDelta;
}

/// Query a matcher over every range and reduce the result.
pub fn query_ranges(
    matcher: &dyn Matcher,
    ctx: &EditorContext<'_>,
    ranges: &[TbRange],
) -> Option<MatchDelta> {
    MatchDelta::reduce(ranges.iter().map(|r| matcher.query_state(ctx, r)))
}

/// Matches the ranges of one formatter.
///
/// Inline formatters are checked over the selected runs; a collapsed caret
/// looks at the character before it. Block formatters are checked over the
/// selected blocks.
#[derive(Debug, Clone)]
pub struct FormatMatcher {
    formatter: SmolStr,
}

impl FormatMatcher {
    pub fn new(formatter: impl Into<SmolStr>) -> Self {
        Self {
            formatter: formatter.into(),
        }
    }
}

impl Matcher for FormatMatcher {
    fn query_state(&self, ctx: &EditorContext<'_>, range: &TbRange) -> MatchDelta {
        let mut delta = MatchDelta {
            in_single_container: range.start.fragment == range.end.fragment,
            ..MatchDelta::default()
        };
        let Some(formatter) = ctx.registry.get(&self.formatter) else {
            delta.disable = true;
            return delta;
        };
        let name = formatter.name();

        let spans: Vec<(crate::view::ViewId, usize, usize)> = match formatter.kind() {
            FormatterKind::Inline => selected_spans(ctx.tree, range)
                .into_iter()
                .map(|s| {
                    if s.is_collapsed() && s.start > 0 {
                        (s.fragment, s.start - 1, s.start)
                    } else {
                        (s.fragment, s.start, s.end)
                    }
                })
                .collect(),
            FormatterKind::Block => selected_blocks(ctx.tree, range)
                .into_iter()
                .map(|b| (b, 0, 0))
                .collect(),
        };

        let mut covered = 0;
        for (index, (fragment, start, end)) in spans.iter().copied().enumerate() {
            let Ok(matrix) = ctx.tree.matrix(fragment) else {
                continue;
            };
            let coverage = matrix.coverage(name, start, end);
            if coverage == Coverage::Full {
                covered += 1;
            }
            delta.contain |= coverage != Coverage::None;
            if index == 0 {
                delta.abstract_data = matrix
                    .range_at(name, start)
                    .and_then(|r| r.abstract_data.clone());
            }
        }
        delta.overlap = !spans.is_empty() && covered == spans.len();
        delta
    }
}

/// Matches a block formatter on the selected blocks or any block around
/// them, optionally narrowed to one tag (`ul` vs `ol`).
#[derive(Debug, Clone)]
pub struct BlockMatcher {
    formatter: SmolStr,
    tag: Option<SmolStr>,
}

impl BlockMatcher {
    pub fn new(formatter: impl Into<SmolStr>) -> Self {
        Self {
            formatter: formatter.into(),
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<SmolStr>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

impl Matcher for BlockMatcher {
    fn query_state(&self, ctx: &EditorContext<'_>, range: &TbRange) -> MatchDelta {
        let mut delta = MatchDelta {
            in_single_container: range.start.fragment == range.end.fragment,
            ..MatchDelta::default()
        };
        if ctx.registry.get(&self.formatter).is_none() {
            delta.disable = true;
            return delta;
        }
        let blocks = selected_blocks(ctx.tree, range);
        let mut matched = 0;
        for block in &blocks {
            let start = enclosing_block(ctx.tree, *block).unwrap_or(*block);
            let found = std::iter::once(start)
                .chain(ctx.tree.ancestors(start))
                .find_map(|v| {
                    let r = ctx.tree.matrix(v).ok()?.range_at(&self.formatter, 0)?;
                    let data = r.abstract_data.as_ref();
                    match &self.tag {
                        Some(tag) if data.and_then(|d| d.tag()) != Some(tag.as_str()) => None,
                        _ => Some(data.cloned()),
                    }
                });
            if let Some(data) = found {
                matched += 1;
                if delta.abstract_data.is_none() {
                    delta.abstract_data = data;
                }
            }
        }
        delta.contain = matched > 0;
        delta.overlap = !blocks.is_empty() && matched == blocks.len();
        delta
    }
}

/// A toolbar control: status in, command out.
pub trait Handler {
    fn name(&self) -> &str;
    fn matcher(&self) -> &dyn Matcher;
    fn commander(&self) -> &dyn Commander;
    fn update_status(&mut self, delta: &MatchDelta);

    /// The last status received, for handlers that keep it.
    fn status(&self) -> Option<&MatchDelta> {
        None
    }
}

/// A [`Handler`] that remembers the last status it was given.
pub struct ToolbarHandler {
    name: SmolStr,
    matcher: Box<dyn Matcher>,
    commander: Box<dyn Commander>,
    status: Option<MatchDelta>,
}

impl ToolbarHandler {
    pub fn new(
        name: impl Into<SmolStr>,
        matcher: impl Matcher + 'static,
        commander: impl Commander + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            matcher: Box::new(matcher),
            commander: Box::new(commander),
            status: None,
        }
    }
}

impl std::fmt::Debug for ToolbarHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolbarHandler")
            .field("name", &self.name)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl Handler for ToolbarHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn matcher(&self) -> &dyn Matcher {
        self.matcher.as_ref()
    }

    fn commander(&self) -> &dyn Commander {
        self.commander.as_ref()
    }

    fn update_status(&mut self, delta: &MatchDelta) {
        tracing::trace!(target: "textbus::events", handler = %self.name, ?delta, "status");
        self.status = Some(delta.clone());
    }

    fn status(&self) -> Option<&MatchDelta> {
        self.status.as_ref()
    }
}
