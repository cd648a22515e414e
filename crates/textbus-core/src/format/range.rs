//! Format ranges: a span of fragment content plus the format state over it.

use super::FormatAbstractData;

/// Result of matching a formatter against an element or abstract data, and
/// the state carried by a [`FormatRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormatEffect {
    /// Already expresses the formatter's concern exactly.
    Valid,
    /// Does not express the concern. On a range: remove coverage here.
    #[default]
    Invalid,
    /// Compatible with the parent's state; needs no re-render.
    Inherit,
}

/// A half-open span `[start_index, end_index)` of a fragment's content.
///
/// Indices count content units of the owning fragment (one per character,
/// one per child view), never live DOM offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRange {
    pub start_index: usize,
    pub end_index: usize,
    pub state: FormatEffect,
    pub abstract_data: Option<FormatAbstractData>,
    /// Render-time data that overrides `abstract_data` when present, for
    /// example an image source after URL resolution. Never serialized back
    /// into matcher state.
    pub cache_data: Option<FormatAbstractData>,
}

impl FormatRange {
    pub fn new(
        start_index: usize,
        end_index: usize,
        state: FormatEffect,
        abstract_data: Option<FormatAbstractData>,
    ) -> Self {
        debug_assert!(end_index >= start_index, "inverted format range");
        Self {
            start_index,
            end_index: end_index.max(start_index),
            state,
            abstract_data,
            cache_data: None,
        }
    }

    pub fn valid(start_index: usize, end_index: usize, data: FormatAbstractData) -> Self {
        Self::new(start_index, end_index, FormatEffect::Valid, Some(data))
    }

    pub fn with_cache_data(mut self, cache_data: FormatAbstractData) -> Self {
        self.cache_data = Some(cache_data);
        self
    }

    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }

    /// Half-open interval intersection.
    pub fn overlaps(&self, other: &FormatRange) -> bool {
        self.start_index < other.end_index && other.start_index < self.end_index
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start_index <= offset && offset < self.end_index
    }

    /// Whether `[start, end)` lies entirely within this range.
    pub fn covers(&self, start: usize, end: usize) -> bool {
        self.start_index <= start && end <= self.end_index
    }

    /// Same state and abstract data; the indices may differ.
    pub fn same_format(&self, other: &FormatRange) -> bool {
        self.state == other.state && self.abstract_data == other.abstract_data
    }

    /// The data a formatter should render from.
    pub fn render_data(&self) -> Option<&FormatAbstractData> {
        self.cache_data.as_ref().or(self.abstract_data.as_ref())
    }

    /// Copy of this range re-spanned to `[start, end)`.
    pub fn respan(&self, start: usize, end: usize) -> Self {
        Self {
            start_index: start,
            end_index: end,
            ..self.clone()
        }
    }

    /// The parts of this range outside `[start, end)`: zero, one or two pieces.
    pub fn subtract(&self, start: usize, end: usize) -> Vec<FormatRange> {
        if end <= self.start_index || start >= self.end_index {
            return vec![self.clone()];
        }
        let mut pieces = Vec::with_capacity(2);
        if self.start_index < start {
            pieces.push(self.respan(self.start_index, start));
        }
        if end < self.end_index {
            pieces.push(self.respan(end, self.end_index));
        }
        pieces
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold(start: usize, end: usize) -> FormatRange {
        FormatRange::valid(start, end, FormatAbstractData::new().with_tag("strong"))
    }

    #[test]
    fn test_overlaps_half_open() {
        assert!(bold(0, 5).overlaps(&bold(4, 6)));
        assert!(!bold(0, 5).overlaps(&bold(5, 6)));
        assert!(!bold(5, 6).overlaps(&bold(0, 5)));
        assert!(bold(2, 3).overlaps(&bold(0, 10)));
    }

    #[test]
    fn test_contains() {
        let r = bold(2, 4);
        assert!(!r.contains(1));
        assert!(r.contains(2));
        assert!(r.contains(3));
        assert!(!r.contains(4));
    }

    #[test]
    fn test_clone_is_independent() {
        let original = bold(0, 3);
        let mut copy = original.clone();
        copy.abstract_data = Some(FormatAbstractData::new().with_tag("b"));
        copy.end_index = 9;

        assert_eq!(original.end_index, 3);
        assert_eq!(original.abstract_data.as_ref().and_then(|d| d.tag()), Some("strong"));
    }

    #[test]
    fn test_subtract() {
        let r = bold(2, 10);
        assert_eq!(r.subtract(4, 6), vec![bold(2, 4), bold(6, 10)]);
        assert_eq!(r.subtract(0, 4), vec![bold(4, 10)]);
        assert_eq!(r.subtract(8, 12), vec![bold(2, 8)]);
        assert!(r.subtract(0, 12).is_empty());
        assert_eq!(r.subtract(10, 12), vec![bold(2, 10)]);
    }

    #[test]
    fn test_render_data_prefers_cache() {
        let r = FormatRange::valid(0, 1, FormatAbstractData::new().with_attr("src", "/a.png"))
            .with_cache_data(FormatAbstractData::new().with_attr("src", "https://cdn/a.png"));
        assert_eq!(r.render_data().and_then(|d| d.attr("src")), Some("https://cdn/a.png"));
        assert_eq!(r.abstract_data.as_ref().and_then(|d| d.attr("src")), Some("/a.png"));
    }
}
