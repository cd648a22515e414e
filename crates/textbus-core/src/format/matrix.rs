//! Per-node format matrix: formatter -> ordered, non-overlapping ranges.

use std::fmt;

use super::{FormatEffect, FormatRange, FormatterKind, FormatterRef};

/// How much of a span a formatter's `Valid` ranges cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    Full,
    Partial,
    None,
}

#[derive(Clone)]
struct MatrixEntry {
    formatter: FormatterRef,
    ranges: Vec<FormatRange>,
}

/// Formatting owned by one fragment or single.
///
/// Entries are keyed by [`Formatter::name`](super::Formatter::name). After
/// every mutation the ranges of one formatter are sorted by start, never
/// overlap, and touching ranges with the same format are coalesced.
///
/// Cloning deep-copies every range; formatter handles are shared.
#[derive(Clone, Default)]
pub struct FormatMatrix {
    entries: Vec<MatrixEntry>,
}

impl fmt::Debug for FormatMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|e| (e.formatter.name(), &e.ranges)))
            .finish()
    }
}

impl PartialEq for FormatMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().all(|e| {
                other
                    .ranges(e.formatter.name())
                    .is_some_and(|ranges| ranges == e.ranges.as_slice())
            })
    }
}

impl FormatMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ranges for a formatter, by name.
    pub fn ranges(&self, name: &str) -> Option<&[FormatRange]> {
        self.entry(name).map(|e| e.ranges.as_slice())
    }

    /// Formatter handle for a name, if this matrix holds ranges for it.
    pub fn formatter(&self, name: &str) -> Option<&FormatterRef> {
        self.entry(name).map(|e| &e.formatter)
    }

    /// Formatters present in the matrix, in insertion order.
    pub fn formatters(&self) -> impl Iterator<Item = &FormatterRef> {
        self.entries.iter().map(|e| &e.formatter)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FormatterRef, &[FormatRange])> {
        self.entries
            .iter()
            .map(|e| (&e.formatter, e.ranges.as_slice()))
    }

    fn entry(&self, name: &str) -> Option<&MatrixEntry> {
        self.entries.iter().find(|e| e.formatter.name() == name)
    }

    pub fn remove_formatter(&mut self, name: &str) -> Option<Vec<FormatRange>> {
        let at = self.entries.iter().position(|e| e.formatter.name() == name)?;
        Some(self.entries.remove(at).ranges)
    }

    /// Merge a range for `formatter` into the matrix.
    ///
    /// With `important`, the new range wins: existing ranges are cut around
    /// it. Without, existing `Valid` coverage wins and only the uncovered
    /// parts of the new range are added; existing non-`Valid` ranges still
    /// yield to it. Merging the same range twice without `important` leaves
    /// the matrix unchanged.
    ///
    /// `Invalid` ranges are removal instructions: they cut coverage and are
    /// then discarded.
    pub fn merge_format(&mut self, formatter: &FormatterRef, range: FormatRange, important: bool) {
        let kind = formatter.kind();
        let Some(at) = self
            .entries
            .iter()
            .position(|e| e.formatter.name() == formatter.name())
        else {
            let mut ranges = vec![range];
            normalize(&mut ranges, kind);
            if !ranges.is_empty() {
                self.entries.push(MatrixEntry {
                    formatter: formatter.clone(),
                    ranges,
                });
            }
            return;
        };

        let existing = std::mem::take(&mut self.entries[at].ranges);
        let (start, end) = (range.start_index, range.end_index);
        let mut merged = Vec::with_capacity(existing.len() + 1);

        if important {
            for r in &existing {
                merged.extend(cut(r, start, end));
            }
            merged.push(range);
        } else {
            let mut pieces = vec![range];
            for r in existing.iter().filter(|r| r.state == FormatEffect::Valid) {
                pieces = pieces
                    .iter()
                    .flat_map(|p| cut(p, r.start_index, r.end_index))
                    .collect();
            }
            for r in &existing {
                if r.state == FormatEffect::Valid {
                    merged.push(r.clone());
                } else {
                    merged.extend(cut(r, start, end));
                }
            }
            merged.extend(pieces);
        }

        normalize(&mut merged, kind);
        tracing::debug!(
            target: "textbus::format",
            formatter = formatter.name(),
            important,
            ranges = merged.len(),
            "merged format range"
        );
        if merged.is_empty() {
            self.entries.remove(at);
        } else {
            self.entries[at].ranges = merged;
        }
    }

    /// Adjust every range for `len` units inserted at `at`.
    ///
    /// A range starting exactly at a non-zero insertion point moves right;
    /// a range containing or ending at it grows.
    pub fn shift_for_insert(&mut self, at: usize, len: usize) {
        if len == 0 {
            return;
        }
        for entry in &mut self.entries {
            for r in &mut entry.ranges {
                if at < r.start_index || (at == r.start_index && at > 0) {
                    r.start_index += len;
                    r.end_index += len;
                } else if at <= r.end_index {
                    r.end_index += len;
                }
            }
        }
    }

    /// Adjust every range for the removal of `[start, end)`.
    pub fn shrink_for_delete(&mut self, start: usize, end: usize) {
        if end <= start {
            return;
        }
        let removed = end - start;
        let map = |x: usize| {
            if x <= start {
                x
            } else if x < end {
                start
            } else {
                x - removed
            }
        };
        for entry in &mut self.entries {
            for r in &mut entry.ranges {
                r.start_index = map(r.start_index);
                r.end_index = map(r.end_index);
            }
            let kind = entry.formatter.kind();
            normalize(&mut entry.ranges, kind);
        }
        self.entries.retain(|e| !e.ranges.is_empty());
    }

    /// How much of `[start, end)` carries `Valid` ranges of `name`.
    ///
    /// A collapsed span is covered when a `Valid` range touches it.
    pub fn coverage(&self, name: &str, start: usize, end: usize) -> Coverage {
        let Some(ranges) = self.ranges(name) else {
            return Coverage::None;
        };
        let valid = ranges.iter().filter(|r| r.state == FormatEffect::Valid);
        if start >= end {
            return if valid
                .clone()
                .any(|r| r.start_index <= start && start <= r.end_index)
            {
                Coverage::Full
            } else {
                Coverage::None
            };
        }
        let covered: usize = valid
            .map(|r| {
                let lo = r.start_index.max(start);
                let hi = r.end_index.min(end);
                hi.saturating_sub(lo)
            })
            .sum();
        if covered >= end - start {
            Coverage::Full
        } else if covered > 0 {
            Coverage::Partial
        } else {
            Coverage::None
        }
    }

    /// The `Valid` range of `name` containing `offset`, or touching it for an
    /// empty range.
    pub fn range_at(&self, name: &str, offset: usize) -> Option<&FormatRange> {
        self.ranges(name)?.iter().find(|r| {
            r.state == FormatEffect::Valid
                && (r.contains(offset) || (r.is_empty() && r.start_index == offset))
        })
    }

    /// Every `Valid` range of formatters of `kind`, highest priority first.
    ///
    /// This is the fold order: the first entry renders outermost.
    pub fn applicable(&self, kind: FormatterKind) -> Vec<(&FormatterRef, &FormatRange)> {
        let mut out: Vec<(&FormatterRef, &FormatRange)> = self
            .entries
            .iter()
            .filter(|e| e.formatter.kind() == kind)
            .flat_map(|e| {
                e.ranges
                    .iter()
                    .filter(|r| r.state == FormatEffect::Valid)
                    .map(move |r| (&e.formatter, r))
            })
            .collect();
        out.sort_by(|a, b| b.0.priority().cmp(&a.0.priority()));
        out
    }

    /// Every `Valid` range regardless of kind, highest priority first.
    pub fn all_applicable(&self) -> Vec<(&FormatterRef, &FormatRange)> {
        let mut out = self.applicable(FormatterKind::Block);
        out.extend(self.applicable(FormatterKind::Inline));
        out.sort_by(|a, b| b.0.priority().cmp(&a.0.priority()));
        out
    }
}

/// Cut `[start, end)` out of a range. Empty ranges are removed when they sit
/// inside the cut; an empty cut removes nothing but empty ranges at its spot.
fn cut(range: &FormatRange, start: usize, end: usize) -> Vec<FormatRange> {
    if range.is_empty() {
        if start <= range.start_index && range.end_index <= end {
            return Vec::new();
        }
        return vec![range.clone()];
    }
    if start == end {
        return vec![range.clone()];
    }
    range.subtract(start, end)
}

/// Drop `Invalid` ranges (and empty inline ranges), sort, coalesce.
///
/// Block ranges on an empty fragment legitimately span `[0, 0)`.
fn normalize(ranges: &mut Vec<FormatRange>, kind: FormatterKind) {
    ranges.retain(|r| {
        r.state != FormatEffect::Invalid && !(kind == FormatterKind::Inline && r.is_empty())
    });
    ranges.sort_by_key(|r| (r.start_index, r.end_index));

    let mut out: Vec<FormatRange> = Vec::with_capacity(ranges.len());
    for r in ranges.drain(..) {
        match out.last_mut() {
            Some(last) if last.end_index >= r.start_index && last.same_format(&r) => {
                last.end_index = last.end_index.max(r.end_index);
            }
            _ => out.push(r),
        }
    }
    *ranges = out;
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::dom::{Dom, NodeId};
    use crate::format::{FormatAbstractData, Formatter, Priority, RenderContext, RenderMode};

    #[derive(Debug)]
    struct Probe(&'static str, FormatterKind, Priority);

    impl Formatter for Probe {
        fn name(&self) -> &str {
            self.0
        }
        fn kind(&self) -> FormatterKind {
            self.1
        }
        fn priority(&self) -> Priority {
            self.2
        }
        fn match_element(&self, _dom: &Dom, _node: NodeId) -> FormatEffect {
            FormatEffect::Invalid
        }
        fn match_data(&self, _data: &FormatAbstractData) -> FormatEffect {
            FormatEffect::Invalid
        }
        fn read(&self, _dom: &Dom, _node: NodeId) -> FormatAbstractData {
            FormatAbstractData::new()
        }
        fn render(&self, _dom: &mut Dom, _ctx: RenderContext<'_>) -> Option<RenderMode> {
            None
        }
    }

    fn bold() -> FormatterRef {
        Rc::new(Probe("bold", FormatterKind::Inline, Priority::InlineTag))
    }

    fn strong(start: usize, end: usize) -> FormatRange {
        FormatRange::valid(start, end, FormatAbstractData::new().with_tag("strong"))
    }

    fn b(start: usize, end: usize) -> FormatRange {
        FormatRange::valid(start, end, FormatAbstractData::new().with_tag("b"))
    }

    fn spans(m: &FormatMatrix, name: &str) -> Vec<(usize, usize)> {
        m.ranges(name)
            .unwrap_or_default()
            .iter()
            .map(|r| (r.start_index, r.end_index))
            .collect()
    }

    fn assert_disjoint_sorted(m: &FormatMatrix, name: &str) {
        let ranges = m.ranges(name).unwrap_or_default();
        for pair in ranges.windows(2) {
            assert!(pair[0].start_index <= pair[1].start_index, "unsorted: {ranges:?}");
            assert!(!pair[0].overlaps(&pair[1]), "overlap: {ranges:?}");
        }
    }

    #[test]
    fn test_merge_into_empty_matrix() {
        let f = bold();
        let mut m = FormatMatrix::new();
        m.merge_format(&f, strong(1, 4), false);
        assert_eq!(m.ranges("bold"), Some(&[strong(1, 4)][..]));
    }

    #[test]
    fn test_merge_existing_valid_wins() {
        let f = bold();
        let mut m = FormatMatrix::new();
        m.merge_format(&f, strong(2, 5), false);
        m.merge_format(&f, b(0, 8), false);

        assert_eq!(
            m.ranges("bold").unwrap_or_default(),
            &[b(0, 2), strong(2, 5), b(5, 8)][..]
        );
    }

    #[test]
    fn test_merge_important_splits_existing() {
        let f = bold();
        let mut m = FormatMatrix::new();
        m.merge_format(&f, strong(0, 10), false);
        m.merge_format(&f, b(3, 6), true);

        assert_eq!(
            m.ranges("bold").unwrap_or_default(),
            &[strong(0, 3), b(3, 6), strong(6, 10)][..]
        );
    }

    #[test]
    fn test_invalid_range_removes_coverage() {
        let f = bold();
        let mut m = FormatMatrix::new();
        m.merge_format(&f, strong(0, 6), false);
        m.merge_format(&f, FormatRange::new(2, 4, FormatEffect::Invalid, None), true);
        assert_eq!(spans(&m, "bold"), vec![(0, 2), (4, 6)]);

        m.merge_format(&f, FormatRange::new(0, 6, FormatEffect::Invalid, None), true);
        assert!(m.ranges("bold").is_none());
        assert!(m.is_empty());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let f = bold();
        let mut m = FormatMatrix::new();
        m.merge_format(&f, strong(0, 2), false);
        m.merge_format(&f, b(4, 9), false);
        let inherit = FormatRange::new(10, 12, FormatEffect::Inherit, None);
        m.merge_format(&f, inherit.clone(), false);

        let before = m.clone();
        m.merge_format(&f, b(1, 7), false);
        let once = m.clone();
        m.merge_format(&f, b(1, 7), false);
        assert_eq!(m, once);
        assert_ne!(before, once);

        m.merge_format(&f, inherit, false);
        assert_eq!(m, once);
    }

    #[test]
    fn test_touching_ranges_coalesce() {
        let f = bold();
        let mut m = FormatMatrix::new();
        m.merge_format(&f, strong(0, 3), false);
        m.merge_format(&f, strong(3, 5), false);
        m.merge_format(&f, b(5, 7), false);
        assert_eq!(spans(&m, "bold"), vec![(0, 5), (5, 7)]);
    }

    #[test]
    fn test_merges_never_overlap() {
        let f = bold();
        let mut m = FormatMatrix::new();
        let ops = [
            (0, 4, false, true),
            (2, 9, true, false),
            (7, 12, false, true),
            (1, 3, true, true),
            (5, 6, false, false),
            (0, 12, false, false),
            (4, 8, true, true),
        ];
        for (start, end, important, use_strong) in ops {
            let r = if use_strong { strong(start, end) } else { b(start, end) };
            m.merge_format(&f, r, important);
            assert_disjoint_sorted(&m, "bold");
        }
    }

    #[test]
    fn test_empty_inline_range_dropped_block_kept() {
        let inline = bold();
        let block: FormatterRef = Rc::new(Probe("block", FormatterKind::Block, Priority::Default));
        let mut m = FormatMatrix::new();
        m.merge_format(&inline, strong(3, 3), false);
        m.merge_format(
            &block,
            FormatRange::valid(0, 0, FormatAbstractData::new().with_tag("p")),
            true,
        );
        assert!(m.ranges("bold").is_none());
        assert_eq!(spans(&m, "block"), vec![(0, 0)]);

        m.merge_format(
            &block,
            FormatRange::valid(0, 0, FormatAbstractData::new().with_tag("h1")),
            true,
        );
        let ranges = m.ranges("block").unwrap_or_default();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].abstract_data.as_ref().and_then(|d| d.tag()), Some("h1"));
    }

    #[test]
    fn test_shift_for_insert() {
        let f = bold();
        let mut m = FormatMatrix::new();
        m.merge_format(&f, strong(0, 2), false);
        m.merge_format(&f, b(4, 6), false);

        // Typing at the end of a range extends it.
        m.shift_for_insert(2, 1);
        assert_eq!(spans(&m, "bold"), vec![(0, 3), (5, 7)]);

        // Inserting at a range's non-zero start pushes it right.
        m.shift_for_insert(5, 2);
        assert_eq!(spans(&m, "bold"), vec![(0, 3), (7, 9)]);

        m.shift_for_insert(0, 1);
        assert_eq!(spans(&m, "bold"), vec![(0, 4), (8, 10)]);
    }

    #[test]
    fn test_shrink_for_delete() {
        let f = bold();
        let mut m = FormatMatrix::new();
        m.merge_format(&f, strong(0, 3), false);
        m.merge_format(&f, strong(5, 8), false);
        m.merge_format(&f, b(9, 10), false);

        m.shrink_for_delete(2, 6);
        assert_eq!(spans(&m, "bold"), vec![(0, 4), (5, 6)]);

        m.shrink_for_delete(4, 6);
        assert_eq!(spans(&m, "bold"), vec![(0, 4)]);
    }

    #[test]
    fn test_coverage() {
        let f = bold();
        let mut m = FormatMatrix::new();
        m.merge_format(&f, strong(2, 6), false);

        assert_eq!(m.coverage("bold", 2, 6), Coverage::Full);
        assert_eq!(m.coverage("bold", 3, 4), Coverage::Full);
        assert_eq!(m.coverage("bold", 0, 4), Coverage::Partial);
        assert_eq!(m.coverage("bold", 6, 9), Coverage::None);
        assert_eq!(m.coverage("bold", 4, 4), Coverage::Full);
        assert_eq!(m.coverage("italic", 2, 6), Coverage::None);
    }

    #[test]
    fn test_clone_is_deep() {
        let f = bold();
        let mut m = FormatMatrix::new();
        m.merge_format(&f, strong(0, 4), false);
        let snapshot = m.clone();

        m.merge_format(&f, b(0, 4), true);
        assert_eq!(snapshot.ranges("bold"), Some(&[strong(0, 4)][..]));
        assert_eq!(m.ranges("bold"), Some(&[b(0, 4)][..]));
    }

    #[test]
    fn test_applicable_sorted_by_priority_desc() {
        let f = bold();
        let style: FormatterRef = Rc::new(Probe("color", FormatterKind::Inline, Priority::InlineStyle));
        let block: FormatterRef = Rc::new(Probe("block", FormatterKind::Block, Priority::Default));
        let mut m = FormatMatrix::new();
        m.merge_format(&style, FormatRange::valid(0, 1, FormatAbstractData::new()), false);
        m.merge_format(&f, strong(0, 1), false);
        m.merge_format(&block, FormatRange::valid(0, 1, FormatAbstractData::new()), false);

        let names: Vec<&str> = m.all_applicable().iter().map(|(f, _)| f.name()).collect();
        assert_eq!(names, vec!["block", "bold", "color"]);
        assert_eq!(m.applicable(FormatterKind::Block).len(), 1);
    }
}
