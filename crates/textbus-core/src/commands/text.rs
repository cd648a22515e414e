//! Text entry: typing and deleting at the selection.
//!
//! Edits stay inside one fragment. A range spanning fragments inserts at its
//! start and deletes nothing; joining or splitting blocks is not handled
//! here.

use super::{CommandContext, Commander};
use crate::error::Result;
use crate::selection::{AbstractPosition, TbRange, compare_positions};
use crate::view::{ContentAt, ViewId, ViewTree};

/// Inserts text at every range, replacing selected content that lies in one
/// fragment. Each range collapses after its inserted text.
#[derive(Debug, Clone)]
pub struct InsertTextCommander {
    text: String,
}

impl InsertTextCommander {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Deletes the selected content, or one unit beside a collapsed caret.
/// Nested blocks are never removed by a caret delete.
#[derive(Debug, Clone, Copy)]
pub struct DeleteCommander {
    forward: bool,
}

impl DeleteCommander {
    pub fn backward() -> Self {
        Self { forward: false }
    }

    pub fn forward() -> Self {
        Self { forward: true }
    }
}

/// One replacement of `removed` units at `at` by `added` units.
struct Edit {
    fragment: ViewId,
    at: usize,
    removed: usize,
    added: usize,
}

impl Edit {
    fn shift(&self, pos: &mut AbstractPosition) {
        if pos.fragment == self.fragment && pos.offset > self.at {
            pos.offset = (pos.offset + self.added)
                .saturating_sub(self.removed)
                .max(self.at);
        }
    }
}

/// Run `edit` over the ranges last-first, so each edit sees offsets the
/// earlier ones have not moved, then collapse every edited range after its
/// edit. Ranges `edit` skips are kept as they were.
fn edit_ranges(
    ctx: &mut CommandContext<'_>,
    mut edit: impl FnMut(&mut ViewTree, &TbRange) -> Result<Option<Edit>>,
) -> Result<()> {
    let mut ranges = ctx.require_ranges()?;
    let tree: &ViewTree = ctx.tree;
    ranges.sort_by(|a, b| compare_positions(tree, &b.start, &a.start));

    let mut after: Vec<TbRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        let Some(done) = edit(ctx.tree, &range)? else {
            after.push(range);
            continue;
        };
        for later in &mut after {
            done.shift(&mut later.start);
            done.shift(&mut later.end);
        }
        after.push(TbRange::collapsed(AbstractPosition::new(
            done.fragment,
            done.at + done.added,
        )));
    }
    after.reverse();
    ctx.selection.update(after);
    Ok(())
}

impl Commander for InsertTextCommander {
    fn name(&self) -> &str {
        "insert-text"
    }

    fn command(&self, ctx: &mut CommandContext<'_>, _overlap: bool) -> Result<()> {
        if self.text.is_empty() {
            return Ok(());
        }
        let added = self.text.chars().count();
        edit_ranges(ctx, |tree, range| {
            let fragment = range.start.fragment;
            let at = range.start.offset;
            let removed = if range.end.fragment == fragment {
                range.end.offset.saturating_sub(at)
            } else {
                tracing::debug!(target: "textbus::command", ?range, "typing over a cross-block range");
                0
            };
            if removed > 0 {
                tree.delete(fragment, at, at + removed)?;
            }
            tree.insert_text(fragment, at, &self.text)?;
            Ok(Some(Edit {
                fragment,
                at,
                removed,
                added,
            }))
        })
    }
}

impl Commander for DeleteCommander {
    fn name(&self) -> &str {
        "delete"
    }

    fn command(&self, ctx: &mut CommandContext<'_>, _overlap: bool) -> Result<()> {
        let forward = self.forward;
        edit_ranges(ctx, |tree, range| {
            let fragment = range.start.fragment;
            let offset = range.start.offset;
            let (lo, hi) = if !range.is_collapsed() {
                if range.end.fragment != fragment {
                    tracing::debug!(target: "textbus::command", ?range, "cross-block delete skipped");
                    return Ok(None);
                }
                (offset, range.end.offset)
            } else if forward {
                (offset, offset + 1)
            } else if offset > 0 {
                (offset - 1, offset)
            } else {
                return Ok(None);
            };

            let frag = tree.fragment(fragment)?;
            if hi > frag.content_length() {
                return Ok(None);
            }
            if range.is_collapsed() {
                if let Some(ContentAt::View(view)) = frag.content_at(lo) {
                    if tree.is_fragment(view) {
                        return Ok(None);
                    }
                }
            }
            tree.delete(fragment, lo, hi)?;
            Ok(Some(Edit {
                fragment,
                at: lo,
                removed: hi - lo,
                added: 0,
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::formatters::FormatterRegistry;
    use crate::html::parse_html;
    use crate::selection::TbSelection;
    use crate::view::parse::parse_view_tree;
    use crate::view::render::render_tree;

    struct Doc {
        tree: ViewTree,
        selection: TbSelection,
        registry: FormatterRegistry,
    }

    impl Doc {
        fn new(html: &str) -> Self {
            let registry = FormatterRegistry::with_defaults().unwrap();
            let (dom, root) = parse_html(html);
            let tree = parse_view_tree(&dom, root, &registry);
            Self {
                tree,
                selection: TbSelection::new(),
                registry,
            }
        }

        fn block(&self, index: usize) -> ViewId {
            let root = self.tree.root();
            self.tree
                .fragment(root)
                .unwrap()
                .child_views()
                .nth(index)
                .unwrap()
        }

        fn run(&mut self, ranges: Vec<TbRange>, commander: &dyn Commander) -> String {
            self.selection.update(ranges);
            let mut ctx = CommandContext {
                tree: &mut self.tree,
                selection: &mut self.selection,
                registry: &self.registry,
            };
            commander.command(&mut ctx, false).unwrap();
            render_tree(&self.tree, true).html()
        }
    }

    fn at(view: ViewId, offset: usize) -> AbstractPosition {
        AbstractPosition::new(view, offset)
    }

    #[test]
    fn test_typing_extends_formatting() {
        let mut doc = Doc::new("<p><strong>ab</strong>c</p>");
        let p = doc.block(0);
        let html = doc.run(
            vec![TbRange::collapsed(at(p, 2))],
            &InsertTextCommander::new("X"),
        );
        insta::assert_snapshot!(html, @"<p><strong>abX</strong>c</p>");
        assert_eq!(doc.selection.ranges(), &[TbRange::collapsed(at(p, 3))]);
    }

    #[test]
    fn test_typing_replaces_selection() {
        let mut doc = Doc::new("<p>hello world</p>");
        let p = doc.block(0);
        let html = doc.run(
            vec![TbRange::new(at(p, 6), at(p, 11))],
            &InsertTextCommander::new("there"),
        );
        insta::assert_snapshot!(html, @"<p>hello there</p>");
        assert_eq!(doc.selection.ranges(), &[TbRange::collapsed(at(p, 11))]);
    }

    #[test]
    fn test_typing_at_several_carets_in_one_block() {
        let mut doc = Doc::new("<p>ac</p>");
        let p = doc.block(0);
        let html = doc.run(
            vec![TbRange::collapsed(at(p, 1)), TbRange::collapsed(at(p, 2))],
            &InsertTextCommander::new("b"),
        );
        insta::assert_snapshot!(html, @"<p>abcb</p>");
        assert_eq!(
            doc.selection.ranges(),
            &[TbRange::collapsed(at(p, 2)), TbRange::collapsed(at(p, 4))]
        );
    }

    #[test]
    fn test_backspace_and_forward_delete() {
        let mut doc = Doc::new("<p>abc</p>");
        let p = doc.block(0);
        let html = doc.run(vec![TbRange::collapsed(at(p, 2))], &DeleteCommander::backward());
        insta::assert_snapshot!(html, @"<p>ac</p>");
        assert_eq!(doc.selection.ranges(), &[TbRange::collapsed(at(p, 1))]);

        let html = doc.run(vec![TbRange::collapsed(at(p, 0))], &DeleteCommander::forward());
        insta::assert_snapshot!(html, @"<p>c</p>");
    }

    #[test]
    fn test_delete_stops_at_block_edges() {
        let mut doc = Doc::new("<p>a</p><p>b</p>");
        let second = doc.block(1);
        let html = doc.run(
            vec![TbRange::collapsed(at(second, 0))],
            &DeleteCommander::backward(),
        );
        insta::assert_snapshot!(html, @"<p>a</p><p>b</p>");

        // A caret between blocks does not remove them
        let root = doc.tree.root();
        let html = doc.run(vec![TbRange::collapsed(at(root, 1))], &DeleteCommander::backward());
        insta::assert_snapshot!(html, @"<p>a</p><p>b</p>");
        assert_eq!(doc.selection.ranges(), &[TbRange::collapsed(at(root, 1))]);
    }
}
