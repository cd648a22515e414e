//! Table insertion.

use super::{CommandContext, Commander, selected_blocks, set_block};
use crate::error::Result;
use crate::format::FormatAbstractData;
use crate::selection::{AbstractPosition, TbRange};
use crate::view::{Content, ViewId, ViewTree};

/// Inserts an empty `rows` x `cols` table after the block holding the caret
/// and moves the caret into the first cell.
#[derive(Debug, Clone)]
pub struct TableCommander {
    rows: usize,
    cols: usize,
    data: FormatAbstractData,
}

impl TableCommander {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows: rows.max(1),
            cols: cols.max(1),
            data: FormatAbstractData::new().with_tag("table"),
        }
    }

    /// Set a `<table>` attribute such as `border` or `width`.
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.data = self.data.with_attr(name.to_string(), value);
        self
    }
}

/// Where a new top-level block goes for a caret at `range.start`.
fn insertion_point(tree: &ViewTree, range: &TbRange) -> (ViewId, usize) {
    let block = selected_blocks(tree, range)
        .first()
        .copied()
        .unwrap_or(range.start.fragment);
    match (tree.parent(block), tree.find(block)) {
        (Some(parent), Some(at)) => (parent, at + 1),
        _ => (block, range.start.offset),
    }
}

impl Commander for TableCommander {
    fn name(&self) -> &str {
        "table"
    }

    fn command(&self, ctx: &mut CommandContext<'_>, _overlap: bool) -> Result<()> {
        let ranges = ctx.require_ranges()?;
        let table_fmt = ctx.formatter("table")?;
        let block_fmt = ctx.formatter("block")?;
        let tree = &mut *ctx.tree;

        let table = tree.create_fragment();
        let body = tree.create_fragment();
        let mut first_cell = None;
        for _ in 0..self.rows {
            let row = tree.create_fragment();
            for _ in 0..self.cols {
                let cell = tree.create_fragment();
                set_block(tree, &block_fmt, cell, FormatAbstractData::new().with_tag("td"))?;
                tree.append(row, Content::View(cell))?;
                first_cell.get_or_insert(cell);
            }
            set_block(tree, &block_fmt, row, FormatAbstractData::new().with_tag("tr"))?;
            tree.append(body, Content::View(row))?;
        }
        set_block(tree, &block_fmt, body, FormatAbstractData::new().with_tag("tbody"))?;
        tree.append(table, Content::View(body))?;
        set_block(tree, &table_fmt, table, self.data.clone())?;

        let (parent, at) = insertion_point(tree, &ranges[0]);
        tree.insert(parent, at, Content::View(table))?;
        tracing::debug!(target: "textbus::command", rows = self.rows, cols = self.cols, "table inserted");

        if let Some(cell) = first_cell {
            ctx.selection
                .update(vec![TbRange::collapsed(AbstractPosition::new(cell, 0))]);
        }
        Ok(())
    }
}
