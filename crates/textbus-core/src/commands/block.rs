//! Commands over whole blocks: margins and lists.

use smol_str::SmolStr;

use super::{CommandContext, Commander, clear_block, selected_blocks, set_block};
use crate::error::Result;
use crate::format::{FormatAbstractData, FormatterRef};
use crate::view::{Content, ViewId, ViewTree};

const MARGIN_SIDES: [&str; 4] = ["margin-top", "margin-right", "margin-bottom", "margin-left"];

/// Sets block margins. Unset sides are left out of the data and render as
/// `0`.
#[derive(Debug, Clone, Default)]
pub struct MarginCommander {
    data: FormatAbstractData,
}

impl MarginCommander {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn top(self, value: impl Into<String>) -> Self {
        self.side("margin-top", value)
    }

    pub fn right(self, value: impl Into<String>) -> Self {
        self.side("margin-right", value)
    }

    pub fn bottom(self, value: impl Into<String>) -> Self {
        self.side("margin-bottom", value)
    }

    pub fn left(self, value: impl Into<String>) -> Self {
        self.side("margin-left", value)
    }

    fn side(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.data = self.data.with_style(name, value);
        self
    }

    fn matches(&self, tree: &ViewTree, block: ViewId) -> bool {
        let Some(data) = tree
            .matrix(block)
            .ok()
            .and_then(|m| m.range_at("margin", 0))
            .and_then(|r| r.abstract_data.as_ref())
        else {
            return false;
        };
        MARGIN_SIDES
            .iter()
            .all(|side| data.style(side) == self.data.style(side))
    }
}

impl Commander for MarginCommander {
    fn name(&self) -> &str {
        "margin"
    }

    fn command(&self, ctx: &mut CommandContext<'_>, overlap: bool) -> Result<()> {
        let formatter = ctx.formatter("margin")?;
        for range in ctx.require_ranges()? {
            let blocks = selected_blocks(ctx.tree, &range);
            let toggle_off = !overlap && blocks.iter().all(|b| self.matches(ctx.tree, *b));
            for block in blocks {
                if toggle_off || self.data.is_empty() {
                    clear_block(ctx.tree, &formatter, block)?;
                } else {
                    set_block(ctx.tree, &formatter, block, self.data.clone())?;
                }
            }
        }
        Ok(())
    }
}

/// Wraps the selected blocks in a `ul` or `ol`, or unwraps them when they
/// already sit in a list of that kind.
#[derive(Debug, Clone)]
pub struct ListCommander {
    tag: SmolStr,
}

impl ListCommander {
    pub fn unordered() -> Self {
        Self { tag: "ul".into() }
    }

    pub fn ordered() -> Self {
        Self { tag: "ol".into() }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

/// The list fragment directly holding `block`, with its tag.
pub(crate) fn enclosing_list(tree: &ViewTree, block: ViewId) -> Option<(ViewId, SmolStr)> {
    let parent = tree.parent(block)?;
    let range = tree.matrix(parent).ok()?.range_at("list", 0)?;
    let tag = range
        .abstract_data
        .as_ref()
        .and_then(|d| d.tag())
        .unwrap_or("ul");
    Some((parent, tag.into()))
}

struct Lists<'a> {
    tree: &'a mut ViewTree,
    list: FormatterRef,
    block: FormatterRef,
}

impl Lists<'_> {
    fn item_data() -> FormatAbstractData {
        FormatAbstractData::new().with_tag("li")
    }

    fn list_data(tag: &str) -> FormatAbstractData {
        FormatAbstractData::new().with_tag(tag)
    }

    fn refresh(&mut self, list: ViewId, tag: &str) -> Result<()> {
        set_block(self.tree, &self.list, list, Self::list_data(tag))
    }

    /// Wrap consecutive sibling blocks into one new list placed where the
    /// first of them was.
    fn wrap(&mut self, blocks: &[ViewId], tag: &str) -> Result<()> {
        let Some(first) = blocks.first().copied() else {
            return Ok(());
        };
        let (Some(parent), Some(at)) = (self.tree.parent(first), self.tree.find(first)) else {
            tracing::warn!(target: "textbus::command", "cannot wrap a detached block in a list");
            return Ok(());
        };
        let list = self.tree.create_fragment();
        self.tree.insert(parent, at, Content::View(list))?;
        for (index, block) in blocks.iter().enumerate() {
            self.tree.move_view(*block, list, index)?;
            set_block(self.tree, &self.block, *block, Self::item_data())?;
        }
        self.refresh(list, tag)
    }

    /// Move one item out of its list, splitting the list around it.
    fn unwrap(&mut self, item: ViewId, list: ViewId, tag: &str) -> Result<()> {
        let (Some(parent), Some(list_at), Some(item_at)) = (
            self.tree.parent(list),
            self.tree.find(list),
            self.tree.find(item),
        ) else {
            return Ok(());
        };

        // Items after this one move to a new list of the same kind.
        let after: Vec<ViewId> = self
            .tree
            .fragment(list)?
            .child_views()
            .filter(|view| self.tree.find(*view).is_some_and(|at| at > item_at))
            .collect();
        if !after.is_empty() {
            let tail = self.tree.create_fragment();
            self.tree.insert(parent, list_at + 1, Content::View(tail))?;
            for (index, view) in after.into_iter().enumerate() {
                self.tree.move_view(view, tail, index)?;
            }
            self.refresh(tail, tag)?;
        }

        self.tree.move_view(item, parent, list_at + 1)?;
        set_block(
            self.tree,
            &self.block,
            item,
            FormatAbstractData::new().with_tag("p"),
        )?;

        if self.tree.fragment(list)?.child_views().next().is_none() {
            self.tree.delete(parent, list_at, list_at + 1)?;
        } else {
            self.refresh(list, tag)?;
        }
        Ok(())
    }
}

impl Commander for ListCommander {
    fn name(&self) -> &str {
        "list"
    }

    fn command(&self, ctx: &mut CommandContext<'_>, overlap: bool) -> Result<()> {
        let ranges = ctx.require_ranges()?;
        let mut lists = Lists {
            tree: &mut *ctx.tree,
            list: ctx.registry.require("list")?.clone(),
            block: ctx.registry.require("block")?.clone(),
        };
        for range in ranges {
            let blocks: Vec<ViewId> = selected_blocks(lists.tree, &range)
                .into_iter()
                .filter(|b| *b != lists.tree.root())
                .collect();
            let enclosing: Vec<Option<(ViewId, SmolStr)>> = blocks
                .iter()
                .map(|b| enclosing_list(lists.tree, *b))
                .collect();
            let all_listed = !blocks.is_empty()
                && enclosing
                    .iter()
                    .all(|l| l.as_ref().is_some_and(|(_, tag)| *tag == self.tag));

            if all_listed && !overlap {
                tracing::debug!(target: "textbus::command", tag = %self.tag, items = blocks.len(), "unwrap list");
                // Last first, so earlier items keep their offsets.
                for (block, listed) in blocks.iter().zip(enclosing).rev() {
                    if let Some((list, _)) = listed {
                        lists.unwrap(*block, list, &self.tag)?;
                    }
                }
                continue;
            }

            tracing::debug!(target: "textbus::command", tag = %self.tag, items = blocks.len(), "wrap list");
            let mut group: Vec<ViewId> = Vec::new();
            let mut retagged: Vec<ViewId> = Vec::new();
            for (block, listed) in blocks.iter().zip(enclosing) {
                if let Some((list, tag)) = listed {
                    if tag != self.tag && !retagged.contains(&list) {
                        lists.refresh(list, &self.tag)?;
                        retagged.push(list);
                    }
                    continue;
                }
                let adjacent = group.last().is_some_and(|prev| {
                    lists.tree.parent(*prev) == lists.tree.parent(*block)
                        && lists.tree.find(*prev).map(|o| o + 1) == lists.tree.find(*block)
                });
                if !adjacent && !group.is_empty() {
                    lists.wrap(&group, &self.tag)?;
                    group.clear();
                }
                group.push(*block);
            }
            lists.wrap(&group, &self.tag)?;
        }
        Ok(())
    }
}
