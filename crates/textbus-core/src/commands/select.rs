//! Selection-only commands.

use super::{CommandContext, Commander};
use crate::error::Result;
use crate::selection::{AbstractPosition, TbRange};

/// Selects the whole document. Changes no content, so it records no history.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectAllCommander;

impl Commander for SelectAllCommander {
    fn name(&self) -> &str {
        "select-all"
    }

    fn record_history(&self) -> bool {
        false
    }

    fn command(&self, ctx: &mut CommandContext<'_>, _overlap: bool) -> Result<()> {
        let root = ctx.tree.root();
        let len = ctx.tree.content_length(root)?;
        ctx.selection.update(vec![TbRange::new(
            AbstractPosition::new(root, 0),
            AbstractPosition::new(root, len),
        )]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatters::FormatterRegistry;
    use crate::selection::{SelectionPhase, TbSelection};
    use crate::view::{Content, ViewTree};

    #[test]
    fn test_select_all_without_prior_selection() {
        let registry = FormatterRegistry::new();
        let mut tree = ViewTree::new();
        let p = tree.create_fragment();
        tree.append(tree.root(), Content::View(p)).unwrap();
        tree.append(tree.root(), Content::Text("tail".into())).unwrap();

        let mut selection = TbSelection::new();
        let mut ctx = CommandContext {
            tree: &mut tree,
            selection: &mut selection,
            registry: &registry,
        };
        assert!(!SelectAllCommander.record_history());
        SelectAllCommander.command(&mut ctx, false).unwrap();

        let range = selection.first().unwrap();
        assert_eq!(range.start, AbstractPosition::new(tree.root(), 0));
        assert_eq!(range.end, AbstractPosition::new(tree.root(), 5));
        assert_eq!(selection.phase(), SelectionPhase::Selecting { collapsed: false });
    }
}
