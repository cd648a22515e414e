//! Image insertion.

use std::rc::Rc;

use super::{CommandContext, Commander};
use crate::error::Result;
use crate::format::{FormatAbstractData, FormatRange};
use crate::selection::{AbstractPosition, TbRange};
use crate::view::Content;

/// Maps an image source as written to the URL the DOM should load.
///
/// Supplied by the caller, for example to point at an upload cache. The
/// abstract data keeps the source as written; the resolved URL goes into the
/// range's cache data and only affects rendering.
pub trait ImageResolver {
    fn resolve(&self, src: &str) -> Option<String>;
}

/// Inserts an image single at the caret, replacing a selection that lies
/// within one fragment.
#[derive(Clone)]
pub struct ImageCommander {
    data: FormatAbstractData,
    resolver: Option<Rc<dyn ImageResolver>>,
}

impl std::fmt::Debug for ImageCommander {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCommander")
            .field("data", &self.data)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

impl ImageCommander {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            data: FormatAbstractData::new()
                .with_tag("img")
                .with_attr("src", src),
            resolver: None,
        }
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.data = self.data.with_attr("alt", alt);
        self
    }

    pub fn with_size(mut self, width: impl Into<String>, height: impl Into<String>) -> Self {
        self.data = self.data.with_attr("width", width).with_attr("height", height);
        self
    }

    pub fn with_resolver(mut self, resolver: Rc<dyn ImageResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    fn range(&self) -> FormatRange {
        let range = FormatRange::valid(0, 1, self.data.clone());
        let resolved = self
            .resolver
            .as_ref()
            .zip(self.data.attr("src"))
            .and_then(|(resolver, src)| resolver.resolve(src));
        match resolved {
            Some(url) => range.with_cache_data(self.data.clone().with_attr("src", url)),
            None => range,
        }
    }
}

impl Commander for ImageCommander {
    fn name(&self) -> &str {
        "image"
    }

    fn command(&self, ctx: &mut CommandContext<'_>, _overlap: bool) -> Result<()> {
        let formatter = ctx.formatter("image")?;
        let range = ctx.require_ranges()?.remove(0);
        let at = range.start;
        if !range.is_collapsed() && range.start.fragment == range.end.fragment {
            ctx.tree.delete(at.fragment, at.offset, range.end.offset)?;
        }

        let image = ctx.tree.create_single("img");
        ctx.tree.apply(image, &formatter, self.range(), true)?;
        ctx.tree.insert(at.fragment, at.offset, Content::View(image))?;
        tracing::debug!(target: "textbus::command", src = ?self.data.attr("src"), "image inserted");

        ctx.selection.update(vec![TbRange::collapsed(AbstractPosition::new(
            at.fragment,
            at.offset + 1,
        ))]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatters::FormatterRegistry;
    use crate::html::parse_html;
    use crate::selection::TbSelection;
    use crate::view::parse::parse_view_tree;
    use crate::view::render::render_tree;
    use crate::view::{ViewId, ViewTree};
    use pretty_assertions::assert_eq;

    struct Uploads;

    impl ImageResolver for Uploads {
        fn resolve(&self, src: &str) -> Option<String> {
            src.strip_prefix("upload:")
                .map(|name| format!("https://cdn.example/{name}"))
        }
    }

    fn insert(
        html: &str,
        start: usize,
        end: usize,
        commander: ImageCommander,
    ) -> (ViewTree, TbSelection) {
        let registry = FormatterRegistry::with_defaults().unwrap();
        let (dom, root) = parse_html(html);
        let mut tree = parse_view_tree(&dom, root, &registry);
        let p: ViewId = tree.fragment(tree.root()).unwrap().child_views().next().unwrap();
        let mut selection = TbSelection::new();
        selection.update(vec![TbRange::new(
            AbstractPosition::new(p, start),
            AbstractPosition::new(p, end),
        )]);
        let mut ctx = CommandContext {
            tree: &mut tree,
            selection: &mut selection,
            registry: &registry,
        };
        commander.command(&mut ctx, false).unwrap();
        (tree, selection)
    }

    #[test]
    fn test_insert_at_caret_inherits_inline_format() {
        let (tree, selection) = insert(
            "<p><strong>abcd</strong></p>",
            2,
            2,
            ImageCommander::new("cat.png").with_alt("cat"),
        );
        insta::assert_snapshot!(
            render_tree(&tree, true).html(),
            @r#"<p><strong>ab<img src="cat.png" alt="cat">cd</strong></p>"#
        );
        assert_eq!(selection.first().unwrap().start.offset, 3);
    }

    #[test]
    fn test_replaces_selection_and_resolves_url() {
        let (tree, _) = insert(
            "<p>abcd</p>",
            1,
            3,
            ImageCommander::new("upload:cat.png").with_resolver(Rc::new(Uploads)),
        );
        insta::assert_snapshot!(
            render_tree(&tree, true).html(),
            @r#"<p>a<img src="https://cdn.example/cat.png">d</p>"#
        );

        let p = tree.fragment(tree.root()).unwrap().child_views().next().unwrap();
        let image = tree.fragment(p).unwrap().child_views().next().unwrap();
        let range = &tree.matrix(image).unwrap().ranges("image").unwrap()[0];
        assert_eq!(
            range.abstract_data.as_ref().and_then(|d| d.attr("src")),
            Some("upload:cat.png")
        );
    }
}
