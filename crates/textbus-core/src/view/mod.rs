//! The abstract content tree.
//!
//! A [`ViewTree`] is an arena of fragments (containers with ordered content)
//! and singles (leaf elements such as images). Each node owns its
//! [`FormatMatrix`]; the DOM is re-derived from the tree by the
//! [`Renderer`](render::Renderer).
//!
//! Content offsets count one unit per character and one per child view.
//! Child positions are recomputed by scanning the parent on every
//! [`ViewTree::find`] call, so structural edits never leave stale indices.

pub mod parse;
pub mod render;

use smol_str::SmolStr;

use crate::error::{EditorError, Result};
use crate::format::{FormatMatrix, FormatRange, FormatterRef};

/// Identity of a node within one [`ViewTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u32);

impl ViewId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One unit run of fragment content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    View(ViewId),
}

impl Content {
    /// Content length: characters for text, one for a child view.
    pub fn len(&self) -> usize {
        match self {
            Content::Text(text) => text.chars().count(),
            Content::View(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Content::Text(text) if text.is_empty())
    }
}

/// A container: ordered content plus block and inline formatting.
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    contents: Vec<Content>,
    pub matrix: FormatMatrix,
}

impl Fragment {
    pub fn contents(&self) -> &[Content] {
        &self.contents
    }

    pub fn content_length(&self) -> usize {
        self.contents.iter().map(Content::len).sum()
    }

    /// Child views in content order.
    pub fn child_views(&self) -> impl Iterator<Item = ViewId> + '_ {
        self.contents.iter().filter_map(|c| match c {
            Content::View(id) => Some(*id),
            Content::Text(_) => None,
        })
    }

    /// Text in `[start, end)`. Child views contribute nothing.
    pub fn text_between(&self, start: usize, end: usize) -> String {
        let mut out = String::new();
        let mut offset = 0;
        for content in &self.contents {
            let len = content.len();
            if let Content::Text(text) = content {
                let lo = start.max(offset);
                let hi = end.min(offset + len);
                if lo < hi {
                    out.extend(text.chars().skip(lo - offset).take(hi - lo));
                }
            }
            offset += len;
        }
        out
    }

    /// The unit at `offset`: a character or a child view.
    pub fn content_at(&self, offset: usize) -> Option<ContentAt> {
        let (index, inner) = self.locate(offset)?;
        match self.contents.get(index)? {
            Content::Text(text) => text.chars().nth(inner).map(ContentAt::Char),
            Content::View(id) => Some(ContentAt::View(*id)),
        }
    }

    /// Index of the content run holding `offset` and the offset inside it.
    /// An offset on a run boundary resolves to the start of the later run.
    fn locate(&self, offset: usize) -> Option<(usize, usize)> {
        let mut acc = 0;
        for (index, content) in self.contents.iter().enumerate() {
            let len = content.len();
            if offset < acc + len {
                return Some((index, offset - acc));
            }
            acc += len;
        }
        (offset == acc).then_some((self.contents.len(), 0))
    }

    /// Split a text run so `offset` falls on a run boundary. Returns the
    /// index of the run starting at `offset`.
    fn split_at(&mut self, offset: usize) -> Option<usize> {
        let (index, inner) = self.locate(offset)?;
        if inner == 0 {
            return Some(index);
        }
        let Some(Content::Text(text)) = self.contents.get_mut(index) else {
            return Some(index + 1);
        };
        let byte = text
            .char_indices()
            .nth(inner)
            .map_or(text.len(), |(b, _)| b);
        let tail = text.split_off(byte);
        self.contents.insert(index + 1, Content::Text(tail));
        Some(index + 1)
    }

    /// Merge adjacent text runs and drop empty ones.
    fn compact(&mut self) {
        let mut out: Vec<Content> = Vec::with_capacity(self.contents.len());
        for content in self.contents.drain(..) {
            if content.is_empty() {
                continue;
            }
            if let (Some(Content::Text(prev)), Content::Text(text)) = (out.last_mut(), &content) {
                prev.push_str(text);
                continue;
            }
            out.push(content);
        }
        self.contents = out;
    }
}

/// What sits at a content offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentAt {
    Char(char),
    View(ViewId),
}

/// A leaf element such as `<img>` or `<br>`.
#[derive(Debug, Clone)]
pub struct Single {
    tag_name: SmolStr,
    pub matrix: FormatMatrix,
}

impl Single {
    pub fn new(tag_name: impl Into<SmolStr>) -> Self {
        Self {
            tag_name: tag_name.into(),
            matrix: FormatMatrix::new(),
        }
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }
}

#[derive(Debug, Clone)]
pub enum ViewKind {
    Fragment(Fragment),
    Single(Single),
}

#[derive(Debug, Clone)]
pub struct ViewNode {
    parent: Option<ViewId>,
    pub kind: ViewKind,
}

impl ViewNode {
    pub fn parent(&self) -> Option<ViewId> {
        self.parent
    }

    pub fn matrix(&self) -> &FormatMatrix {
        match &self.kind {
            ViewKind::Fragment(f) => &f.matrix,
            ViewKind::Single(s) => &s.matrix,
        }
    }

    fn matrix_mut(&mut self) -> &mut FormatMatrix {
        match &mut self.kind {
            ViewKind::Fragment(f) => &mut f.matrix,
            ViewKind::Single(s) => &mut s.matrix,
        }
    }
}

/// Arena owning every fragment and single of one document.
///
/// Parents own their children exclusively; the `parent` link on each node is
/// a lookup aid only. Cloning the tree deep-copies every matrix.
///
/// Slots of deleted nodes are reused, so an id held past the deletion of its
/// node may later name a different node.
#[derive(Debug, Clone)]
pub struct ViewTree {
    nodes: Vec<Option<ViewNode>>,
    free: Vec<ViewId>,
    root: ViewId,
}

impl Default for ViewTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewTree {
    /// A tree holding one empty root fragment.
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(ViewNode {
                parent: None,
                kind: ViewKind::Fragment(Fragment::default()),
            })],
            free: Vec::new(),
            root: ViewId(0),
        }
    }

    pub fn root(&self) -> ViewId {
        self.root
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: ViewId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: ViewId) -> Option<&ViewNode> {
        self.nodes.get(id.index())?.as_ref()
    }

    pub fn node(&self, id: ViewId) -> Result<&ViewNode> {
        self.get(id).ok_or(EditorError::UnknownView(id))
    }

    fn node_mut(&mut self, id: ViewId) -> Result<&mut ViewNode> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(EditorError::UnknownView(id))
    }

    pub fn fragment(&self, id: ViewId) -> Result<&Fragment> {
        match &self.node(id)?.kind {
            ViewKind::Fragment(f) => Ok(f),
            ViewKind::Single(_) => Err(EditorError::NotAFragment(id)),
        }
    }

    pub fn fragment_mut(&mut self, id: ViewId) -> Result<&mut Fragment> {
        match &mut self.node_mut(id)?.kind {
            ViewKind::Fragment(f) => Ok(f),
            ViewKind::Single(_) => Err(EditorError::NotAFragment(id)),
        }
    }

    pub fn single(&self, id: ViewId) -> Result<&Single> {
        match &self.node(id)?.kind {
            ViewKind::Single(s) => Ok(s),
            ViewKind::Fragment(_) => Err(EditorError::NotASingle(id)),
        }
    }

    pub fn is_fragment(&self, id: ViewId) -> bool {
        matches!(self.get(id).map(|n| &n.kind), Some(ViewKind::Fragment(_)))
    }

    pub fn matrix(&self, id: ViewId) -> Result<&FormatMatrix> {
        Ok(self.node(id)?.matrix())
    }

    pub fn matrix_mut(&mut self, id: ViewId) -> Result<&mut FormatMatrix> {
        Ok(self.node_mut(id)?.matrix_mut())
    }

    pub fn parent(&self, id: ViewId) -> Option<ViewId> {
        self.get(id)?.parent
    }

    /// Ancestors from the parent upwards.
    pub fn ancestors(&self, id: ViewId) -> impl Iterator<Item = ViewId> + '_ {
        std::iter::successors(self.parent(id), move |v| self.parent(*v))
    }

    /// Content length of a fragment; a single counts as one.
    pub fn content_length(&self, id: ViewId) -> Result<usize> {
        match &self.node(id)?.kind {
            ViewKind::Fragment(f) => Ok(f.content_length()),
            ViewKind::Single(_) => Ok(1),
        }
    }

    fn push(&mut self, kind: ViewKind) -> ViewId {
        let node = Some(ViewNode { parent: None, kind });
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = node;
            return id;
        }
        let id = ViewId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// A detached, empty fragment.
    pub fn create_fragment(&mut self) -> ViewId {
        self.push(ViewKind::Fragment(Fragment::default()))
    }

    /// A detached single with no formatting.
    pub fn create_single(&mut self, tag_name: &str) -> ViewId {
        self.push(ViewKind::Single(Single::new(tag_name)))
    }

    /// Append content at the end of a fragment without touching its ranges.
    ///
    /// Used while building a tree; edits go through [`insert`](Self::insert).
    pub fn append(&mut self, fragment: ViewId, content: Content) -> Result<()> {
        if let Content::View(child) = content {
            self.adopt(fragment, child)?;
        }
        let frag = self.fragment_mut(fragment)?;
        frag.contents.push(content);
        frag.compact();
        Ok(())
    }

    /// Insert content at `offset`, shifting and extending ranges.
    pub fn insert(&mut self, fragment: ViewId, offset: usize, content: Content) -> Result<()> {
        let len = self.fragment(fragment)?.content_length();
        if offset > len {
            return Err(EditorError::PositionOutOfRange {
                view: fragment,
                offset,
                len,
            });
        }
        if let Content::View(child) = content {
            self.adopt(fragment, child)?;
        }
        let added = content.len();
        let frag = self.fragment_mut(fragment)?;
        let index = frag.split_at(offset).unwrap_or(frag.contents.len());
        frag.contents.insert(index, content);
        frag.compact();
        frag.matrix.shift_for_insert(offset, added);
        Ok(())
    }

    pub fn insert_text(&mut self, fragment: ViewId, offset: usize, text: &str) -> Result<()> {
        self.insert(fragment, offset, Content::Text(text.to_string()))
    }

    /// Remove `[start, end)` from a fragment. Removed child views are
    /// dropped from the arena with their subtrees.
    pub fn delete(&mut self, fragment: ViewId, start: usize, end: usize) -> Result<()> {
        let removed = self.cut(fragment, start, end)?;
        for content in removed {
            if let Content::View(child) = content {
                self.drop_subtree(child);
            }
        }
        Ok(())
    }

    /// Remove `[start, end)` and hand back the removed content. Child views
    /// stay in the arena, detached.
    fn cut(&mut self, fragment: ViewId, start: usize, end: usize) -> Result<Vec<Content>> {
        let len = self.fragment(fragment)?.content_length();
        if start > end || end > len {
            return Err(EditorError::PositionOutOfRange {
                view: fragment,
                offset: end,
                len,
            });
        }
        let frag = self.fragment_mut(fragment)?;
        // Split at `start` first: the later split can only add runs after it.
        let lo = frag.split_at(start).unwrap_or(frag.contents.len());
        let hi = frag.split_at(end).unwrap_or(frag.contents.len());
        let removed: Vec<Content> = frag.contents.drain(lo..hi).collect();
        frag.compact();
        frag.matrix.shrink_for_delete(start, end);
        for content in &removed {
            if let Content::View(child) = content {
                if let Ok(node) = self.node_mut(*child) {
                    node.parent = None;
                }
            }
        }
        Ok(removed)
    }

    fn adopt(&mut self, parent: ViewId, child: ViewId) -> Result<()> {
        if parent == child || self.ancestors(parent).any(|a| a == child) {
            return Err(EditorError::UnknownView(child));
        }
        let node = self.node_mut(child)?;
        debug_assert!(node.parent.is_none(), "view already has a parent");
        node.parent = Some(parent);
        Ok(())
    }

    fn drop_subtree(&mut self, id: ViewId) {
        let children: Vec<ViewId> = match self.get(id).map(|n| &n.kind) {
            Some(ViewKind::Fragment(f)) => f.child_views().collect(),
            _ => Vec::new(),
        };
        for child in children {
            self.drop_subtree(child);
        }
        if let Some(slot) = self.nodes.get_mut(id.index()) {
            if slot.take().is_some() {
                self.free.push(id);
            }
        }
    }

    /// Content offset of `child` within its parent. Scans on every call.
    pub fn find(&self, child: ViewId) -> Option<usize> {
        let parent = self.fragment(self.parent(child)?).ok()?;
        let mut offset = 0;
        for content in &parent.contents {
            if *content == Content::View(child) {
                return Some(offset);
            }
            offset += content.len();
        }
        None
    }

    /// Offsets from the root down to `id`, for document-order comparison.
    pub fn path(&self, id: ViewId) -> Vec<usize> {
        let mut path: Vec<usize> = std::iter::once(id)
            .chain(self.ancestors(id))
            .filter_map(|v| self.find(v))
            .collect();
        path.reverse();
        path
    }

    /// Detach `child` from its parent, keeping it alive in the arena.
    pub fn detach(&mut self, child: ViewId) -> Result<()> {
        let (Some(parent), Some(offset)) = (self.parent(child), self.find(child)) else {
            return Ok(());
        };
        self.cut(parent, offset, offset + 1)?;
        Ok(())
    }

    /// Move `child` to `offset` in `fragment`.
    pub fn move_view(&mut self, child: ViewId, fragment: ViewId, offset: usize) -> Result<()> {
        self.detach(child)?;
        self.insert(fragment, offset, Content::View(child))
    }

    /// Deep copy of a subtree under fresh ids, detached from any parent.
    ///
    /// Used when splitting content across a boundary: both halves start from
    /// identical formatting and are adjusted independently.
    pub fn clone_subtree(&mut self, id: ViewId) -> Result<ViewId> {
        let node = self.node(id)?.clone();
        match node.kind {
            ViewKind::Single(single) => Ok(self.push(ViewKind::Single(single))),
            ViewKind::Fragment(fragment) => {
                let copy = self.push(ViewKind::Fragment(Fragment {
                    contents: Vec::new(),
                    matrix: fragment.matrix,
                }));
                for content in fragment.contents {
                    let content = match content {
                        Content::View(child) => Content::View(self.clone_subtree(child)?),
                        text => text,
                    };
                    self.append(copy, content)?;
                }
                Ok(copy)
            }
        }
    }

    /// Merge a range into a node's matrix.
    pub fn apply(
        &mut self,
        id: ViewId,
        formatter: &FormatterRef,
        range: FormatRange,
        important: bool,
    ) -> Result<()> {
        self.matrix_mut(id)?.merge_format(formatter, range, important);
        Ok(())
    }

    /// All fragments in document order, starting at `from`.
    pub fn fragments(&self, from: ViewId) -> Vec<ViewId> {
        let mut out = Vec::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            let Ok(frag) = self.fragment(id) else {
                continue;
            };
            out.push(id);
            let children: Vec<ViewId> = frag.child_views().collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }
}
