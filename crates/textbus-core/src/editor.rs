//! The editor facade.
//!
//! [`Editor`] owns one document: the view tree, the DOM rendered from it,
//! the current selection and the undo history. Hosts feed it native
//! selections and events; toolbar handlers query it and run commands
//! through it. Every command re-renders the whole document, typing
//! included, so hosts must not let their own DOM diverge from the render.

use web_time::Instant;

use crate::commands::{CommandContext, Commander, DeleteCommander, InsertTextCommander};
use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::events::{
    Debouncer, EditorEvent, EventKind, EventQueue, ListenerId, ListenerRegistry,
};
use crate::formatters::FormatterRegistry;
use crate::history::{History, Snapshot, UndoManager};
use crate::html::parse_html;
use crate::platform::{CursorPlatform, SelectionSource};
use crate::selection::{
    CaretBlink, CaretStyle, NativeRange, SelectionBridge, TbRange, TbSelection, place_caret,
};
use crate::toolbar::{EditorContext, Handler, MatchDelta, Matcher, query_ranges};
use crate::view::ViewTree;
use crate::view::parse::parse_view_tree;
use crate::view::render::{RenderOutput, render_tree};

pub struct Editor {
    config: EditorConfig,
    registry: FormatterRegistry,
    tree: ViewTree,
    output: RenderOutput,
    selection: TbSelection,
    history: History,
    handlers: Vec<Box<dyn Handler>>,
    queue: EventQueue,
    listeners: ListenerRegistry,
    debounce: Debouncer,
    blink: CaretBlink,
    composing: bool,
    revision: u64,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("views", &self.tree.len())
            .field("selection", &self.selection)
            .field("handlers", &self.handlers.len())
            .field("pending_events", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl Editor {
    /// An empty document with the formatters named in `config`.
    pub fn new(config: EditorConfig) -> Result<Self> {
        let registry = FormatterRegistry::from_config(&config)?;
        Ok(Self::with_parts(config, registry, ViewTree::new()))
    }

    /// Parse `html` into a document.
    pub fn from_html(html: &str, config: EditorConfig) -> Result<Self> {
        let registry = FormatterRegistry::from_config(&config)?;
        let (dom, root) = parse_html(html);
        let tree = parse_view_tree(&dom, root, &registry);
        Ok(Self::with_parts(config, registry, tree))
    }

    /// Use a caller-built registry, for custom formatters.
    pub fn with_registry(config: EditorConfig, registry: FormatterRegistry) -> Self {
        Self::with_parts(config, registry, ViewTree::new())
    }

    fn with_parts(config: EditorConfig, registry: FormatterRegistry, tree: ViewTree) -> Self {
        let output = render_tree(&tree, config.empty_block_placeholder);
        Self {
            history: History::new(config.history_limit),
            debounce: Debouncer::new(config.selection_debounce()),
            blink: CaretBlink::new(config.caret_blink()),
            config,
            registry,
            tree,
            output,
            selection: TbSelection::new(),
            handlers: Vec::new(),
            queue: EventQueue::new(),
            listeners: ListenerRegistry::new(),
            composing: false,
            revision: 0,
        }
    }

    /// Replace the whole document. Selection and history are reset.
    pub fn set_contents(&mut self, html: &str) {
        let (dom, root) = parse_html(html);
        self.tree = parse_view_tree(&dom, root, &self.registry);
        self.selection.clear();
        self.history.clear();
        self.render();
    }

    /// Serialized HTML of the current render.
    pub fn contents(&self) -> String {
        self.output.html()
    }

    /// Rebuild the DOM from the view tree.
    pub fn render(&mut self) {
        self.output = render_tree(&self.tree, self.config.empty_block_placeholder);
        self.revision += 1;
        tracing::debug!(
            target: "textbus::render",
            nodes = self.output.dom.len(),
            revision = self.revision,
            "rendered"
        );
    }

    /// Bumped on every render. Hosts compare it to know when to re-mirror.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn registry(&self) -> &FormatterRegistry {
        &self.registry
    }

    pub fn tree(&self) -> &ViewTree {
        &self.tree
    }

    pub fn output(&self) -> &RenderOutput {
        &self.output
    }

    pub fn selection(&self) -> &TbSelection {
        &self.selection
    }

    /// Position mapping for the current render.
    pub fn bridge(&self) -> SelectionBridge<'_> {
        SelectionBridge::new(&self.tree, &self.output)
    }

    /// Take the host's selection. Ranges outside the rendered document are
    /// skipped. Returns how many ranges were mapped.
    pub fn select_native(&mut self, ranges: &[NativeRange]) -> usize {
        if ranges.is_empty() {
            self.selection.clear();
            self.blink.hide();
            return 0;
        }
        let bridge = SelectionBridge::new(&self.tree, &self.output);
        let mut mapped = Vec::with_capacity(ranges.len());
        for raw in ranges {
            match bridge.range_to_abstract(raw) {
                Some(range) => mapped.push(range),
                None => {
                    tracing::warn!(target: "textbus::selection", ?raw, "range outside the editor")
                }
            }
        }
        let count = mapped.len();
        self.selection.update(mapped);
        self.queue.push(EditorEvent::SelectionChange);
        count
    }

    /// Set abstract ranges directly.
    pub fn select(&mut self, ranges: Vec<TbRange>) {
        let ranges = ranges
            .into_iter()
            .map(|r| r.normalized(&self.tree))
            .collect();
        self.selection.update(ranges);
        self.queue.push(EditorEvent::SelectionChange);
    }

    /// The current ranges mapped onto the current render.
    pub fn native_selection(&self) -> Vec<NativeRange> {
        let bridge = self.bridge();
        self.selection
            .ranges()
            .iter()
            .filter_map(|r| bridge.range_to_native(r))
            .collect()
    }

    /// Read the host selection before a command runs.
    pub fn read_selection(&mut self, source: &dyn SelectionSource) -> Result<usize> {
        let ranges = source.native_ranges()?;
        Ok(self.select_native(&ranges))
    }

    /// Put the selection back into the host after a render. Ends the
    /// current interaction.
    pub fn restore_selection(&mut self, source: &dyn SelectionSource) -> Result<()> {
        let ranges = self.native_selection();
        source.apply_ranges(&ranges)?;
        self.selection.finish();
        Ok(())
    }

    pub fn add_handler(&mut self, handler: impl Handler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    pub fn handler(&self, name: &str) -> Option<&dyn Handler> {
        self.handlers
            .iter()
            .find(|h| h.name() == name)
            .map(|h| h.as_ref())
    }

    /// Reduced match state of the current selection. `None` without ranges.
    pub fn query(&self, matcher: &dyn Matcher) -> Option<MatchDelta> {
        let ctx = EditorContext {
            tree: &self.tree,
            registry: &self.registry,
        };
        query_ranges(matcher, &ctx, self.selection.ranges())
    }

    /// Run a commander against the current selection and re-render.
    pub fn exec_commander(&mut self, commander: &dyn Commander, overlap: bool) -> Result<()> {
        run_commander(
            &mut self.tree,
            &mut self.selection,
            &self.registry,
            &mut self.history,
            commander,
            overlap,
        )?;
        self.after_command(commander.name());
        Ok(())
    }

    /// Run a toolbar handler: query its matcher, then run its commander
    /// with the selection's mixed state as `overlap`.
    pub fn exec(&mut self, name: &str) -> Result<()> {
        let handler = self
            .handlers
            .iter()
            .find(|h| h.name() == name)
            .ok_or_else(|| EditorError::UnknownHandler(name.to_string()))?;
        let ctx = EditorContext {
            tree: &self.tree,
            registry: &self.registry,
        };
        let overlap = query_ranges(handler.matcher(), &ctx, self.selection.ranges())
            .is_some_and(|d| d.is_mixed());

        let commander = handler.commander();
        run_commander(
            &mut self.tree,
            &mut self.selection,
            &self.registry,
            &mut self.history,
            commander,
            overlap,
        )?;
        let command = commander.name().to_string();
        self.after_command(&command);
        Ok(())
    }

    /// Type `text` at the selection.
    pub fn insert_text(&mut self, text: &str) -> Result<()> {
        self.exec_commander(&InsertTextCommander::new(text), false)
    }

    /// Delete the selection, or one unit before (or after) the caret.
    pub fn delete(&mut self, forward: bool) -> Result<()> {
        let commander = if forward {
            DeleteCommander::forward()
        } else {
            DeleteCommander::backward()
        };
        self.exec_commander(&commander, false)
    }

    /// Whether an IME composition is in progress.
    pub fn is_composing(&self) -> bool {
        self.composing
    }

    fn after_command(&mut self, name: &str) {
        self.selection.mark_applied();
        self.render();
        self.queue.push(EditorEvent::Command { name: name.into() });
        self.update_toolbar();
    }

    /// Recompute every handler's status from the current selection.
    pub fn update_toolbar(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        let ctx = EditorContext {
            tree: &self.tree,
            registry: &self.registry,
        };
        for handler in &mut self.handlers {
            if let Some(delta) = query_ranges(handler.matcher(), &ctx, self.selection.ranges()) {
                handler.update_status(&delta);
            }
        }
        tracing::trace!(target: "textbus::selection", handlers = self.handlers.len(), "toolbar updated");
    }

    /// Queue a host event for the next [`process_events`](Self::process_events).
    pub fn dispatch(&mut self, event: EditorEvent) {
        self.queue.push(event);
    }

    pub fn on(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&EditorEvent) + 'static,
    ) -> ListenerId {
        self.listeners.on(kind, listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.off(id)
    }

    /// Handle queued events in order. Returns how many were handled.
    ///
    /// Text events edit the document. During a composition only its final
    /// text is inserted, when it ends.
    pub fn process_events(&mut self, now: Instant) -> usize {
        let events = self.queue.drain();
        for event in &events {
            self.listeners.dispatch(event);
            if let Err(err) = self.handle_event(event, now) {
                tracing::warn!(target: "textbus::events", ?event, %err, "event not applied");
            }
        }
        events.len()
    }

    fn handle_event(&mut self, event: &EditorEvent, now: Instant) -> Result<()> {
        match event {
            EditorEvent::SelectionChange => self.debounce.trigger(now),
            EditorEvent::Focus => self.blink.show(now),
            EditorEvent::Blur => self.blink.hide(),
            EditorEvent::VisibilityChange { visible } => {
                self.blink.on_visibility_change(*visible, now)
            }
            EditorEvent::CompositionStart => self.composing = true,
            EditorEvent::CompositionEnd { data } => {
                self.composing = false;
                if !data.is_empty() {
                    self.insert_text(data)?;
                }
            }
            EditorEvent::Input { data: Some(data) } if !self.composing => self.insert_text(data)?,
            EditorEvent::Delete { forward } if !self.composing => self.delete(*forward)?,
            EditorEvent::Input { .. }
            | EditorEvent::Delete { .. }
            | EditorEvent::Command { .. } => {}
        }
        Ok(())
    }

    /// Update the toolbar once selection changes have settled. Returns
    /// whether an update ran.
    pub fn poll_toolbar(&mut self, now: Instant) -> bool {
        if self.debounce.poll(now) {
            self.update_toolbar();
            true
        } else {
            false
        }
    }

    /// Where to draw the caret for a collapsed selection.
    pub fn caret(&self, platform: &dyn CursorPlatform) -> Result<Option<CaretStyle>> {
        let Some(range) = self.selection.first() else {
            return Ok(None);
        };
        if !self.selection.is_collapsed() {
            return Ok(None);
        }
        let Some(pos) = self.bridge().to_native(range.start) else {
            tracing::warn!(target: "textbus::selection", ?range, "caret has no native position");
            return Ok(None);
        };
        let Some(rect) = platform.caret_rect(&pos)? else {
            return Ok(None);
        };
        let metrics = platform.font_metrics(&pos)?;
        Ok(Some(place_caret(rect, &metrics)))
    }

    pub fn caret_visible(&self) -> bool {
        self.blink.is_visible()
    }

    /// Advance the caret blink. Returns whether the caret is visible.
    pub fn tick_caret(&mut self, now: Instant) -> bool {
        self.blink.tick(now)
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.tree = snapshot.tree;
        self.selection.update(snapshot.ranges);
        self.render();
        self.queue.push(EditorEvent::SelectionChange);
    }
}

/// Run `commander` and record history. A failing command leaves the tree
/// and selection as they were.
fn run_commander(
    tree: &mut ViewTree,
    selection: &mut TbSelection,
    registry: &FormatterRegistry,
    history: &mut History,
    commander: &dyn Commander,
    overlap: bool,
) -> Result<()> {
    let before = Snapshot::new(tree, selection.ranges());
    let mut ctx = CommandContext {
        tree: &mut *tree,
        selection: &mut *selection,
        registry,
    };
    if let Err(err) = commander.command(&mut ctx, overlap) {
        tracing::warn!(target: "textbus::command", command = commander.name(), %err, "command failed");
        *tree = before.tree;
        selection.update(before.ranges);
        return Err(err);
    }
    tracing::debug!(target: "textbus::command", command = commander.name(), overlap, "command applied");
    if commander.record_history() {
        history.record(before);
    }
    Ok(())
}

impl UndoManager for Editor {
    fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn undo(&mut self) -> bool {
        if !self.history.can_undo() {
            return false;
        }
        let current = Snapshot::new(&self.tree, self.selection.ranges());
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    fn redo(&mut self) -> bool {
        if !self.history.can_redo() {
            return false;
        }
        let current = Snapshot::new(&self.tree, self.selection.ranges());
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests;
