//! An [`Editor`] mounted into a live element.

use textbus_core::{CaretStyle, Editor, EditorError, EditorEvent, PlatformError};
use web_time::Instant;

use crate::cursor::BrowserCursor;
use crate::events::EventBridge;
use crate::mirror::DomMirror;
use crate::selection::BrowserSelection;

/// Owns the editor, the mirror of its render and the DOM listeners.
///
/// The host is editable so it takes focus, selection and IME input, but its
/// content only ever changes through [`commit`](Self::commit). Typing and
/// deleting inside a block are applied by the editor; other edits the
/// browser proposes (paste, line breaks) are cancelled.
pub struct BrowserEditor {
    editor: Editor,
    mirror: DomMirror,
    events: EventBridge,
    composing: bool,
}

impl BrowserEditor {
    /// Make `host` editable and render `editor` into it.
    pub fn mount(host: web_sys::HtmlElement, editor: Editor) -> Result<Self, EditorError> {
        host.set_attribute("contenteditable", "true")
            .map_err(|e| PlatformError::from(format!("set_attribute failed: {:?}", e)))?;
        let events = EventBridge::attach(&host)?;
        let mut mirror = DomMirror::new(host.into());
        mirror.sync(editor.output())?;
        tracing::info!(target: "textbus::render", "editor mounted");
        Ok(Self {
            editor,
            mirror,
            events,
            composing: false,
        })
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn mirror(&self) -> &DomMirror {
        &self.mirror
    }

    /// Read the page selection into the editor.
    pub fn read_selection(&mut self) -> Result<usize, EditorError> {
        self.editor.read_selection(&BrowserSelection::new(&self.mirror))
    }

    /// Hand DOM events to the editor and process them. Selection changes
    /// re-read the page selection, once per batch. A render caused by the
    /// events is committed to the page.
    pub fn pump(&mut self, now: Instant) -> Result<usize, EditorError> {
        let revision = self.editor.revision();
        let mut selection_read = false;
        for event in self.events.take() {
            match event {
                EditorEvent::SelectionChange => {
                    // The composing text is not in the mirror yet, so its
                    // offsets would not map. Reading the selection queues its
                    // own change event.
                    if !selection_read && !self.composing {
                        self.read_selection()?;
                        selection_read = true;
                    }
                    continue;
                }
                EditorEvent::CompositionStart => self.composing = true,
                EditorEvent::CompositionEnd { .. } => self.composing = false,
                _ => {}
            }
            self.editor.dispatch(event);
        }
        let handled = self.editor.process_events(now);
        if self.editor.revision() != revision {
            self.commit()?;
        }
        self.editor.poll_toolbar(now);
        self.editor.tick_caret(now);
        Ok(handled)
    }

    /// Run a toolbar handler, then write the new render and selection back
    /// into the page.
    pub fn exec(&mut self, handler: &str) -> Result<(), EditorError> {
        self.read_selection()?;
        self.editor.exec(handler)?;
        self.commit()
    }

    /// Mirror the current render and restore the selection into it.
    pub fn commit(&mut self) -> Result<(), EditorError> {
        self.mirror.sync(self.editor.output())?;
        self.editor.restore_selection(&BrowserSelection::new(&self.mirror))
    }

    /// Where to draw the caret, relative to the host element.
    pub fn caret(&self) -> Result<Option<CaretStyle>, EditorError> {
        self.editor.caret(&BrowserCursor::new(&self.mirror))
    }

    /// Mutable access for running commanders directly. Call
    /// [`commit`](Self::commit) afterwards.
    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }
}
