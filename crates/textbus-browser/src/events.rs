//! Browser event wiring.
//!
//! DOM listeners run outside the editor's turn, so they only record
//! [`EditorEvent`]s. The owner takes them with [`EventBridge::take`] and
//! hands them to the editor on its own turn.
//!
//! `beforeinput` is cancelled so the browser never edits the host itself;
//! the editor applies the edit and the mirror re-renders it. Composition
//! updates cannot be cancelled, so their text arrives with `compositionend`.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions};
use textbus_core::{EditorEvent, PlatformError};
use wasm_bindgen::JsCast;

type Pending = Rc<RefCell<Vec<EditorEvent>>>;

/// DOM listeners feeding a pending-event buffer. Dropping the bridge
/// removes the listeners.
pub struct EventBridge {
    pending: Pending,
    _listeners: Vec<EventListener>,
}

fn record(
    pending: &Pending,
    target: &web_sys::EventTarget,
    event_type: &'static str,
    to_event: impl Fn(&web_sys::Event) -> EditorEvent + 'static,
) -> EventListener {
    let pending = pending.clone();
    EventListener::new(target, event_type, move |event| {
        let event = to_event(event);
        tracing::trace!(target: "textbus::events", ?event, "dom event");
        pending.borrow_mut().push(event);
    })
}

/// Cancel edits the browser would make and record the ones the editor
/// applies.
fn record_input(pending: &Pending, host: &web_sys::HtmlElement) -> EventListener {
    let pending = pending.clone();
    let options = EventListenerOptions::enable_prevent_default();
    EventListener::new_with_options(host, "beforeinput", options, move |event| {
        let Some(input) = event.dyn_ref::<web_sys::InputEvent>() else {
            return;
        };
        let input_type = input.input_type();
        let recorded = match input_type.as_str() {
            "insertCompositionText" => return,
            "insertText" | "insertReplacementText" => {
                Some(EditorEvent::Input { data: input.data() })
            }
            "deleteContentBackward" => Some(EditorEvent::Delete { forward: false }),
            "deleteContentForward" => Some(EditorEvent::Delete { forward: true }),
            _ => None,
        };
        event.prevent_default();
        match recorded {
            Some(recorded) => {
                tracing::trace!(target: "textbus::events", event = ?recorded, "dom input");
                pending.borrow_mut().push(recorded);
            }
            None => tracing::debug!(
                target: "textbus::events",
                %input_type,
                "unsupported input cancelled"
            ),
        }
    })
}

impl EventBridge {
    /// Listen on `host` and its document.
    pub fn attach(host: &web_sys::HtmlElement) -> Result<Self, PlatformError> {
        let document = host.owner_document().ok_or("host has no document")?;
        let pending: Pending = Rc::default();

        let visibility_doc = document.clone();
        let listeners = vec![
            record(&pending, &document, "selectionchange", |_| {
                EditorEvent::SelectionChange
            }),
            record(&pending, &document, "visibilitychange", move |_| {
                EditorEvent::VisibilityChange {
                    visible: !visibility_doc.hidden(),
                }
            }),
            record(&pending, host, "focus", |_| EditorEvent::Focus),
            record(&pending, host, "blur", |_| EditorEvent::Blur),
            record_input(&pending, host),
            record(&pending, host, "compositionstart", |_| {
                EditorEvent::CompositionStart
            }),
            record(&pending, host, "compositionend", |event| {
                EditorEvent::CompositionEnd {
                    data: event
                        .dyn_ref::<web_sys::CompositionEvent>()
                        .and_then(|e| e.data())
                        .unwrap_or_default(),
                }
            }),
        ];

        Ok(Self {
            pending,
            _listeners: listeners,
        })
    }

    /// Take pending events in arrival order.
    pub fn take(&self) -> Vec<EditorEvent> {
        self.pending.borrow_mut().drain(..).collect()
    }
}
