//! Event queue, listener registry and debouncing.
//!
//! Host events (selection changes, focus, input) are pushed onto an
//! [`EventQueue`] and processed in FIFO order on the editor's turn. Listeners
//! registered with a [`ListenerRegistry`] see each event as it is processed.
//! Selection churn reaches the toolbar through a [`Debouncer`] so a burst of
//! changes causes one status update.

use std::collections::VecDeque;
use std::time::Duration;

use smol_str::SmolStr;
use web_time::Instant;

/// Something that happened in the host document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    SelectionChange,
    /// Text typed at the selection. `None` for input carrying no text.
    Input { data: Option<String> },
    /// Delete key: the selection, or one unit beside the caret.
    Delete { forward: bool },
    Focus,
    Blur,
    CompositionStart,
    CompositionEnd { data: String },
    VisibilityChange { visible: bool },
    /// A command ran; carries the commander name.
    Command { name: SmolStr },
}

/// Discriminant of [`EditorEvent`], used to subscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SelectionChange,
    Input,
    Delete,
    Focus,
    Blur,
    CompositionStart,
    CompositionEnd,
    VisibilityChange,
    Command,
}

impl EditorEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EditorEvent::SelectionChange => EventKind::SelectionChange,
            EditorEvent::Input { .. } => EventKind::Input,
            EditorEvent::Delete { .. } => EventKind::Delete,
            EditorEvent::Focus => EventKind::Focus,
            EditorEvent::Blur => EventKind::Blur,
            EditorEvent::CompositionStart => EventKind::CompositionStart,
            EditorEvent::CompositionEnd { .. } => EventKind::CompositionEnd,
            EditorEvent::VisibilityChange { .. } => EventKind::VisibilityChange,
            EditorEvent::Command { .. } => EventKind::Command,
        }
    }
}

/// FIFO task queue of pending events.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<EditorEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: EditorEvent) {
        tracing::trace!(target: "textbus::events", ?event, "queued");
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<EditorEvent> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take everything queued so far. Events pushed while the batch is being
    /// handled wait for the next drain.
    pub fn drain(&mut self) -> Vec<EditorEvent> {
        self.events.drain(..).collect()
    }
}

/// Handle returned by [`ListenerRegistry::on`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&EditorEvent)>;

/// Callbacks subscribed to event kinds.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: u64,
    listeners: Vec<(ListenerId, EventKind, Listener)>,
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&EditorEvent) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, kind, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(l, _, _)| *l != id);
        self.listeners.len() != before
    }

    /// Call every listener for the event's kind, in registration order.
    /// Returns how many ran.
    pub fn dispatch(&mut self, event: &EditorEvent) -> usize {
        let kind = event.kind();
        let mut count = 0;
        for (_, _, listener) in self.listeners.iter_mut().filter(|(_, k, _)| *k == kind) {
            listener(event);
            count += 1;
        }
        count
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

/// Trailing-edge debounce: every trigger pushes the deadline back, and the
/// debouncer fires once when polled after the deadline.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether the debounced action should run now. Fires at most once per
    /// burst of triggers.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = EventQueue::new();
        queue.push(EditorEvent::Focus);
        queue.push(EditorEvent::SelectionChange);
        queue.push(EditorEvent::Blur);
        assert_eq!(queue.pop(), Some(EditorEvent::Focus));
        assert_eq!(
            queue.drain(),
            vec![EditorEvent::SelectionChange, EditorEvent::Blur]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_listeners_by_kind() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ListenerRegistry::new();

        let log = seen.clone();
        let input = registry.on(EventKind::Input, move |e| {
            if let EditorEvent::Input { data } = e {
                log.borrow_mut().push(data.clone().unwrap_or_default());
            }
        });
        let log = seen.clone();
        registry.on(EventKind::Input, move |_| log.borrow_mut().push("second".into()));

        let ran = registry.dispatch(&EditorEvent::Input {
            data: Some("a".into()),
        });
        assert_eq!(ran, 2);
        assert_eq!(registry.dispatch(&EditorEvent::Focus), 0);
        assert_eq!(*seen.borrow(), vec!["a".to_string(), "second".to_string()]);

        assert!(registry.off(input));
        assert!(!registry.off(input));
        assert_eq!(registry.dispatch(&EditorEvent::Input { data: None }), 1);
    }

    #[test]
    fn test_debounce_coalesces_burst() {
        let start = Instant::now();
        let ms = Duration::from_millis;
        let mut debounce = Debouncer::new(ms(10));

        assert!(!debounce.poll(start));
        debounce.trigger(start);
        debounce.trigger(start + ms(4));
        debounce.trigger(start + ms(8));
        assert!(!debounce.poll(start + ms(12)));
        assert!(debounce.poll(start + ms(18)));
        assert!(!debounce.poll(start + ms(30)));

        debounce.trigger(start + ms(40));
        debounce.cancel();
        assert!(!debounce.is_pending());
        assert!(!debounce.poll(start + ms(100)));
    }
}
