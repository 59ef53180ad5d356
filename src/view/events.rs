//! Caret and modification events
//!
//! The core consumes caret moves (through `Session::caret_moved`) and emits
//! modification and window events to whoever subscribed, typically the UI.

use std::ops::Range;

use crate::dom::NodeId;
use crate::map::View;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    CaretMoved { view: View, offset: usize },
    /// An edit changed these nodes
    Modified { nodes: Vec<NodeId> },
    /// The loaded section range changed
    WindowChanged { sections: Range<usize> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(usize);

type Listener = Box<dyn FnMut(&ViewEvent) + Send>;

#[derive(Default)]
pub struct EventBus {
    next_id: usize,
    listeners: Vec<(SubscriberId, Listener)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ViewEvent) + Send + 'static) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Deliver to every listener in subscription order
    pub fn emit(&mut self, event: &ViewEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_subscribe_emit_unsubscribe() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        let sink = Arc::clone(&seen);
        let id = bus.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        bus.emit(&ViewEvent::Modified { nodes: vec![3] });
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&ViewEvent::WindowChanged { sections: 0..2 });

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![ViewEvent::Modified { nodes: vec![3] }]);
        assert!(bus.is_empty());
    }
}
