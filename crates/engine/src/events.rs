//! Change notifications for external observers.
//!
//! A rendering or persistence collaborator subscribes a callback on the
//! grid and receives an event per observable cell change. Dependency
//! propagation between cells does NOT go through this surface; it is
//! driven by the grid's dependency graph. These events exist purely for
//! collaborators outside the engine.

use std::cell::RefCell;
use std::rc::Rc;

use crate::cell_id::CellId;

/// Events emitted by the grid when a cell changes observably.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellEvent {
    /// The cell's computed value changed (literal edit or recomputation).
    ValueChanged(CellId),
    /// The cell's background color changed. Never triggers recomputation.
    ColorChanged(CellId),
}

impl CellEvent {
    pub fn cell(&self) -> CellId {
        match self {
            CellEvent::ValueChanged(id) | CellEvent::ColorChanged(id) => *id,
        }
    }
}

/// Callback type for receiving cell events.
pub type EventCallback = Box<dyn FnMut(CellEvent)>;

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberId(u64);

/// Registry of observer callbacks.
///
/// Emission is synchronous and in subscription order.
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    callbacks: Vec<(SubscriberId, EventCallback)>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, callback: EventCallback) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, callback));
        id
    }

    /// Remove a subscriber. Returns false if the id was already gone.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(sid, _)| *sid != id);
        self.callbacks.len() != before
    }

    pub fn emit(&mut self, event: CellEvent) {
        for (_, callback) in &mut self.callbacks {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.callbacks.len())
            .finish()
    }
}

/// Simple event collector for testing.
///
/// Clones share the same buffer, so a clone can be moved into a
/// subscription callback while the original is used for assertions.
#[derive(Default, Clone)]
pub struct EventCollector {
    events: Rc<RefCell<Vec<CellEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that records every event into this collector.
    pub fn callback(&self) -> EventCallback {
        let events = Rc::clone(&self.events);
        Box::new(move |event| events.borrow_mut().push(event))
    }

    pub fn events(&self) -> Vec<CellEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Cells that had value changes, in emission order.
    pub fn value_changes(&self) -> Vec<CellId> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                CellEvent::ValueChanged(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Cells that had color changes, in emission order.
    pub fn color_changes(&self) -> Vec<CellId> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                CellEvent::ColorChanged(id) => Some(*id),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_and_emit() {
        let mut subs = Subscribers::new();
        let collector = EventCollector::new();
        subs.subscribe(collector.callback());

        let a1 = CellId::new(0, 0);
        subs.emit(CellEvent::ValueChanged(a1));
        subs.emit(CellEvent::ColorChanged(a1));

        assert_eq!(collector.len(), 2);
        assert_eq!(collector.value_changes(), vec![a1]);
        assert_eq!(collector.color_changes(), vec![a1]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut subs = Subscribers::new();
        let collector = EventCollector::new();
        let id = subs.subscribe(collector.callback());

        assert!(subs.unsubscribe(id));
        assert!(!subs.unsubscribe(id)); // second call finds nothing

        subs.emit(CellEvent::ValueChanged(CellId::new(0, 0)));
        assert!(collector.is_empty());
    }

    #[test]
    fn test_multiple_subscribers_each_receive() {
        let mut subs = Subscribers::new();
        let first = EventCollector::new();
        let second = EventCollector::new();
        subs.subscribe(first.callback());
        subs.subscribe(second.callback());
        assert_eq!(subs.len(), 2);

        subs.emit(CellEvent::ValueChanged(CellId::new(1, 1)));
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_event_cell_accessor() {
        let b2 = CellId::new(1, 1);
        assert_eq!(CellEvent::ValueChanged(b2).cell(), b2);
        assert_eq!(CellEvent::ColorChanged(b2).cell(), b2);
    }
}
