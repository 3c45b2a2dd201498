//! Change notifications
//!
//! Listeners subscribe to a [`Grid`] and receive one [`CellChange`] per committed change.
//! Delivery is synchronous: every change raised by a call is delivered before that call
//! returns. Listeners get mutable access to the grid; changes they cause are queued and
//! delivered once the change being dispatched has reached every listener.

use crate::cell::CellAddress;
use crate::grid::Grid;
use std::collections::VecDeque;
use std::fmt;

/// Which part of a cell changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellField {
    /// The entered text (and with it the value) was written
    Text,
    /// The value was recalculated after a referenced cell changed
    Value,
    /// The color was written
    Color,
}

impl fmt::Display for CellField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CellField::Text => "Text",
            CellField::Value => "Value",
            CellField::Color => "Color",
        })
    }
}

/// A committed change to one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellChange {
    pub address: CellAddress,
    pub field: CellField,
}

/// Handle returned by [`Grid::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub(crate) type Listener = Box<dyn FnMut(&mut Grid, &CellChange)>;

/// Listener registry plus the queue of undelivered changes
#[derive(Default)]
pub(crate) struct Notifier {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
    pending: VecDeque<CellChange>,
    dispatching: bool,
    /// Listeners currently lent out to a dispatch
    checked_out: Vec<SubscriptionId>,
    /// Checked-out listeners unsubscribed during the dispatch
    removed: Vec<SubscriptionId>,
}

impl Notifier {
    pub(crate) fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        if self.listeners.len() != before {
            return true;
        }
        if self.checked_out.contains(&id) && !self.removed.contains(&id) {
            self.removed.push(id);
            return true;
        }
        false
    }

    pub(crate) fn queue(&mut self, change: CellChange) {
        self.pending.push_back(change);
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }

    fn is_removed(&self, id: SubscriptionId) -> bool {
        self.removed.contains(&id)
    }

    fn check_out(&mut self) -> Vec<(SubscriptionId, Listener)> {
        let listeners = std::mem::take(&mut self.listeners);
        self.checked_out = listeners.iter().map(|(id, _)| *id).collect();
        listeners
    }

    /// Put the dispatched listeners back ahead of any subscribed meanwhile
    fn check_in(&mut self, mut listeners: Vec<(SubscriptionId, Listener)>) {
        self.checked_out.clear();
        let removed = std::mem::take(&mut self.removed);
        listeners.retain(|(id, _)| !removed.contains(id));
        listeners.append(&mut self.listeners);
        self.listeners = listeners;
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.len())
            .field("pending", &self.pending)
            .field("dispatching", &self.dispatching)
            .finish()
    }
}

/// Deliver every queued change to every listener
///
/// Does nothing when called from inside a listener; the outer dispatch picks up whatever
/// the listener queued.
pub(crate) fn dispatch(grid: &mut Grid) {
    if grid.notifier.dispatching {
        return;
    }
    grid.notifier.dispatching = true;

    while let Some(change) = grid.notifier.pending.pop_front() {
        let mut listeners = grid.notifier.check_out();
        for (id, listener) in listeners.iter_mut() {
            if grid.notifier.is_removed(*id) {
                continue;
            }
            listener(grid, &change);
        }
        grid.notifier.check_in(listeners);
    }

    grid.notifier.dispatching = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<CellChange>>>, Listener) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (
            seen,
            Box::new(move |_: &mut Grid, change: &CellChange| sink.borrow_mut().push(*change)),
        )
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let mut notifier = Notifier::default();
        let (_, listener) = recorder();
        let id = notifier.subscribe(listener);
        assert_eq!(notifier.len(), 1);
        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        assert_eq!(notifier.len(), 0);
    }

    #[test]
    fn test_dispatch_drains_queue_in_order() {
        let mut grid = Grid::new(2, 2).unwrap();
        let (seen, listener) = recorder();
        grid.notifier.subscribe(listener);

        let a1 = CellChange {
            address: CellAddress::new(0, 0),
            field: CellField::Text,
        };
        let b1 = CellChange {
            address: CellAddress::new(0, 1),
            field: CellField::Color,
        };
        grid.notifier.queue(a1);
        grid.notifier.queue(b1);
        dispatch(&mut grid);

        assert_eq!(*seen.borrow(), vec![a1, b1]);
        assert!(grid.notifier.pending.is_empty());
        assert!(!grid.notifier.dispatching);
    }

    #[test]
    fn test_field_display() {
        assert_eq!(CellField::Text.to_string(), "Text");
        assert_eq!(CellField::Value.to_string(), "Value");
        assert_eq!(CellField::Color.to_string(), "Color");
    }
}
