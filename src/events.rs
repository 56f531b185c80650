// Observer interface for cross-component notifications.
// Single-threaded: publishers and subscribers live on the UI thread.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Listener<E> = Box<dyn FnMut(&E)>;

struct Registry<E> {
    next_id: u64,
    listeners: Vec<(u64, Listener<E>)>,
    /// Set while `emit` has the listeners checked out.
    emitting: bool,
    /// Unsubscribed during an emit; dropped once the emit finishes.
    removed: Vec<u64>,
}

/// Fire-and-forget broadcaster. Subscribers receive a read-only view of each event.
pub struct Publisher<E> {
    registry: Rc<RefCell<Registry<E>>>,
}

/// Handle returned by [`Publisher::subscribe`]. Dropping it does not unsubscribe;
/// call [`Subscription::unsubscribe`].
pub struct Subscription<E> {
    id: u64,
    registry: Weak<RefCell<Registry<E>>>,
}

impl<E> Publisher<E> {
    pub fn new() -> Self {
        Publisher {
            registry: Rc::new(RefCell::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
                emitting: false,
                removed: Vec::new(),
            })),
        }
    }

    pub fn subscribe(&self, listener: impl FnMut(&E) + 'static) -> Subscription<E> {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Box::new(listener)));
        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }

    /// Deliver `event` to every subscriber in subscription order.
    ///
    /// Listeners may subscribe or unsubscribe while being called; new
    /// subscribers start with the next event.
    pub fn emit(&self, event: &E) {
        let mut listeners = {
            let mut registry = self.registry.borrow_mut();
            if registry.emitting {
                tracing::debug!("Dropped event emitted from inside a listener");
                return;
            }
            registry.emitting = true;
            std::mem::take(&mut registry.listeners)
        };

        for (id, listener) in listeners.iter_mut() {
            if self.registry.borrow().removed.contains(id) {
                continue;
            }
            listener(event);
        }

        let mut registry = self.registry.borrow_mut();
        let added = std::mem::take(&mut registry.listeners);
        listeners.extend(added);
        let removed = std::mem::take(&mut registry.removed);
        listeners.retain(|(id, _)| !removed.contains(id));
        registry.listeners = listeners;
        registry.emitting = false;
    }
}

impl<E> Default for Publisher<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Subscription<E> {
    /// Stop receiving events. Returns false if the publisher is gone or the
    /// subscription was already removed.
    pub fn unsubscribe(self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut registry = registry.borrow_mut();
        if registry.emitting {
            if registry.removed.contains(&self.id) {
                return false;
            }
            registry.removed.push(self.id);
            return true;
        }
        let before = registry.listeners.len();
        registry.listeners.retain(|(id, _)| *id != self.id);
        registry.listeners.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_in_subscription_order() {
        let publisher = Publisher::<u32>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let a = Rc::clone(&seen);
        let _sa = publisher.subscribe(move |e| a.borrow_mut().push(("a", *e)));
        let b = Rc::clone(&seen);
        let _sb = publisher.subscribe(move |e| b.borrow_mut().push(("b", *e)));

        publisher.emit(&7);
        assert_eq!(*seen.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let publisher = Publisher::<u32>::new();
        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        let sub = publisher.subscribe(move |_| *c.borrow_mut() += 1);

        publisher.emit(&1);
        assert!(sub.unsubscribe());
        publisher.emit(&2);

        assert_eq!(*count.borrow(), 1);
        assert_eq!(publisher.subscriber_count(), 0);
    }

    #[test]
    fn unsubscribe_after_publisher_dropped() {
        let publisher = Publisher::<u32>::new();
        let sub = publisher.subscribe(|_| {});
        drop(publisher);
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn listener_may_unsubscribe_during_emit() {
        let publisher = Publisher::<u32>::new();
        let count = Rc::new(RefCell::new(0));
        let slot: Rc<RefCell<Option<Subscription<u32>>>> = Rc::new(RefCell::new(None));

        let c = Rc::clone(&count);
        let s = Rc::clone(&slot);
        let sub = publisher.subscribe(move |_| {
            *c.borrow_mut() += 1;
            if let Some(sub) = s.borrow_mut().take() {
                assert!(sub.unsubscribe());
            }
        });
        *slot.borrow_mut() = Some(sub);

        publisher.emit(&1);
        publisher.emit(&2);
        assert_eq!(*count.borrow(), 1);
        assert_eq!(publisher.subscriber_count(), 0);
    }

    #[test]
    fn listener_added_during_emit_waits_for_next_event() {
        let publisher = Rc::new(Publisher::<u32>::new());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let p = Rc::clone(&publisher);
        let s = Rc::clone(&seen);
        let mut added = false;
        let _outer = publisher.subscribe(move |_| {
            if !added {
                added = true;
                let inner_seen = Rc::clone(&s);
                let _inner = p.subscribe(move |e| inner_seen.borrow_mut().push(*e));
            }
        });

        publisher.emit(&1);
        publisher.emit(&2);
        assert_eq!(*seen.borrow(), vec![2]);
    }

    #[test]
    fn reentrant_emit_is_dropped() {
        let publisher = Rc::new(Publisher::<u32>::new());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let p = Rc::clone(&publisher);
        let s = Rc::clone(&seen);
        let _sub = publisher.subscribe(move |e| {
            s.borrow_mut().push(*e);
            if *e == 1 {
                p.emit(&99);
            }
        });

        publisher.emit(&1);
        publisher.emit(&2);
        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(publisher.subscriber_count(), 1);
    }
}
