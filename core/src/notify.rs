//! Change notification for the owned state containers.
//!
//! Everything runs on the host's event loop, so listeners are plain
//! `FnMut` closures called synchronously, in subscription order, after the
//! state change they describe has been applied.

use std::fmt;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Callback<E> = Box<dyn FnMut(&E)>;

pub struct Listeners<E> {
    next: u64,
    entries: Vec<(Subscription, Callback<E>)>,
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            next: 0,
            entries: Vec::new(),
        }
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}

impl<E> Listeners<E> {
    pub fn subscribe(&mut self, callback: impl FnMut(&E) + 'static) -> Subscription {
        let subscription = Subscription(self.next);
        self.next += 1;
        self.entries.push((subscription, Box::new(callback)));
        subscription
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(s, _)| *s != subscription);
        self.entries.len() != before
    }

    pub fn emit(&mut self, event: &E) {
        for (_, callback) in &mut self.entries {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn emits_in_subscription_order_until_unsubscribed() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut listeners: Listeners<u32> = Listeners::default();

        let a = {
            let seen = Rc::clone(&seen);
            listeners.subscribe(move |e| seen.borrow_mut().push(("a", *e)))
        };
        {
            let seen = Rc::clone(&seen);
            listeners.subscribe(move |e| seen.borrow_mut().push(("b", *e)));
        }

        listeners.emit(&1);
        assert!(listeners.unsubscribe(a));
        assert!(!listeners.unsubscribe(a));
        listeners.emit(&2);

        assert_eq!(*seen.borrow(), vec![("a", 1), ("b", 1), ("b", 2)]);
        assert_eq!(listeners.len(), 1);
    }
}
