//! In-process change subscribers for the task store.

use crate::model::task::Task;
use std::collections::BTreeMap;

/// Callback receiving the full committed task collection.
pub type TaskListener = Box<dyn FnMut(&[Task])>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Ordered listener registry. Listeners are called in subscription order.
#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: u64,
    listeners: BTreeMap<SubscriptionId, TaskListener>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one listener and returns its handle.
    pub fn subscribe(&mut self, listener: TaskListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.insert(id, listener);
        id
    }

    /// Removes one listener. Returns `false` for unknown handles.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Delivers `tasks` to one listener.
    pub fn notify_one(&mut self, id: SubscriptionId, tasks: &[Task]) {
        if let Some(listener) = self.listeners.get_mut(&id) {
            listener(tasks);
        }
    }

    /// Delivers `tasks` to every listener.
    pub fn publish(&mut self, tasks: &[Task]) {
        for listener in self.listeners.values_mut() {
            listener(tasks);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SubscriberRegistry;
    use crate::model::task::Task;
    use std::cell::RefCell;
    use std::rc::Rc;
    use uuid::Uuid;

    #[test]
    fn publish_reaches_only_remaining_listeners() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut registry = SubscriberRegistry::new();

        let first_calls = Rc::clone(&calls);
        let first = registry.subscribe(Box::new(move |tasks| {
            first_calls.borrow_mut().push(("first", tasks.len()));
        }));
        let second_calls = Rc::clone(&calls);
        registry.subscribe(Box::new(move |tasks| {
            second_calls.borrow_mut().push(("second", tasks.len()));
        }));

        let tasks = vec![Task::with_id(Uuid::new_v4(), "a")];
        registry.publish(&tasks);
        assert!(registry.unsubscribe(first));
        assert!(!registry.unsubscribe(first));
        registry.publish(&[]);

        assert_eq!(
            *calls.borrow(),
            vec![("first", 1), ("second", 1), ("second", 0)]
        );
        assert_eq!(registry.len(), 1);
    }
}
