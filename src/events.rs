//! Multi-subscriber notifications fired by the dispatch loop.

use crate::error::ShellError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Listener for "command observed" and "unknown command": `(command, arguments)`.
pub type CommandListener = dyn Fn(&str, &[String]) + Send + Sync;

/// Listener for failures contained by the loop.
pub type ErrorListener = dyn Fn(&ShellError) + Send + Sync;

/// Token returned by a subscription, used to unsubscribe later.
///
/// Ids are only meaningful to the list that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Ordered list of listeners of one kind.
///
/// Listeners are delivered to in subscription order. Delivery works on a
/// snapshot, so a listener may subscribe or unsubscribe while being invoked.
pub struct Subscribers<F: ?Sized> {
    entries: Mutex<Vec<(SubscriptionId, Arc<F>)>>,
    next_id: AtomicU64,
}

impl<F: ?Sized> Default for Subscribers<F> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<F: ?Sized> Subscribers<F> {
    pub fn subscribe(&self, listener: Arc<F>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, listener));
        id
    }

    /// Removes the listener registered under `id`. Returns `false` if there was none.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Current listeners, in delivery order.
    pub fn snapshot(&self) -> Vec<Arc<F>> {
        self.lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Arc<F>)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Subscribers<CommandListener> {
    pub fn notify(&self, command: &str, args: &[String]) {
        for listener in self.snapshot() {
            listener(command, args);
        }
    }
}

impl Subscribers<ErrorListener> {
    /// Delivers `error` to every listener. Returns `false` when nobody is subscribed.
    pub fn notify(&self, error: &ShellError) -> bool {
        let listeners = self.snapshot();
        for listener in &listeners {
            listener(error);
        }
        !listeners.is_empty()
    }
}

/// The three notification channels a shell exposes.
#[derive(Default)]
pub struct Notifications {
    pub command: Subscribers<CommandListener>,
    pub unknown_command: Subscribers<CommandListener>,
    pub error: Subscribers<ErrorListener>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&'static str) -> Arc<CommandListener>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let make = move |tag: &'static str| -> Arc<CommandListener> {
            let sink = sink.clone();
            Arc::new(move |command: &str, args: &[String]| {
                sink.lock()
                    .unwrap()
                    .push(format!("{tag}:{command}:{}", args.join(",")));
            })
        };
        (log, make)
    }

    #[test]
    fn listeners_run_in_subscription_order() {
        let subscribers = Subscribers::<CommandListener>::default();
        let (log, make) = recorder();
        subscribers.subscribe(make("first"));
        subscribers.subscribe(make("second"));

        subscribers.notify("xyz", &["arg1".to_string()]);

        assert_eq!(*log.lock().unwrap(), ["first:xyz:arg1", "second:xyz:arg1"]);
    }

    #[test]
    fn unsubscribe_removes_only_that_listener() {
        let subscribers = Subscribers::<CommandListener>::default();
        let (log, make) = recorder();
        let first = subscribers.subscribe(make("first"));
        subscribers.subscribe(make("second"));

        assert!(subscribers.unsubscribe(first));
        assert!(!subscribers.unsubscribe(first));
        subscribers.notify("cmd", &[]);

        assert_eq!(*log.lock().unwrap(), ["second:cmd:"]);
        assert_eq!(subscribers.len(), 1);
    }

    #[test]
    fn listener_may_unsubscribe_itself_during_delivery() {
        let subscribers = Arc::new(Subscribers::<CommandListener>::default());
        let id_slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

        let inner = subscribers.clone();
        let slot = id_slot.clone();
        let id = subscribers.subscribe(Arc::new(move |_: &str, _: &[String]| {
            if let Some(id) = *slot.lock().unwrap() {
                inner.unsubscribe(id);
            }
        }));
        *id_slot.lock().unwrap() = Some(id);

        subscribers.notify("once", &[]);
        assert!(subscribers.is_empty());
    }

    #[test]
    fn each_list_numbers_its_own_subscriptions() {
        let first = Subscribers::<CommandListener>::default();
        let second = Subscribers::<CommandListener>::default();
        let (_, make) = recorder();

        let a = first.subscribe(make("a"));
        let b = first.subscribe(make("b"));
        let c = second.subscribe(make("c"));

        assert_eq!(a, c);
        assert!(a < b);
    }

    #[test]
    fn error_notify_reports_whether_anyone_listened() {
        let subscribers = Subscribers::<ErrorListener>::default();
        let err = ShellError::Input(std::io::Error::other("boom"));
        assert!(!subscribers.notify(&err));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        subscribers.subscribe(Arc::new(move |e: &ShellError| {
            sink.lock().unwrap().push(e.to_string());
        }));

        assert!(subscribers.notify(&err));
        assert_eq!(*seen.lock().unwrap(), ["failed to read input: boom"]);
    }
}
