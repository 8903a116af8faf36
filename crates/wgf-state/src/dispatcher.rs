//! Synchronous observer: subscribers registered for event tags transform a
//! payload one after another.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::Result;

/// Reacts to some events of type `E` by transforming a payload `P`.
pub trait EventSubscriber<E, P>: Send + Sync {
    /// Events this subscriber wants.
    fn subscribed_events(&self) -> Vec<E>;

    /// Whether to run for this payload. Defaults to always.
    fn should_run(&self, _payload: &P) -> bool {
        true
    }

    /// Handles the payload, returning it for the next subscriber.
    ///
    /// # Errors
    ///
    /// Any error aborts the dispatch and reaches the dispatcher's caller.
    fn run(&self, payload: P) -> Result<P>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Runs subscribers in registration order.
pub struct EventDispatcher<E, P> {
    subscribers: RwLock<Vec<Arc<dyn EventSubscriber<E, P>>>>,
}

impl<E, P> EventDispatcher<E, P>
where
    E: PartialEq + fmt::Debug + 'static,
    P: 'static,
{
    /// Creates a dispatcher with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Adds a subscriber after the existing ones.
    pub fn register(&self, subscriber: Arc<dyn EventSubscriber<E, P>>) {
        debug!(subscriber = subscriber.name(), "registered event subscriber");
        self.subscribers.write().push(subscriber);
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Whether no subscriber is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.read().is_empty()
    }

    /// Passes `payload` through every subscriber interested in any of
    /// `events` whose `should_run` accepts it, and returns the result.
    ///
    /// # Errors
    ///
    /// Returns the first subscriber error; later subscribers do not run.
    pub fn dispatch(&self, events: &[E], payload: P) -> Result<P> {
        let subscribers = self.subscribers.read().clone();
        let mut payload = payload;
        for subscriber in subscribers {
            if !subscriber
                .subscribed_events()
                .iter()
                .any(|event| events.contains(event))
            {
                continue;
            }
            if !subscriber.should_run(&payload) {
                trace!(subscriber = subscriber.name(), ?events, "subscriber skipped");
                continue;
            }
            debug!(subscriber = subscriber.name(), ?events, "running subscriber");
            payload = subscriber.run(payload)?;
        }
        Ok(payload)
    }
}

impl<E, P> Default for EventDispatcher<E, P>
where
    E: PartialEq + fmt::Debug + 'static,
    P: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E, P> fmt::Debug for EventDispatcher<E, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscribers", &self.subscribers.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use wgf_wireguard::WireGuardError;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Tag {
        A,
        B,
    }

    struct Append {
        events: Vec<Tag>,
        suffix: &'static str,
        enabled: bool,
    }

    impl EventSubscriber<Tag, String> for Append {
        fn subscribed_events(&self) -> Vec<Tag> {
            self.events.clone()
        }

        fn should_run(&self, _payload: &String) -> bool {
            self.enabled
        }

        fn run(&self, payload: String) -> Result<String> {
            Ok(payload + self.suffix)
        }
    }

    struct Fail;

    impl EventSubscriber<Tag, String> for Fail {
        fn subscribed_events(&self) -> Vec<Tag> {
            vec![Tag::A]
        }

        fn run(&self, _payload: String) -> Result<String> {
            Err(Error::WireGuard(WireGuardError::validation("test", "boom")))
        }
    }

    fn append(events: &[Tag], suffix: &'static str) -> Arc<Append> {
        Arc::new(Append {
            events: events.to_vec(),
            suffix,
            enabled: true,
        })
    }

    #[test]
    fn runs_matching_subscribers_in_registration_order() {
        let dispatcher: EventDispatcher<Tag, String> = EventDispatcher::new();
        dispatcher.register(append(&[Tag::A], "1"));
        dispatcher.register(append(&[Tag::B], "2"));
        dispatcher.register(append(&[Tag::A, Tag::B], "3"));

        assert_eq!(dispatcher.len(), 3);
        assert_eq!(dispatcher.dispatch(&[Tag::A], String::new()).expect("dispatch"), "13");
        assert_eq!(dispatcher.dispatch(&[Tag::B], String::new()).expect("dispatch"), "23");
        assert_eq!(
            dispatcher.dispatch(&[Tag::A, Tag::B], String::new()).expect("dispatch"),
            "123"
        );
    }

    #[test]
    fn should_run_gates_subscriber() {
        let dispatcher: EventDispatcher<Tag, String> = EventDispatcher::new();
        dispatcher.register(Arc::new(Append {
            events: vec![Tag::A],
            suffix: "x",
            enabled: false,
        }));
        assert_eq!(dispatcher.dispatch(&[Tag::A], "p".to_string()).expect("dispatch"), "p");
    }

    #[test]
    fn error_stops_dispatch() {
        let dispatcher: EventDispatcher<Tag, String> = EventDispatcher::new();
        dispatcher.register(Arc::new(Fail));
        dispatcher.register(append(&[Tag::A], "never"));
        assert!(dispatcher.dispatch(&[Tag::A], String::new()).is_err());
    }

    #[test]
    fn empty_dispatcher_returns_payload() {
        let dispatcher: EventDispatcher<Tag, String> = EventDispatcher::default();
        assert!(dispatcher.is_empty());
        assert_eq!(dispatcher.dispatch(&[Tag::A], "same".to_string()).expect("dispatch"), "same");
    }
}
