use crate::calculation::Calculation;
use crate::error::{CalcError, CalcResult};
use log::warn;

/// What a listener sees after a successful calculation.
#[derive(Debug, Clone, Copy)]
pub struct CalculationEvent<'a> {
    /// The record that was just appended
    pub calculation: &'a Calculation,
    /// The live history after the append, oldest first
    pub history: &'a [Calculation],
}

/// Receives every completed calculation.
pub trait CalculationListener: Send {
    /// Name used when reporting a failure
    fn name(&self) -> &str;

    fn on_calculation(&mut self, event: &CalculationEvent<'_>) -> CalcResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A listener error collected during [`NotificationHub::publish`].
#[derive(Debug)]
pub struct ListenerFailure {
    pub listener: String,
    pub error: CalcError,
}

impl ListenerFailure {
    pub fn into_error(self) -> CalcError {
        CalcError::listener(self.listener, self.error.to_string())
    }
}

/// Ordered set of listeners, notified synchronously.
#[derive(Default)]
pub struct NotificationHub {
    listeners: Vec<(ListenerId, Box<dyn CalculationListener>)>,
    next_id: u64,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn CalculationListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Returns false if `id` was not subscribed
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Calls each listener in subscription order.
    ///
    /// A failing listener never stops the ones after it; every failure is
    /// returned to the caller.
    pub fn publish(&mut self, event: &CalculationEvent<'_>) -> Vec<ListenerFailure> {
        let mut failures = Vec::new();
        for (_, listener) in self.listeners.iter_mut() {
            if let Err(error) = listener.on_calculation(event) {
                warn!("Listener '{}' failed: {}", listener.name(), error);
                failures.push(ListenerFailure {
                    listener: listener.name().to_string(),
                    error,
                });
            }
        }
        failures
    }

    pub fn listener_names(&self) -> Vec<&str> {
        self.listeners.iter().map(|(_, l)| l.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        name: String,
        seen: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl CalculationListener for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn on_calculation(&mut self, event: &CalculationEvent<'_>) -> CalcResult<()> {
            self.seen
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, event.calculation.result()));
            if self.fail {
                Err(CalcError::storage("disk full"))
            } else {
                Ok(())
            }
        }
    }

    fn recorder(name: &str, seen: &Arc<Mutex<Vec<String>>>, fail: bool) -> Box<Recorder> {
        Box::new(Recorder {
            name: name.to_string(),
            seen: Arc::clone(seen),
            fail,
        })
    }

    #[test]
    fn test_publish_in_subscription_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut hub = NotificationHub::new();
        hub.subscribe(recorder("first", &seen, false));
        hub.subscribe(recorder("second", &seen, false));

        let calc = Calculation::new("add", 1.0, 2.0, 3.0);
        let history = vec![calc.clone()];
        let failures = hub.publish(&CalculationEvent {
            calculation: &calc,
            history: &history,
        });

        assert!(failures.is_empty());
        assert_eq!(*seen.lock().unwrap(), vec!["first:3", "second:3"]);
    }

    #[test]
    fn test_failure_does_not_stop_later_listeners() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut hub = NotificationHub::new();
        hub.subscribe(recorder("broken", &seen, true));
        hub.subscribe(recorder("healthy", &seen, false));

        let calc = Calculation::new("add", 1.0, 1.0, 2.0);
        let failures = hub.publish(&CalculationEvent {
            calculation: &calc,
            history: std::slice::from_ref(&calc),
        });

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].listener, "broken");
        assert_eq!(*seen.lock().unwrap(), vec!["broken:2", "healthy:2"]);
    }

    #[test]
    fn test_unsubscribe() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut hub = NotificationHub::new();
        let id = hub.subscribe(recorder("gone", &seen, false));
        hub.subscribe(recorder("kept", &seen, false));

        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        assert_eq!(hub.listener_names(), vec!["kept"]);
    }

    #[test]
    fn test_failure_into_error() {
        let failure = ListenerFailure {
            listener: "autosave".to_string(),
            error: CalcError::storage("disk full"),
        };
        assert_eq!(
            failure.into_error().to_string(),
            "Listener 'autosave' failed: Storage error: disk full"
        );
    }
}
