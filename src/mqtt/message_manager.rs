//! Observer side of the subscription: the callback interface, the slot that
//! serialises and revokes it, and a channel-backed observer for the UI.

use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

use super::error::TransportError;

/// Receives the lifecycle notifications of one broker subscription.
///
/// Calls are serialised: a method runs to completion before the next event
/// is dispatched. Do not release the owning handle from inside a callback.
pub trait ConnectionObserver: Send + 'static {
    fn on_connected(&mut self);

    /// `payload` is the message body decoded as UTF-8 (lossy)
    fn on_message(&mut self, topic: &str, payload: &str);

    fn on_error(&mut self, cause: &TransportError);

    fn on_closed(&mut self);

    /// A single topic could not be subscribed. The connection stays up.
    fn on_subscribe_failed(&mut self, _topic: &str, _cause: &TransportError) {}
}

/// Holds the observer until the handle is released.
///
/// Dispatch and detach share one lock, so once [`ObserverSlot::detach`]
/// returns no callback is running and none will run again.
pub struct ObserverSlot {
    inner: Mutex<Option<Box<dyn ConnectionObserver>>>,
}

impl ObserverSlot {
    pub fn new(observer: Box<dyn ConnectionObserver>) -> Self {
        Self {
            inner: Mutex::new(Some(observer)),
        }
    }

    /// Runs `f` against the observer. Returns `false` once detached.
    pub fn dispatch(&self, f: impl FnOnce(&mut (dyn ConnectionObserver + 'static))) -> bool {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Observer panicked during an earlier callback");
                poisoned.into_inner()
            }
        };
        match guard.as_mut() {
            Some(observer) => {
                f(observer.as_mut());
                true
            }
            None => false,
        }
    }

    /// Drops the observer. Returns `true` on the first call only.
    pub fn detach(&self) -> bool {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.take().is_some()
    }

    pub fn is_attached(&self) -> bool {
        match self.inner.lock() {
            Ok(guard) => guard.is_some(),
            Err(poisoned) => poisoned.into_inner().is_some(),
        }
    }
}

/// Lifecycle notification forwarded to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Connected,
    Message { topic: String, payload: String },
    Error(String),
    Closed,
    SubscribeFailed { topic: String, reason: String },
}

/// Observer that forwards every callback into an unbounded channel.
///
/// The UI drains the receiver once per frame, so the broker task never waits
/// on rendering.
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<LinkEvent>,
}

impl ChannelObserver {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<LinkEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn forward(&self, event: LinkEvent) {
        if let Err(e) = self.sender.send(event) {
            warn!("Dashboard stopped listening, dropping {:?}", e.0);
        }
    }
}

impl ConnectionObserver for ChannelObserver {
    fn on_connected(&mut self) {
        self.forward(LinkEvent::Connected);
    }

    fn on_message(&mut self, topic: &str, payload: &str) {
        self.forward(LinkEvent::Message {
            topic: topic.to_string(),
            payload: payload.to_string(),
        });
    }

    fn on_error(&mut self, cause: &TransportError) {
        self.forward(LinkEvent::Error(cause.to_string()));
    }

    fn on_closed(&mut self) {
        self.forward(LinkEvent::Closed);
    }

    fn on_subscribe_failed(&mut self, topic: &str, cause: &TransportError) {
        self.forward(LinkEvent::SubscribeFailed {
            topic: topic.to_string(),
            reason: cause.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_observer_forwards_in_order() {
        let (mut observer, mut rx) = ChannelObserver::channel();

        observer.on_connected();
        observer.on_message("Kasna/NETWORK", "Ping: 3 ms");
        observer.on_subscribe_failed(
            "Faqa/NETWORK",
            &TransportError::Subscribe {
                topic: "Faqa/NETWORK".into(),
                reason: "denied".into(),
            },
        );
        observer.on_error(&TransportError::Connection("refused".into()));
        observer.on_closed();

        assert_eq!(rx.try_recv().unwrap(), LinkEvent::Connected);
        assert_eq!(
            rx.try_recv().unwrap(),
            LinkEvent::Message {
                topic: "Kasna/NETWORK".into(),
                payload: "Ping: 3 ms".into()
            }
        );
        assert!(matches!(rx.try_recv().unwrap(), LinkEvent::SubscribeFailed { topic, .. } if topic == "Faqa/NETWORK"));
        assert_eq!(
            rx.try_recv().unwrap(),
            LinkEvent::Error("Connection error: refused".into())
        );
        assert_eq!(rx.try_recv().unwrap(), LinkEvent::Closed);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_receiver_does_not_panic() {
        let (mut observer, rx) = ChannelObserver::channel();
        drop(rx);
        observer.on_connected();
    }

    #[test]
    fn detached_slot_stops_dispatch() {
        let (observer, mut rx) = ChannelObserver::channel();
        let slot = ObserverSlot::new(Box::new(observer));

        assert!(slot.dispatch(|o| o.on_connected()));
        assert!(slot.detach());
        assert!(!slot.detach());
        assert!(!slot.is_attached());
        assert!(!slot.dispatch(|o| o.on_closed()));

        assert_eq!(rx.try_recv().unwrap(), LinkEvent::Connected);
        assert!(rx.try_recv().is_err());
    }
}
