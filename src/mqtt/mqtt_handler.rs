//! Broker subscription lifecycle.
//!
//! [`SubscriptionManager::open`] spawns one driver task per subscription. The
//! driver is a statum machine over the link phases:
//!
//! ```text
//!             ┌──────── auto-reconnect ────────┐
//!             ▼                                │
//!        Connecting ──► Online ──► Offline ────┘
//!             │           │           ▲
//!             ├───────────┴── close ──┘
//!             │
//!             └── error ──► Finished
//! ```
//!
//! The connection-level [`ConnectionState`] published through the handle
//! follows `Connecting → Connected → (Error | Closed)`, with `Error` always
//! followed by `Closed`. An error ends the link for good; only a plain close
//! is retried.

use statum::{machine, state};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::config::MqttConfig;
use super::error::{MqttError, TransportError};
use super::message_manager::{ConnectionObserver, ObserverSlot};
use super::transport::{RumqttTransport, Transport, TransportEvent};

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Connected,
    Error,
    Closed,
}

/// Driver settings derived from [`MqttConfig`].
#[derive(Clone, Debug)]
pub struct LinkSettings {
    pub auto_reconnect: bool,
    pub reconnect_delay: Duration,
    /// Upper bound for flushing the DISCONNECT packet on release
    pub disconnect_timeout: Duration,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            reconnect_delay: Duration::from_secs(1),
            disconnect_timeout: Duration::from_secs(1),
        }
    }
}

impl From<&MqttConfig> for LinkSettings {
    fn from(config: &MqttConfig) -> Self {
        Self {
            auto_reconnect: config.auto_reconnect,
            reconnect_delay: config.reconnect_delay(),
            ..Self::default()
        }
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum LinkPhase {
    Connecting, // waiting for the broker to accept us
    Online,     // subscribed, dispatching messages
    Offline,    // connection gone, deciding whether to retry
}

#[machine]
pub struct BrokerLink<S: LinkPhase> {
    transport: Box<dyn Transport>,
    topics: Vec<String>,
    observer: Arc<ObserverSlot>,
    status: watch::Sender<ConnectionState>,
    settings: LinkSettings,
    cancel: CancellationToken,
}

enum Step {
    Connecting(BrokerLink<Connecting>),
    Online(BrokerLink<Online>),
    Offline(BrokerLink<Offline>),
    Finished,
}

impl<S: LinkPhase> BrokerLink<S> {
    fn set_status(&self, state: ConnectionState) {
        let previous = self.status.send_replace(state);
        if previous != state {
            debug!("Connection state {:?} -> {:?}", previous, state);
        }
    }

    /// Next transport event, or `None` once the handle has been released.
    async fn next_event(&mut self) -> Option<Result<TransportEvent, TransportError>> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            event = self.transport.next_event() => Some(event),
        }
    }

    fn dispatch_message(&self, topic: &str, payload: &[u8]) {
        let text = String::from_utf8_lossy(payload);
        trace!("Message on {} ({} bytes)", topic, payload.len());
        if !self.observer.dispatch(|o| o.on_message(topic, &text)) {
            debug!("Dropping message for {} after release", topic);
        }
    }

    fn subscribe_all(&mut self) {
        for topic in &self.topics {
            match self.transport.subscribe(topic) {
                Ok(()) => debug!("Subscribe requested for {}", topic),
                Err(e) => {
                    warn!("Failed to subscribe to {}: {}", topic, e);
                    self.observer.dispatch(|o| o.on_subscribe_failed(topic, &e));
                }
            }
        }
    }

    fn announce_connected(&mut self) {
        info!("Connected to MQTT broker");
        self.set_status(ConnectionState::Connected);
        self.observer.dispatch(|o| o.on_connected());
        self.subscribe_all();
    }

    /// Reports a transport failure. The link is not retried afterwards.
    fn report_failure(&self, cause: &TransportError) {
        error!("MQTT error, giving up on the broker link: {}", cause);
        self.set_status(ConnectionState::Error);
        self.observer.dispatch(|o| o.on_error(cause));
        self.report_closed();
    }

    fn report_closed(&self) {
        info!("MQTT client disconnected");
        self.set_status(ConnectionState::Closed);
        self.observer.dispatch(|o| o.on_closed());
    }

    /// Orderly disconnect after release. No observer calls happen here.
    async fn shutdown(mut self) {
        debug!("Disconnecting from MQTT broker");
        match tokio::time::timeout(self.settings.disconnect_timeout, self.transport.disconnect()).await {
            Ok(Ok(())) => debug!("Disconnect sent"),
            Ok(Err(e)) => warn!("Disconnect failed: {}", e),
            Err(_) => warn!(
                "Disconnect did not complete within {:?}",
                self.settings.disconnect_timeout
            ),
        }
        self.set_status(ConnectionState::Closed);
    }
}

impl BrokerLink<Connecting> {
    pub fn create(
        transport: Box<dyn Transport>,
        topics: Vec<String>,
        observer: Arc<ObserverSlot>,
        status: watch::Sender<ConnectionState>,
        settings: LinkSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self::new(transport, topics, observer, status, settings, cancel)
    }

    async fn establish(mut self) -> Step {
        self.set_status(ConnectionState::Connecting);
        loop {
            match self.next_event().await {
                None => {
                    self.shutdown().await;
                    return Step::Finished;
                }
                Some(Ok(TransportEvent::Connected)) => {
                    self.announce_connected();
                    return Step::Online(self.transition());
                }
                Some(Ok(TransportEvent::Message { topic, payload })) => {
                    self.dispatch_message(&topic, &payload)
                }
                Some(Ok(TransportEvent::SubscribeAck { topic, .. })) => {
                    trace!("Stale SubAck for {} while connecting", topic)
                }
                Some(Ok(TransportEvent::Closed)) => {
                    self.report_closed();
                    return Step::Offline(self.transition());
                }
                Some(Err(e)) => {
                    self.report_failure(&e);
                    return Step::Finished;
                }
            }
        }
    }
}

impl BrokerLink<Online> {
    async fn serve(mut self) -> Step {
        loop {
            match self.next_event().await {
                None => {
                    self.shutdown().await;
                    return Step::Finished;
                }
                Some(Ok(TransportEvent::Message { topic, payload })) => {
                    self.dispatch_message(&topic, &payload)
                }
                Some(Ok(TransportEvent::SubscribeAck {
                    topic,
                    granted: false,
                })) => {
                    let cause = TransportError::Subscribe {
                        topic: topic.clone(),
                        reason: "refused by broker".to_string(),
                    };
                    warn!("Failed to subscribe to {}: {}", topic, cause);
                    self.observer
                        .dispatch(|o| o.on_subscribe_failed(&topic, &cause));
                }
                Some(Ok(TransportEvent::SubscribeAck { topic, .. })) => {
                    debug!("Subscribed to {}", topic)
                }
                // The transport reconnected on its own; subscriptions are gone
                Some(Ok(TransportEvent::Connected)) => self.announce_connected(),
                Some(Ok(TransportEvent::Closed)) => {
                    self.report_closed();
                    return Step::Offline(self.transition());
                }
                Some(Err(e)) => {
                    self.report_failure(&e);
                    return Step::Finished;
                }
            }
        }
    }
}

impl BrokerLink<Offline> {
    async fn recover(self) -> Step {
        if !self.settings.auto_reconnect {
            info!("Auto-reconnect disabled, broker link stays closed");
            return Step::Finished;
        }

        debug!("Retrying broker connection in {:?}", self.settings.reconnect_delay);
        let released = tokio::select! {
            _ = self.cancel.cancelled() => true,
            _ = tokio::time::sleep(self.settings.reconnect_delay) => false,
        };

        if released {
            self.shutdown().await;
            Step::Finished
        } else {
            Step::Connecting(self.transition())
        }
    }
}

async fn drive(link: BrokerLink<Connecting>) {
    let mut step = Step::Connecting(link);
    loop {
        step = match step {
            Step::Connecting(link) => link.establish().await,
            Step::Online(link) => link.serve().await,
            Step::Offline(link) => link.recover().await,
            Step::Finished => break,
        };
    }
    debug!("Broker link driver finished");
}

/// Owner of a running subscription.
///
/// Dropping the handle releases it.
pub struct SubscriptionHandle {
    status: watch::Receiver<ConnectionState>,
    observer: Arc<ObserverSlot>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    /// Current connection-level state.
    pub fn status(&self) -> ConnectionState {
        *self.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<ConnectionState> {
        self.status.clone()
    }

    pub fn is_released(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stops all observer calls and asks the driver to disconnect.
    ///
    /// Waits for a callback that is currently running, so it must not be
    /// called from inside the observer. Safe to call more than once.
    pub fn release(&self) {
        if self.observer.detach() {
            info!("Releasing MQTT subscription");
        }
        self.cancel.cancel();
    }

    /// Releases the subscription and waits for the driver to finish.
    pub async fn shutdown(mut self) {
        self.release();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Broker link task failed: {}", e);
            }
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct SubscriptionManager;

impl SubscriptionManager {
    /// Connects to the configured broker and subscribes to `topics`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open<I, T, O>(config: &MqttConfig, topics: I, observer: O) -> Result<SubscriptionHandle, MqttError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
        O: ConnectionObserver,
    {
        let transport = RumqttTransport::connect(config)?;
        info!("Opening MQTT subscription to {}", config.broker_url);
        Ok(Self::open_with(
            transport,
            topics,
            observer,
            LinkSettings::from(config),
        ))
    }

    /// Same as [`SubscriptionManager::open`] over an arbitrary transport.
    pub fn open_with<Tr, I, T, O>(transport: Tr, topics: I, observer: O, settings: LinkSettings) -> SubscriptionHandle
    where
        Tr: Transport + 'static,
        I: IntoIterator<Item = T>,
        T: Into<String>,
        O: ConnectionObserver,
    {
        let topics = ordered_topics(topics);
        debug!("Subscription covers {} topics", topics.len());

        let (status_tx, status_rx) = watch::channel(ConnectionState::Connecting);
        let observer = Arc::new(ObserverSlot::new(Box::new(observer)));
        let cancel = CancellationToken::new();

        let link = BrokerLink::create(
            Box::new(transport),
            topics,
            observer.clone(),
            status_tx,
            settings,
            cancel.clone(),
        );
        let task = tokio::spawn(drive(link));

        SubscriptionHandle {
            status: status_rx,
            observer,
            cancel,
            task: Some(task),
        }
    }
}

/// Removes duplicate topics, keeping the first occurrence.
pub fn ordered_topics<I, T>(topics: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let mut seen = HashSet::new();
    topics
        .into_iter()
        .map(Into::into)
        .filter(|topic: &String| seen.insert(topic.clone()))
        .collect()
}
