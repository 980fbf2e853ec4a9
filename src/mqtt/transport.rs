//! Broker transport seam.
//!
//! The lifecycle driver only needs three things from a broker connection:
//! queue a subscription, wait for the next event and say goodbye. [`Transport`]
//! captures exactly that, [`RumqttTransport`] implements it on top of rumqttc.

use async_trait::async_trait;
use rumqttc::{
    AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
    SubscribeReasonCode,
};
use std::collections::{HashMap, VecDeque};
use std::io::ErrorKind;
use std::time::Duration;
use tracing::{debug, trace};

use super::config::MqttConfig;
use super::error::{MqttError, TransportError};

/// Events surfaced by a transport, already reduced to what the driver handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The broker accepted the connection
    Connected,
    /// An inbound publish
    Message { topic: String, payload: Vec<u8> },
    /// The broker answered a subscribe request
    SubscribeAck { topic: String, granted: bool },
    /// The connection ended without an error
    Closed,
}

#[async_trait]
pub trait Transport: Send {
    /// Queues a subscribe request. Must not wait for the broker.
    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    /// Waits for the next event. Calling it again after a close lets the
    /// transport attempt to reconnect.
    async fn next_event(&mut self) -> Result<TransportEvent, TransportError>;

    /// Requests an orderly disconnect.
    async fn disconnect(&mut self) -> Result<(), TransportError>;
}

/// Attributes SubAcks to topics by following subscribe packet ids.
///
/// rumqttc replays requests that were queued but unsent when a connection
/// drops, in their original order and ahead of anything queued later. The
/// request queue therefore survives a lost connection; only the packets that
/// were already on the wire are forgotten, since their acks never arrive.
#[derive(Debug, Default)]
struct SubscribeTracker {
    // Topics whose subscribe request has not reached the wire yet, in request order
    requested: VecDeque<String>,
    in_flight: HashMap<u16, String>,
}

impl SubscribeTracker {
    fn request(&mut self, topic: &str) {
        self.requested.push_back(topic.to_string());
    }

    fn sent(&mut self, pkid: u16) {
        if let Some(topic) = self.requested.pop_front() {
            trace!("Subscribe for {} sent with packet id {}", topic, pkid);
            self.in_flight.insert(pkid, topic);
        }
    }

    fn acked(&mut self, pkid: u16) -> Option<String> {
        self.in_flight.remove(&pkid)
    }

    fn connection_lost(&mut self) {
        self.in_flight.clear();
    }
}

pub struct RumqttTransport {
    client: AsyncClient,
    eventloop: EventLoop,
    subscriptions: SubscribeTracker,
}

impl RumqttTransport {
    pub fn connect(config: &MqttConfig) -> Result<Self, MqttError> {
        let endpoint = config.endpoint()?;
        debug!("Creating MQTT client '{}' for {}", config.client_id, endpoint);

        let mut mqtt_options = MqttOptions::new(config.client_id.clone(), endpoint.host, endpoint.port);
        mqtt_options
            .set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(5)))
            .set_clean_session(true);

        let (client, eventloop) = AsyncClient::new(mqtt_options, config.channel_capacity.max(1));

        Ok(Self {
            client,
            eventloop,
            subscriptions: SubscribeTracker::default(),
        })
    }
}

/// A peer hanging up shows up as an IO error; treat it as a close.
fn is_peer_close(error: &ConnectionError) -> bool {
    match error {
        ConnectionError::Io(e) => matches!(
            e.kind(),
            ErrorKind::ConnectionAborted
                | ErrorKind::ConnectionReset
                | ErrorKind::UnexpectedEof
                | ErrorKind::BrokenPipe
        ),
        _ => false,
    }
}

#[async_trait]
impl Transport for RumqttTransport {
    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.client
            .try_subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| TransportError::Subscribe {
                topic: topic.to_string(),
                reason: e.to_string(),
            })?;
        self.subscriptions.request(topic);
        Ok(())
    }

    async fn next_event(&mut self) -> Result<TransportEvent, TransportError> {
        loop {
            let event = match self.eventloop.poll().await {
                Ok(event) => event,
                Err(e) if is_peer_close(&e) => {
                    debug!("Broker closed the connection: {}", e);
                    self.subscriptions.connection_lost();
                    return Ok(TransportEvent::Closed);
                }
                Err(e) => {
                    self.subscriptions.connection_lost();
                    return Err(TransportError::Connection(e.to_string()));
                }
            };

            match event {
                Event::Incoming(Packet::ConnAck(ack)) => {
                    debug!("ConnAck received: {:?}", ack.code);
                    return Ok(TransportEvent::Connected);
                }
                Event::Incoming(Packet::Publish(publish)) => {
                    return Ok(TransportEvent::Message {
                        topic: publish.topic,
                        payload: publish.payload.to_vec(),
                    });
                }
                Event::Incoming(Packet::SubAck(ack)) => {
                    if let Some(topic) = self.subscriptions.acked(ack.pkid) {
                        let granted = ack
                            .return_codes
                            .iter()
                            .all(|code| !matches!(code, SubscribeReasonCode::Failure));
                        return Ok(TransportEvent::SubscribeAck { topic, granted });
                    }
                    trace!("SubAck for unknown packet id {}", ack.pkid);
                }
                Event::Incoming(Packet::Disconnect) => {
                    self.subscriptions.connection_lost();
                    return Ok(TransportEvent::Closed);
                }
                Event::Outgoing(Outgoing::Subscribe(pkid)) => self.subscriptions.sent(pkid),
                other => trace!("Ignoring MQTT event: {:?}", other),
            }
        }
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.client
            .try_disconnect()
            .map_err(|e| TransportError::Disconnect(e.to_string()))?;

        // Drive the event loop until the DISCONNECT packet is on the wire
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) => return Ok(()),
                Ok(_) => continue,
                Err(e) => {
                    debug!("Connection ended while disconnecting: {}", e);
                    return Ok(());
                }
            }
        }
    }
}
