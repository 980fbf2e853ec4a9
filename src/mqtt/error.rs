//! Error definitions for the MQTT module

use thiserror::Error;

/// Failures reported by a broker transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection could not be established or broke down
    #[error("Connection error: {0}")]
    Connection(String),

    /// A single topic subscription was rejected
    #[error("Subscribe to {topic} failed: {reason}")]
    Subscribe { topic: String, reason: String },

    /// The orderly disconnect request could not be issued
    #[error("Disconnect failed: {0}")]
    Disconnect(String),
}

/// Errors raised while opening a subscription.
#[derive(Debug, Error)]
pub enum MqttError {
    #[error("Invalid broker URL '{url}': {reason}")]
    InvalidBrokerUrl { url: String, reason: String },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}
