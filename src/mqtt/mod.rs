//! # MQTT Subscription Module
//!
//! Owns the single broker connection of a dashboard session. Sites publish
//! their network reports to per-site topics; this module subscribes to the
//! configured topic list and hands every report to an observer.
//!
//! ## Module Architecture
//!
//! ```text
//! mqtt/
//! ├── config.rs           - Broker settings and URI parsing
//! ├── error.rs            - TransportError and MqttError
//! ├── message_manager.rs  - Observer trait, observer slot, channel observer
//! ├── mqtt_handler.rs     - Lifecycle state machine and subscription handle
//! └── transport.rs        - Transport seam and its rumqttc implementation
//! ```
//!
//! ## Lifecycle
//!
//! On every successful connection the observer hears `on_connected` and a
//! subscribe request goes out for each topic. A topic that cannot be
//! subscribed is logged and reported on its own; it never takes the
//! connection down. Transport errors are reported through `on_error`
//! followed by `on_closed` and end the subscription; a caller must `open`
//! again. A plain close is retried by the transport when `auto_reconnect` is
//! enabled.
//!
//! Releasing the [`SubscriptionHandle`] detaches the observer before the
//! driver is cancelled, so nothing buffered in the transport can reach the
//! observer afterwards.

pub mod config;
pub mod error;
pub mod message_manager;
pub mod mqtt_handler;
pub mod transport;

pub use config::MqttConfig;
pub use error::{MqttError, TransportError};
pub use message_manager::{ChannelObserver, ConnectionObserver, LinkEvent};
pub use mqtt_handler::{ConnectionState, LinkSettings, SubscriptionHandle, SubscriptionManager};
