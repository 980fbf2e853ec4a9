//! # Telemetry Payloads
//!
//! Sites publish their network health as loosely formatted, human-readable
//! text. This module turns one such payload into a [`NetworkReading`].
//!
//! ```text
//! telemetry/
//! ├── parser.rs   - extraction rule table and parse entry points
//! └── reading.rs  - NetworkReading and its status enums
//! ```
//!
//! Parsing is total: labels that are missing simply leave their field empty.
//! The only field derived from more than one rule is the current DNS server,
//! which falls back to a sentinel when the report flags a DNS failure.

pub mod parser;
pub mod reading;

pub use parser::{parse, parse_at};
pub use reading::{NetworkReading, PoolsTest, ResolutionStatus, DNS_FAILED_SENTINEL};
