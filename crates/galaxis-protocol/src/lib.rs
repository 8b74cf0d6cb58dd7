//! Wire protocol for Galaxis.
//!
//! This crate defines how a client and the authoritative game server
//! talk to each other:
//!
//! - **Taxonomy** ([`MessageKind`], [`Module`], [`PlayerId`]): the closed
//!   set of message kinds and receiver modules, with pinned wire values.
//! - **Envelope** ([`Envelope`]): routing metadata plus an owned payload.
//! - **Header** ([`Header`], [`encode_header`], [`decode_header`]): the
//!   fixed 20-byte prefix that frames each envelope on a byte stream.
//! - **Builders** ([`build`]) and **extractors** ([`extract`]): one pair
//!   per message, sharing the payload [`schema`] so they cannot drift.
//! - **Codec** ([`Codec`], [`BincodeCodec`], [`JsonCodec`]): how
//!   structured payloads become bytes.
//! - **Errors** ([`ProtocolError`]): header faults close a connection,
//!   payload faults drop one message.
//!
//! # Architecture
//!
//! The crate does no I/O and keeps no state between calls:
//!
//! ```text
//! domain values → build::* → Envelope → Header + payload → transport
//! transport → Header::from_bytes → Envelope → extract::* → domain values
//! ```
//!
//! # Example
//!
//! ```rust
//! use galaxis_protocol::{build, extract, BincodeCodec, MessageKind, PlayerId};
//!
//! let codec = BincodeCodec;
//! let orders = vec!["move fleet 7".to_string(), "build scout".to_string()];
//!
//! let envelope = build::turn_orders(&codec, PlayerId(2), &orders)?;
//! assert_eq!(envelope.kind(), MessageKind::TurnOrders);
//! assert_eq!(envelope.receiver(), PlayerId::SERVER);
//!
//! let decoded: Vec<String> = extract::turn_orders(&codec, &envelope)?;
//! assert_eq!(decoded, orders);
//! # Ok::<(), galaxis_protocol::ProtocolError>(())
//! ```

mod codec;
mod config;
mod envelope;
mod error;
mod header;
mod render;
mod types;

pub mod build;
pub mod extract;
pub mod schema;

#[cfg(feature = "bincode")]
pub use codec::BincodeCodec;
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use config::{DEFAULT_MAX_PAYLOAD_LEN, DEFAULT_PREVIEW_LEN, ProtocolLimits};
pub use envelope::Envelope;
pub use error::{CodecError, HeaderFault, ProtocolError, Result};
pub use header::{HEADER_FIELDS, HEADER_LEN, Header, WIRE_VERSION, decode_header, encode_header};
pub use render::render;
pub use schema::Redact;
pub use types::{EmpireId, MessageKind, Module, PlayerId, TurnProgressPhase};
