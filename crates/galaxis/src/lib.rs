//! # Galaxis
//!
//! Server side of the Galaxis turn-based strategy protocol.
//!
//! Clients and the authoritative server exchange
//! [`Envelope`](protocol::Envelope)s framed on TCP. This crate accepts
//! connections, checks each incoming envelope against a
//! [`SenderPolicy`](policy::SenderPolicy), routes it by
//! [`Module`](protocol::Module) to a [`ModuleHandler`] and sends the
//! handler's replies to their receivers.
//!
//! Game rules live in the handlers. They read payloads with
//! [`extract`](protocol::extract) and produce replies with
//! [`build`](protocol::build).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use galaxis::prelude::*;
//!
//! # async fn run() -> Result<(), GalaxisError> {
//! let server = GalaxisServer::builder()
//!     .bind("0.0.0.0:12346")
//!     .handler(Module::Core, |envelope: Envelope| -> HandlerResult {
//!         match envelope.kind() {
//!             MessageKind::RequestNewObjectId => {
//!                 Ok(vec![build::dispatch_new_object_id(envelope.sender(), 1)])
//!             }
//!             _ => Ok(Vec::new()),
//!         }
//!     })
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod dispatch;
mod error;
mod handler;
pub mod policy;
mod server;

pub use galaxis_protocol as protocol;
pub use galaxis_transport as transport;

pub use config::{ConfigError, ServerConfig};
pub use dispatch::{Dispatcher, DropReason, HandlerResult, ModuleHandler, Outcome};
pub use error::GalaxisError;
pub use server::{GalaxisServer, GalaxisServerBuilder};

/// Everything a server binary or handler usually needs.
pub mod prelude {
    pub use crate::policy::{AllowAll, DirectionPolicy, PolicyViolation, SenderPolicy};
    pub use crate::{
        ConfigError, Dispatcher, DropReason, GalaxisError, GalaxisServer, GalaxisServerBuilder,
        HandlerResult, ModuleHandler, Outcome, ServerConfig,
    };
    pub use galaxis_protocol::{
        BincodeCodec, Codec, EmpireId, Envelope, JsonCodec, MessageKind, Module, PlayerId,
        ProtocolError, ProtocolLimits, build, extract,
    };
}
