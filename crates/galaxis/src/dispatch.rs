//! Routes decoded envelopes to the handler for their module.
//!
//! Every incoming envelope goes through three steps:
//!
//! 1. the [`SenderPolicy`] decides whether this connection may send it
//! 2. the handler registered for the envelope's [`Module`] is looked up
//! 3. the handler runs and returns the envelopes to send in reply
//!
//! A failure in any step drops that one message ([`Outcome::Dropped`]).
//! Only a handler error that is fatal to the connection is returned as
//! `Err`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use galaxis_protocol::{Envelope, Module, PlayerId, ProtocolError};

use crate::GalaxisError;
use crate::policy::{DirectionPolicy, PolicyViolation, SenderPolicy};

/// What a handler returns: the replies to send, or why it could not
/// produce any.
pub type HandlerResult = Result<Vec<Envelope>, ProtocolError>;

/// Handles every envelope addressed to one [`Module`].
///
/// Handlers use the [`extract`](galaxis_protocol::extract) functions to
/// read payloads and return their errors unchanged; the dispatcher
/// decides what a failure means for the connection.
pub trait ModuleHandler: Send + Sync + 'static {
    /// Processes one envelope and returns the replies to send.
    fn handle(&self, envelope: Envelope) -> HandlerResult;
}

/// Plain closures are handlers. Annotate the return type as
/// [`HandlerResult`] so the error type can be inferred.
impl<F> ModuleHandler for F
where
    F: Fn(Envelope) -> HandlerResult + Send + Sync + 'static,
{
    fn handle(&self, envelope: Envelope) -> HandlerResult {
        self(envelope)
    }
}

/// Why a message was dropped.
#[derive(Debug, thiserror::Error)]
pub enum DropReason {
    #[error("refused by sender policy: {0}")]
    Policy(#[from] PolicyViolation),

    #[error("no handler registered for module {0}")]
    NoHandler(Module),

    #[error("handler failed: {0}")]
    Payload(#[from] ProtocolError),
}

/// What became of a dispatched envelope.
#[derive(Debug)]
pub enum Outcome {
    /// The handler ran; these envelopes should be sent.
    Replies(Vec<Envelope>),
    /// The envelope was discarded. The connection stays up.
    Dropped(DropReason),
}

impl Outcome {
    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped(_))
    }
}

/// Module-keyed handler table plus the policy guarding it.
pub struct Dispatcher {
    handlers: HashMap<Module, Arc<dyn ModuleHandler>>,
    policy: Arc<dyn SenderPolicy>,
}

impl Dispatcher {
    /// An empty dispatcher enforcing [`DirectionPolicy`].
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            policy: Arc::new(DirectionPolicy),
        }
    }

    /// Replaces the sender policy.
    pub fn with_policy(mut self, policy: impl SenderPolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Registers `handler` for `module`, returning the handler it
    /// replaced, if any.
    pub fn register(
        &mut self,
        module: Module,
        handler: Arc<dyn ModuleHandler>,
    ) -> Option<Arc<dyn ModuleHandler>> {
        tracing::debug!(%module, "registered module handler");
        self.handlers.insert(module, handler)
    }

    pub fn handles(&self, module: Module) -> bool {
        self.handlers.contains_key(&module)
    }

    /// Runs `envelope`, received on the connection bound to `origin`,
    /// through policy and handler.
    pub fn dispatch(&self, origin: PlayerId, envelope: Envelope) -> Result<Outcome, GalaxisError> {
        let kind = envelope.kind();
        let module = envelope.module();

        if let Err(violation) = self.policy.check(origin, &envelope) {
            tracing::warn!(%origin, %kind, reason = %violation, "dropping envelope");
            return Ok(Outcome::Dropped(violation.into()));
        }

        let Some(handler) = self.handlers.get(&module) else {
            tracing::warn!(%origin, %kind, %module, "no handler for module, dropping envelope");
            return Ok(Outcome::Dropped(DropReason::NoHandler(module)));
        };

        match handler.handle(envelope) {
            Ok(replies) => {
                tracing::debug!(%origin, %kind, replies = replies.len(), "dispatched envelope");
                Ok(Outcome::Replies(replies))
            }
            Err(e) if e.is_fatal_to_connection() => Err(e.into()),
            Err(e) => {
                tracing::warn!(%origin, %kind, error = %e, "handler failed, dropping envelope");
                Ok(Outcome::Dropped(e.into()))
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut modules: Vec<_> = self.handlers.keys().copied().collect();
        modules.sort_by_key(|m| m.wire());
        f.debug_struct("Dispatcher")
            .field("modules", &modules)
            .finish_non_exhaustive()
    }
}
