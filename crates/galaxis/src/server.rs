//! `GalaxisServer` builder and server loop.
//!
//! This is the entry point for running a Galaxis game server. It ties
//! together the layers: transport → dispatcher → module handlers.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use galaxis_protocol::{Module, PlayerId, ProtocolLimits, build};
use galaxis_transport::{FramedListener, TcpConnection};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::GalaxisError;
use crate::config::ServerConfig;
use crate::dispatch::{Dispatcher, ModuleHandler};
use crate::handler::handle_connection;
use crate::policy::SenderPolicy;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState {
    pub(crate) dispatcher: Dispatcher,
    /// Connections that have been assigned a player id.
    pub(crate) peers: Mutex<HashMap<PlayerId, Arc<TcpConnection>>>,
    pub(crate) idle_timeout: Option<Duration>,
}

impl ServerState {
    pub(crate) async fn peer(&self, player: PlayerId) -> Option<Arc<TcpConnection>> {
        self.peers.lock().await.get(&player).cloned()
    }

    /// Tells every joined player the server is going away and closes
    /// their connections.
    async fn shut_down(&self) {
        let peers: Vec<_> = self.peers.lock().await.drain().collect();
        tracing::info!(players = peers.len(), "server shutting down");
        for (player, conn) in peers {
            if let Err(e) = conn.send(&build::server_dying(player)).await {
                tracing::debug!(%player, error = %e, "could not notify player of shutdown");
            }
            let _ = conn.close().await;
        }
    }
}

/// Builder for configuring and starting a Galaxis server.
///
/// # Example
///
/// ```rust,no_run
/// use galaxis::prelude::*;
///
/// # async fn run() -> Result<(), GalaxisError> {
/// let server = GalaxisServer::builder()
///     .bind("0.0.0.0:12346")
///     .handler(Module::Core, |envelope: Envelope| -> HandlerResult {
///         tracing::info!(%envelope, "received");
///         Ok(Vec::new())
///     })
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct GalaxisServerBuilder {
    config: ServerConfig,
    dispatcher: Dispatcher,
}

impl GalaxisServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            dispatcher: Dispatcher::new(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the frame limits for every connection.
    pub fn limits(mut self, limits: ProtocolLimits) -> Self {
        self.config.limits = limits;
        self
    }

    /// Registers the handler for `module`.
    pub fn handler(mut self, module: Module, handler: impl ModuleHandler) -> Self {
        self.dispatcher.register(module, Arc::new(handler));
        self
    }

    /// Replaces the default [`DirectionPolicy`](crate::policy::DirectionPolicy).
    pub fn policy(mut self, policy: impl SenderPolicy) -> Self {
        self.dispatcher = self.dispatcher.with_policy(policy);
        self
    }

    /// Binds the listener.
    pub async fn build(self) -> Result<GalaxisServer, GalaxisError> {
        let listener =
            FramedListener::bind(self.config.bind_addr.as_str(), self.config.limits.clone())
                .await?;

        let state = Arc::new(ServerState {
            dispatcher: self.dispatcher,
            peers: Mutex::new(HashMap::new()),
            idle_timeout: self.config.idle_timeout(),
        });

        Ok(GalaxisServer { listener, state })
    }
}

impl Default for GalaxisServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Galaxis server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GalaxisServer {
    listener: FramedListener,
    state: Arc<ServerState>,
}

impl GalaxisServer {
    /// Creates a new builder.
    pub fn builder() -> GalaxisServerBuilder {
        GalaxisServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), GalaxisError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes, then sends
    /// `SERVER_DYING` to every joined player and stops every connection
    /// task, joined or not.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), GalaxisError> {
        tracing::info!("Galaxis server running");
        tokio::pin!(shutdown);
        let mut conns = JoinSet::new();

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((conn, peer)) => {
                        let state = Arc::clone(&self.state);
                        conns.spawn(async move {
                            if let Err(e) = handle_connection(Arc::new(conn), state).await {
                                tracing::debug!(%peer, error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
                Some(_) = conns.join_next(), if !conns.is_empty() => {}
            }
        }

        self.state.shut_down().await;
        conns.shutdown().await;
        Ok(())
    }
}
