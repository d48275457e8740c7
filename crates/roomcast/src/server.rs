//! `RoomcastServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → coordination →
//! broadcast. All registries are constructed here and injected, so a
//! process (or a test) can run several independent servers against
//! separate — or shared — stores.

use std::sync::Arc;

use roomcast_coord::{
    GameStateStore, MatchmakingQueue, RoomRegistry, DEFAULT_ROOM_SIZE,
};
use roomcast_protocol::JsonCodec;
use roomcast_store::SharedStore;
use roomcast_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::broadcast::Broadcaster;
use crate::gateway::{handle_connection, ConnectionRegistry};
use crate::RoomcastError;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<S: SharedStore> {
    pub(crate) connections: Arc<Mutex<ConnectionRegistry>>,
    pub(crate) rooms: RoomRegistry<S>,
    pub(crate) queue: MatchmakingQueue<S>,
    pub(crate) game: GameStateStore<S>,
    pub(crate) broadcaster: Broadcaster<S>,
    pub(crate) codec: JsonCodec,
    pub(crate) room_size: usize,
}

/// Builder for configuring and starting a Roomcast server.
///
/// # Example
///
/// ```rust,no_run
/// use roomcast::RoomcastServerBuilder;
/// use roomcast_store::MemoryStore;
///
/// # async fn run() -> Result<(), roomcast::RoomcastError> {
/// let server = RoomcastServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(MemoryStore::new())
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct RoomcastServerBuilder {
    bind_addr: String,
    room_size: usize,
}

impl RoomcastServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_size: DEFAULT_ROOM_SIZE,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets how many queued players form a match.
    pub fn room_size(mut self, room_size: usize) -> Self {
        self.room_size = room_size;
        self
    }

    /// Builds the server over the given shared store.
    pub async fn build<S: SharedStore>(
        self,
        store: S,
    ) -> Result<RoomcastServer<S>, RoomcastError> {
        let transport =
            WebSocketTransport::bind(&self.bind_addr).await?;

        let connections =
            Arc::new(Mutex::new(ConnectionRegistry::new()));
        let rooms = RoomRegistry::new(store.clone());
        let game = GameStateStore::new(store.clone());
        let broadcaster = Broadcaster::new(
            Arc::clone(&connections),
            rooms.clone(),
            game.clone(),
        );

        let state = Arc::new(ServerState {
            connections,
            queue: MatchmakingQueue::new(store, rooms.clone()),
            rooms,
            game,
            broadcaster,
            codec: JsonCodec,
            room_size: self.room_size,
        });

        Ok(RoomcastServer { transport, state })
    }
}

impl Default for RoomcastServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Roomcast server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RoomcastServer<S: SharedStore> {
    transport: WebSocketTransport,
    state: Arc<ServerState<S>>,
}

impl<S: SharedStore> RoomcastServer<S> {
    /// Creates a new builder.
    pub fn builder() -> RoomcastServerBuilder {
        RoomcastServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop: one handler task per connection, until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), RoomcastError> {
        tracing::info!("Roomcast server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
