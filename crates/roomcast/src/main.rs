//! Roomcast server binary.

use roomcast::{RoomcastError, RoomcastServer, ServerConfig};
use roomcast_store::RedisStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), RoomcastError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        port = config.port,
        store_url = %config.store_url,
        "starting roomcast"
    );

    let store =
        RedisStore::connect(&config.store_url, config.store_timeout)
            .await?;

    let server = RoomcastServer::<RedisStore>::builder()
        .bind(&config.socket_addr())
        .build(store)
        .await?;
    server.run().await
}
