use std::net::TcpListener;
use std::sync::Arc;

use mediashare_auth::configuration::get_configuration;
use mediashare_auth::media::{LocalObjectStore, ObjectStore};
use mediashare_auth::startup::run;
use mediashare_auth::store::{InMemoryUserStore, PgUserStore, UserStore};
use mediashare_auth::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry("info");

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let store: Arc<dyn UserStore> = match &configuration.database {
        Some(database) => {
            tracing::info!("Attempting to connect to database");
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database.connection_string())
                .await
                .map_err(|e| {
                    tracing::error!("Failed to create connection pool: {}", e);
                    std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        "Database connection error",
                    )
                })?;

            let store = PgUserStore::new(pool);
            store.ensure_schema().await.map_err(|e| {
                tracing::error!("Failed to prepare users table: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, "Database schema error")
            })?;
            tracing::info!("Database connection pool created successfully");
            Arc::new(store)
        }
        None => {
            tracing::warn!("No database configured, identities are kept in memory");
            Arc::new(InMemoryUserStore::new())
        }
    };

    std::fs::create_dir_all(&configuration.media.root)?;
    let objects: Arc<dyn ObjectStore> = Arc::new(LocalObjectStore::new(
        configuration.media.root.clone(),
        configuration.media.public_url.clone(),
    ));

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, store, objects, configuration)?;
    server.await
}
