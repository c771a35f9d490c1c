//! Application state - shared across all handlers.

use std::sync::Arc;

use feed_core::PostService;
use feed_core::ports::{ImageStore, UserRepository};
use feed_infra::{InMemoryStore, LocalImageStore};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: PostService,
    pub max_image_bytes: usize,
    /// Backend in use, reported by the health check.
    pub storage: &'static str,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let images: Arc<dyn ImageStore> = Arc::new(LocalImageStore::new(
            config.images.root.clone(),
            config.images.dir.clone(),
        ));

        let state = match Self::postgres(config, images.clone()).await {
            Some(state) => state,
            None => Self::in_memory(images, config.images.max_bytes),
        };

        tracing::info!(storage = state.storage, "Application state initialized");
        state
    }

    /// State backed by the in-memory repositories.
    pub fn in_memory(images: Arc<dyn ImageStore>, max_image_bytes: usize) -> Self {
        let store = InMemoryStore::new();
        Self {
            users: Arc::new(store.users()),
            posts: PostService::new(Arc::new(store.posts()), images),
            max_image_bytes,
            storage: "memory",
        }
    }

    #[cfg(feature = "postgres")]
    async fn postgres(config: &AppConfig, images: Arc<dyn ImageStore>) -> Option<Self> {
        use feed_infra::database::connect;

        let Some(db_config) = config.database.as_ref() else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return None;
        };

        let conn = match connect(db_config).await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                return None;
            }
        };

        Self::with_connection(conn, config, images).await
    }

    /// Postgres-backed state over an open connection. `None` when the
    /// requested migrations fail, since the schema cannot be trusted then.
    #[cfg(feature = "postgres")]
    async fn with_connection(
        conn: sea_orm::DatabaseConnection,
        config: &AppConfig,
        images: Arc<dyn ImageStore>,
    ) -> Option<Self> {
        use feed_infra::{PostgresPostRepository, PostgresUserRepository};
        use migration::{Migrator, MigratorTrait};

        if config.run_migrations {
            match Migrator::up(&conn, None).await {
                Ok(()) => tracing::info!("Migrations applied"),
                Err(e) => {
                    tracing::error!(
                        "Failed to apply migrations: {}. Using in-memory fallback.",
                        e
                    );
                    return None;
                }
            }
        }

        Some(Self {
            users: Arc::new(PostgresUserRepository::new(conn.clone())),
            posts: PostService::new(Arc::new(PostgresPostRepository::new(conn)), images),
            max_image_bytes: config.images.max_bytes,
            storage: "postgres",
        })
    }

    #[cfg(not(feature = "postgres"))]
    async fn postgres(_config: &AppConfig, _images: Arc<dyn ImageStore>) -> Option<Self> {
        tracing::info!("Running without postgres feature - using in-memory repositories");
        None
    }
}
