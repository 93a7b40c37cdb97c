mod forum;
pub mod memory;
mod message;
pub mod postgres;
mod relationship;
mod search;
mod user;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::info;

use abi::config::{Config, StorageBackend};
use abi::errors::Result;

pub use crate::forum::ForumRepo;
pub use crate::message::MessageRepo;
pub use crate::relationship::RelationshipRepo;
pub use crate::search::{LazyUsers, UserFilter, UserQuery, UserSearchRepo, UserSearchService};
pub use crate::user::UserRepo;

/// hold every repository the application needs, behind its trait
#[derive(Clone, Debug)]
pub struct DbRepo {
    pub relationship: Arc<dyn RelationshipRepo>,
    pub user: Arc<dyn UserRepo>,
    pub user_search: Arc<dyn UserSearchRepo>,
    pub forum: Arc<dyn ForumRepo>,
    pub message: Arc<dyn MessageRepo>,
}

impl DbRepo {
    pub async fn new(config: &Config) -> Result<Self> {
        match config.db.backend {
            StorageBackend::Memory => {
                info!("using in-memory storage");
                Ok(Self::memory())
            }
            StorageBackend::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.db.postgres.max_connections)
                    .connect(&config.db.postgres.url())
                    .await?;
                sqlx::migrate!("./migrations").run(&pool).await?;
                info!(
                    "connected to postgres {}:{}/{}",
                    config.db.postgres.host, config.db.postgres.port, config.db.postgres.database
                );
                Ok(Self::postgres(pool))
            }
        }
    }

    pub fn memory() -> Self {
        let user = Arc::new(memory::MemoryUser::new());
        Self {
            relationship: Arc::new(memory::MemoryRelationship::new()),
            user: user.clone(),
            user_search: user,
            forum: Arc::new(memory::MemoryForum::new()),
            message: Arc::new(memory::MemoryMessage::new()),
        }
    }

    pub fn postgres(pool: sqlx::PgPool) -> Self {
        let user = Arc::new(postgres::PostgresUser::new(pool.clone()));
        Self {
            relationship: Arc::new(postgres::PostgresRelationship::new(pool.clone())),
            user: user.clone(),
            user_search: user,
            forum: Arc::new(postgres::PostgresForum::new(pool.clone())),
            message: Arc::new(postgres::PostgresMessage::new(pool)),
        }
    }
}
