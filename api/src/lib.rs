use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use abi::config::Config;
use abi::errors::Result;
use db::{DbRepo, UserSearchService};
use friendship::{FriendshipCoordinator, Messenger};

pub use crate::api_utils::custom_extract::AuthUser;
pub use crate::routes::app_routes;

mod api_utils;
pub(crate) mod handlers;
pub(crate) mod routes;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: DbRepo,
    pub coordinator: Arc<FriendshipCoordinator>,
    pub messenger: Messenger,
    pub search: UserSearchService,
    pub jwt_secret: String,
}

impl AppState {
    pub fn new(db: DbRepo, coordinator: Arc<FriendshipCoordinator>, config: &Config) -> Self {
        let search = UserSearchService::new(db.user_search.clone());
        let messenger = Messenger::new(db.relationship.clone(), db.user.clone(), db.message.clone());
        Self {
            db,
            coordinator,
            messenger,
            search,
            jwt_secret: config.server.jwt_secret.clone(),
        }
    }
}

pub async fn start(config: &Config, state: AppState) -> Result<()> {
    let app = routes::app_routes(state);
    let listener = tokio::net::TcpListener::bind(&config.server.server_url()).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
