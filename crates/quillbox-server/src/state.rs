use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{config::Config, token::TokenService};

pub struct AppState {
    pub config: Config,
    pub db: DatabaseConnection,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(config: Config, db: DatabaseConnection) -> Arc<Self> {
        let tokens = TokenService::new(config.auth_secret.clone(), config.token_ttl_secs);

        Arc::new(Self { config, db, tokens })
    }
}
