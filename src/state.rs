use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    mailer::Mailer,
    repository::{CartRepository, CatalogRepository, OrderRepository},
    services::token_service::TokenIssuer,
};

#[derive(Clone)]
pub struct AppState {
    /// Relational store: users and reset tokens.
    pub orm: DatabaseConnection,
    pub catalog: Arc<dyn CatalogRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub mailer: Arc<dyn Mailer>,
    pub tokens: TokenIssuer,
    /// Public base URL used to build links in outgoing mail.
    pub app_url: String,
}
