#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sea_orm::{Database, DatabaseConnection};
use storefront_api::{
    db::{create_document_schema, create_relational_schema},
    dto::auth::RegisterRequest,
    mailer::{Email, Mailer},
    middleware::auth::AuthUser,
    models::{Product, Role},
    repository::{CatalogRepository, DocumentStore},
    dto::products::CreateProductRequest,
    services::{auth_service, token_service::TokenIssuer},
    state::AppState,
};

pub const TEST_SECRET: &str = "test-secret";

/// Keeps every message instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: Email) -> anyhow::Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow::anyhow!("mailer poisoned"))?
            .push(email);
        Ok(())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
    pub documents: DocumentStore,
    pub orm: DatabaseConnection,
}

/// Two in-memory SQLite databases standing in for the relational and document stores.
pub async fn test_app() -> anyhow::Result<TestApp> {
    let orm = Database::connect("sqlite::memory:").await?;
    create_relational_schema(&orm).await?;
    let documents_conn = Database::connect("sqlite::memory:").await?;
    create_document_schema(&documents_conn).await?;

    let documents = DocumentStore::new(documents_conn);
    let mailer = Arc::new(RecordingMailer::default());

    let state = AppState {
        orm: orm.clone(),
        catalog: Arc::new(documents.clone()),
        carts: Arc::new(documents.clone()),
        orders: Arc::new(documents.clone()),
        mailer: mailer.clone(),
        tokens: TokenIssuer::new(TEST_SECRET),
        app_url: "http://shop.test".to_string(),
    };

    Ok(TestApp {
        state,
        mailer,
        documents,
        orm,
    })
}

pub async fn register(
    state: &AppState,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<(AuthUser, String)> {
    let resp = auth_service::register_user(
        state,
        RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: Some(role.as_str().to_string()),
        },
    )
    .await?;
    let data = resp.data.ok_or_else(|| anyhow::anyhow!("missing data"))?;
    let auth = AuthUser {
        user_id: data.user.id,
        email: data.user.email,
        role: data.user.role,
    };
    Ok((auth, data.token))
}

pub async fn product(
    catalog: &dyn CatalogRepository,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<Product> {
    let product = catalog
        .create(&CreateProductRequest {
            name: name.to_string(),
            description: format!("{name} description"),
            price: Some(price),
            stock: Some(stock),
            ..CreateProductRequest::default()
        })
        .await?;
    Ok(product)
}

/// Waits for background mail tasks to deliver at least `count` messages.
pub async fn wait_for_mail(mailer: &RecordingMailer, count: usize) -> Vec<Email> {
    for _ in 0..200 {
        let sent = mailer.sent();
        if sent.len() >= count {
            return sent;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    mailer.sent()
}
