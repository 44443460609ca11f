use std::env;

use anyhow::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogBackend {
    /// Products are read from and written to the document store.
    Document,
    /// In-memory placeholder catalog, used when the document store is not reachable.
    Sample,
}

impl CatalogBackend {
    fn parse(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "document" => Ok(CatalogBackend::Document),
            "sample" => Ok(CatalogBackend::Sample),
            other => anyhow::bail!("unknown CATALOG_BACKEND `{other}` (expected document or sample)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub document_database_url: String,
    pub db_max_connections: u32,
    pub catalog_backend: CatalogBackend,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub app_url: String,
    pub mail_from: String,
    pub smtp: Option<SmtpConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let document_database_url =
            env::var("DOCUMENT_DATABASE_URL").unwrap_or_else(|_| database_url.clone());
        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|n| n.parse::<u32>().ok())
            .unwrap_or(5);
        let catalog_backend = match env::var("CATALOG_BACKEND") {
            Ok(value) => CatalogBackend::parse(&value)?,
            Err(_) => CatalogBackend::Document,
        };
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let app_url = env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let mail_from =
            env::var("MAIL_FROM").unwrap_or_else(|_| "Storefront <no-reply@storefront.local>".to_string());
        let smtp = env::var("SMTP_HOST").ok().map(|host| SmtpConfig {
            host,
            username: env::var("SMTP_USERNAME").ok(),
            password: env::var("SMTP_PASSWORD").ok(),
        });

        Ok(Self {
            database_url,
            document_database_url,
            db_max_connections,
            catalog_backend,
            jwt_secret,
            host,
            port,
            app_url,
            mail_from,
            smtp,
        })
    }
}
