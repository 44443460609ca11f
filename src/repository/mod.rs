//! Storage seams for the document store.
//!
//! Products, carts and orders are reached through these traits so the catalog can be
//! served from placeholder data and tests can swap in their own backends. The adapter
//! is picked from configuration at startup.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    dto::products::{CreateProductRequest, UpdateProductRequest},
    error::AppResult,
    models::{Cart, Order, Product},
};

pub mod document;
pub mod sample;

pub use document::DocumentStore;
pub use sample::SampleCatalog;

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-sensitive substring of the product name.
    pub q: Option<String>,
    pub category: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    /// Returns one page of products and the total number of matches.
    async fn list(&self, filter: &ProductFilter) -> AppResult<(Vec<Product>, i64)>;

    async fn find(&self, id: Uuid) -> AppResult<Option<Product>>;

    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<Product>>;

    async fn create(&self, payload: &CreateProductRequest) -> AppResult<Product>;

    async fn update(&self, id: Uuid, payload: &UpdateProductRequest) -> AppResult<Option<Product>>;

    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Decrements stock only when at least `quantity` units remain.
    /// Returns `false` and leaves the product untouched otherwise.
    async fn take_stock(&self, id: Uuid, quantity: i32) -> AppResult<bool>;

    async fn restore_stock(&self, id: Uuid, quantity: i32) -> AppResult<()>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn find(&self, user_id: Uuid) -> AppResult<Option<Cart>>;

    /// Inserts or replaces the user's cart document.
    async fn save(&self, cart: &Cart) -> AppResult<Cart>;

    /// Empties the cart but keeps the document. No-op when the user has none.
    async fn clear(&self, user_id: Uuid) -> AppResult<()>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create(&self, order: &Order) -> AppResult<Order>;

    /// Newest first, with the total count for the user.
    async fn list_for_user(&self, user_id: Uuid, limit: u64, offset: u64) -> AppResult<(Vec<Order>, i64)>;

    async fn find_for_user(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<Order>>;
}
