use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CatalogRepository, ProductFilter};
use crate::{
    dto::products::{CreateProductRequest, UpdateProductRequest},
    error::AppResult,
    models::Product,
};

/// In-memory catalog. Serves placeholder products when the service is started with
/// `CATALOG_BACKEND=sample`; writes only live until the process exits.
#[derive(Default)]
pub struct SampleCatalog {
    products: RwLock<Vec<Product>>,
}

impl SampleCatalog {
    pub fn new() -> Self {
        Self::with_products(placeholder_products())
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
        }
    }
}

fn placeholder_products() -> Vec<Product> {
    let now = Utc::now();
    [
        (
            "Sample Product 1",
            "Placeholder product shown while the document store is unavailable.",
            9_999,
            10,
        ),
        (
            "Sample Product 2",
            "Check the document store connection settings to see the real catalog.",
            14_999,
            5,
        ),
    ]
    .into_iter()
    .map(|(name, description, price, stock)| Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: description.to_string(),
        price,
        stock,
        image_url: Some("https://via.placeholder.com/150".to_string()),
        category: Some("Sample".to_string()),
        features: vec!["Feature 1".to_string(), "Feature 2".to_string()],
        ratings: Vec::new(),
        average_rating: 0.0,
        created_at: now,
        updated_at: now,
    })
    .collect()
}

fn matches(product: &Product, filter: &ProductFilter) -> bool {
    let name_ok = filter
        .q
        .as_ref()
        .filter(|q| !q.is_empty())
        .is_none_or(|q| product.name.contains(q.as_str()));
    let category_ok = filter
        .category
        .as_ref()
        .filter(|c| !c.is_empty())
        .is_none_or(|c| product.category.as_deref() == Some(c.as_str()));
    name_ok && category_ok
}

#[async_trait]
impl CatalogRepository for SampleCatalog {
    fn backend_tag(&self) -> &'static str {
        "sample"
    }

    async fn list(&self, filter: &ProductFilter) -> AppResult<(Vec<Product>, i64)> {
        let products = self.products.read().await;
        let mut matching: Vec<&Product> = products.iter().filter(|p| matches(p, filter)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<Product>> {
        let products = self.products.read().await;
        Ok(products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn create(&self, payload: &CreateProductRequest) -> AppResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: payload.name.trim().to_string(),
            description: payload.description.clone(),
            price: payload.price.unwrap_or_default(),
            stock: payload.stock.unwrap_or_default(),
            image_url: payload.image_url.clone(),
            category: payload.category.clone(),
            features: payload.features.clone(),
            ratings: Vec::new(),
            average_rating: 0.0,
            created_at: now,
            updated_at: now,
        };
        self.products.write().await.push(product.clone());
        Ok(product)
    }

    async fn update(&self, id: Uuid, payload: &UpdateProductRequest) -> AppResult<Option<Product>> {
        let mut products = self.products.write().await;
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(name) = &payload.name {
            product.name = name.trim().to_string();
        }
        if let Some(description) = &payload.description {
            product.description = description.clone();
        }
        if let Some(price) = payload.price {
            product.price = price;
        }
        if let Some(stock) = payload.stock {
            product.stock = stock;
        }
        if let Some(image_url) = &payload.image_url {
            product.image_url = Some(image_url.clone());
        }
        if let Some(category) = &payload.category {
            product.category = Some(category.clone());
        }
        if let Some(features) = &payload.features {
            product.features = features.clone();
        }
        product.updated_at = Utc::now();

        Ok(Some(product.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| p.id != id);
        Ok(products.len() < before)
    }

    async fn take_stock(&self, id: Uuid, quantity: i32) -> AppResult<bool> {
        let mut products = self.products.write().await;
        match products.iter_mut().find(|p| p.id == id) {
            Some(product) if product.stock >= quantity => {
                product.stock -= quantity;
                product.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn restore_stock(&self, id: Uuid, quantity: i32) -> AppResult<()> {
        let mut products = self.products.write().await;
        if let Some(product) = products.iter_mut().find(|p| p.id == id) {
            product.stock += quantity;
            product.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(limit: u64) -> ProductFilter {
        ProductFilter {
            limit,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn placeholder_catalog_lists_two_products() {
        let catalog = SampleCatalog::new();
        let (items, total) = catalog.list(&page(20)).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|p| p.category.as_deref() == Some("Sample")));
    }

    #[tokio::test]
    async fn take_stock_never_goes_negative() {
        let catalog = SampleCatalog::new();
        let (items, _) = catalog.list(&page(1)).await.unwrap();
        let product = &items[0];

        assert!(!catalog.take_stock(product.id, product.stock + 1).await.unwrap());
        assert!(catalog.take_stock(product.id, product.stock).await.unwrap());

        let after = catalog.find(product.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 0);

        catalog.restore_stock(product.id, 3).await.unwrap();
        assert_eq!(catalog.find(product.id).await.unwrap().unwrap().stock, 3);
    }

    #[tokio::test]
    async fn name_filter_and_paging_apply() {
        let catalog = SampleCatalog::new();
        let filter = ProductFilter {
            q: Some("Product 2".into()),
            limit: 10,
            ..Default::default()
        };
        let (items, total) = catalog.list(&filter).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(items[0].name, "Sample Product 2");

        let (items, total) = catalog.list(&page(1)).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(items.len(), 1);
    }
}
