use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Option<i64>,
    pub stock: Option<i32>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i32>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub features: Option<Vec<String>>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

/// Supplier listing. `notice` is set when the placeholder catalog is being served.
#[derive(Serialize, ToSchema)]
pub struct SupplierProductList {
    pub products: Vec<Product>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SupplyLine {
    pub id: Uuid,
    pub name: String,
    pub stock: i32,
}

/// Supplier landing data: stock levels, lowest first.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupplierOverview {
    pub supplies: Vec<SupplyLine>,
    pub product_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}
