use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    #[sea_orm(string_value = "customer")]
    Customer,
    #[sea_orm(string_value = "supplier")]
    Supplier,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Supplier => "supplier",
        }
    }
}

/// Public view of a user. The password hash never leaves the service layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub user_id: Uuid,
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Minor currency units.
    pub price: i64,
    pub stock: i32,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub features: Vec<String>,
    pub ratings: Vec<Rating>,
    pub average_rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cart line. Name and price are copied from the product when the line is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Checked `Σ price × quantity`.
pub fn line_total(lines: impl IntoIterator<Item = (i64, i32)>) -> Option<i64> {
    lines.into_iter().try_fold(0_i64, |acc, (price, quantity)| {
        price
            .checked_mul(i64::from(quantity))
            .and_then(|line| acc.checked_add(line))
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub user_id: Uuid,
    pub items: Vec<CartItem>,
    pub total_price: i64,
}

impl Cart {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            items: Vec::new(),
            total_price: 0,
        }
    }

    /// Sum of `price * quantity` over every line, `None` when it does not fit in `i64`.
    pub fn compute_total(items: &[CartItem]) -> Option<i64> {
        line_total(items.iter().map(|item| (item.price, item.quantity)))
    }

    pub fn recompute_total(&mut self) -> AppResult<()> {
        self.total_price = Self::compute_total(&self.items)
            .ok_or_else(|| AppError::BadRequest("cart total is out of range".to_string()))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub shipping_cost: i64,
    pub total_price: i64,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: i64, quantity: i32) -> CartItem {
        CartItem {
            product_id: Uuid::new_v4(),
            name: "line".into(),
            price,
            quantity,
            image_url: None,
        }
    }

    #[test]
    fn cart_total_sums_price_times_quantity() {
        let mut cart = Cart::empty(Uuid::new_v4());
        cart.items = vec![line(1000, 2), line(250, 3)];
        cart.recompute_total().unwrap();
        assert_eq!(cart.total_price, 2750);

        cart.items.clear();
        cart.recompute_total().unwrap();
        assert_eq!(cart.total_price, 0);
    }

    #[test]
    fn oversized_total_is_rejected_not_wrapped() {
        let mut cart = Cart::empty(Uuid::new_v4());
        cart.items = vec![line(i64::MAX / 2 + 1, 2)];
        assert!(matches!(cart.recompute_total(), Err(AppError::BadRequest(_))));
        assert_eq!(cart.total_price, 0);

        cart.items = vec![line(i64::MAX, 1), line(1, 1)];
        assert!(cart.recompute_total().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Supplier).unwrap(), "\"supplier\"");
        let role: Role = serde_json::from_str("\"customer\"").unwrap();
        assert_eq!(role, Role::Customer);
        assert!(serde_json::from_str::<Role>("\"admin\"").is_err());
    }
}
