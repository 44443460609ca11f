use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::{Expr, OnConflict},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value as Json;
use uuid::Uuid;

use super::{CartRepository, CatalogRepository, OrderRepository, ProductFilter};
use crate::{
    dto::products::{CreateProductRequest, UpdateProductRequest},
    entity::{
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    models::{Cart, Order, Product},
};

/// Products, carts and orders kept as documents in the document database.
#[derive(Clone)]
pub struct DocumentStore {
    conn: DatabaseConnection,
}

impl DocumentStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

fn now() -> DateTime<FixedOffset> {
    Utc::now().into()
}

fn to_json<T: Serialize>(value: &T) -> AppResult<Json> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.into()))
}

fn from_json<T: DeserializeOwned>(value: Json, field: &str) -> AppResult<T> {
    serde_json::from_value(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("corrupt `{field}` document: {e}")))
}

fn product_from_entity(model: ProductModel) -> AppResult<Product> {
    Ok(Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        stock: model.stock,
        image_url: model.image_url,
        category: model.category,
        features: from_json(model.features, "features")?,
        ratings: from_json(model.ratings, "ratings")?,
        average_rating: model.average_rating,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn cart_from_entity(model: CartModel) -> AppResult<Cart> {
    Ok(Cart {
        user_id: model.user_id,
        items: from_json(model.items, "items")?,
        total_price: model.total_price,
    })
}

fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        user_id: model.user_id,
        order_items: from_json(model.order_items, "order_items")?,
        shipping_address: from_json(model.shipping_address, "shipping_address")?,
        payment_method: model.payment_method,
        shipping_cost: model.shipping_cost,
        total_price: model.total_price,
        is_paid: model.is_paid,
        paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
        is_delivered: model.is_delivered,
        delivered_at: model.delivered_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

#[async_trait]
impl CatalogRepository for DocumentStore {
    fn backend_tag(&self) -> &'static str {
        "document"
    }

    async fn list(&self, filter: &ProductFilter) -> AppResult<(Vec<Product>, i64)> {
        let mut condition = Condition::all();
        if let Some(q) = filter.q.as_ref().filter(|s| !s.is_empty()) {
            condition = condition.add(ProdCol::Name.contains(q.as_str()));
        }
        if let Some(category) = filter.category.as_ref().filter(|s| !s.is_empty()) {
            condition = condition.add(ProdCol::Category.eq(category.as_str()));
        }

        let finder = Products::find()
            .filter(condition)
            .order_by_desc(ProdCol::CreatedAt);

        let total = finder.clone().count(&self.conn).await? as i64;

        let items = finder
            .limit(filter.limit)
            .offset(filter.offset)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(product_from_entity)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((items, total))
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<Product>> {
        Products::find_by_id(id)
            .one(&self.conn)
            .await?
            .map(product_from_entity)
            .transpose()
    }

    async fn find_many(&self, ids: &[Uuid]) -> AppResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Products::find()
            .filter(ProdCol::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(product_from_entity)
            .collect()
    }

    async fn create(&self, payload: &CreateProductRequest) -> AppResult<Product> {
        let now = now();
        let product = ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(payload.name.trim().to_string()),
            description: Set(payload.description.clone()),
            price: Set(payload.price.unwrap_or_default()),
            stock: Set(payload.stock.unwrap_or_default()),
            image_url: Set(payload.image_url.clone()),
            category: Set(payload.category.clone()),
            features: Set(to_json(&payload.features)?),
            ratings: Set(Json::Array(Vec::new())),
            average_rating: Set(0.0),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.conn)
        .await?;

        product_from_entity(product)
    }

    async fn update(&self, id: Uuid, payload: &UpdateProductRequest) -> AppResult<Option<Product>> {
        let Some(existing) = Products::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: ProductActive = existing.into();
        if let Some(name) = &payload.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(description) = &payload.description {
            active.description = Set(description.clone());
        }
        if let Some(price) = payload.price {
            active.price = Set(price);
        }
        if let Some(stock) = payload.stock {
            active.stock = Set(stock);
        }
        if let Some(image_url) = &payload.image_url {
            active.image_url = Set(Some(image_url.clone()));
        }
        if let Some(category) = &payload.category {
            active.category = Set(Some(category.clone()));
        }
        if let Some(features) = &payload.features {
            active.features = Set(to_json(features)?);
        }
        active.updated_at = Set(now());

        let product = active.update(&self.conn).await?;
        product_from_entity(product).map(Some)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = Products::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    async fn take_stock(&self, id: Uuid, quantity: i32) -> AppResult<bool> {
        let result = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(quantity))
            .col_expr(ProdCol::UpdatedAt, Expr::value(now()))
            .filter(ProdCol::Id.eq(id))
            .filter(ProdCol::Stock.gte(quantity))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn restore_stock(&self, id: Uuid, quantity: i32) -> AppResult<()> {
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(quantity))
            .col_expr(ProdCol::UpdatedAt, Expr::value(now()))
            .filter(ProdCol::Id.eq(id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CartRepository for DocumentStore {
    async fn find(&self, user_id: Uuid) -> AppResult<Option<Cart>> {
        Carts::find_by_id(user_id)
            .one(&self.conn)
            .await?
            .map(cart_from_entity)
            .transpose()
    }

    async fn save(&self, cart: &Cart) -> AppResult<Cart> {
        let now = now();
        let row = CartActive {
            user_id: Set(cart.user_id),
            items: Set(to_json(&cart.items)?),
            total_price: Set(cart.total_price),
            created_at: Set(now),
            updated_at: Set(now),
        };

        // Single upsert so two first writes for the same user cannot collide on the key.
        Carts::insert(row)
            .on_conflict(
                OnConflict::column(CartCol::UserId)
                    .update_columns([CartCol::Items, CartCol::TotalPrice, CartCol::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(cart.clone())
    }

    async fn clear(&self, user_id: Uuid) -> AppResult<()> {
        Carts::update_many()
            .col_expr(CartCol::Items, Expr::value(Json::Array(Vec::new())))
            .col_expr(CartCol::TotalPrice, Expr::value(0_i64))
            .col_expr(CartCol::UpdatedAt, Expr::value(now()))
            .filter(CartCol::UserId.eq(user_id))
            .exec(&self.conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for DocumentStore {
    async fn create(&self, order: &Order) -> AppResult<Order> {
        let model = OrderActive {
            id: Set(order.id),
            user_id: Set(order.user_id),
            order_items: Set(to_json(&order.order_items)?),
            shipping_address: Set(to_json(&order.shipping_address)?),
            payment_method: Set(order.payment_method.clone()),
            shipping_cost: Set(order.shipping_cost),
            total_price: Set(order.total_price),
            is_paid: Set(order.is_paid),
            paid_at: Set(order.paid_at.map(Into::into)),
            is_delivered: Set(order.is_delivered),
            delivered_at: Set(order.delivered_at.map(Into::into)),
            created_at: Set(order.created_at.into()),
            updated_at: Set(order.updated_at.into()),
        }
        .insert(&self.conn)
        .await?;

        order_from_entity(model)
    }

    async fn list_for_user(&self, user_id: Uuid, limit: u64, offset: u64) -> AppResult<(Vec<Order>, i64)> {
        let finder = Orders::find()
            .filter(OrderCol::UserId.eq(user_id))
            .order_by_desc(OrderCol::CreatedAt);

        let total = finder.clone().count(&self.conn).await? as i64;

        let orders = finder
            .limit(limit)
            .offset(offset)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(order_from_entity)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((orders, total))
    }

    async fn find_for_user(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<Order>> {
        Orders::find()
            .filter(
                Condition::all()
                    .add(OrderCol::UserId.eq(user_id))
                    .add(OrderCol::Id.eq(id)),
            )
            .one(&self.conn)
            .await?
            .map(order_from_entity)
            .transpose()
    }
}
