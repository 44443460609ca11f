//! Checkout and order history.
//!
//! Checkout spans the catalog, the order store and the cart store, which share no
//! transaction. Stock is taken with a guarded decrement per line and every decrement is
//! handed back if a later step fails before the order exists.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    dto::orders::{CheckoutItem, CheckoutRequest, CustomerOverview, OrderList},
    entity::users::Entity as Users,
    error::{AppError, AppResult},
    mailer::order_confirmation_email,
    middleware::auth::{AuthUser, ensure_role},
    models::{Cart, Order, OrderItem, Product, Role, ShippingAddress, line_total},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub const PAYMENT_METHOD: &str = "Credit Card";
const FALLBACK_CUSTOMER_NAME: &str = "Valued Customer";

fn placeholder_address() -> ShippingAddress {
    ShippingAddress {
        address: "Sample Street 1".to_string(),
        city: "Istanbul".to_string(),
        postal_code: "34000".to_string(),
        country: "Turkey".to_string(),
    }
}

fn validate_items(payload: &CheckoutRequest) -> AppResult<()> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("Cart cannot be empty".to_string()));
    }
    if payload.shipping_cost < 0 {
        return Err(AppError::BadRequest(
            "shippingCost must not be negative".to_string(),
        ));
    }
    for item in &payload.items {
        if item.quantity < 1 {
            return Err(AppError::BadRequest(format!(
                "quantity for {} must be at least 1",
                item.name
            )));
        }
        if item.price < 0 {
            return Err(AppError::BadRequest(format!(
                "price for {} must not be negative",
                item.name
            )));
        }
    }
    Ok(())
}

/// One message per line that cannot be served. Lines naming the same product draw
/// from the same remaining stock.
pub fn stock_problems(items: &[CheckoutItem], products: &[Product]) -> Vec<String> {
    let mut remaining: HashMap<Uuid, i32> =
        products.iter().map(|p| (p.id, p.stock)).collect();
    let mut problems = Vec::new();

    for item in items {
        let Some(available) = remaining.get_mut(&item.product_id) else {
            problems.push(format!("Product not found: {}", item.name));
            continue;
        };
        if *available < item.quantity {
            problems.push(format!(
                "Insufficient stock for {}. Available: {}, requested: {}",
                item.name, available, item.quantity
            ));
            continue;
        }
        *available -= item.quantity;
    }
    problems
}

fn order_total(items: &[CheckoutItem], shipping_cost: i64) -> AppResult<i64> {
    line_total(items.iter().map(|item| (item.price, item.quantity)))
        .and_then(|subtotal| subtotal.checked_add(shipping_cost))
        .ok_or_else(|| AppError::BadRequest("order total is out of range".to_string()))
}

async fn restore_taken(state: &AppState, taken: &[(Uuid, i32)]) {
    for (product_id, quantity) in taken.iter().rev() {
        if let Err(err) = state.catalog.restore_stock(*product_id, *quantity).await {
            tracing::error!(
                error = %err,
                product_id = %product_id,
                quantity,
                "failed to restore stock after aborted checkout"
            );
        }
    }
}

async fn take_all(state: &AppState, items: &[CheckoutItem]) -> AppResult<Vec<(Uuid, i32)>> {
    let mut taken = Vec::with_capacity(items.len());
    for item in items {
        match state.catalog.take_stock(item.product_id, item.quantity).await {
            Ok(true) => taken.push((item.product_id, item.quantity)),
            Ok(false) => {
                restore_taken(state, &taken).await;
                let problem = match state.catalog.find(item.product_id).await {
                    Ok(Some(product)) => format!(
                        "Insufficient stock for {}. Available: {}, requested: {}",
                        item.name, product.stock, item.quantity
                    ),
                    _ => format!("Product not found: {}", item.name),
                };
                tracing::warn!(product_id = %item.product_id, "stock taken by a concurrent checkout");
                return Err(AppError::StockProblems(vec![problem]));
            }
            Err(err) => {
                restore_taken(state, &taken).await;
                return Err(err);
            }
        }
    }
    Ok(taken)
}

fn send_confirmation(state: &AppState, user: &AuthUser, order: &Order) {
    let orm = state.orm.clone();
    let mailer = state.mailer.clone();
    let user = user.clone();
    let order = order.clone();

    tokio::spawn(async move {
        let name = match Users::find_by_id(user.user_id).one(&orm).await {
            Ok(Some(row)) if !row.name.trim().is_empty() => row.name,
            _ => FALLBACK_CUSTOMER_NAME.to_string(),
        };
        let email = order_confirmation_email(&user.email, &name, &order);
        if let Err(err) = mailer.send(email).await {
            tracing::warn!(error = %err, order_id = %order.id, "order confirmation mail failed");
        }
    });
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<Order>> {
    validate_items(&payload)?;

    let mut ids: Vec<Uuid> = payload.items.iter().map(|item| item.product_id).collect();
    ids.sort_unstable();
    ids.dedup();
    let products = state.catalog.find_many(&ids).await?;

    let problems = stock_problems(&payload.items, &products);
    if !problems.is_empty() {
        return Err(AppError::StockProblems(problems));
    }

    let total_price = order_total(&payload.items, payload.shipping_cost)?;
    if let Some(client_total) = payload.total_price.filter(|t| *t != total_price) {
        tracing::warn!(client_total, total_price, "client total differs, using computed total");
    }

    let taken = take_all(state, &payload.items).await?;

    let now = Utc::now();
    let order = Order {
        id: Uuid::new_v4(),
        user_id: user.user_id,
        order_items: payload
            .items
            .iter()
            .map(|item| OrderItem {
                product_id: item.product_id,
                name: item.name.clone(),
                price: item.price,
                quantity: item.quantity,
            })
            .collect(),
        shipping_address: placeholder_address(),
        payment_method: PAYMENT_METHOD.to_string(),
        shipping_cost: payload.shipping_cost,
        total_price,
        is_paid: true,
        paid_at: Some(now),
        is_delivered: false,
        delivered_at: None,
        created_at: now,
        updated_at: now,
    };

    let order = match state.orders.create(&order).await {
        Ok(order) => order,
        Err(err) => {
            restore_taken(state, &taken).await;
            return Err(err);
        }
    };

    if let Err(err) = state.carts.clear(user.user_id).await {
        tracing::error!(error = %err, order_id = %order.id, "order placed but cart was not cleared");
    }

    tracing::info!(order_id = %order.id, user_id = %user.user_id, total_price, "order placed");
    send_confirmation(state, user, &order);

    Ok(ApiResponse::success("Order placed", order, Some(Meta::empty())))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = pagination.normalize();
    let (items, total) = state
        .orders
        .list_for_user(user.user_id, limit as u64, offset as u64)
        .await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = state
        .orders
        .find_for_user(user.user_id, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("OK", order, Some(Meta::empty())))
}

const RECENT_ORDERS: u64 = 5;

pub async fn customer_overview(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CustomerOverview>> {
    ensure_role(user, &[Role::Customer])?;

    let (recent_orders, order_count) = state
        .orders
        .list_for_user(user.user_id, RECENT_ORDERS, 0)
        .await?;
    let cart = state
        .carts
        .find(user.user_id)
        .await?
        .unwrap_or_else(|| Cart::empty(user.user_id));

    Ok(ApiResponse::success(
        "Welcome back",
        CustomerOverview {
            recent_orders,
            order_count,
            cart,
        },
        Some(Meta::empty()),
    ))
}
