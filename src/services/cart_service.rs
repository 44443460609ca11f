use uuid::Uuid;

use crate::{
    dto::cart::{RemoveCartItemQuery, UpsertCartItemRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartItem},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// A user without a stored cart sees an empty one; nothing is written.
pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let cart = state
        .carts
        .find(user.user_id)
        .await?
        .unwrap_or_else(|| Cart::empty(user.user_id));
    Ok(ApiResponse::success("OK", cart, Some(Meta::empty())))
}

fn validate_line(payload: UpsertCartItemRequest) -> AppResult<CartItem> {
    let product_id = payload
        .product_id
        .ok_or_else(|| AppError::BadRequest("productId is required".to_string()))?;
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }
    let price = match payload.price {
        Some(p) if p >= 0 => p,
        Some(_) => return Err(AppError::BadRequest("price must not be negative".to_string())),
        None => return Err(AppError::BadRequest("price is required".to_string())),
    };
    let quantity = match payload.quantity {
        Some(q) if q >= 1 => q,
        _ => {
            return Err(AppError::BadRequest(
                "quantity must be at least 1".to_string(),
            ));
        }
    };

    Ok(CartItem {
        product_id,
        name: name.to_string(),
        price,
        quantity,
        image_url: payload.image_url.filter(|url| !url.trim().is_empty()),
    })
}

/// Sets the line for `productId` to the given quantity, adding it if absent.
pub async fn upsert_item(
    state: &AppState,
    user: &AuthUser,
    payload: UpsertCartItemRequest,
) -> AppResult<ApiResponse<Cart>> {
    let line = validate_line(payload)?;

    let mut cart = state
        .carts
        .find(user.user_id)
        .await?
        .unwrap_or_else(|| Cart::empty(user.user_id));

    match cart
        .items
        .iter_mut()
        .find(|item| item.product_id == line.product_id)
    {
        Some(existing) => existing.quantity = line.quantity,
        None => cart.items.push(line),
    }
    cart.recompute_total()?;

    let cart = state.carts.save(&cart).await?;
    Ok(ApiResponse::success("Cart updated", cart, Some(Meta::empty())))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    query: RemoveCartItemQuery,
) -> AppResult<ApiResponse<Cart>> {
    let product_id: Uuid = query
        .product_id
        .ok_or_else(|| AppError::BadRequest("productId is required".to_string()))?;

    let mut cart = state
        .carts
        .find(user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    cart.items.retain(|item| item.product_id != product_id);
    cart.recompute_total()?;

    let cart = state.carts.save(&cart).await?;
    Ok(ApiResponse::success("Item removed", cart, Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> UpsertCartItemRequest {
        UpsertCartItemRequest {
            product_id: Some(Uuid::new_v4()),
            name: "Mug".into(),
            price: Some(1200),
            quantity: Some(2),
            image_url: None,
        }
    }

    #[test]
    fn valid_line_passes() {
        let line = validate_line(request()).unwrap();
        assert_eq!(line.name, "Mug");
        assert_eq!(line.quantity, 2);
    }

    #[test]
    fn invalid_lines_are_rejected() {
        let blank_name = UpsertCartItemRequest {
            name: "  ".into(),
            ..request()
        };
        assert!(matches!(validate_line(blank_name), Err(AppError::BadRequest(_))));

        let negative_price = UpsertCartItemRequest {
            price: Some(-1),
            ..request()
        };
        assert!(matches!(validate_line(negative_price), Err(AppError::BadRequest(_))));

        let zero_quantity = UpsertCartItemRequest {
            quantity: Some(0),
            ..request()
        };
        assert!(matches!(validate_line(zero_quantity), Err(AppError::BadRequest(_))));
    }
}
