use axum::{
    Json, Router,
    extract::State,
    routing::get,
};

use crate::{
    dto::cart::{RemoveCartItemQuery, UpsertCartItemRequest},
    error::AppResult,
    extract::{AppJson, AppQuery},
    middleware::auth::AuthUser,
    models::Cart,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_cart).post(upsert_item).delete(remove_item))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart of the current user, empty if none was saved", body = ApiResponse<Cart>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::get_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = UpsertCartItemRequest,
    responses(
        (status = 200, description = "Line added or its quantity replaced", body = ApiResponse<Cart>),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn upsert_item(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<UpsertCartItemRequest>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::upsert_item(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    params(RemoveCartItemQuery),
    responses(
        (status = 200, description = "Line removed", body = ApiResponse<Cart>),
        (status = 400, description = "productId missing"),
        (status = 404, description = "Cart not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(query): AppQuery<RemoveCartItemQuery>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::remove_item(&state, &user, query).await?;
    Ok(Json(resp))
}
