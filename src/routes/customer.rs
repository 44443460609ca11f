use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::orders::CustomerOverview,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(overview))
}

#[utoipa::path(
    get,
    path = "/api/customer",
    responses(
        (status = 200, description = "Recent orders and current cart", body = ApiResponse<CustomerOverview>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Customer role required")
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn overview(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CustomerOverview>>> {
    let resp = order_service::customer_overview(&state, &user).await?;
    Ok(Json(resp))
}
