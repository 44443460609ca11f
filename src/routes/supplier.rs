//! Catalog management. Every handler here is restricted to suppliers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::products::{CreateProductRequest, SupplierOverview, SupplierProductList, UpdateProductRequest},
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    middleware::auth::AuthUser,
    models::Product,
    response::ApiResponse,
    routes::params::Pagination,
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(overview))
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", put(update_product).delete(delete_product))
}

#[utoipa::path(
    get,
    path = "/api/supplier",
    responses(
        (status = 200, description = "Stock levels, lowest first", body = ApiResponse<SupplierOverview>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Supplier role required")
    ),
    security(("bearer_auth" = [])),
    tag = "Supplier"
)]
pub async fn overview(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SupplierOverview>>> {
    let resp = product_service::supplier_overview(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/supplier/products",
    operation_id = "supplier_list_products",
    params(Pagination),
    responses(
        (status = 200, description = "All products, with a notice when sample data is served", body = ApiResponse<SupplierProductList>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Supplier role required")
    ),
    security(("bearer_auth" = [])),
    tag = "Supplier"
)]
pub async fn list_products(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(pagination): AppQuery<Pagination>,
) -> AppResult<Json<ApiResponse<SupplierProductList>>> {
    let resp = product_service::list_supplier_products(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/supplier/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<Product>),
        (status = 400, description = "Invalid fields"),
        (status = 403, description = "Supplier role required")
    ),
    security(("bearer_auth" = [])),
    tag = "Supplier"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let resp = product_service::create_product(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/supplier/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<Product>),
        (status = 400, description = "Invalid fields"),
        (status = 403, description = "Supplier role required"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Supplier"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::update_product(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/supplier/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Supplier role required"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Supplier"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_product(&state, &user, id).await?;
    Ok(Json(resp))
}
