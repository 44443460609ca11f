use uuid::Uuid;

use crate::{
    dto::products::{
        CreateProductRequest, ProductList, SupplierOverview, SupplierProductList, SupplyLine,
        UpdateProductRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_role, ensure_supplier},
    models::{Product, Role},
    repository::ProductFilter,
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ProductQuery},
    state::AppState,
};

pub const SAMPLE_CATALOG_NOTICE: &str =
    "Sample data is being shown because the catalog is running without its document store";

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn validate_create(payload: &CreateProductRequest) -> AppResult<()> {
    if payload.name.trim().is_empty() || payload.description.trim().is_empty() {
        return Err(AppError::BadRequest(
            "name and description are required".to_string(),
        ));
    }
    match payload.price {
        None => return Err(AppError::BadRequest("price is required".to_string())),
        Some(p) if p < 0 => {
            return Err(AppError::BadRequest("price must not be negative".to_string()));
        }
        Some(_) => {}
    }
    if payload.stock.is_some_and(|s| s < 0) {
        return Err(AppError::BadRequest("stock must not be negative".to_string()));
    }
    Ok(())
}

fn validate_update(payload: &UpdateProductRequest) -> AppResult<()> {
    if payload.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }
    if payload
        .description
        .as_deref()
        .is_some_and(|d| d.trim().is_empty())
    {
        return Err(AppError::BadRequest(
            "description must not be empty".to_string(),
        ));
    }
    if payload.price.is_some_and(|p| p < 0) {
        return Err(AppError::BadRequest("price must not be negative".to_string()));
    }
    if payload.stock.is_some_and(|s| s < 0) {
        return Err(AppError::BadRequest("stock must not be negative".to_string()));
    }
    Ok(())
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let filter = ProductFilter {
        q: clean(query.q.as_deref()),
        category: clean(query.category.as_deref()),
        limit: limit as u64,
        offset: offset as u64,
    };

    let (items, total) = state.catalog.list(&filter).await?;
    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = state.catalog.find(id).await?.ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("OK", product, None))
}

pub async fn list_supplier_products(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<SupplierProductList>> {
    ensure_supplier(user)?;
    let (page, limit, offset) = pagination.normalize();
    let filter = ProductFilter {
        limit: limit as u64,
        offset: offset as u64,
        ..ProductFilter::default()
    };

    let (products, total) = state.catalog.list(&filter).await?;
    let notice = (state.catalog.backend_tag() == "sample").then(|| SAMPLE_CATALOG_NOTICE.to_string());

    Ok(ApiResponse::success(
        "Products",
        SupplierProductList { products, notice },
        Some(Meta::new(page, limit, total)),
    ))
}

const OVERVIEW_SCAN_LIMIT: u64 = 100;
const OVERVIEW_LINES: usize = 10;

pub async fn supplier_overview(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<SupplierOverview>> {
    ensure_role(user, &[Role::Supplier])?;

    let (products, product_count) = state
        .catalog
        .list(&ProductFilter {
            limit: OVERVIEW_SCAN_LIMIT,
            ..ProductFilter::default()
        })
        .await?;

    let mut supplies: Vec<SupplyLine> = products
        .into_iter()
        .map(|p| SupplyLine {
            id: p.id,
            name: p.name,
            stock: p.stock,
        })
        .collect();
    supplies.sort_by_key(|line| line.stock);
    supplies.truncate(OVERVIEW_LINES);

    let notice = (state.catalog.backend_tag() == "sample").then(|| SAMPLE_CATALOG_NOTICE.to_string());
    Ok(ApiResponse::success(
        "Welcome back",
        SupplierOverview {
            supplies,
            product_count,
            notice,
        },
        Some(Meta::empty()),
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_supplier(user)?;
    validate_create(&payload)?;

    let payload = CreateProductRequest {
        image_url: clean(payload.image_url.as_deref()),
        category: clean(payload.category.as_deref()),
        ..payload
    };
    let product = state.catalog.create(&payload).await?;
    tracing::info!(product_id = %product.id, supplier_id = %user.user_id, "product created");

    Ok(ApiResponse::success("Product created", product, None))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_supplier(user)?;
    validate_update(&payload)?;

    let product = state
        .catalog
        .update(id, &payload)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!(product_id = %product.id, supplier_id = %user.user_id, "product updated");

    Ok(ApiResponse::success("Product updated", product, None))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_supplier(user)?;
    if !state.catalog.delete(id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(product_id = %id, supplier_id = %user.user_id, "product deleted");

    Ok(ApiResponse::success(
        "Product deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
