mod support;

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use storefront_api::{
    models::Role,
    repository::SampleCatalog,
    routes::create_app,
    state::AppState,
};
use tower::ServiceExt;

use support::{register, test_app};

async fn send(app: Router, request: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let response = app.oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    Ok(builder.body(Body::from(body.to_string()))?)
}

#[tokio::test]
async fn register_over_http_returns_created_with_token() -> anyhow::Result<()> {
    let app = test_app().await?;
    let router = create_app(app.state.clone());

    let (status, body) = send(
        router.clone(),
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "name": "Wes", "email": "wes@example.com", "password": "secret1" }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["user"]["role"], "customer");
    assert!(body["data"]["user"].get("passwordHash").is_none());
    assert!(body["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));

    let (status, body) = send(
        router,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({ "name": "Wes", "email": "wes@example.com", "password": "secret1" }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["data"]["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_token() -> anyhow::Result<()> {
    let app = test_app().await?;
    let router = create_app(app.state.clone());

    let request = Request::builder().uri("/api/cart").body(Body::empty())?;
    let (status, _) = send(router.clone(), request).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/orders")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())?;
    let (status, _) = send(router, request).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn session_cookie_is_accepted_like_a_bearer_token() -> anyhow::Result<()> {
    let app = test_app().await?;
    let (user, token) = register(&app.state, "Xia", "xia@example.com", "secret1", Role::Customer).await?;
    let router = create_app(app.state.clone());

    let request = Request::builder()
        .uri("/api/auth/protected")
        .header(header::COOKIE, format!("theme=dark; session_token={token}"))
        .body(Body::empty())?;
    let (status, body) = send(router, request).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], user.user_id.to_string());
    assert_eq!(body["data"]["role"], "customer");
    Ok(())
}

#[tokio::test]
async fn customers_cannot_manage_products() -> anyhow::Result<()> {
    let app = test_app().await?;
    let (_, customer) = register(&app.state, "Yan", "yan@example.com", "secret1", Role::Customer).await?;
    let (_, supplier) = register(&app.state, "Zed", "zed@example.com", "secret1", Role::Supplier).await?;
    let router = create_app(app.state.clone());
    let product = json!({ "name": "Scarf", "description": "Wool", "price": 1990, "stock": 7 });

    let (status, _) = send(
        router.clone(),
        json_request("POST", "/api/supplier/products", Some(&customer), product.clone())?,
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        router.clone(),
        json_request("POST", "/api/supplier/products", Some(&supplier), product)?,
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().expect("id").to_string();

    let (status, body) = send(
        router.clone(),
        Request::builder().uri("/api/products?q=Sca").body(Body::empty())?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], id);
    assert_eq!(body["meta"]["total"], 1);

    let (status, _) = send(
        router.clone(),
        json_request("DELETE", &format!("/api/supplier/products/{id}"), Some(&supplier), json!({}))?,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        router,
        Request::builder().uri(format!("/api/products/{id}")).body(Body::empty())?,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn stock_failure_returns_problem_list() -> anyhow::Result<()> {
    let app = test_app().await?;
    let (_, token) = register(&app.state, "Abe", "abe@example.com", "secret1", Role::Customer).await?;
    let lamp = support::product(app.state.catalog.as_ref(), "Lamp", 2_500, 1).await?;
    let router = create_app(app.state.clone());

    let (status, body) = send(
        router,
        json_request(
            "POST",
            "/api/orders",
            Some(&token),
            json!({
                "items": [{ "productId": lamp.id, "name": "Lamp", "price": 2500, "quantity": 2 }],
                "totalPrice": 5000
            }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["data"]["problems"][0],
        "Insufficient stock for Lamp. Available: 1, requested: 2"
    );
    Ok(())
}

#[tokio::test]
async fn sample_catalog_is_flagged_to_suppliers() -> anyhow::Result<()> {
    let app = test_app().await?;
    let state = AppState {
        catalog: Arc::new(SampleCatalog::new()),
        ..app.state.clone()
    };
    let (_, supplier) = register(&state, "Bea", "bea@example.com", "secret1", Role::Supplier).await?;
    let router = create_app(state);

    let request = Request::builder()
        .uri("/api/supplier/products")
        .header(header::AUTHORIZATION, format!("Bearer {supplier}"))
        .body(Body::empty())?;
    let (status, body) = send(router, request).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["notice"].is_string());
    assert_eq!(body["data"]["products"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn unknown_paths_fall_through_to_not_found() -> anyhow::Result<()> {
    let app = test_app().await?;
    let router = create_app(app.state.clone());

    let (status, body) = send(router, Request::builder().uri("/nope").body(Body::empty())?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["path"], "/nope");
    Ok(())
}

#[tokio::test]
async fn malformed_input_gets_the_json_error_envelope() -> anyhow::Result<()> {
    let app = test_app().await?;
    let (_, token) = register(&app.state, "Cy", "cy@example.com", "secret1", Role::Customer).await?;
    let router = create_app(app.state.clone());

    let (status, body) = send(
        router.clone(),
        json_request(
            "POST",
            "/api/orders",
            Some(&token),
            json!({ "items": [{ "name": "x", "price": 1, "quantity": 1 }] }),
        )?,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["error"].is_string());

    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))?;
    let (status, body) = send(router.clone(), request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["error"].is_string());

    let (status, body) = send(
        router.clone(),
        Request::builder().uri("/api/products/not-a-uuid").body(Body::empty())?,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["error"].is_string());

    let (status, body) = send(
        router,
        Request::builder().uri("/api/products?page=abc").body(Body::empty())?,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"]["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn missing_products_are_not_found() -> anyhow::Result<()> {
    let app = test_app().await?;
    let (_, supplier) = register(&app.state, "Dee", "dee@example.com", "secret1", Role::Supplier).await?;
    let router = create_app(app.state.clone());
    let missing = uuid::Uuid::new_v4();

    let (status, body) = send(
        router.clone(),
        Request::builder().uri(format!("/api/products/{missing}")).body(Body::empty())?,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["data"]["error"].is_string());

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/supplier/products/{missing}"))
        .header(header::AUTHORIZATION, format!("Bearer {supplier}"))
        .body(Body::empty())?;
    let (status, _) = send(router, request).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn far_page_is_empty_not_an_error() -> anyhow::Result<()> {
    let app = test_app().await?;
    support::product(app.state.catalog.as_ref(), "Vase", 4_000, 2).await?;
    let router = create_app(app.state.clone());

    let uri = format!("/api/products?page={}&perPage=100", i64::MAX);
    let (status, body) = send(router, Request::builder().uri(uri).body(Body::empty())?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
    assert_eq!(body["meta"]["total"], 1);
    Ok(())
}

#[tokio::test]
async fn overviews_are_gated_by_role() -> anyhow::Result<()> {
    let app = test_app().await?;
    let (_, customer) = register(&app.state, "Eli", "eli@example.com", "secret1", Role::Customer).await?;
    let (_, supplier) = register(&app.state, "Fay", "fay@example.com", "secret1", Role::Supplier).await?;
    support::product(app.state.catalog.as_ref(), "Rug", 12_000, 3).await?;
    support::product(app.state.catalog.as_ref(), "Lamp", 2_500, 1).await?;
    let router = create_app(app.state.clone());

    let get = |uri: &str, token: &str| {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
    };

    let (status, body) = send(router.clone(), get("/api/customer", &customer)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["orderCount"], 0);
    assert!(body["data"]["cart"]["items"].as_array().is_some_and(Vec::is_empty));

    let (status, _) = send(router.clone(), get("/api/customer", &supplier)?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(router.clone(), get("/api/supplier", &supplier)?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["productCount"], 2);
    assert_eq!(body["data"]["supplies"][0]["name"], "Lamp");
    assert!(body["data"].get("notice").is_none());

    let (status, _) = send(router, get("/api/supplier", &customer)?).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}
