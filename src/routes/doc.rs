use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{
            AuthResponse, ForgotPasswordRequest, Identity, LoginRequest, ProfileResponse,
            RegisterRequest, ResetPasswordRequest, TokenValidity, UpdateProfileRequest,
        },
        cart::UpsertCartItemRequest,
        orders::{CheckoutItem, CheckoutRequest, CustomerOverview, OrderList},
        products::{
            CreateProductRequest, ProductList, SupplierOverview, SupplierProductList, SupplyLine,
            UpdateProductRequest,
        },
    },
    models::{Cart, CartItem, Order, OrderItem, Product, Rating, Role, ShippingAddress, User},
    response::{ApiResponse, Meta},
    routes::{auth, cart, customer, health, orders, params, products, supplier},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::forgot_password,
        auth::validate_reset_token,
        auth::reset_password,
        auth::get_profile,
        auth::update_profile,
        auth::protected,
        cart::get_cart,
        cart::upsert_item,
        cart::remove_item,
        customer::overview,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        products::list_products,
        products::get_product,
        supplier::overview,
        supplier::list_products,
        supplier::create_product,
        supplier::update_product,
        supplier::delete_product
    ),
    components(
        schemas(
            Role,
            User,
            Rating,
            Product,
            CartItem,
            Cart,
            OrderItem,
            ShippingAddress,
            Order,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            TokenValidity,
            UpdateProfileRequest,
            ProfileResponse,
            Identity,
            UpsertCartItemRequest,
            CheckoutItem,
            CheckoutRequest,
            OrderList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            SupplierProductList,
            SupplyLine,
            SupplierOverview,
            CustomerOverview,
            params::Pagination,
            params::ProductQuery,
            health::HealthData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Cart>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<AuthResponse>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login, password reset and profile"),
        (name = "Products", description = "Public catalog"),
        (name = "Supplier", description = "Catalog management for suppliers"),
        (name = "Customer", description = "Customer landing data"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Checkout and order history"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
