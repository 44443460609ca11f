pub mod auth_service;
pub mod cart_service;
pub mod order_service;
pub mod password;
pub mod password_reset_service;
pub mod product_service;
pub mod token_service;
