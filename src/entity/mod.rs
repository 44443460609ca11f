//! SeaORM entities.
//!
//! `users` and `reset_tokens` live in the relational store. `products`, `carts` and
//! `orders` live in the document store and keep nested data in JSON columns.

pub mod carts;
pub mod orders;
pub mod products;
pub mod reset_tokens;
pub mod users;

pub use carts::Entity as Carts;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use reset_tokens::Entity as ResetTokens;
pub use users::Entity as Users;
