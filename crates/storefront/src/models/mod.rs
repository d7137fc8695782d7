//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`]. JSON field names are camelCase to match the client's
//! guest cart format.

pub mod cart;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use cart::{CartView, CartViewLine};
pub use order::{Order, OrderItem, OrderStats, OrderSummary};
pub use product::{
    DEFAULT_PRODUCT_IMAGE, InventoryStats, NewProduct, Product, ProductFilter, ProductQuery,
    ProductSort, ProductUpdate, ProductValidationError, ValidNewProduct, ValidProductUpdate,
};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
