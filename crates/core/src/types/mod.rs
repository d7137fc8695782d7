//! Core types for the PharmaCorp storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod order_number;
pub mod status;
pub mod stock;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Money, MoneyError};
pub use order_number::{OrderNumber, OrderNumberError};
pub use status::*;
pub use stock::{LOW_STOCK_THRESHOLD, StockLevel, in_stock};
