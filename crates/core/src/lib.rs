//! PharmaCorp Core - Shared domain types and rules.
//!
//! This crate provides the types and pure business rules used by every
//! PharmaCorp component:
//! - `storefront` - Public storefront and admin back-office (HTTP JSON API)
//! - `cli` - Migrations, catalog seeding, and admin user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Everything that decides *whether* a cart or checkout
//! is valid lives here so it can be tested without a database; the storefront
//! crate only decides *how* to persist it.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, money, stock levels, order statuses and numbers
//! - [`cart`] - Cart line arithmetic: normalisation, guest merge, replace diffs
//! - [`checkout`] - Checkout request validation, consolidation, and order snapshots

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod types;

pub use types::*;
