//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Email/password accounts
//! - `cart` - Cart edits with stock checks, guest-cart lookup
//! - `checkout` - Order placement
//! - `email` - Order and contact-form mail via Resend

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod email;

pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartService};
pub use checkout::{CheckoutError, CheckoutService};
pub use email::{ContactMessage, EmailError, EmailService};
