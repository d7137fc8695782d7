//! Cart line arithmetic.
//!
//! A cart is a quantity-per-product mapping. Guest carts live on the client
//! as a JSON array of `{productId, quantity}`; signed-in carts are rows in
//! the database. The functions here decide what rows must change. They
//! never touch storage, which keeps the merge and replace rules testable
//! on their own.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ProductId;

/// One product in a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

impl CartLine {
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: i32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// A row-level change produced by [`merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartMutation {
    /// The product is not in the stored cart yet.
    Insert(CartLine),
    /// The stored row must be set to the new combined quantity.
    Update(CartLine),
}

impl CartMutation {
    /// The line this mutation writes.
    #[must_use]
    pub const fn line(&self) -> CartLine {
        match self {
            Self::Insert(line) | Self::Update(line) => *line,
        }
    }
}

/// Row-level changes needed to turn one cart into another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartDiff {
    /// Products present now but absent from the desired cart.
    pub remove: Vec<ProductId>,
    /// Lines to insert or overwrite.
    pub upsert: Vec<CartLine>,
}

impl CartDiff {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.upsert.is_empty()
    }
}

/// Raised when a cart quantity would exceed what is on hand.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Only {available} item(s) available in stock")]
pub struct StockExceeded {
    pub available: i32,
}

/// Clean up a client-supplied cart for replacement.
///
/// Lines with a non-positive quantity are dropped. When a product appears
/// more than once the last line wins, which matches a client that sends
/// its whole cart state. The result is ordered by product id.
#[must_use]
pub fn normalize<I>(lines: I) -> Vec<CartLine>
where
    I: IntoIterator<Item = CartLine>,
{
    let mut by_product = BTreeMap::new();
    for line in lines {
        if line.quantity > 0 {
            by_product.insert(line.product_id, line.quantity);
        } else {
            by_product.remove(&line.product_id);
        }
    }
    by_product
        .into_iter()
        .map(|(product_id, quantity)| CartLine::new(product_id, quantity))
        .collect()
}

/// Plan the merge of a guest cart into a stored cart.
///
/// Quantities add up: guest `{A: 2}` merged into `{A: 3}` stores `{A: 5}`.
/// Products the user has not stored yet become inserts. Guest lines with a
/// non-positive quantity are ignored; repeated guest lines for one product
/// are summed first. Stock is not checked here; checkout does that.
#[must_use]
pub fn merge(existing: &[CartLine], guest: &[CartLine]) -> Vec<CartMutation> {
    let mut incoming: BTreeMap<ProductId, i32> = BTreeMap::new();
    for line in guest.iter().filter(|line| line.quantity > 0) {
        let total = incoming.entry(line.product_id).or_default();
        *total = total.saturating_add(line.quantity);
    }

    let stored: HashMap<ProductId, i32> = existing
        .iter()
        .map(|line| (line.product_id, line.quantity))
        .collect();

    incoming
        .into_iter()
        .map(|(product_id, quantity)| match stored.get(&product_id) {
            Some(current) => {
                CartMutation::Update(CartLine::new(product_id, current.saturating_add(quantity)))
            }
            None => CartMutation::Insert(CartLine::new(product_id, quantity)),
        })
        .collect()
}

/// Plan a bulk replace of `current` by `desired`.
///
/// Rows absent from `desired` are removed; every desired line is upserted.
/// Lines that already hold the desired quantity are skipped so a no-op
/// replace writes nothing.
#[must_use]
pub fn diff(current: &[CartLine], desired: &[CartLine]) -> CartDiff {
    let desired = normalize(desired.iter().copied());
    let wanted: HashMap<ProductId, i32> = desired
        .iter()
        .map(|line| (line.product_id, line.quantity))
        .collect();
    let stored: HashMap<ProductId, i32> = current
        .iter()
        .map(|line| (line.product_id, line.quantity))
        .collect();

    let mut remove: Vec<ProductId> = current
        .iter()
        .map(|line| line.product_id)
        .filter(|id| !wanted.contains_key(id))
        .collect();
    remove.sort_unstable();
    remove.dedup();

    let upsert = desired
        .into_iter()
        .filter(|line| stored.get(&line.product_id) != Some(&line.quantity))
        .collect();

    CartDiff { remove, upsert }
}

/// Units still addable given `stock` on hand and `in_cart` already held.
#[must_use]
pub const fn available(stock: i32, in_cart: i32) -> i32 {
    let left = stock.saturating_sub(in_cart);
    if left > 0 { left } else { 0 }
}

/// Check a cart quantity against stock when adding or updating a line.
///
/// # Errors
///
/// Returns [`StockExceeded`] carrying the on-hand stock when `requested`
/// is greater than `stock`.
pub const fn ensure_within_stock(requested: i32, stock: i32) -> Result<(), StockExceeded> {
    if requested > stock {
        let available = if stock > 0 { stock } else { 0 };
        Err(StockExceeded { available })
    } else {
        Ok(())
    }
}
