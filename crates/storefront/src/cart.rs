//! In-memory shopping cart store.
//!
//! The cart is pure client-side state: an insertion-ordered list of lines
//! keyed by product id, plus the open/closed flag for the cart panel. Totals
//! are derived on read with exact decimal arithmetic. No network calls
//! originate here; checkout submission lives in [`crate::state::AppState`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rust_decimal::Decimal;
use soundcart_core::{MerchantId, ProductId};

/// One product entry in the shopping cart.
///
/// `name`, `unit_price`, and `image` are snapshots taken when the product is
/// first added; later catalog changes do not retroactively update the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub image: Option<String>,
    pub merchant_id: Option<MerchantId>,
    /// Always >= 1 while the line is present.
    pub quantity: u32,
}

impl CartLine {
    /// Line subtotal: `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Snapshot of a product at add-to-cart time.
#[derive(Debug, Clone)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub merchant_id: Option<MerchantId>,
}

#[derive(Debug, Default)]
struct CartState {
    lines: Vec<CartLine>,
    is_open: bool,
}

/// Shopping cart store.
///
/// Cheaply cloneable handle; all clones share the same state. Mutations
/// serialize through an internal lock and never fail for domain conditions
/// (absent ids, non-positive quantities degrade to no-ops or removals).
#[derive(Clone, Default)]
pub struct CartStore {
    inner: Arc<Mutex<CartState>>,
}

impl CartStore {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CartState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a product to the cart.
    ///
    /// If a line for this product already exists its quantity is incremented
    /// by 1; otherwise a new line with quantity 1 is inserted at the end,
    /// snapshotting the product's name, price, and image.
    pub fn add_item(&self, product: &ProductSummary) {
        let mut state = self.state();
        if let Some(line) = state
            .lines
            .iter_mut()
            .find(|line| line.product_id == product.id)
        {
            line.quantity = line.quantity.saturating_add(1);
            return;
        }

        state.lines.push(CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            image: product.image.clone(),
            merchant_id: product.merchant_id.clone(),
            quantity: 1,
        });
    }

    /// Set a line's quantity.
    ///
    /// A quantity of zero removes the line. No-op if the product is not in
    /// the cart.
    pub fn update_quantity(&self, product_id: &ProductId, quantity: u32) {
        let mut state = self.state();
        if quantity == 0 {
            state.lines.retain(|line| line.product_id != *product_id);
            return;
        }

        if let Some(line) = state
            .lines
            .iter_mut()
            .find(|line| line.product_id == *product_id)
        {
            line.quantity = quantity;
        }
    }

    /// Remove a line from the cart. No-op if absent.
    pub fn remove_item(&self, product_id: &ProductId) {
        self.state()
            .lines
            .retain(|line| line.product_id != *product_id);
    }

    /// Empty the cart unconditionally.
    pub fn clear(&self) {
        self.state().lines.clear();
    }

    /// Snapshot of all lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.state().lines.clone()
    }

    /// Total number of items across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.state()
            .lines
            .iter()
            .map(|line| u64::from(line.quantity))
            .sum()
    }

    /// Sum over lines of `unit_price * quantity`.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.state().lines.iter().map(CartLine::line_total).sum()
    }

    /// Quantity of a product in the cart; 0 if absent.
    #[must_use]
    pub fn item_quantity(&self, product_id: &ProductId) -> u32 {
        self.state()
            .lines
            .iter()
            .find(|line| line.product_id == *product_id)
            .map_or(0, |line| line.quantity)
    }

    /// Whether the cart panel is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state().is_open
    }

    /// Open the cart panel.
    pub fn open(&self) {
        self.state().is_open = true;
    }

    /// Close the cart panel.
    pub fn close(&self) {
        self.state().is_open = false;
    }

    /// Toggle the cart panel.
    pub fn toggle(&self) {
        let mut state = self.state();
        state.is_open = !state.is_open;
    }
}
