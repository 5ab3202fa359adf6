//! Cache value types for the backend API client.

use super::types::{Category, StoreMenu};

/// Values stored in the API client's read cache.
///
/// Only read-mostly catalog data is cached; notifications and orders are
/// never cached (mutable state).
#[derive(Clone)]
pub enum CacheValue {
    Menu(Box<StoreMenu>),
    Categories(Vec<Category>),
}
