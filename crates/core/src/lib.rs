//! Soundcart Core - Shared types library.
//!
//! This crate provides common types used across all Soundcart components:
//! - `storefront` - client-side storefront engine (cart, notifications, hub)
//! - `cli` - terminal client for browsing, ordering, and tailing notifications
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no channel
//! handling. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
