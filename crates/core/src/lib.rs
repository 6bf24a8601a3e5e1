//! DS Nutritional Health Core - Shared domain library.
//!
//! This crate provides the domain model used across all storefront components:
//! - `storefront` - Cart store, order history, catalog, checkout and admin console
//! - `cli` - Command-line shell over the storefront
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere (including from tests without a runtime).
//!
//! # Modules
//!
//! - [`coerce`] - Lenient coercion of untrusted JSON values
//! - [`types`] - Cart, order, product, customer and money types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod coerce;
pub mod types;

pub use types::*;
