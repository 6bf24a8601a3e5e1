//! DS Nutritional Health storefront library.
//!
//! Cart and order state for the storefront, the product catalog, checkout,
//! and the back-office console, all behind a small storage trait so they can
//! run over files, memory, or anything else that stores strings by key.
//!
//! [`state::Storefront`] wires every service over one storage medium.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod admin;
pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod notice;
pub mod orders;
pub mod signal;
pub mod state;
pub mod storage;
pub mod views;
