//! Subcommand implementations.
//!
//! Output goes through `tracing` at INFO so it shares the subscriber (and the
//! Sentry breadcrumb trail) with the library's own logging.

pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;
