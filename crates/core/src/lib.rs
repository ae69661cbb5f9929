//! Ventas Core - Shared types library.
//!
//! This crate provides common types used across the Ventas components:
//! - `client` - Session, gateway, cart and order submission
//! - `cli` - Command-line front end for the point-of-sale backend
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no clocks.
//! This keeps it lightweight and lets the cart and route logic be tested
//! without a network.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, product keys, prices, emails and
//!   order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
