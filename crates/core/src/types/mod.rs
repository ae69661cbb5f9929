//! Core types for Ventas.
//!
//! This module provides type-safe wrappers for the domain concepts shared by
//! the client and the command-line front end.

pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{PriceError, PriceField};
pub use status::OrderStatus;
