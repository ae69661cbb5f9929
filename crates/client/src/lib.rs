//! Ventas client library.
//!
//! Session handling and order composition for the Ventas point-of-sale
//! backend. The dashboard screens are thin renderings of REST responses; the
//! pieces with invariants live here:
//!
//! - [`session`] - Bearer token lifecycle, epochs and token persistence
//! - [`gateway`] - Outbound HTTP with token injection and 401 handling
//! - [`guard`] - Pure route access decisions plus the navigation adapter
//! - [`cart`] - In-memory line aggregation with decimal totals
//! - [`order`] - The register: submission state machine over the cart
//! - [`search`] - Name and email filters for catalog lists
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ventas_client::{ApiGateway, ClientConfig, Credentials, LogNavigator, Register, SessionService};
//!
//! let config = ClientConfig::from_env()?;
//! let session = SessionService::in_memory(config.session_ttl);
//! let gateway = ApiGateway::new(&config, session, Arc::new(LogNavigator))?;
//!
//! gateway.authenticate(&Credentials::new("caja1", "secreto".into())).await?;
//!
//! let products = gateway.list_products().await?;
//! let mut register = Register::new();
//! register.add_line(&products[0], 2)?;
//! register.select_customer(7.into())?;
//! let sale = register.submit(&gateway).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod order;
pub mod search;
pub mod session;
pub mod types;

pub use cart::{Cart, CartLine, CartTotal, ExcludedLine};
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, AuthError, CONNECTIVITY_MESSAGE, RejectionBody, ValidationError};
pub use gateway::{ApiGateway, Credentials};
pub use guard::{LogNavigator, Navigator, RecordingNavigator, RouteDecision, RouteGuard, RouteTable};
pub use order::{Order, PendingSubmission, Register, SaleLinePayload, SalePayload};
pub use search::{filter_customers, filter_products};
pub use session::{
    AttachedRequest, FileTokenStore, MemoryTokenStore, Session, SessionEpoch, SessionService,
    SessionState, StoredToken, TokenStore, TokenStoreError, UnauthorizedOutcome,
};
pub use types::{Customer, NewCustomer, Product, ProductDraft, Sale, SaleDetail};
