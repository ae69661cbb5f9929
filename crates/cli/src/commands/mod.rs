//! Subcommand implementations.
//!
//! Every command runs against an [`App`]: a gateway and route guard sharing
//! one session restored from the session file.

pub mod clientes;
pub mod productos;
pub mod session;
pub mod ventas;

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;
use ventas_client::{
    ApiError, ApiGateway, AuthError, FileTokenStore, LogNavigator, Navigator, RouteGuard,
    SessionService, TokenStoreError, ValidationError,
};
use ventas_core::ProductKey;

use crate::config::CliConfig;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Session file error: {0}")]
    TokenStore(#[from] TokenStoreError),

    /// A login value was neither passed nor configured.
    #[error("Missing {0}: pass it as an argument or set {1}")]
    MissingCredential(&'static str, &'static str),

    #[error("Unknown product: {0}")]
    UnknownProduct(ProductKey),

    #[error("Invalid item {0:?}: expected <key> or <key>:<qty>")]
    InvalidItem(String),
}

/// Shared state for one invocation.
pub struct App {
    pub config: CliConfig,
    pub gateway: ApiGateway,
    pub guard: RouteGuard,
}

impl App {
    /// Build the gateway and guard, restoring a saved session if it is
    /// still valid.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file is unreadable or the HTTP client
    /// cannot be created.
    pub async fn connect(config: CliConfig) -> Result<Self, CommandError> {
        let store = Arc::new(FileTokenStore::new(&config.session_file));
        let session = SessionService::new(store, config.client.session_ttl);

        if session.restore().await? {
            debug!(path = %config.session_file.display(), "Using saved session");
        }

        let navigator: Arc<dyn Navigator> = Arc::new(LogNavigator);
        let gateway = ApiGateway::new(&config.client, session.clone(), Arc::clone(&navigator))?;
        let guard = RouteGuard::new(config.client.routes.clone(), session, navigator);

        Ok(Self {
            config,
            gateway,
            guard,
        })
    }
}
