//! REST gateway.
//!
//! Every outbound call goes through [`ApiGateway::send`]: the session token
//! is attached, the request is tagged with the session epoch, and a 401 is
//! turned into a forced logout before the caller sees
//! [`ApiError::SessionExpired`]. Other failures are returned untouched.
//!
//! Resource endpoints live in one file per resource:
//! - `products.rs` - `/productos/`
//! - `customers.rs` - `/clientes/`
//! - `sales.rs` - `/ventas/`

mod customers;
mod products;
mod sales;

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ApiError, AuthError, RejectionBody};
use crate::guard::Navigator;
use crate::session::{AttachedRequest, Session, SessionEpoch, SessionService, UnauthorizedOutcome};
use crate::types::ListEnvelope;

/// Login credentials for the token endpoint.
#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access: String,
}

/// Client for the Ventas REST API.
///
/// Cheaply cloneable via `Arc`. The gateway is the only writer of the
/// [`SessionService`] it is built with.
#[derive(Clone)]
pub struct ApiGateway {
    inner: Arc<ApiGatewayInner>,
}

struct ApiGatewayInner {
    client: reqwest::Client,
    config: ClientConfig,
    session: SessionService,
    navigator: Arc<dyn Navigator>,
}

impl ApiGateway {
    /// Create a gateway for `config`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be created.
    pub fn new(
        config: &ClientConfig,
        session: SessionService,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiGatewayInner {
                client,
                config: config.clone(),
                session,
                navigator,
            }),
        })
    }

    #[must_use]
    pub fn session(&self) -> &SessionService {
        &self.inner.session
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Exchange credentials for a token and establish the session.
    ///
    /// A rejected login leaves any existing session untouched.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Rejected` with the server's message on a non-2xx
    /// response, `AuthError::Network` if the endpoint cannot be reached and
    /// `AuthError::Malformed` if the response carries no token.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let url = self.inner.config.endpoint("token/")?;

        let response = self
            .inner
            .client
            .post(url)
            .json(&TokenRequest {
                username: &credentials.username,
                password: credentials.password.expose_secret(),
            })
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(%status, "Login rejected");
            let message = match RejectionBody::parse(&text) {
                RejectionBody::Detail(detail) => detail,
                RejectionBody::Text(raw) if raw.is_empty() => format!("HTTP {status}"),
                other => other.to_string(),
            };
            return Err(AuthError::Rejected(message));
        }

        let token: TokenResponse =
            serde_json::from_str(&text).map_err(|e| AuthError::Malformed(e.to_string()))?;
        if token.access.trim().is_empty() {
            return Err(AuthError::Malformed("empty access token".to_string()));
        }

        Ok(self
            .inner
            .session
            .establish(SecretString::from(token.access))
            .await)
    }

    /// Log out and send the user to the login page.
    ///
    /// Returns whether a session was cleared. Logging out twice redirects
    /// once.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> bool {
        let cleared = self.inner.session.invalidate().await;
        if cleared {
            self.inner
                .navigator
                .redirect(self.inner.config.routes.login_path());
        }
        cleared
    }

    // =========================================================================
    // Request execution
    // =========================================================================

    /// Send a request to `path` (relative to the API base).
    ///
    /// # Errors
    ///
    /// Returns `ApiError::SessionExpired` on a 401 (after clearing the
    /// session), `ApiError::ServerRejected` on any other non-2xx status and
    /// `ApiError::Network` if no response arrived.
    #[instrument(skip(self, body), fields(request_id = %Uuid::new_v4()))]
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.inner.config.endpoint(path)?;

        let mut builder = self.inner.client.request(method, url);
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let AttachedRequest { request, epoch } = self.inner.session.attach(builder.build()?).await;
        debug!(%epoch, "Dispatching request");

        let response = self.inner.client.execute(request).await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.on_unauthorized(epoch).await;
            return Err(ApiError::SessionExpired);
        }

        if !status.is_success() {
            let body = RejectionBody::parse(&response.text().await?);
            warn!(%status, %body, "Request rejected");
            return Err(ApiError::ServerRejected { status, body });
        }

        Ok(response)
    }

    /// `GET` a single resource.
    ///
    /// # Errors
    ///
    /// See [`ApiGateway::send`]; also `ApiError::Decode` for an unexpected body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        decode(self.send(Method::GET, path, None).await?).await
    }

    /// `GET` a collection, accepting a bare array or a paginated envelope.
    ///
    /// # Errors
    ///
    /// See [`ApiGateway::get`].
    pub async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let envelope: ListEnvelope<T> = self.get(path).await?;
        Ok(envelope.into_vec())
    }

    /// `POST` a JSON body and decode the created resource.
    ///
    /// # Errors
    ///
    /// See [`ApiGateway::get`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        decode(self.send(Method::POST, path, Some(body)).await?).await
    }

    /// `PUT` a JSON body and decode the updated resource.
    ///
    /// # Errors
    ///
    /// See [`ApiGateway::get`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        decode(self.send(Method::PUT, path, Some(body)).await?).await
    }

    /// `DELETE` a resource; the response body is ignored.
    ///
    /// # Errors
    ///
    /// See [`ApiGateway::send`].
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::DELETE, path, None).await?;
        Ok(())
    }

    async fn on_unauthorized(&self, epoch: SessionEpoch) {
        match self.inner.session.handle_unauthorized(epoch).await {
            UnauthorizedOutcome::Invalidate => {
                info!(%epoch, "Server rejected the session token; logging out");
                self.inner
                    .navigator
                    .redirect(self.inner.config.routes.login_path());
            }
            UnauthorizedOutcome::Stale => {
                warn!(%epoch, "Ignoring 401 from a superseded session");
            }
            UnauthorizedOutcome::AlreadyCleared => {
                debug!(%epoch, "401 without a session");
            }
        }
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
