//! End-to-end test support for the Ventas client.
//!
//! [`FakeBackend`] is an in-process axum server that speaks the backend's
//! REST dialect (`/api/token/`, `/api/productos/`, `/api/clientes/`,
//! `/api/ventas/`) on an ephemeral port. Tests drive the real reqwest
//! gateway against it and inspect what it received.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ventas-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `session` - Login, bearer injection, 401 handling, persistence
//! - `catalog` - Envelope normalisation and resource endpoints
//! - `orders` - Order submission against the backend

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use ventas_client::{
    ApiError, ApiGateway, ClientConfig, Credentials, Navigator, RecordingNavigator,
    SessionService,
};

/// Password the fake token endpoint accepts for any username.
pub const PASSWORD: &str = "secreto";

/// Credentials the fake backend accepts.
#[must_use]
pub fn valid_credentials() -> Credentials {
    Credentials::new("caja1", SecretString::from(PASSWORD))
}

/// Request counters per endpoint.
#[derive(Debug, Default)]
pub struct Hits {
    pub token: AtomicUsize,
    pub productos: AtomicUsize,
    pub clientes: AtomicUsize,
    pub ventas_list: AtomicUsize,
    pub ventas_create: AtomicUsize,
}

#[derive(Debug, Default)]
struct Behaviour {
    products: Vec<Value>,
    customers: Vec<Value>,
    sales: Vec<Value>,
    paginate: bool,
    sale_response: Option<(StatusCode, String)>,
    unauthorized_delay: Duration,
}

#[derive(Debug, Default)]
struct BackendState {
    hits: Hits,
    tokens: Mutex<HashSet<String>>,
    issued: AtomicUsize,
    behaviour: Mutex<Behaviour>,
    authorizations: Mutex<Vec<Option<String>>>,
    sale_bodies: Mutex<Vec<Value>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process stand-in for the sales backend.
pub struct FakeBackend {
    addr: SocketAddr,
    state: Arc<BackendState>,
    server: tokio::task::JoinHandle<()>,
}

impl FakeBackend {
    /// Start a backend seeded with a small catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port can be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(BackendState::default());
        {
            let mut behaviour = lock(&state.behaviour);
            behaviour.products = vec![
                json!({"id": 1, "nombre": "Café Molido", "precio": "4990.00", "cantidad": 20}),
                json!({"id": 2, "nombre": "Té Verde", "precio": 2990, "cantidad": 15}),
                json!({"id": "SKU-3", "nombre": "Taza", "precio": "3500"}),
            ];
            behaviour.customers = vec![
                json!({"id": 7, "nombre": "Ana Rojas", "email": "ana@tienda.cl", "telefono": "+56911111111"}),
                json!({"id": 8, "nombre": "Luis Soto", "email": null}),
            ];
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let router = router(Arc::clone(&state));
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Panics if the bound address does not form a URL.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(url::Url::parse(&format!("http://{}/api", self.addr)).unwrap())
    }

    /// A gateway with an in-memory session and a recording navigator.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn gateway(&self) -> Result<(ApiGateway, Arc<RecordingNavigator>), ApiError> {
        let config = self.config();
        let session = SessionService::in_memory(config.session_ttl);
        self.gateway_with_session(session)
    }

    /// A gateway over an existing session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn gateway_with_session(
        &self,
        session: SessionService,
    ) -> Result<(ApiGateway, Arc<RecordingNavigator>), ApiError> {
        let navigator = Arc::new(RecordingNavigator::new());
        let gateway = ApiGateway::new(
            &self.config(),
            session,
            Arc::clone(&navigator) as Arc<dyn Navigator>,
        )?;
        Ok((gateway, navigator))
    }

    #[must_use]
    pub fn hits(&self) -> &Hits {
        &self.state.hits
    }

    /// Serve lists as `{count, next, previous, results}` instead of arrays.
    pub fn set_paginated(&self, paginate: bool) {
        lock(&self.state.behaviour).paginate = paginate;
    }

    /// Answer every sale submission with `status` and a raw `body`.
    ///
    /// A 2xx `status` still records the sale; only the reply differs from
    /// the usual echo.
    pub fn answer_sales(&self, status: StatusCode, body: &str) {
        lock(&self.state.behaviour).sale_response = Some((status, body.to_string()));
    }

    /// Refuse every sale submission with `status` and a raw `body`.
    pub fn reject_sales(&self, status: StatusCode, body: &str) {
        self.answer_sales(status, body);
    }

    pub fn accept_sales(&self) {
        lock(&self.state.behaviour).sale_response = None;
    }

    /// Make every token issued so far invalid.
    pub fn revoke_tokens(&self) {
        lock(&self.state.tokens).clear();
    }

    /// Hold 401 responses for `delay` before sending them.
    pub fn set_unauthorized_delay(&self, delay: Duration) {
        lock(&self.state.behaviour).unauthorized_delay = delay;
    }

    /// `Authorization` header of every authenticated-endpoint request, in
    /// arrival order.
    #[must_use]
    pub fn authorizations(&self) -> Vec<Option<String>> {
        lock(&self.state.authorizations).clone()
    }

    /// Every body posted to `/api/ventas/`.
    #[must_use]
    pub fn sale_bodies(&self) -> Vec<Value> {
        lock(&self.state.sale_bodies).clone()
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn router(state: Arc<BackendState>) -> Router {
    Router::new()
        .route("/api/token/", post(token))
        .route("/api/productos/", get(list_products).post(create_product))
        .route(
            "/api/productos/{id}/",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/clientes/", get(list_customers).post(create_customer))
        .route("/api/clientes/{id}/", axum::routing::delete(delete_customer))
        .route("/api/ventas/", get(list_sales).post(create_sale))
        .with_state(state)
}

// =============================================================================
// Auth
// =============================================================================

async fn token(State(state): State<Arc<BackendState>>, Json(body): Json<Value>) -> Response {
    state.hits.token.fetch_add(1, Ordering::SeqCst);

    if body["password"] != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "No active account found with the given credentials"})),
        )
            .into_response();
    }

    let n = state.issued.fetch_add(1, Ordering::SeqCst) + 1;
    let access = format!("tok-{n}");
    lock(&state.tokens).insert(access.clone());
    Json(json!({"access": access, "refresh": format!("refresh-{n}")})).into_response()
}

async fn authorize(state: &BackendState, headers: &HeaderMap) -> Result<(), Response> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    lock(&state.authorizations).push(header.clone());

    let valid = header
        .as_deref()
        .and_then(|h| h.strip_prefix("Bearer "))
        .is_some_and(|t| lock(&state.tokens).contains(t));
    if valid {
        return Ok(());
    }

    let delay = lock(&state.behaviour).unauthorized_delay;
    tokio::time::sleep(delay).await;
    Err((
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Given token not valid for any token type"})),
    )
        .into_response())
}

// =============================================================================
// Resources
// =============================================================================

fn list_body(items: &[Value], paginate: bool) -> Response {
    if paginate {
        Json(json!({"count": items.len(), "next": null, "previous": null, "results": items}))
            .into_response()
    } else {
        Json(json!(items)).into_response()
    }
}

fn id_matches(value: &Value, id: &str) -> bool {
    match value {
        Value::Number(n) => n.to_string() == id,
        Value::String(s) => s == id,
        _ => false,
    }
}

fn next_id(items: &[Value]) -> i64 {
    items
        .iter()
        .filter_map(|item| item["id"].as_i64())
        .max()
        .unwrap_or(0)
        + 1
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"detail": "No encontrado."}))).into_response()
}

fn required(field: &str) -> Response {
    let mut errors = serde_json::Map::new();
    errors.insert(field.to_string(), json!(["Este campo es requerido."]));
    (StatusCode::BAD_REQUEST, Json(Value::Object(errors))).into_response()
}

async fn list_products(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize(&state, &headers).await {
        return response;
    }
    state.hits.productos.fetch_add(1, Ordering::SeqCst);
    let behaviour = lock(&state.behaviour);
    list_body(&behaviour.products, behaviour.paginate)
}

async fn get_product(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authorize(&state, &headers).await {
        return response;
    }
    let behaviour = lock(&state.behaviour);
    behaviour
        .products
        .iter()
        .find(|p| id_matches(&p["id"], &id))
        .map_or_else(not_found, |p| Json(p.clone()).into_response())
}

async fn create_product(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&state, &headers).await {
        return response;
    }
    if body["nombre"].as_str().is_none_or(str::is_empty) {
        return required("nombre");
    }
    let mut behaviour = lock(&state.behaviour);
    body["id"] = json!(next_id(&behaviour.products));
    behaviour.products.push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update_product(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&state, &headers).await {
        return response;
    }
    let mut behaviour = lock(&state.behaviour);
    let Some(product) = behaviour
        .products
        .iter_mut()
        .find(|p| id_matches(&p["id"], &id))
    else {
        return not_found();
    };
    body["id"] = product["id"].clone();
    *product = body.clone();
    Json(body).into_response()
}

async fn delete_product(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authorize(&state, &headers).await {
        return response;
    }
    let mut behaviour = lock(&state.behaviour);
    let before = behaviour.products.len();
    behaviour.products.retain(|p| !id_matches(&p["id"], &id));
    if behaviour.products.len() == before {
        return not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_customers(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize(&state, &headers).await {
        return response;
    }
    state.hits.clientes.fetch_add(1, Ordering::SeqCst);
    let behaviour = lock(&state.behaviour);
    list_body(&behaviour.customers, behaviour.paginate)
}

async fn create_customer(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&state, &headers).await {
        return response;
    }
    state.hits.clientes.fetch_add(1, Ordering::SeqCst);
    if body["nombre"].as_str().is_none_or(str::is_empty) {
        return required("nombre");
    }
    let mut behaviour = lock(&state.behaviour);
    body["id"] = json!(next_id(&behaviour.customers));
    behaviour.customers.push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn delete_customer(
    State(state): State<Arc<BackendState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = authorize(&state, &headers).await {
        return response;
    }
    let mut behaviour = lock(&state.behaviour);
    let before = behaviour.customers.len();
    behaviour.customers.retain(|c| !id_matches(&c["id"], &id));
    if behaviour.customers.len() == before {
        return not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_sales(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    if let Err(response) = authorize(&state, &headers).await {
        return response;
    }
    state.hits.ventas_list.fetch_add(1, Ordering::SeqCst);
    let behaviour = lock(&state.behaviour);
    list_body(&behaviour.sales, behaviour.paginate)
}

async fn create_sale(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(response) = authorize(&state, &headers).await {
        return response;
    }
    state.hits.ventas_create.fetch_add(1, Ordering::SeqCst);
    lock(&state.sale_bodies).push(body.clone());

    let mut behaviour = lock(&state.behaviour);
    let custom = behaviour.sale_response.clone();
    if let Some((status, raw)) = &custom
        && !status.is_success()
    {
        return (*status, raw.clone()).into_response();
    }

    let sale = json!({
        "id": next_id(&behaviour.sales),
        "cliente": body["cliente"],
        "total": body["total"].to_string(),
        "fecha": "2024-05-01T12:00:00Z",
        "detalles": body["detalles"],
    });
    behaviour.sales.push(sale.clone());

    match custom {
        Some((status, raw)) => (status, raw).into_response(),
        None => (StatusCode::CREATED, Json(sale)).into_response(),
    }
}
