//! Session store.
//!
//! Holds the bearer token for the whole process. The token and the session
//! epoch live in one [`SessionState`] value that is replaced wholesale on
//! every write, so readers never see a token from one login paired with the
//! epoch of another.
//!
//! # Epochs
//!
//! Every request is tagged with the epoch that was current when its
//! `Authorization` header was attached. A 401 only clears the session if its
//! epoch is still current:
//!
//! - a response from before a newer login cannot log that login out;
//! - when several requests of one session fail together, the first one
//!   clears the session (and bumps the epoch) and the rest become stale.
//!
//! The decision itself is the pure [`SessionState::on_unauthorized`]; the
//! gateway performs the redirect.
//!
//! Token store writes happen while the state's write lock is held, so the
//! persisted token changes in the same order as the in-process one.

mod store;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

pub use store::{FileTokenStore, MemoryTokenStore, StoredToken, TokenStore, TokenStoreError};

/// An authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    token: SecretString,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// A session issued at `issued_at` and valid for `ttl`.
    #[must_use]
    pub fn new(token: SecretString, issued_at: DateTime<Utc>, ttl: TimeDelta) -> Self {
        Self::from_parts(token, issued_at, issued_at + ttl)
    }

    pub(crate) const fn from_parts(
        token: SecretString,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token,
            issued_at,
            expires_at,
        }
    }

    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// An expired session is treated exactly like no session.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Monotonic session generation counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SessionEpoch(u64);

impl SessionEpoch {
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SessionEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a 401 means for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedOutcome {
    /// The failing request belongs to the live session: clear it and send
    /// the user to the login page.
    Invalidate,
    /// The request was issued under an earlier epoch; ignore it.
    Stale,
    /// The request was issued while logged out; nothing to clear.
    AlreadyCleared,
}

impl UnauthorizedOutcome {
    /// Whether this outcome triggers the redirect to login.
    #[must_use]
    pub const fn redirects(self) -> bool {
        matches!(self, Self::Invalidate)
    }
}

/// Session plus epoch, replaced as a single value.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    session: Option<Session>,
    epoch: SessionEpoch,
}

impl SessionState {
    #[must_use]
    pub const fn epoch(&self) -> SessionEpoch {
        self.epoch
    }

    /// The session if present and not expired at `now`.
    #[must_use]
    pub fn live_session(&self, now: DateTime<Utc>) -> Option<&Session> {
        self.session.as_ref().filter(|s| !s.is_expired_at(now))
    }

    /// Decide what a 401 from a request tagged with `request_epoch` means.
    #[must_use]
    pub fn on_unauthorized(&self, request_epoch: SessionEpoch) -> UnauthorizedOutcome {
        if request_epoch != self.epoch {
            UnauthorizedOutcome::Stale
        } else if self.session.is_none() {
            UnauthorizedOutcome::AlreadyCleared
        } else {
            UnauthorizedOutcome::Invalidate
        }
    }

    /// The state after a login.
    #[must_use]
    pub fn established(&self, session: Session) -> Self {
        Self {
            session: Some(session),
            epoch: self.epoch.next(),
        }
    }

    /// The state after logout or invalidation.
    #[must_use]
    pub fn cleared(&self) -> Self {
        Self {
            session: None,
            epoch: self.epoch.next(),
        }
    }
}

/// A request with the session applied, tagged with its epoch.
#[derive(Debug)]
pub struct AttachedRequest {
    pub request: reqwest::Request,
    pub epoch: SessionEpoch,
}

/// Shared handle to the process session.
///
/// Cheaply cloneable via `Arc`. Pass one instance to the gateway and the
/// route guard; only the gateway writes to it.
#[derive(Clone)]
pub struct SessionService {
    inner: Arc<SessionServiceInner>,
}

struct SessionServiceInner {
    state: RwLock<SessionState>,
    store: Arc<dyn TokenStore>,
    ttl: TimeDelta,
}

impl SessionService {
    /// Create an empty session backed by `store`.
    #[must_use]
    pub fn new(store: Arc<dyn TokenStore>, ttl: TimeDelta) -> Self {
        Self {
            inner: Arc::new(SessionServiceInner {
                state: RwLock::new(SessionState::default()),
                store,
                ttl,
            }),
        }
    }

    /// Create an empty session that is not persisted.
    #[must_use]
    pub fn in_memory(ttl: TimeDelta) -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()), ttl)
    }

    /// Load a persisted token, if one is still valid.
    ///
    /// Returns whether a session was restored. Expired tokens are removed
    /// from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot be read or cleared.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<bool, TokenStoreError> {
        let mut state = self.inner.state.write().await;

        let Some(stored) = self.inner.store.load()? else {
            return Ok(false);
        };

        if !stored.is_live_at(Utc::now()) {
            info!("Discarding expired persisted session");
            self.inner.store.clear()?;
            return Ok(false);
        }

        *state = state.established(stored.into_session());
        info!(epoch = %state.epoch(), "Session restored");
        Ok(true)
    }

    /// Install a freshly issued token, replacing any previous session.
    ///
    /// A failure to persist the token is logged; the in-process session is
    /// still established.
    pub async fn establish(&self, token: SecretString) -> Session {
        let session = Session::new(token, Utc::now(), self.inner.ttl);

        let epoch = {
            let mut state = self.inner.state.write().await;
            *state = state.established(session.clone());
            if let Err(e) = self.inner.store.save(&StoredToken::from(&session)) {
                warn!(error = %e, "Failed to persist session token");
            }
            state.epoch()
        };

        info!(%epoch, expires_at = %session.expires_at(), "Session established");
        session
    }

    /// Clear the session (logout). Idempotent.
    ///
    /// Returns whether a session was present.
    pub async fn invalidate(&self) -> bool {
        let cleared = {
            let mut state = self.inner.state.write().await;
            if state.session.is_none() {
                false
            } else {
                *state = state.cleared();
                self.forget_persisted();
                true
            }
        };

        if cleared {
            info!("Session invalidated");
        }
        cleared
    }

    /// Apply a 401 observed by a request tagged with `request_epoch`.
    ///
    /// The check and the clear happen under one write lock, so exactly one
    /// of several concurrent 401s of the same session gets
    /// [`UnauthorizedOutcome::Invalidate`].
    pub async fn handle_unauthorized(&self, request_epoch: SessionEpoch) -> UnauthorizedOutcome {
        let mut state = self.inner.state.write().await;
        let outcome = state.on_unauthorized(request_epoch);
        if outcome == UnauthorizedOutcome::Invalidate {
            *state = state.cleared();
            self.forget_persisted();
        }
        outcome
    }

    /// Whether a live token is present.
    pub async fn is_authenticated(&self) -> bool {
        self.inner
            .state
            .read()
            .await
            .live_session(Utc::now())
            .is_some()
    }

    /// The epoch new requests are currently tagged with.
    pub async fn current_epoch(&self) -> SessionEpoch {
        self.inner.state.read().await.epoch()
    }

    /// A copy of the live session, if any.
    pub async fn current(&self) -> Option<Session> {
        self.inner
            .state
            .read()
            .await
            .live_session(Utc::now())
            .cloned()
    }

    /// Add `Authorization: Bearer <token>` when a live token is present.
    ///
    /// Never blocks a request for lack of a token; authorization is enforced
    /// by the server and the route guard.
    pub async fn attach(&self, mut request: reqwest::Request) -> AttachedRequest {
        let state = self.inner.state.read().await;

        if let Some(session) = state.live_session(Utc::now()) {
            match HeaderValue::from_str(&format!("Bearer {}", session.token().expose_secret())) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    request.headers_mut().insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Session token is not a valid header value; sending without it"),
            }
        }

        AttachedRequest {
            request,
            epoch: state.epoch(),
        }
    }

    fn forget_persisted(&self) {
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "Failed to remove persisted session token");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session(token: &str) -> Session {
        Session::new(SecretString::from(token), Utc::now(), TimeDelta::hours(24))
    }

    fn request() -> reqwest::Request {
        reqwest::Request::new(
            reqwest::Method::GET,
            "http://127.0.0.1/api/productos/".parse().unwrap(),
        )
    }

    #[test]
    fn test_unauthorized_decisions() {
        let empty = SessionState::default();
        assert_eq!(
            empty.on_unauthorized(empty.epoch()),
            UnauthorizedOutcome::AlreadyCleared
        );

        let live = empty.established(session("a"));
        assert_eq!(
            live.on_unauthorized(live.epoch()),
            UnauthorizedOutcome::Invalidate
        );
        assert_eq!(
            live.on_unauthorized(empty.epoch()),
            UnauthorizedOutcome::Stale
        );
    }

    #[test]
    fn test_every_write_bumps_epoch() {
        let state = SessionState::default();
        let logged_in = state.established(session("a"));
        let logged_out = logged_in.cleared();
        let again = logged_out.established(session("b"));

        assert!(state.epoch() < logged_in.epoch());
        assert!(logged_in.epoch() < logged_out.epoch());
        assert!(logged_out.epoch() < again.epoch());
    }

    #[test]
    fn test_expired_session_is_not_live() {
        let issued = Utc::now() - TimeDelta::hours(25);
        let state = SessionState::default().established(Session::new(
            SecretString::from("old"),
            issued,
            TimeDelta::hours(24),
        ));
        assert!(state.live_session(Utc::now()).is_none());
    }

    #[tokio::test]
    async fn test_attach_adds_bearer_header() {
        let service = SessionService::in_memory(TimeDelta::hours(24));

        let anonymous = service.attach(request()).await;
        assert!(anonymous.request.headers().get(AUTHORIZATION).is_none());

        service.establish(SecretString::from("tok-1")).await;
        let attached = service.attach(request()).await;
        assert_eq!(
            attached.request.headers().get(AUTHORIZATION).unwrap(),
            "Bearer tok-1"
        );
        assert_eq!(attached.epoch, service.current_epoch().await);
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let service = SessionService::in_memory(TimeDelta::hours(24));
        service.establish(SecretString::from("tok-1")).await;

        assert!(service.invalidate().await);
        let epoch = service.current_epoch().await;
        assert!(!service.invalidate().await);
        assert_eq!(service.current_epoch().await, epoch);
        assert!(!service.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_stale_unauthorized_keeps_newer_session() {
        let service = SessionService::in_memory(TimeDelta::hours(24));
        service.establish(SecretString::from("first")).await;
        let old_epoch = service.attach(request()).await.epoch;

        service.establish(SecretString::from("second")).await;

        assert_eq!(
            service.handle_unauthorized(old_epoch).await,
            UnauthorizedOutcome::Stale
        );
        assert!(service.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_restore_from_store() {
        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());

        let first = SessionService::new(Arc::clone(&store), TimeDelta::hours(24));
        first.establish(SecretString::from("persisted")).await;

        let second = SessionService::new(Arc::clone(&store), TimeDelta::hours(24));
        assert!(second.restore().await.unwrap());
        assert_eq!(
            second.current().await.unwrap().token().expose_secret(),
            "persisted"
        );

        second.invalidate().await;
        assert!(store.load().unwrap().is_none());
    }

    /// Store whose `clear` takes a while, like a slow disk.
    struct SlowClearStore {
        inner: MemoryTokenStore,
        delay: std::time::Duration,
    }

    impl TokenStore for SlowClearStore {
        fn load(&self) -> Result<Option<StoredToken>, TokenStoreError> {
            self.inner.load()
        }

        fn save(&self, token: &StoredToken) -> Result<(), TokenStoreError> {
            self.inner.save(token)
        }

        fn clear(&self) -> Result<(), TokenStoreError> {
            std::thread::sleep(self.delay);
            self.inner.clear()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slow_clear_cannot_drop_newer_login() {
        let store: Arc<dyn TokenStore> = Arc::new(SlowClearStore {
            inner: MemoryTokenStore::new(),
            delay: std::time::Duration::from_millis(200),
        });
        let service = SessionService::new(Arc::clone(&store), TimeDelta::hours(24));
        service.establish(SecretString::from("old")).await;
        let old_epoch = service.current_epoch().await;

        let expiring = service.clone();
        let unauthorized =
            tokio::spawn(async move { expiring.handle_unauthorized(old_epoch).await });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        service.establish(SecretString::from("new")).await;
        unauthorized.await.unwrap();

        assert!(service.is_authenticated().await);
        let restarted = SessionService::new(Arc::clone(&store), TimeDelta::hours(24));
        assert!(restarted.restore().await.unwrap());
        assert_eq!(
            restarted.current().await.unwrap().token().expose_secret(),
            "new"
        );
    }

    #[tokio::test]
    async fn test_restore_discards_expired() {
        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
        let stale = Session::new(
            SecretString::from("old"),
            Utc::now() - TimeDelta::hours(30),
            TimeDelta::hours(24),
        );
        store.save(&StoredToken::from(&stale)).unwrap();

        let service = SessionService::new(Arc::clone(&store), TimeDelta::hours(24));
        assert!(!service.restore().await.unwrap());
        assert!(store.load().unwrap().is_none());
    }
}
