//! Route guard.
//!
//! [`RouteTable::decide`] is a pure function of the path and whether a
//! session is present; [`RouteGuard`] is the adapter that reads the session
//! store and hands redirects to a [`Navigator`].

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use crate::session::SessionService;

/// Result of evaluating one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    pub allow: bool,
    pub redirect_to: Option<String>,
}

impl RouteDecision {
    #[must_use]
    pub const fn allow() -> Self {
        Self {
            allow: true,
            redirect_to: None,
        }
    }

    #[must_use]
    pub fn redirect(to: &str) -> Self {
        Self {
            allow: false,
            redirect_to: Some(to.to_string()),
        }
    }
}

/// The route surface: one public entry path and one protected area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    login_path: String,
    protected_prefix: String,
    landing_path: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new("/", "/panel", "/panel")
    }
}

impl RouteTable {
    #[must_use]
    pub fn new(login_path: &str, protected_prefix: &str, landing_path: &str) -> Self {
        Self {
            login_path: normalize(login_path).to_string(),
            protected_prefix: normalize(protected_prefix).to_string(),
            landing_path: normalize(landing_path).to_string(),
        }
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    #[must_use]
    pub fn protected_prefix(&self) -> &str {
        &self.protected_prefix
    }

    #[must_use]
    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    /// Decide whether `path` may be shown.
    ///
    /// ```
    /// use ventas_client::{RouteDecision, RouteTable};
    ///
    /// let routes = RouteTable::default();
    /// assert_eq!(routes.decide("/panel", false), RouteDecision::redirect("/"));
    /// assert_eq!(routes.decide("/", true), RouteDecision::redirect("/panel"));
    /// assert_eq!(routes.decide("/panel", true), RouteDecision::allow());
    /// assert_eq!(routes.decide("/", false), RouteDecision::allow());
    /// ```
    #[must_use]
    pub fn decide(&self, path: &str, session_present: bool) -> RouteDecision {
        let path = normalize(path);

        // The login page is never protected, even under a "/" prefix.
        if path == self.login_path {
            return if session_present {
                RouteDecision::redirect(&self.landing_path)
            } else {
                RouteDecision::allow()
            };
        }

        if !session_present && self.is_protected(path) {
            return RouteDecision::redirect(&self.login_path);
        }

        RouteDecision::allow()
    }

    fn is_protected(&self, path: &str) -> bool {
        let prefix = self.protected_prefix.as_str();
        if prefix == "/" {
            return true;
        }
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

/// Drop query, fragment and trailing slashes; keep the root as `/`.
fn normalize(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = path.get(..end).unwrap_or(path);
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

/// Performs redirects decided elsewhere.
pub trait Navigator: Send + Sync {
    fn redirect(&self, target: &str);
}

/// Navigator for headless use: the redirect is only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, target: &str) {
        info!(target_path = %target, "Redirect");
    }
}

/// Navigator that remembers every redirect, in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn redirects(&self) -> Vec<String> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, target: &str) {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(target.to_string());
    }
}

/// Wires the route table to the session store and a navigator.
#[derive(Clone)]
pub struct RouteGuard {
    routes: RouteTable,
    session: SessionService,
    navigator: Arc<dyn Navigator>,
}

impl RouteGuard {
    #[must_use]
    pub fn new(routes: RouteTable, session: SessionService, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            routes,
            session,
            navigator,
        }
    }

    /// Evaluate a navigation attempt and perform the redirect if needed.
    ///
    /// No network access: only the local session state is consulted.
    pub async fn navigate(&self, path: &str) -> RouteDecision {
        let session_present = self.session.is_authenticated().await;
        let decision = self.routes.decide(path, session_present);

        debug!(path, session_present, ?decision, "Route evaluated");
        if let Some(target) = &decision.redirect_to {
            self.navigator.redirect(target);
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn test_decide_truth_table() {
        let routes = RouteTable::default();
        assert_eq!(routes.decide("/panel", false), RouteDecision::redirect("/"));
        assert_eq!(routes.decide("/", true), RouteDecision::redirect("/panel"));
        assert_eq!(routes.decide("/panel", true), RouteDecision::allow());
        assert_eq!(routes.decide("/", false), RouteDecision::allow());
    }

    #[test]
    fn test_nested_protected_paths() {
        let routes = RouteTable::default();
        assert_eq!(
            routes.decide("/panel/ventas", false),
            RouteDecision::redirect("/")
        );
        assert_eq!(
            routes.decide("/panel/?tab=clientes", false),
            RouteDecision::redirect("/")
        );
        assert_eq!(routes.decide("/panel/ventas", true), RouteDecision::allow());
    }

    #[test]
    fn test_prefix_is_segment_aware() {
        let routes = RouteTable::default();
        assert_eq!(routes.decide("/panelista", false), RouteDecision::allow());
        assert_eq!(routes.decide("/acerca", false), RouteDecision::allow());
    }

    #[test]
    fn test_root_prefix_keeps_login_public() {
        let routes = RouteTable::new("/login", "/", "/inicio");
        assert_eq!(routes.decide("/login", false), RouteDecision::allow());
        assert_eq!(routes.decide("/inicio", false), RouteDecision::redirect("/login"));
        assert_eq!(routes.decide("/login/", true), RouteDecision::redirect("/inicio"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/panel///"), "/panel");
        assert_eq!(normalize("/panel#top"), "/panel");
    }

    #[tokio::test]
    async fn test_guard_redirects_through_navigator() {
        let session = SessionService::in_memory(TimeDelta::hours(24));
        let navigator = Arc::new(RecordingNavigator::new());
        let guard = RouteGuard::new(
            RouteTable::default(),
            session.clone(),
            Arc::clone(&navigator) as Arc<dyn Navigator>,
        );

        assert!(!guard.navigate("/panel").await.allow);
        session.establish(SecretString::from("tok")).await;
        assert!(guard.navigate("/panel").await.allow);
        assert!(!guard.navigate("/").await.allow);

        assert_eq!(navigator.redirects(), vec!["/", "/panel"]);
    }
}
