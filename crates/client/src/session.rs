//! Session state and the auth token bridge.
//!
//! The session is the single owner of the bearer token. Components observe
//! it through a `tokio::sync::watch` channel; the bridge task is the only
//! writer into the [`ApiClient`]'s token slot, so callers never thread the
//! token through explicitly.

use secrecy::SecretString;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use clover_core::Email;

use crate::api::{ApiClient, ApiError};
use crate::api::types::SignUpBody;

/// Profile data returned by the auth endpoints.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub role: Option<String>,
}

/// The session's view of authentication.
///
/// `Loading` is the transitional state before the session provider has
/// resolved; no token may be pushed while in it, to avoid flashing
/// unauthenticated requests.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// The session provider has not resolved yet.
    #[default]
    Loading,
    /// Signed in with a live bearer token.
    Authenticated {
        user: UserProfile,
        token: SecretString,
    },
    /// Signed out (or sign-in failed).
    Unauthenticated,
}

impl SessionState {
    /// Whether the session holds a live token.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Owner of the session lifecycle.
///
/// Created at application start; every store and the token bridge subscribe
/// to it. Dropping the `Session` ends the subscriptions, which tears the
/// bridge task down.
pub struct Session {
    tx: watch::Sender<SessionState>,
}

impl Session {
    /// Create a new session in the `Loading` state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(SessionState::Loading),
        }
    }

    /// Subscribe to session transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    /// Sign in against the backend and transition to `Authenticated`.
    ///
    /// On failure the session transitions to `Unauthenticated` and the error
    /// is returned for the caller to present.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the credentials are rejected.
    pub async fn sign_in(
        &self,
        api: &ApiClient,
        email: &Email,
        password: &str,
    ) -> Result<UserProfile, ApiError> {
        match api.sign_in(email.as_str(), password).await {
            Ok(auth) => {
                let user = UserProfile {
                    name: auth.user.name,
                    email: auth.user.email,
                    role: auth.user.role,
                };
                self.tx.send_replace(SessionState::Authenticated {
                    user: user.clone(),
                    token: SecretString::from(auth.token),
                });
                Ok(user)
            }
            Err(e) => {
                self.tx.send_replace(SessionState::Unauthenticated);
                Err(e)
            }
        }
    }

    /// Create an account and transition to `Authenticated`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    pub async fn sign_up(
        &self,
        api: &ApiClient,
        signup: &SignUpBody,
    ) -> Result<UserProfile, ApiError> {
        match api.sign_up(signup).await {
            Ok(auth) => {
                let user = UserProfile {
                    name: auth.user.name,
                    email: auth.user.email,
                    role: auth.user.role,
                };
                self.tx.send_replace(SessionState::Authenticated {
                    user: user.clone(),
                    token: SecretString::from(auth.token),
                });
                Ok(user)
            }
            Err(e) => {
                self.tx.send_replace(SessionState::Unauthenticated);
                Err(e)
            }
        }
    }

    /// Sign out.
    pub fn sign_out(&self) {
        self.tx.send_replace(SessionState::Unauthenticated);
    }

    /// Install an already-obtained token (e.g. restored from storage).
    pub fn restore(&self, user: UserProfile, token: SecretString) {
        self.tx
            .send_replace(SessionState::Authenticated { user, token });
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn the auth token bridge.
///
/// The bridge observes session transitions and pushes the bearer token into
/// the API client exactly when it changes: `Authenticated` installs the
/// token, `Unauthenticated` clears it, and `Loading` is skipped so no call
/// ever goes out with a half-resolved session.
pub fn spawn_token_bridge(
    api: ApiClient,
    mut session: watch::Receiver<SessionState>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // Apply whatever state the session is already in.
        apply(&api, &session.borrow_and_update().clone());

        while session.changed().await.is_ok() {
            apply(&api, &session.borrow_and_update().clone());
        }

        debug!("session channel closed, token bridge stopping");
    })
}

fn apply(api: &ApiClient, state: &SessionState) {
    match state {
        SessionState::Loading => {}
        SessionState::Authenticated { token, .. } => {
            debug!("session authenticated, installing bearer token");
            api.set_token(Some(token.clone()));
        }
        SessionState::Unauthenticated => {
            debug!("session unauthenticated, clearing bearer token");
            api.set_token(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::ClientConfig;

    fn test_client() -> ApiClient {
        let config = ClientConfig::for_base_url("https://shop.example.com")
            .expect("static URL parses");
        ApiClient::new(&config).expect("client builds")
    }

    #[tokio::test]
    async fn test_bridge_skips_loading_state() {
        let api = test_client();
        let session = Session::new();
        let bridge = spawn_token_bridge(api.clone(), session.subscribe());

        // Still loading: no token must be installed.
        tokio::task::yield_now().await;
        assert!(!api.has_token());

        drop(session);
        let _ = bridge.await;
    }

    #[tokio::test]
    async fn test_bridge_installs_and_clears_token() {
        let api = test_client();
        let session = Session::new();
        let bridge = spawn_token_bridge(api.clone(), session.subscribe());

        session.restore(
            UserProfile {
                name: "Jo".to_owned(),
                email: "jo@example.com".to_owned(),
                role: None,
            },
            SecretString::from("opaque-bearer"),
        );
        // Let the bridge observe the transition.
        while !api.has_token() {
            tokio::task::yield_now().await;
        }

        session.sign_out();
        while api.has_token() {
            tokio::task::yield_now().await;
        }

        drop(session);
        let _ = bridge.await;
    }
}
