//! Explicit session context.
//!
//! A [`Session`] owns the bearer token (through a [`TokenStore`]) and the
//! resolved operator. It is created once, injected into [`IicgpApi`], and
//! moves through `Unresolved -> Anonymous | Authenticated`:
//!
//! - [`Session::resolve`] turns a stored token into an operator via
//!   `/auth/me`, or drops the token if the backend rejects it.
//! - [`Session::login`] stores a fresh token and resolves it.
//! - [`Session::logout`] and any 401 on an authenticated call clear both.
//! - [`Session::guard`] is the route guard: nothing protected runs until the
//!   session is resolved and the role passes [`can_access`].

use std::sync::{Arc, RwLock};

use iicgp_core::access::{can_access, Resource};
use iicgp_core::user::{CurrentUser, LoginRequest};

use crate::api::IicgpApi;
use crate::error::{ClientError, ClientResult};
use crate::token::TokenStore;

/// Fallback when the login endpoint rejects without a message.
pub const MSG_INVALID_CREDENTIALS: &str = "Credenciais inválidas";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// A token may exist but has not been checked yet.
    Unresolved,
    Anonymous,
    Authenticated(CurrentUser),
}

struct SessionInner {
    store: Box<dyn TokenStore>,
    state: RwLock<SessionState>,
}

/// Shared handle to the operator's session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                store: Box::new(store),
                state: RwLock::new(SessionState::Unresolved),
            }),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.inner.store.load()
    }

    pub fn state(&self) -> SessionState {
        self.inner
            .state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        match self.state() {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    fn set_state(&self, state: SessionState) {
        *self.inner.state.write().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Check the stored token against `/auth/me`.
    ///
    /// A rejected token is removed. Any other failure keeps the token and
    /// leaves the session unresolved, so the next guard checks it again.
    pub async fn resolve(&self, api: &IicgpApi) -> ClientResult<SessionState> {
        let Some(token) = self.token() else {
            self.set_state(SessionState::Anonymous);
            return Ok(SessionState::Anonymous);
        };

        match api.me_with_token(&token).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, role_id = user.role_id, "Session resolved");
                self.set_state(SessionState::Authenticated(user.clone()));
                Ok(SessionState::Authenticated(user))
            }
            Err(ClientError::Server { status, .. }) => {
                tracing::info!(status, "Stored token rejected, clearing it");
                self.inner.store.clear()?;
                self.set_state(SessionState::Anonymous);
                Ok(SessionState::Anonymous)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Could not resolve session");
                self.set_state(SessionState::Unresolved);
                Err(err)
            }
        }
    }

    /// Authenticate and resolve the operator.
    pub async fn login(
        &self,
        api: &IicgpApi,
        username: &str,
        password: &str,
    ) -> ClientResult<CurrentUser> {
        let credentials = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = api.login(&credentials).await.map_err(|err| match err {
            ClientError::Server { status, message } => ClientError::Server {
                status,
                message: message.or_else(|| Some(MSG_INVALID_CREDENTIALS.to_string())),
            },
            other => other,
        })?;

        self.inner.store.store(&response.token)?;
        match self.resolve(api).await? {
            SessionState::Authenticated(user) => Ok(user),
            _ => Err(ClientError::SessionRequired),
        }
    }

    /// Drop the token and the operator.
    pub fn logout(&self) -> ClientResult<()> {
        self.inner.store.clear()?;
        self.set_state(SessionState::Anonymous);
        tracing::info!("Logged out");
        Ok(())
    }

    /// Forced logout after the backend rejected the token mid-session.
    pub(crate) fn expire(&self) {
        if let Err(err) = self.inner.store.clear() {
            tracing::warn!(error = %err, "Could not clear expired token");
        }
        self.set_state(SessionState::Anonymous);
    }

    /// Route guard: resolve if needed, then require a role that may open
    /// `resource`.
    pub async fn guard(&self, api: &IicgpApi, resource: Resource) -> ClientResult<CurrentUser> {
        let state = match self.state() {
            SessionState::Unresolved => self.resolve(api).await?,
            other => other,
        };
        let SessionState::Authenticated(user) = state else {
            return Err(ClientError::SessionRequired);
        };
        if !can_access(user.role_id, resource) {
            return Err(ClientError::Forbidden {
                role: user.role_id,
                resource,
            });
        }
        Ok(user)
    }
}
