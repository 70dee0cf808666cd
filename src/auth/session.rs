//! Session management
//!
//! [`SessionManager`] is the single owner of "is anyone logged in, and as
//! whom". It keeps the in-memory session in a `watch` channel so readers never
//! touch storage, mirrors it into the [`KeyValueStore`], and publishes
//! [`SessionEvent`]s for anything that needs to react to login or logout.
//!
//! Every transition bumps a generation counter. Authenticated requests carry
//! the generation they were sent under, and a 401 tagged with an older
//! generation is ignored instead of logging out a newer session.
//!
//! Storage writes and the state transition they belong to run under one
//! lock, so the persisted keys always match the in-memory session once a
//! login, logout, rejection or restore has returned.

use crate::auth::models::{LoginRequest, LoginResponse, Role, User};
use crate::auth::store::{KeyValueStore, TOKEN_KEY, USER_KEY};
use crate::auth::token::is_token_expired;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 16;

/// Remote authentication endpoint
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for a token and user payload
    ///
    /// Explicit rejections map to [`Error::InvalidCredentials`], unreachable
    /// backends to [`Error::NetworkUnavailable`].
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse>;
}

/// The client's belief about who is using the app
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    LoggedOut,
    LoggedIn { token: String, user: User },
}

impl Session {
    pub fn is_logged_in(&self) -> bool {
        matches!(self, Session::LoggedIn { .. })
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Session::LoggedIn { token, .. } => Some(token),
            Session::LoggedOut => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Session::LoggedIn { user, .. } => Some(user),
            Session::LoggedOut => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.user().map(|user| user.role)
    }
}

/// Session generation captured when a request is sent, with the token if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTag {
    pub generation: u64,
    pub token: Option<String>,
}

/// Snapshot published to subscribers
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub session: Session,
    /// Incremented on every login and logout
    pub generation: u64,
    /// False until `restore()` has completed
    pub ready: bool,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// Explicit logout
    UserRequested,
    /// The backend answered an authenticated request with 401
    AuthorizationExpired,
}

/// Session lifecycle notifications
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Restoration finished; downstream loads may start
    Ready(Session),
    LoggedIn(User),
    LoggedOut(LogoutReason),
}

struct Inner {
    store: Arc<dyn KeyValueStore>,
    backend: Arc<dyn AuthBackend>,
    state: watch::Sender<SessionState>,
    events: broadcast::Sender<SessionEvent>,
    // Held across every storage mutation and the transition it belongs to
    transition: Mutex<()>,
}

/// Owner of the authentication lifecycle
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Create a session manager in the `LoggedOut`, not-yet-ready state
    pub fn new(store: Arc<dyn KeyValueStore>, backend: Arc<dyn AuthBackend>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                store,
                backend,
                state,
                events,
                transition: Mutex::new(()),
            }),
        }
    }

    /// Rebuild the session from persisted storage
    ///
    /// Never fails: missing, partial, unreadable or expired state all degrade
    /// to `LoggedOut`, and any stray keys are removed unless a login has
    /// already committed.
    pub async fn restore(&self) -> Session {
        let _guard = self.inner.transition.lock().await;
        let restored = match self.read_persisted().await {
            Ok(Some((token, user))) => {
                info!("Restored session for {} ({})", user.email, user.role);
                Session::LoggedIn { token, user }
            }
            Ok(None) => {
                debug!("No persisted session");
                Session::LoggedOut
            }
            Err(e) => {
                // Storage that belongs to a committed login is not ours to wipe
                let live = self.inner.state.borrow().session.is_logged_in();
                if !live {
                    warn!("Discarding persisted session: {}", e);
                    self.clear_persisted().await;
                }
                Session::LoggedOut
            }
        };

        // A login that committed before we took the lock wins
        self.inner.state.send_modify(|state| {
            if !state.session.is_logged_in() && restored.is_logged_in() {
                state.session = restored;
                state.generation += 1;
            }
            state.ready = true;
        });

        let session = self.current();
        let _ = self.inner.events.send(SessionEvent::Ready(session.clone()));
        session
    }

    async fn read_persisted(&self) -> Result<Option<(String, User)>> {
        let store = &self.inner.store;
        let (token, user) = tokio::join!(store.get(TOKEN_KEY), store.get(USER_KEY));

        match (token?, user?) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(Error::CorruptedSession("token without user".to_string())),
            (None, Some(_)) => Err(Error::CorruptedSession("user without token".to_string())),
            (Some(token), Some(raw_user)) => {
                if token.is_empty() {
                    return Err(Error::CorruptedSession("empty token".to_string()));
                }
                let user: User = serde_json::from_str(&raw_user)
                    .map_err(|e| Error::CorruptedSession(format!("unreadable user: {}", e)))?;
                if is_token_expired(&token) {
                    return Err(Error::AuthorizationExpired(
                        "persisted token has expired".to_string(),
                    ));
                }
                Ok(Some((token, user)))
            }
        }
    }

    /// Log in with email and password
    ///
    /// On failure the in-memory session is left as it was.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let request = LoginRequest::new(email, password);
        let response = match self.inner.backend.login(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Login failed for {}: {}", email, e);
                return Err(e);
            }
        };

        if response.token.is_empty() {
            return Err(Error::InvalidResponse(
                "login response carried no token".to_string(),
            ));
        }

        let _guard = self.inner.transition.lock().await;
        self.persist(&response).await?;

        let user = response.user;
        let session = Session::LoggedIn {
            token: response.token,
            user: user.clone(),
        };
        self.inner.state.send_modify(|state| {
            state.session = session.clone();
            state.generation += 1;
            state.ready = true;
        });

        info!("Logged in as {} ({})", user.email, user.role);
        let _ = self.inner.events.send(SessionEvent::LoggedIn(user));
        Ok(session)
    }

    /// Write token and user; either both land or neither does
    async fn persist(&self, response: &LoginResponse) -> Result<()> {
        let store = &self.inner.store;
        let user_json = serde_json::to_string(&response.user)?;

        store
            .set(TOKEN_KEY, &response.token)
            .await
            .map_err(storage_error)?;

        if let Err(e) = store.set(USER_KEY, &user_json).await {
            if let Err(cleanup) = store.remove(TOKEN_KEY).await {
                warn!("Failed to roll back token after partial write: {}", cleanup);
            }
            return Err(storage_error(e));
        }
        Ok(())
    }

    /// Clear the session. Safe to call when already logged out; any stray
    /// persisted keys are removed either way.
    pub async fn logout(&self) {
        self.end_session(LogoutReason::UserRequested, None).await;
    }

    /// Called when any authenticated request gets a 401; ends the live session
    /// like `logout()`, but does nothing when no one is logged in
    pub async fn on_authentication_rejected(&self) {
        self.end_session(LogoutReason::AuthorizationExpired, None).await;
    }

    /// Like `on_authentication_rejected`, but only if `generation` is still current
    ///
    /// Returns whether the session was ended. A rejection that ends nothing
    /// leaves storage untouched.
    pub async fn on_authentication_rejected_for(&self, generation: u64) -> bool {
        self.end_session(LogoutReason::AuthorizationExpired, Some(generation))
            .await
    }

    async fn end_session(&self, reason: LogoutReason, expected: Option<u64>) -> bool {
        let _guard = self.inner.transition.lock().await;
        let ended = self.inner.state.send_if_modified(|state| {
            let current = expected.map_or(true, |generation| generation == state.generation);
            if current && state.session.is_logged_in() {
                state.session = Session::LoggedOut;
                state.generation += 1;
                true
            } else {
                false
            }
        });

        if !ended {
            if let Some(generation) = expected {
                debug!("Ignoring stale authorization rejection (generation {})", generation);
            }
            if reason == LogoutReason::UserRequested {
                self.clear_persisted().await;
            }
            return false;
        }

        self.clear_persisted().await;

        match reason {
            LogoutReason::UserRequested => info!("Logged out"),
            LogoutReason::AuthorizationExpired => info!("Session rejected by server, logged out"),
        }
        let _ = self.inner.events.send(SessionEvent::LoggedOut(reason));
        true
    }

    async fn clear_persisted(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.inner.store.remove(key).await {
                warn!("Failed to remove '{}' from storage: {}", key, e);
            }
        }
    }

    /// The in-memory session; never touches storage or network
    pub fn current(&self) -> Session {
        self.inner.state.borrow().session.clone()
    }

    /// Generation and token for an outgoing request, read in one step
    pub fn request_tag(&self) -> RequestTag {
        let state = self.inner.state.borrow();
        RequestTag {
            generation: state.generation,
            token: state.session.token().map(str::to_string),
        }
    }

    pub fn generation(&self) -> u64 {
        self.inner.state.borrow().generation
    }

    /// Whether `restore()` (or a login) has completed
    pub fn is_ready(&self) -> bool {
        self.inner.state.borrow().ready
    }

    /// Follow session state changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Receive lifecycle events emitted after this call
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }
}

fn storage_error(err: Error) -> Error {
    match err {
        Error::Storage(_) => err,
        other => Error::Storage(other.to_string()),
    }
}
