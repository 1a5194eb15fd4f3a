//! Authentication state store.
//!
//! Owns the mutable auth record and the storage handle. Every mutation is a
//! plain `&mut self` method that runs to completion, then commits the
//! persisted subset (`token`, `userId`, `user`, `isAuthenticated`) through
//! the injected [`StateStorage`]. Transient fields (`is_loading`, `error`)
//! never touch storage.
//!
//! Commit failures are logged and swallowed: no action here returns an
//! error, and the worst outcome of any internal failure is a safe
//! "unauthenticated" reading.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::storage::StateStorage;
use crate::token;

/// Slot key for the persisted auth subset.
pub const STORAGE_KEY: &str = "auth-storage";

/// A user identifier: servers hand these out as strings or numbers, and the
/// store treats both as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    /// String-shaped identifier (`"u1"`, UUIDs, ...).
    Text(String),
    /// Numeric identifier.
    Number(i64),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Text(s) => f.write_str(s),
            UserId::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId::Text(s.to_string())
    }
}

impl From<i64> for UserId {
    fn from(n: i64) -> Self {
        UserId::Number(n)
    }
}

/// The live auth record.
///
/// `is_authenticated` is derived-but-stored: [`AuthStore::set_auth`] and
/// [`AuthStore::set_token`] keep it consistent with token presence, but
/// `user`/`user_id` may be populated or stale independently of it (no
/// cross-field enforcement).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    /// Opaque bearer token. `None` when signed out; never `Some("")`.
    pub token: Option<String>,
    /// Opaque user identifier, independent of `user`.
    pub user_id: Option<UserId>,
    /// Arbitrary profile payload, no fixed shape.
    pub user: Option<Value>,
    /// True only while a non-empty token is held.
    pub is_authenticated: bool,
    /// Caller-controlled UI flag, transient.
    pub is_loading: bool,
    /// Caller-supplied error payload, opaque and transient.
    pub error: Option<String>,
}

/// Durable projection of [`AuthState`].
///
/// CamelCase keys match the historical slot format; `isLoading` and `error`
/// are deliberately absent.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PersistedAuth {
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<Value>,
    is_authenticated: bool,
}

impl PersistedAuth {
    fn project(state: &AuthState) -> Self {
        Self {
            token: state.token.clone(),
            user_id: state.user_id.clone(),
            user: state.user.clone(),
            is_authenticated: state.is_authenticated,
        }
    }

    fn seed(self) -> AuthState {
        AuthState {
            token: self.token,
            user_id: self.user_id,
            user: self.user,
            is_authenticated: self.is_authenticated,
            // Transients always start at their defaults.
            is_loading: false,
            error: None,
        }
    }
}

/// The auth state store: record plus injected storage.
///
/// Single-threaded by construction; callers own the store and pass a handle
/// to consumers rather than going through a global.
pub struct AuthStore<S: StateStorage> {
    state: AuthState,
    storage: S,
}

impl<S: StateStorage> AuthStore<S> {
    /// Hydrates a store from the persisted slot.
    ///
    /// A missing slot, an unreadable slot, or malformed JSON all degrade to
    /// the empty default state; hydration never fails.
    pub fn load(storage: S) -> Self {
        let state = match storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<PersistedAuth>(&raw) {
                Ok(persisted) => persisted.seed(),
                Err(e) => {
                    warn!("discarding malformed auth slot: {e}");
                    AuthState::default()
                }
            },
            Ok(None) => AuthState::default(),
            Err(e) => {
                warn!("failed to read auth slot: {e:#}");
                AuthState::default()
            }
        };

        Self { state, storage }
    }

    /// Read access for observers (UI, route guards).
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Records a successful credential exchange.
    ///
    /// Sets token, user id, and profile, forces `is_authenticated`, and
    /// clears any stale error. Trusts its inputs unconditionally: the caller
    /// is responsible for having validated the credentials remotely.
    pub fn set_auth(&mut self, token: String, user_id: UserId, user: Option<Value>) {
        self.state.token = normalize(Some(token));
        self.state.user_id = Some(user_id);
        self.state.user = user;
        self.state.is_authenticated = true;
        self.state.error = None;
        self.commit();
    }

    /// Replaces the profile only.
    pub fn set_user(&mut self, user: Option<Value>) {
        self.state.user = user;
        self.commit();
    }

    /// Replaces the token and recomputes `is_authenticated` from its
    /// presence. Structural check only, not a validity check.
    pub fn set_token(&mut self, token: Option<String>) {
        let token = normalize(token);
        self.state.is_authenticated = token.is_some();
        self.state.token = token;
        self.commit();
    }

    /// Replaces the user identifier only.
    pub fn set_user_id(&mut self, user_id: Option<UserId>) {
        self.state.user_id = user_id;
        self.commit();
    }

    /// Replaces the loading flag. Transient, never persisted.
    pub fn set_loading(&mut self, is_loading: bool) {
        self.state.is_loading = is_loading;
    }

    /// Replaces the error payload. Transient, never persisted.
    pub fn set_error(&mut self, error: Option<String>) {
        self.state.error = error;
    }

    /// Clears the error payload.
    pub fn clear_error(&mut self) {
        self.state.error = None;
    }

    /// Resets every field to its default in one update and overwrites the
    /// slot with the empty projection. The slot is not deleted.
    pub fn logout(&mut self) {
        self.state = AuthState::default();
        self.commit();
    }

    /// Headers to attach to outgoing requests.
    ///
    /// Empty map when no token is held; otherwise exactly one
    /// `Authorization: Bearer <token>` entry. Never an empty-string value.
    pub fn auth_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        if let Some(token) = &self.state.token {
            headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        }
        headers
    }

    /// Optimistic local expiry check, collapsed to a boolean.
    ///
    /// True only when a token is held, its payload decodes, and `exp` is in
    /// the future. Absent, malformed, and expired tokens all read as false;
    /// callers that need to tell those apart use [`token::evaluate`] on the
    /// token directly. Advisory only: this does not transition state, and it
    /// is not a security boundary.
    pub fn is_token_valid(&self) -> bool {
        self.state
            .token
            .as_deref()
            .is_some_and(|t| token::evaluate(t).is_valid())
    }

    /// Projects the persisted subset and writes it through the storage.
    ///
    /// Fire-and-forget durability: a failed write is logged and the action
    /// still completes.
    fn commit(&self) {
        let projection = PersistedAuth::project(&self.state);
        let json = match serde_json::to_string(&projection) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to serialize auth state: {e}");
                return;
            }
        };
        if let Err(e) = self.storage.put(STORAGE_KEY, &json) {
            warn!("failed to persist auth state: {e:#}");
        }
    }
}

/// Collapses empty-string tokens to `None` so the container has a single
/// definition of "token present".
fn normalize(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}
