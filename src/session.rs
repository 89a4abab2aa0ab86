//! Who is logged in.
//!
//! The session record is kept in client storage as JSON, the same shape the
//! backend returns for a user. Views never read storage themselves: the app
//! resolves the session once per navigation and hands it to the view.

use crate::store::Store;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Storage key of the session record.
pub const SESSION_KEY: &str = "currentUser";

/// Value that older clients wrote when a login produced no user object.
pub const ABSENT_MARKER: &str = "undefined";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "userName")]
    pub user_name: String,
    #[serde(
        rename = "loggedInAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub logged_in_at: Option<DateTime<Utc>>,
    /// Whatever else the backend put in the user object (tokens, ids, ...).
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl Session {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            logged_in_at: None,
            profile: Map::new(),
        }
    }

    /// Handle exactly as the backend spelled it.
    pub fn handle(&self) -> &str {
        &self.user_name
    }
}

/// Identity resolution over a raw stored value.
///
/// Anything that is not a JSON object with a non-empty string `userName`
/// means "no session".
pub fn resolve_identity(raw: Option<&str>) -> Option<Session> {
    let raw = raw?;
    if raw == ABSENT_MARKER {
        return None;
    }

    match serde_json::from_str::<Session>(raw) {
        Ok(session) if !session.user_name.is_empty() => Some(session),
        Ok(_) => None,
        Err(e) => {
            warn!("Ignoring unreadable session record: {}", e);
            None
        }
    }
}

/// Read/write/clear lifecycle of the persisted session.
#[derive(Clone, Debug)]
pub struct SessionContext {
    store: Store,
}

impl SessionContext {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// The logged-in user, if any. Storage failures count as "no session".
    pub async fn current(&self) -> Option<Session> {
        match self.store.get(SESSION_KEY).await {
            Ok(raw) => resolve_identity(raw.as_deref()),
            Err(e) => {
                warn!("Failed to read session: {:#}", e);
                None
            }
        }
    }

    /// Persist `session` as the logged-in user (login).
    pub async fn begin(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string(session).context("Failed to encode session")?;
        self.store.set(SESSION_KEY, &json).await?;
        info!("Session started for {}", session.user_name);
        Ok(())
    }

    /// Forget the logged-in user (logout).
    pub async fn end(&self) -> Result<()> {
        self.store.remove(SESSION_KEY).await?;
        info!("Session ended");
        Ok(())
    }
}
