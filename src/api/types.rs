use serde::{Deserialize, Serialize};
use serde_json::Value;

// -----------------------------------------------------------------------------
// Envelope
// -----------------------------------------------------------------------------

/// Every backend reply: `{status, data?, message?}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// A missing flag is a failure.
    #[serde(default)]
    pub status: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

// -----------------------------------------------------------------------------
// Requests
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    #[serde(rename = "userName")]
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub message: String,
    pub to_id: String,
}

// -----------------------------------------------------------------------------
// Replies
// -----------------------------------------------------------------------------

/// `/login` reply. Older backends put the user at the top level, newer ones
/// under `data`, some omit it entirely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginReply {
    pub status: Option<bool>,
    pub user: Option<Value>,
    pub data: Option<Value>,
    pub message: Option<String>,
}

impl LoginReply {
    /// The user object carried by the reply, if it names a user.
    pub fn user_object(&self) -> Option<&Value> {
        let nested = self.data.as_ref().and_then(|d| d.get("user"));
        self.user
            .as_ref()
            .or(nested)
            .filter(|u| u.get("userName").and_then(Value::as_str).is_some())
    }
}

/// First entry of a `/sendMessage` reply.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    pub conversation_id: String,
}

/// One row of `/blockList?action=getBlockList`. The backend has shipped this
/// under three key names over time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlockedUser {
    #[serde(rename = "blockedId", alias = "username", alias = "blockedUser")]
    pub blocked_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Existence {
    #[serde(default)]
    pub exists: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Friend {
    #[serde(rename = "userName")]
    pub user_name: String,
}
