use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the two participant handles of a conversation id.
pub const CONVERSATION_ID_SEPARATOR: char = '_';

/// Canonical form used whenever two handles are compared.
pub fn normalize(handle: &str) -> String {
    handle.trim().to_lowercase()
}

/// Composite key of a conversation, conventionally `"<userA>_<userB>"`.
///
/// The backend does not guarantee the order of the two handles and nothing
/// escapes a handle that itself contains the separator, so the format is
/// never validated here. Use [`ConversationId::participants`] to find out
/// whether the id follows the convention.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Returns `None` for an empty id, which means "new conversation".
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The two normalized participant handles, if the id splits into exactly
    /// two segments.
    pub fn participants(&self) -> Option<(String, String)> {
        let segments: Vec<&str> = self.0.split(CONVERSATION_ID_SEPARATOR).collect();
        match segments.as_slice() {
            [a, b] => Some((normalize(a), normalize(b))),
            _ => None,
        }
    }

    /// The participant that is not `me`. When neither segment matches `me`,
    /// the first segment wins.
    pub fn counterpart(&self, me: &str) -> Option<String> {
        let me = normalize(me);
        self.participants()
            .map(|(first, second)| if first == me { second } else { first })
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
