use crate::handle::ConversationId;
use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub from_id: String,
    pub to_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

impl Message {
    /// Body as shown in the conversation view.
    pub fn display_body(&self) -> &str {
        if self.message.is_empty() {
            "..."
        } else {
            &self.message
        }
    }
}

/// One row of the conversation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub conversation_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub to_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub from_id: String,
}

impl ConversationSummary {
    pub fn id(&self) -> Option<ConversationId> {
        ConversationId::new(self.conversation_id.clone())
    }
}

/// Unsent message held in the conversation view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftMessage {
    pub body_text: String,
    pub recipient_handle: String,
}

impl DraftMessage {
    pub fn has_recipient(&self) -> bool {
        !self.recipient_handle.trim().is_empty()
    }
}
