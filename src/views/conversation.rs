//! The conversation screen: loading a conversation, working out who the
//! other party is, and sending.

use crate::api::{ApiClient, ApiError, OutgoingMessage};
use crate::bus::{Event, EventBus, NotificationLevel};
use crate::chat::{DraftMessage, Message};
use crate::handle::{normalize, ConversationId};
use crate::route::Route;
use crate::session::Session;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const ACCESS_DENIED: &str = "Please log in to view this conversation.";
pub const MISSING_RECIPIENT: &str = "Recipient is not specified";
pub const SEND_FAILED: &str = "Failed to send message";
pub const LOAD_FAILED: &str = "Failed to load conversation";

/// Where the other party of a conversation came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Read off the first loaded message.
    FromMessages(String),
    /// Read off the two segments of the conversation id.
    FromIdentifier(String),
    /// The id does not split into two segments; the recipient is cleared.
    Malformed,
    /// New conversation: whatever was entered by hand stays.
    Unknown,
}

/// Work out the other party, preferring loaded messages over the id.
pub fn resolve_recipient(
    me: &str,
    messages: &[Message],
    conversation_id: Option<&ConversationId>,
) -> Resolution {
    let me = normalize(me);

    if let Some(first) = messages.first() {
        let candidate = if normalize(&first.from_id) == me {
            &first.to_id
        } else {
            &first.from_id
        };
        return Resolution::FromMessages(normalize(candidate));
    }

    match conversation_id {
        Some(id) => match id.counterpart(&me) {
            Some(other) => Resolution::FromIdentifier(other),
            None => Resolution::Malformed,
        },
        None => Resolution::Unknown,
    }
}

/// Result of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent(ConversationId),
    MissingRecipient,
    Rejected(String),
    Failed,
    NoSession,
}

pub struct ConversationView {
    api: ApiClient,
    bus: Arc<EventBus>,
    session: Option<Session>,
    conversation_id: Option<ConversationId>,
    messages: Vec<Message>,
    draft: DraftMessage,
}

impl ConversationView {
    pub fn new(
        api: ApiClient,
        bus: Arc<EventBus>,
        session: Option<Session>,
        conversation_id: Option<ConversationId>,
    ) -> Self {
        Self {
            api,
            bus,
            session,
            conversation_id,
            messages: Vec::new(),
            draft: DraftMessage::default(),
        }
    }

    pub fn conversation_id(&self) -> Option<&ConversationId> {
        self.conversation_id.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &DraftMessage {
        &self.draft
    }

    /// Other party, if one is known.
    pub fn recipient(&self) -> Option<&str> {
        Some(self.draft.recipient_handle.as_str()).filter(|r| !r.is_empty())
    }

    pub fn is_new(&self) -> bool {
        self.conversation_id.is_none()
    }

    /// The recipient field is shown for new conversations and whenever no
    /// recipient could be worked out.
    pub fn needs_manual_entry(&self) -> bool {
        self.session.is_some() && (self.is_new() || self.draft.recipient_handle.is_empty())
    }

    pub fn set_body(&mut self, text: impl Into<String>) {
        self.draft.body_text = text.into();
    }

    /// Manual recipient entry.
    pub fn set_recipient(&mut self, handle: &str) {
        self.draft.recipient_handle = normalize(handle);
    }

    /// First display: load whatever the id points at.
    pub async fn mount(&mut self) {
        if self.session.is_none() {
            return;
        }
        self.load().await;
    }

    /// Switch to another conversation. Opening the current one again does
    /// nothing.
    pub async fn open(&mut self, id: ConversationId) {
        if self.conversation_id.as_ref() == Some(&id) {
            return;
        }
        self.conversation_id = Some(id);
        self.messages.clear();
        self.refresh_recipient();
        if self.session.is_some() {
            self.load().await;
        }
    }

    /// Fetch the message history of the current conversation.
    pub async fn load(&mut self) {
        let Some(id) = self.conversation_id.clone() else {
            self.refresh_recipient();
            return;
        };

        match self.api.conversation(&id).await {
            Ok(messages) => {
                info!("Loaded {} messages for {}", messages.len(), id);
                self.messages = messages;
            }
            Err(e) => {
                error!("{} {}: {}", LOAD_FAILED, id, e);
                self.messages.clear();
                self.bus.notify(NotificationLevel::Warning, LOAD_FAILED);
            }
        }

        self.refresh_recipient();
    }

    fn refresh_recipient(&mut self) {
        let Some(session) = &self.session else {
            return;
        };

        match resolve_recipient(
            session.handle(),
            &self.messages,
            self.conversation_id.as_ref(),
        ) {
            Resolution::FromMessages(other) | Resolution::FromIdentifier(other) => {
                self.draft.recipient_handle = other;
            }
            Resolution::Malformed => {
                if let Some(id) = &self.conversation_id {
                    warn!("Conversation id has no two participants: {}", id);
                }
                self.draft.recipient_handle.clear();
            }
            Resolution::Unknown => {}
        }
    }

    /// Submit the draft.
    pub async fn send(&mut self) -> SendOutcome {
        if self.session.is_none() {
            self.bus.notify(NotificationLevel::Error, ACCESS_DENIED);
            return SendOutcome::NoSession;
        }
        if !self.draft.has_recipient() {
            self.bus.notify(NotificationLevel::Error, MISSING_RECIPIENT);
            return SendOutcome::MissingRecipient;
        }

        let outgoing = OutgoingMessage {
            message: self.draft.body_text.clone(),
            to_id: self.draft.recipient_handle.clone(),
        };

        let sent = match self.api.send_message(&outgoing).await {
            Ok(sent) => sent,
            Err(ApiError::Rejected { message }) => {
                let message = message.unwrap_or_else(|| SEND_FAILED.to_string());
                error!("Send message error: {}", message);
                self.bus.notify(NotificationLevel::Error, message.clone());
                return SendOutcome::Rejected(message);
            }
            Err(e) => {
                error!("{}: {}", SEND_FAILED, e);
                self.bus.notify(NotificationLevel::Error, SEND_FAILED);
                return SendOutcome::Failed;
            }
        };

        let Some(id) = sent
            .into_iter()
            .next()
            .and_then(|entry| ConversationId::new(entry.conversation_id))
        else {
            error!("{}: reply carried no conversation id", SEND_FAILED);
            self.bus.notify(NotificationLevel::Error, SEND_FAILED);
            return SendOutcome::Failed;
        };

        info!("Message to {} sent in {}", outgoing.to_id, id);
        self.draft.body_text.clear();
        self.conversation_id = Some(id.clone());
        self.bus.publish(Event::Navigated(Route::conversation(id.clone())));
        self.load().await;

        SendOutcome::Sent(id)
    }

    pub fn render(&self) -> String {
        if self.session.is_none() {
            return ACCESS_DENIED.to_string();
        }

        let mut out = String::new();
        match &self.conversation_id {
            Some(id) => {
                let _ = writeln!(out, "Conversation {}", id);
            }
            None => {
                let _ = writeln!(out, "Conversation (new conversation)");
            }
        }
        for msg in &self.messages {
            let _ = writeln!(out, "  {}: {}", msg.from_id, msg.display_body());
        }
        if self.needs_manual_entry() {
            let _ = writeln!(out, "Recipient: {}", self.draft.recipient_handle);
        } else {
            let _ = writeln!(out, "To: {}", self.draft.recipient_handle);
        }
        if !self.draft.body_text.is_empty() {
            let _ = writeln!(out, "Draft: {}", self.draft.body_text);
        }
        out
    }
}
