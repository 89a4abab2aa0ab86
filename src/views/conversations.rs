use crate::api::ApiClient;
use crate::bus::{EventBus, NotificationLevel};
use crate::chat::ConversationSummary;
use crate::route::Route;
use crate::session::Session;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{error, info};

pub const ACCESS_DENIED: &str = "Please log in to view your conversations.";

/// All conversations of the logged-in user.
pub struct ConversationsView {
    api: ApiClient,
    bus: Arc<EventBus>,
    session: Option<Session>,
    conversations: Vec<ConversationSummary>,
}

impl ConversationsView {
    pub fn new(api: ApiClient, bus: Arc<EventBus>, session: Option<Session>) -> Self {
        Self {
            api,
            bus,
            session,
            conversations: Vec::new(),
        }
    }

    pub fn conversations(&self) -> &[ConversationSummary] {
        &self.conversations
    }

    pub async fn mount(&mut self) {
        self.refresh().await;
    }

    /// Fetch the list. A failure keeps whatever was shown before.
    pub async fn refresh(&mut self) {
        let Some(session) = &self.session else {
            return;
        };

        match self.api.conversations(session.handle()).await {
            Ok(conversations) => {
                info!(
                    "Loaded {} conversations for {}",
                    conversations.len(),
                    session.handle()
                );
                self.conversations = conversations;
            }
            Err(e) => {
                error!("Failed to load conversations: {}", e);
            }
        }
    }

    /// Route to a conversation, by row number (from 1) or by id.
    pub fn select(&self, key: &str) -> Option<Route> {
        self.session.as_ref()?;

        let key = key.trim();
        let row = match key.parse::<usize>() {
            Ok(n) if n >= 1 => self.conversations.get(n - 1),
            _ => self.conversations.iter().find(|c| c.conversation_id == key),
        };

        match row.and_then(ConversationSummary::id) {
            Some(id) => Some(Route::conversation(id)),
            None => {
                self.bus
                    .notify(NotificationLevel::Warning, format!("No conversation '{}'", key));
                None
            }
        }
    }

    pub fn render(&self) -> String {
        let Some(session) = &self.session else {
            return ACCESS_DENIED.to_string();
        };

        let mut out = String::new();
        let _ = writeln!(out, "Conversations for {}", session.handle());
        let _ = writeln!(out, "  # | Id | Message Count | To | From");
        for (index, convo) in self.conversations.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {} | {} | {} | {} | {}",
                index + 1,
                convo.conversation_id,
                convo.message_count,
                convo.to_id,
                convo.from_id
            );
        }
        out
    }
}
