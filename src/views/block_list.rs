use crate::api::ApiClient;
use crate::bus::{EventBus, NotificationLevel};
use crate::handle::normalize;
use crate::session::Session;
use crate::views::ListAction;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{info, warn};

pub const ACCESS_DENIED: &str = "Please log in to view your block list.";

/// Users the logged-in user has blocked.
pub struct BlockListView {
    api: ApiClient,
    bus: Arc<EventBus>,
    session: Option<Session>,
    blocked: Vec<String>,
    input: String,
}

impl BlockListView {
    pub fn new(api: ApiClient, bus: Arc<EventBus>, session: Option<Session>) -> Self {
        Self {
            api,
            bus,
            session,
            blocked: Vec::new(),
            input: String::new(),
        }
    }

    pub fn blocked(&self) -> &[String] {
        &self.blocked
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Normalized handle of the blocker.
    fn blocker(&self) -> Option<String> {
        self.session.as_ref().map(|s| normalize(s.handle()))
    }

    pub async fn mount(&mut self) {
        self.refresh().await;
    }

    /// Fetch the list. Any failure empties it.
    pub async fn refresh(&mut self) {
        let Some(blocker) = self.blocker() else {
            return;
        };

        self.blocked = match self.api.block_list(&blocker).await {
            Ok(rows) => rows.into_iter().map(|row| row.blocked_id).collect(),
            Err(e) => {
                warn!("Failed to load block list: {}", e);
                Vec::new()
            }
        };
    }

    /// Block whatever is in the input field.
    pub async fn block(&mut self) -> ListAction {
        let Some(blocker) = self.blocker() else {
            return ListAction::Skipped;
        };
        let target = normalize(&self.input);
        if target.is_empty() {
            return ListAction::Skipped;
        }

        let exists = match self.api.user_exists(&target).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!("Existence check for {} failed: {}", target, e);
                false
            }
        };
        if !exists {
            let message = format!("User \"{}\" does not exist.", target);
            self.bus.notify(NotificationLevel::Error, message.clone());
            self.input.clear();
            return ListAction::Refused(message);
        }

        let outcome = match self.api.block(&blocker, &target).await {
            Ok(()) => {
                info!("{} blocked {}", blocker, target);
                self.bus
                    .notify(NotificationLevel::Success, "Block successful");
                self.refresh().await;
                ListAction::Done
            }
            Err(e) => {
                let message = e.rejection().unwrap_or("Block failed").to_string();
                warn!("Block of {} failed: {}", target, e);
                self.bus.notify(NotificationLevel::Error, message.clone());
                ListAction::Failed(message)
            }
        };

        self.input.clear();
        outcome
    }

    pub async fn unblock(&mut self, handle: &str) -> ListAction {
        let Some(blocker) = self.blocker() else {
            return ListAction::Skipped;
        };
        let target = normalize(handle);
        if target.is_empty() {
            return ListAction::Skipped;
        }

        match self.api.unblock(&blocker, &target).await {
            Ok(()) => {
                info!("{} unblocked {}", blocker, target);
                self.bus
                    .notify(NotificationLevel::Success, "Unblock successful");
                self.refresh().await;
                ListAction::Done
            }
            Err(e) => {
                let message = e.rejection().unwrap_or("Unblock failed").to_string();
                warn!("Unblock of {} failed: {}", target, e);
                self.bus.notify(NotificationLevel::Error, message.clone());
                ListAction::Failed(message)
            }
        }
    }

    pub fn render(&self) -> String {
        if self.session.is_none() {
            return ACCESS_DENIED.to_string();
        }

        let mut out = String::from("Block List\n");
        if self.blocked.is_empty() {
            out.push_str("  No blocked users\n");
        }
        for handle in &self.blocked {
            let _ = writeln!(out, "  {}", handle);
        }
        out
    }
}
