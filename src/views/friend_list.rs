use crate::api::ApiClient;
use crate::bus::{EventBus, NotificationLevel};
use crate::handle::normalize;
use crate::session::Session;
use crate::views::ListAction;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{info, warn};

pub const ACCESS_DENIED: &str = "Please log in to view your friends list.";

pub struct FriendListView {
    api: ApiClient,
    bus: Arc<EventBus>,
    session: Option<Session>,
    friends: Vec<String>,
    input: String,
}

impl FriendListView {
    pub fn new(api: ApiClient, bus: Arc<EventBus>, session: Option<Session>) -> Self {
        Self {
            api,
            bus,
            session,
            friends: Vec::new(),
            input: String::new(),
        }
    }

    pub fn friends(&self) -> &[String] {
        &self.friends
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub async fn mount(&mut self) {
        self.refresh().await;
    }

    /// Fetch the list. The backend knows the user from the login cookie.
    pub async fn refresh(&mut self) {
        if self.session.is_none() {
            return;
        }

        self.friends = match self.api.friends().await {
            Ok(friends) => friends.into_iter().map(|f| f.user_name).collect(),
            Err(e) => {
                warn!("Failed to load friends: {}", e);
                Vec::new()
            }
        };
    }

    /// Add whatever is in the input field.
    pub async fn add(&mut self) -> ListAction {
        if self.session.is_none() {
            return ListAction::Skipped;
        }
        let friend = normalize(&self.input);
        if friend.is_empty() {
            return ListAction::Skipped;
        }
        self.input.clear();

        match self.api.add_friend(&friend).await {
            Ok(()) => {
                info!("Added friend {}", friend);
                self.bus.notify(NotificationLevel::Success, "Friend added!");
                self.refresh().await;
                ListAction::Done
            }
            Err(e) => {
                let message = e.rejection().unwrap_or("Failed to add friend.").to_string();
                warn!("Adding friend {} failed: {}", friend, e);
                self.bus.notify(NotificationLevel::Error, message.clone());
                ListAction::Failed(message)
            }
        }
    }

    pub async fn remove(&mut self, friend: &str) -> ListAction {
        if self.session.is_none() {
            return ListAction::Skipped;
        }

        match self.api.remove_friend(friend).await {
            Ok(()) => {
                info!("Removed friend {}", friend);
                self.bus.notify(NotificationLevel::Success, "Friend removed!");
                self.refresh().await;
                ListAction::Done
            }
            Err(e) => {
                let message = e
                    .rejection()
                    .unwrap_or("Failed to remove friend.")
                    .to_string();
                warn!("Removing friend {} failed: {}", friend, e);
                self.bus.notify(NotificationLevel::Error, message.clone());
                ListAction::Failed(message)
            }
        }
    }

    pub fn render(&self) -> String {
        if self.session.is_none() {
            return ACCESS_DENIED.to_string();
        }

        let mut out = String::from("Friends List\n");
        if self.friends.is_empty() {
            out.push_str("  No friends\n");
        }
        for friend in &self.friends {
            let _ = writeln!(out, "  {}", friend);
        }
        out
    }
}
