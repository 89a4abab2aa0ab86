use crate::handle::ConversationId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Screens of the client, addressed by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    Login,
    Conversations,
    /// `None` opens a new conversation.
    Conversation(Option<ConversationId>),
    BlockList,
    FriendList,
}

impl Route {
    pub fn conversation(id: ConversationId) -> Self {
        Route::Conversation(Some(id))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Login => f.write_str("/login"),
            Route::Conversations => f.write_str("/conversations"),
            Route::Conversation(None) => f.write_str("/conversation"),
            Route::Conversation(Some(id)) => write!(f, "/conversation/{}", id),
            Route::BlockList => f.write_str("/blocklist"),
            Route::FriendList => f.write_str("/friendlist"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no screen at '{0}'")]
pub struct UnknownRoute(pub String);

impl FromStr for Route {
    type Err = UnknownRoute;

    /// Paths match case-insensitively; the conversation id keeps its case.
    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let trimmed = path.trim();
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        let mut segments = trimmed.splitn(3, '/');

        if !segments.next().map(str::is_empty).unwrap_or(false) {
            return Err(UnknownRoute(path.to_string()));
        }
        let screen = segments.next().unwrap_or("").to_ascii_lowercase();
        let rest = segments.next();

        match (screen.as_str(), rest) {
            ("" | "login", None) => Ok(Route::Login),
            ("conversations", None) => Ok(Route::Conversations),
            ("conversation", None) => Ok(Route::Conversation(None)),
            ("conversation", Some(id)) if !id.contains('/') => {
                Ok(Route::Conversation(ConversationId::new(id)))
            }
            ("blocklist", None) => Ok(Route::BlockList),
            ("friendlist", None) => Ok(Route::FriendList),
            _ => Err(UnknownRoute(path.to_string())),
        }
    }
}
