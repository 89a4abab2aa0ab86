pub mod block_list;
pub mod conversation;
pub mod conversations;
pub mod friend_list;
pub mod login;

pub use block_list::BlockListView;
pub use conversation::{ConversationView, Resolution, SendOutcome};
pub use conversations::ConversationsView;
pub use friend_list::FriendListView;
pub use login::LoginView;

/// Outcome of an add/remove action on a list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListAction {
    Done,
    /// Nothing to do (empty input, no session).
    Skipped,
    /// Precondition failed before the mutation was sent.
    Refused(String),
    Failed(String),
}
