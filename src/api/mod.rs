pub mod client;
pub mod types;

pub use client::{ApiClient, ApiError};
pub use types::{BlockedUser, Credentials, Envelope, Friend, LoginReply, OutgoingMessage, SentMessage};
