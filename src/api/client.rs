use crate::api::types::{
    BlockedUser, Credentials, Envelope, Existence, Friend, LoginReply, OutgoingMessage,
    SentMessage,
};
use crate::chat::{ConversationSummary, Message};
use crate::handle::ConversationId;
use reqwest::{Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend answered {0}")]
    Status(StatusCode),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{}", .message.as_deref().unwrap_or("request rejected"))]
    Rejected { message: Option<String> },
    #[error("invalid endpoint: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Explanation supplied by the backend, for `status: false` replies.
    pub fn rejection(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message } => message.as_deref(),
            _ => None,
        }
    }
}

impl<T> Envelope<T> {
    /// `data` of a successful reply, or the rejection.
    pub fn into_data(self) -> Result<Option<T>, ApiError> {
        if self.status {
            Ok(self.data)
        } else {
            Err(ApiError::Rejected {
                message: self.message,
            })
        }
    }
}

/// REST client for the chat backend.
///
/// Cookies set by `/login` are kept and sent with later calls; the friend
/// endpoints identify the user that way.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: Url, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().cookie_store(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let mut base_url = base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Envelope<T>, ApiError> {
        let url = self.endpoint(path)?;
        debug!("-> GET {} {:?}", url, query);
        let response = self.http.get(url).query(query).send().await?;
        decode(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Envelope<T>, ApiError> {
        let url = self.endpoint(path)?;
        debug!("-> POST {}", url);
        let response = self.http.post(url).json(body).send().await?;
        decode(response).await
    }

    // --- Account ---

    /// `/login` does not always answer with an envelope, so only the HTTP
    /// status and an explicit `status: false` count as failure.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginReply, ApiError> {
        let url = self.endpoint("/login")?;
        debug!("-> POST {}", url);
        let response = self.http.post(url).json(credentials).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        let bytes = response.bytes().await?;
        let reply: LoginReply = if bytes.iter().all(u8::is_ascii_whitespace) {
            LoginReply::default()
        } else {
            serde_json::from_slice(&bytes)?
        };

        if reply.status == Some(false) {
            return Err(ApiError::Rejected {
                message: reply.message,
            });
        }
        Ok(reply)
    }

    pub async fn create_user(&self, credentials: &Credentials) -> Result<(), ApiError> {
        self.post::<_, serde_json::Value>("/createUser", credentials)
            .await?
            .into_data()?;
        Ok(())
    }

    // --- Conversations ---

    pub async fn conversations(&self, username: &str) -> Result<Vec<ConversationSummary>, ApiError> {
        let data = self
            .get("/getConversations", &[("username", username)])
            .await?
            .into_data()?;
        Ok(data.unwrap_or_default())
    }

    pub async fn conversation(&self, id: &ConversationId) -> Result<Vec<Message>, ApiError> {
        let data = self
            .get("/getConversation", &[("conversationId", id.as_str())])
            .await?
            .into_data()?;
        Ok(data.unwrap_or_default())
    }

    /// Entries of the reply's `data`; the first carries the conversation id.
    pub async fn send_message(&self, message: &OutgoingMessage) -> Result<Vec<SentMessage>, ApiError> {
        let data = self.post("/sendMessage", message).await?.into_data()?;
        Ok(data.unwrap_or_default())
    }

    // --- Block list ---

    pub async fn block_list(&self, blocker: &str) -> Result<Vec<BlockedUser>, ApiError> {
        let data = self
            .get(
                "/blockList",
                &[("action", "getBlockList"), ("blockerId", blocker)],
            )
            .await?
            .into_data()?;
        Ok(data.unwrap_or_default())
    }

    /// The exists probe reports through `data` alone; its `status` is not
    /// consulted.
    pub async fn user_exists(&self, username: &str) -> Result<bool, ApiError> {
        let envelope: Envelope<Vec<Existence>> = self
            .get("/blockList", &[("action", "exists"), ("username", username)])
            .await?;
        Ok(envelope
            .data
            .and_then(|rows| rows.into_iter().next())
            .map(|row| row.exists)
            .unwrap_or(false))
    }

    pub async fn block(&self, blocker: &str, blocked: &str) -> Result<(), ApiError> {
        self.get::<serde_json::Value>(
            "/blockList",
            &[
                ("action", "block"),
                ("blockerId", blocker),
                ("blockedId", blocked),
            ],
        )
        .await?
        .into_data()?;
        Ok(())
    }

    pub async fn unblock(&self, blocker: &str, blocked: &str) -> Result<(), ApiError> {
        self.get::<serde_json::Value>(
            "/blockList",
            &[
                ("action", "unblock"),
                ("blockerId", blocker),
                ("blockedId", blocked),
            ],
        )
        .await?
        .into_data()?;
        Ok(())
    }

    // --- Friends ---

    pub async fn friends(&self) -> Result<Vec<Friend>, ApiError> {
        let data = self
            .get("/friendList", &[("action", "getFriends")])
            .await?
            .into_data()?;
        Ok(data.unwrap_or_default())
    }

    pub async fn add_friend(&self, friend: &str) -> Result<(), ApiError> {
        self.get::<serde_json::Value>(
            "/friendList",
            &[("action", "addFriend"), ("friendUser", friend)],
        )
        .await?
        .into_data()?;
        Ok(())
    }

    pub async fn remove_friend(&self, friend: &str) -> Result<(), ApiError> {
        self.get::<serde_json::Value>(
            "/friendList",
            &[("action", "removeFriend"), ("friendUser", friend)],
        )
        .await?
        .into_data()?;
        Ok(())
    }
}

/// Parse an envelope. A body that is not an envelope is reported by HTTP
/// status when the status is an error, as a decode failure otherwise.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<Envelope<T>, ApiError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    debug!("<- {} ({} bytes)", status, bytes.len());

    match serde_json::from_slice::<Envelope<T>>(&bytes) {
        Ok(envelope) => Ok(envelope),
        Err(_) if !status.is_success() => Err(ApiError::Status(status)),
        Err(e) => Err(ApiError::Decode(e)),
    }
}
