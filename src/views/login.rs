use crate::api::{ApiClient, ApiError, Credentials};
use crate::session::Session;
use chrono::Utc;
use tracing::{error, info};

pub const LOGIN_FAILED: &str = "Username or password was incorrect";
pub const CREATE_FAILED: &str = "Failed to create account";

/// Login and account creation form.
pub struct LoginView {
    api: ApiClient,
    username: String,
    password: String,
    error: Option<String>,
}

impl LoginView {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            username: String::new(),
            password: String::new(),
            error: None,
        }
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn credentials(&self) -> Credentials {
        Credentials {
            user_name: self.username.clone(),
            password: self.password.clone(),
        }
    }

    /// Log in with the form's credentials. The returned session still has
    /// to be persisted by the caller.
    pub async fn login(&mut self) -> Option<Session> {
        let reply = match self.api.login(&self.credentials()).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Login error: {}", e);
                self.error = Some(LOGIN_FAILED.to_string());
                return None;
            }
        };

        let mut session = reply
            .user_object()
            .and_then(|user| serde_json::from_value::<Session>(user.clone()).ok())
            .unwrap_or_else(|| Session::new(self.username.clone()));
        session.logged_in_at = Some(Utc::now());

        info!("Login successful for {}", session.user_name);
        self.error = None;
        self.password.clear();
        Some(session)
    }

    /// Create an account with the form's credentials. Success clears the form.
    pub async fn create_account(&mut self) -> bool {
        match self.api.create_user(&self.credentials()).await {
            Ok(()) => {
                info!("Account created for {}", self.username);
                self.username.clear();
                self.password.clear();
                self.error = None;
                true
            }
            Err(ApiError::Rejected { message }) => {
                self.error = Some(message.unwrap_or_else(|| CREATE_FAILED.to_string()));
                false
            }
            Err(e) => {
                error!("Account creation failed: {}", e);
                self.error = Some(CREATE_FAILED.to_string());
                false
            }
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Login\n");
        out.push_str("  /login <username> <password>\n");
        out.push_str("  /signup <username> <password>\n");
        if let Some(error) = &self.error {
            out.push_str(&format!("  {}\n", error));
        }
        out
    }
}
