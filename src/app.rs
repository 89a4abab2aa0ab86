use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::api::ApiClient;
use crate::bus::{Event, EventBus, NotificationLevel};
use crate::route::Route;
use crate::session::SessionContext;
use crate::views::{
    BlockListView, ConversationView, ConversationsView, FriendListView, LoginView,
};

/// The view currently on screen.
pub enum Screen {
    Login(LoginView),
    Conversations(ConversationsView),
    Conversation(ConversationView),
    BlockList(BlockListView),
    FriendList(FriendListView),
}

impl Screen {
    pub fn render(&self) -> String {
        match self {
            Screen::Login(view) => view.render(),
            Screen::Conversations(view) => view.render(),
            Screen::Conversation(view) => view.render(),
            Screen::BlockList(view) => view.render(),
            Screen::FriendList(view) => view.render(),
        }
    }
}

/// Owns the current screen and moves between screens.
pub struct App {
    api: ApiClient,
    bus: Arc<EventBus>,
    sessions: SessionContext,
    route: Route,
    screen: Screen,
}

impl App {
    pub fn new(api: ApiClient, bus: Arc<EventBus>, sessions: SessionContext) -> Self {
        let screen = Screen::Login(LoginView::new(api.clone()));
        Self {
            api,
            bus,
            sessions,
            route: Route::Login,
            screen,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn sessions(&self) -> &SessionContext {
        &self.sessions
    }

    pub fn render(&self) -> String {
        self.screen.render()
    }

    /// Mount the screen for `route` with the session as it is right now.
    pub async fn navigate(&mut self, route: Route) {
        let session = self.sessions.current().await;

        let screen = match &route {
            Route::Login => Screen::Login(LoginView::new(self.api.clone())),
            Route::Conversations => {
                let mut view = ConversationsView::new(self.api.clone(), self.bus.clone(), session);
                view.mount().await;
                Screen::Conversations(view)
            }
            Route::Conversation(id) => {
                let mut view = ConversationView::new(
                    self.api.clone(),
                    self.bus.clone(),
                    session,
                    id.clone(),
                );
                view.mount().await;
                Screen::Conversation(view)
            }
            Route::BlockList => {
                let mut view = BlockListView::new(self.api.clone(), self.bus.clone(), session);
                view.mount().await;
                Screen::BlockList(view)
            }
            Route::FriendList => {
                let mut view = FriendListView::new(self.api.clone(), self.bus.clone(), session);
                view.mount().await;
                Screen::FriendList(view)
            }
        };

        info!("Navigated to {}", route);
        self.screen = screen;
        self.route = route.clone();
        self.bus.publish(Event::Navigated(route));
    }

    /// Like [`App::navigate`], except that a conversation already on screen
    /// switches to the new id in place. Opening the conversation on screen
    /// again does nothing.
    pub async fn open(&mut self, route: Route) {
        if let (Screen::Conversation(view), Route::Conversation(Some(id))) =
            (&mut self.screen, &route)
        {
            view.open(id.clone()).await;
            if self.route != route {
                info!("Switched to {}", route);
                self.route = route.clone();
                self.bus.publish(Event::Navigated(route));
            }
            return;
        }
        self.navigate(route).await;
    }

    /// Bring the recorded route in line with the screen after the
    /// conversation view moved itself to another id. No reload.
    pub fn sync_route(&mut self) {
        if let Screen::Conversation(view) = &self.screen {
            self.route = Route::Conversation(view.conversation_id().cloned());
        }
    }

    /// Log in from the login form; on success persist and show the
    /// conversation list.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<bool> {
        if !matches!(self.screen, Screen::Login(_)) {
            self.navigate(Route::Login).await;
        }
        let Screen::Login(view) = &mut self.screen else {
            return Ok(false);
        };

        view.set_username(username);
        view.set_password(password);
        let Some(session) = view.login().await else {
            if let Some(error) = view.error() {
                self.bus.notify(NotificationLevel::Error, error);
            }
            return Ok(false);
        };

        self.sessions.begin(&session).await?;
        self.bus.publish(Event::SessionStarted {
            user_name: session.user_name.clone(),
        });
        self.navigate(Route::Conversations).await;
        Ok(true)
    }

    pub async fn create_account(&mut self, username: &str, password: &str) -> bool {
        if !matches!(self.screen, Screen::Login(_)) {
            self.navigate(Route::Login).await;
        }
        let Screen::Login(view) = &mut self.screen else {
            return false;
        };

        view.set_username(username);
        view.set_password(password);
        if view.create_account().await {
            self.bus
                .notify(NotificationLevel::Success, format!("Account {} created", username));
            true
        } else {
            if let Some(error) = view.error() {
                self.bus.notify(NotificationLevel::Error, error);
            }
            false
        }
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.sessions.end().await?;
        self.bus.publish(Event::SessionEnded);
        self.navigate(Route::Login).await;
        Ok(())
    }
}
