use crate::{
    app::{App, Screen},
    bus::{self, Event},
    route::Route,
    views::SendOutcome,
};
use rustyline::{error::ReadlineError, DefaultEditor};
use std::str::FromStr;
use std::thread;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Login { username: String, password: String },
    Signup { username: String, password: String },
    Logout,
    Go(Route),
    Conversations,
    Open(String),
    New,
    To(String),
    Send(String),
    BlockList,
    Block(String),
    Unblock(String),
    Friends,
    AddFriend(String),
    RemoveFriend(String),
    Show,
    Quit,
    /// A line without a leading `/`.
    Text(String),
}

pub const HELP: &str = "\
These commands are supported:
  /login <username> <password>   Log in
  /signup <username> <password>  Create an account
  /logout                        Forget the logged-in user
  /go <path>                     Open a screen by path
  /conversations                 List your conversations
  /open <number|id>              Open a conversation from the list
  /new                           Start a new conversation
  /to <handle>                   Set the recipient
  /send <text>                   Send a message (plain lines also send)
  /blocklist                     Show your block list
  /block <user>                  Block a user
  /unblock <user>                Unblock a user
  /friends                       Show your friends
  /addfriend <user>              Add a friend
  /removefriend <user>           Remove a friend
  /show                          Show the current screen again
  /quit                          Exit";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Unknown command: {0}. Type /help for a list.")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
}

fn split_command(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (input, ""),
    }
}

fn one_arg(rest: &str, usage: &'static str) -> Result<String, ParseError> {
    if rest.is_empty() {
        Err(ParseError::Usage(usage))
    } else {
        Ok(rest.to_string())
    }
}

fn credentials(rest: &str, usage: &'static str) -> Result<(String, String), ParseError> {
    match split_command(rest) {
        (user, password) if !user.is_empty() && !password.is_empty() => {
            Ok((user.to_string(), password.to_string()))
        }
        _ => Err(ParseError::Usage(usage)),
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let input = raw.trim();
        if !input.starts_with('/') {
            return Ok(Command::Text(input.to_string()));
        }

        let (cmd, rest) = split_command(input);
        let command = match cmd.to_ascii_lowercase().as_str() {
            "/help" => Command::Help,
            "/login" => {
                let (username, password) = credentials(rest, "/login <username> <password>")?;
                Command::Login { username, password }
            }
            "/signup" => {
                let (username, password) = credentials(rest, "/signup <username> <password>")?;
                Command::Signup { username, password }
            }
            "/logout" => Command::Logout,
            "/go" => {
                let path = one_arg(rest, "/go <path>")?;
                let route = path
                    .parse()
                    .map_err(|_| ParseError::Usage("/go <path>, e.g. /go /conversations"))?;
                Command::Go(route)
            }
            "/conversations" => Command::Conversations,
            "/open" => Command::Open(one_arg(rest, "/open <number|id>")?),
            "/new" => Command::New,
            "/to" => Command::To(one_arg(rest, "/to <handle>")?),
            "/send" => Command::Send(rest.to_string()),
            "/blocklist" => Command::BlockList,
            "/block" => Command::Block(one_arg(rest, "/block <user>")?),
            "/unblock" => Command::Unblock(one_arg(rest, "/unblock <user>")?),
            "/friends" | "/friendlist" => Command::Friends,
            "/addfriend" => Command::AddFriend(one_arg(rest, "/addfriend <user>")?),
            "/removefriend" => Command::RemoveFriend(one_arg(rest, "/removefriend <user>")?),
            "/show" => Command::Show,
            "/quit" | "/exit" => Command::Quit,
            _ => return Err(ParseError::Unknown(cmd.to_string())),
        };
        Ok(command)
    }
}

pub const PROMPT: &str = "parlor> ";

/// One line typed at the prompt. The prompt thread waits on `done` before
/// prompting again, so the screen is printed before the next prompt.
#[derive(Debug)]
pub struct PromptedLine {
    pub line: String,
    pub done: oneshot::Sender<()>,
}

impl PromptedLine {
    pub fn new(line: impl Into<String>) -> (Self, oneshot::Receiver<()>) {
        let (done, finished) = oneshot::channel();
        (
            Self {
                line: line.into(),
                done,
            },
            finished,
        )
    }
}

/// Read lines with rustyline on a dedicated thread and hand them to `tx`.
///
/// Ctrl-C, Ctrl-D and read errors end the thread, which closes the channel.
/// The thread is not part of the tokio runtime, so shutting the runtime down
/// never waits on a pending read.
pub fn spawn_prompt(tx: mpsc::Sender<PromptedLine>) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("parlor-prompt".into())
        .spawn(move || {
            let mut editor = match DefaultEditor::new() {
                Ok(editor) => editor,
                Err(e) => {
                    error!("Failed to start the prompt: {}", e);
                    return;
                }
            };

            loop {
                let line = match editor.readline(PROMPT) {
                    Ok(line) => line,
                    Err(ReadlineError::Interrupted) => {
                        info!("CTRL-C at the prompt");
                        break;
                    }
                    Err(ReadlineError::Eof) => {
                        info!("CTRL-D at the prompt");
                        break;
                    }
                    Err(e) => {
                        error!("Prompt failed: {}", e);
                        break;
                    }
                };

                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                }

                let (prompted, finished) = PromptedLine::new(line);
                if tx.blocking_send(prompted).is_err() || finished.blocking_recv().is_err() {
                    break;
                }
            }
        })
}

/// Interactive line interface over an [`App`].
pub struct Shell {
    app: App,
    events: broadcast::Receiver<Event>,
}

impl Shell {
    pub fn new(app: App) -> Self {
        let events = app.bus().subscribe();
        Self { app, events }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Print the notices raised since the last call, then the screen.
    fn show(&mut self) {
        for event in bus::drain(&mut self.events) {
            match event {
                Event::Notice { level, message } => println!("[{}] {}", level, message),
                other => debug!("bus: {:?}", other),
            }
        }
        println!("{}", self.app.render());
    }

    /// Show `start`, then take commands from the prompt until `/quit`,
    /// Ctrl-C or Ctrl-D.
    pub async fn run(&mut self, start: Route) -> anyhow::Result<()> {
        self.app.navigate(start).await;
        self.show();

        let (tx, rx) = mpsc::channel(1);
        spawn_prompt(tx)?;
        self.serve(rx).await;

        info!("Shell closed");
        Ok(())
    }

    /// Handle prompted lines until `/quit` or until the sender goes away.
    pub async fn serve(&mut self, mut lines: mpsc::Receiver<PromptedLine>) {
        while let Some(PromptedLine { line, done }) = lines.recv().await {
            if self.handle_line(&line).await {
                // Dropping `done` unanswered ends the prompt thread.
                break;
            }
            let _ = done.send(());
        }
    }

    /// Returns `true` when the shell should stop.
    async fn handle_line(&mut self, line: &str) -> bool {
        if line.trim().is_empty() {
            return false;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                return false;
            }
        };

        match command {
            Command::Quit => return true,
            Command::Help => {
                println!("{}", HELP);
                return false;
            }
            command => {
                if let Err(e) = self.execute(command).await {
                    error!("Command failed: {:#}", e);
                    println!("Error: {}", e);
                }
            }
        }

        self.show();
        false
    }

    pub async fn execute(&mut self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Help | Command::Quit | Command::Show => {}
            Command::Login { username, password } => {
                self.app.login(&username, &password).await?;
            }
            Command::Signup { username, password } => {
                self.app.create_account(&username, &password).await;
            }
            Command::Logout => self.app.logout().await?,
            Command::Go(route) => self.app.navigate(route).await,
            Command::Conversations => self.app.navigate(Route::Conversations).await,
            Command::New => self.app.navigate(Route::Conversation(None)).await,
            Command::BlockList => self.app.navigate(Route::BlockList).await,
            Command::Friends => self.app.navigate(Route::FriendList).await,
            Command::Open(key) => {
                let target = match self.app.screen() {
                    Screen::Conversations(view) => view.select(&key),
                    _ => crate::handle::ConversationId::new(key).map(Route::conversation),
                };
                if let Some(route) = target {
                    self.app.open(route).await;
                }
            }
            Command::To(handle) => {
                if let Screen::Conversation(view) = self.app.screen_mut() {
                    view.set_recipient(&handle);
                } else {
                    println!("Open a conversation first (/new or /open).");
                }
            }
            Command::Send(text) | Command::Text(text) => self.send(text).await,
            Command::Block(user) => {
                self.ensure(Route::BlockList).await;
                if let Screen::BlockList(view) = self.app.screen_mut() {
                    view.set_input(user);
                    view.block().await;
                }
            }
            Command::Unblock(user) => {
                self.ensure(Route::BlockList).await;
                if let Screen::BlockList(view) = self.app.screen_mut() {
                    view.unblock(&user).await;
                }
            }
            Command::AddFriend(user) => {
                self.ensure(Route::FriendList).await;
                if let Screen::FriendList(view) = self.app.screen_mut() {
                    view.set_input(user);
                    view.add().await;
                }
            }
            Command::RemoveFriend(user) => {
                self.ensure(Route::FriendList).await;
                if let Screen::FriendList(view) = self.app.screen_mut() {
                    view.remove(&user).await;
                }
            }
        }
        Ok(())
    }

    /// Switch to `route` unless it is already on screen.
    async fn ensure(&mut self, route: Route) {
        if self.app.route() != &route {
            self.app.navigate(route).await;
        }
    }

    async fn send(&mut self, text: String) {
        let Screen::Conversation(view) = self.app.screen_mut() else {
            println!("Open a conversation first (/new or /open).");
            return;
        };

        view.set_body(text);
        if let SendOutcome::Sent(id) = view.send().await {
            info!("Now in conversation {}", id);
            self.app.sync_route();
        }
    }
}
