//! Core TUI application state and event loop.
//!
//! Network work never runs on the draw loop: auth flows and chat turns are
//! spawned as tasks that report back over an [`AppEvent`] channel, drained
//! once per frame.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tenantchat_core::chat::{NO_RESPONSE, fetch_reply};
use tenantchat_core::{ChatSession, PendingTurn, Route, SessionStore, SpeechPlayer, auth, export, router};
use tenantchat_gateway::{ConfiguredBackend, WebhookClient, webhook_client};
use tenantchat_shared::{AppConfig, SessionKey, config_dir};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::screens::{Action, Screens};
use crate::widgets::{centered_rect, status_bar};

/// Long-lived handles shared with background tasks.
pub(crate) struct Services {
    pub config: AppConfig,
    pub client: WebhookClient,
    pub backend: ConfiguredBackend,
    pub store: SessionStore,
    pub speech: SpeechPlayer,
}

impl Services {
    pub(crate) async fn open(config: AppConfig) -> Result<Self> {
        let client = webhook_client(&config)?;
        let backend = ConfiguredBackend::from_config(&config, &client)?;
        let store = SessionStore::open(&config.session).await?;
        let speech = SpeechPlayer::new(config.speech.clone());
        Ok(Self {
            config,
            client,
            backend,
            store,
            speech,
        })
    }
}

/// Results coming back from spawned tasks.
#[derive(Debug)]
pub(crate) enum AppEvent {
    /// An auth flow finished: the next route, or the popup text.
    AuthDone(std::result::Result<Route, String>),
    /// A chat reply for the conversation started as `chat_generation`.
    ChatReply {
        chat_generation: u64,
        turn: PendingTurn,
        text: String,
    },
}

/// Application state.
pub(crate) struct App {
    pub route: Route,
    pub screens: Screens,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Status message shown in bottom bar.
    pub status: String,
    /// Whether help overlay is visible.
    pub show_help: bool,
    /// Error popup text; any key dismisses it.
    pub popup: Option<String>,
    /// Bumped on every new conversation so late replies to an old one are dropped.
    pub chat_generation: u64,
    guard: auth::FlowGuard,
    services: Arc<Services>,
    tx: mpsc::UnboundedSender<AppEvent>,
    rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    pub(crate) fn new(services: Services) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            route: Route::Login,
            screens: Screens::new(&services.config.registration),
            should_quit: false,
            status: "Ready, press ? for help".to_string(),
            show_help: false,
            popup: None,
            chat_generation: 0,
            guard: auth::FlowGuard::new(),
            services: Arc::new(services),
            tx,
            rx,
        }
    }

    fn is_editing(&self) -> bool {
        self.screens.is_editing(self.route)
    }

    fn show_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "showing error popup");
        self.popup = Some(message);
    }

    /// Go to `requested`, subject to the signed-in guard.
    pub(crate) async fn navigate(&mut self, requested: Route) {
        let route = match router::resolve(requested, &self.services.store).await {
            Ok(route) => route,
            Err(e) => {
                error!(error = %e, "failed to read session");
                self.show_error(e.user_message());
                Route::Login
            }
        };

        if route == Route::Home {
            if let Err(e) = self.enter_home().await {
                error!(error = %e, "failed to start conversation");
                self.show_error(e.user_message());
                return;
            }
        }

        info!(from = %self.route.path(), to = %route.path(), "navigate");
        self.route = route;
        self.status = route.to_string();
    }

    async fn enter_home(&mut self) -> tenantchat_shared::Result<()> {
        let store = &self.services.store;
        let chat = ChatSession::start(store).await?;
        let name = store.get(SessionKey::Name).await?;
        self.chat_generation += 1;
        self.screens.home.reset(chat, name);
        Ok(())
    }

    /// Apply one task result.
    pub(crate) async fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::AuthDone(Ok(route)) => self.navigate(route).await,
            AppEvent::AuthDone(Err(message)) => self.show_error(message),
            AppEvent::ChatReply {
                chat_generation,
                turn,
                text,
            } => {
                if chat_generation != self.chat_generation {
                    return;
                }
                let home = &mut self.screens.home;
                home.pending = home.pending.saturating_sub(1);
                if let Some(chat) = home.chat.as_mut() {
                    chat.finish(turn, text);
                }
            }
        }
    }

    pub(crate) async fn perform(&mut self, action: Action) {
        match action {
            Action::Navigate(route) => self.navigate(route).await,
            Action::Register(_) | Action::VerifyOtp(_) | Action::Login(_) => self.spawn_auth(action),
            Action::Send(text) => {
                let turn = self.screens.home.chat.as_mut().and_then(|c| c.begin_send(&text));
                self.spawn_reply(turn);
            }
            Action::Choose { message_id, value } => {
                let turn = self
                    .screens
                    .home
                    .chat
                    .as_mut()
                    .and_then(|c| c.select_option(message_id, &value));
                self.spawn_reply(turn);
            }
            Action::Speak(text) => {
                if !self.services.speech.is_enabled() {
                    self.status = "Speech is disabled in the config".to_string();
                } else if let Err(e) = self.services.speech.speak(&text) {
                    self.show_error(e.to_string());
                }
            }
            Action::StopSpeech => self.services.speech.stop(),
            Action::Export(text) => match config_dir().and_then(|dir| export::export_summary(&dir, &text)) {
                Ok(path) => self.status = format!("Summary saved to {}", path.display()),
                Err(e) => self.show_error(e.to_string()),
            },
            Action::Logout => {
                self.services.speech.stop();
                if let Err(e) = self.services.store.logout().await {
                    self.show_error(e.user_message());
                    return;
                }
                self.chat_generation += 1;
                self.navigate(Route::Login).await;
            }
        }
    }

    /// Run an auth flow in the background. Only one runs at a time.
    fn spawn_auth(&mut self, action: Action) {
        let Some(ticket) = self.guard.try_begin() else {
            self.status = "Please wait...".to_string();
            return;
        };
        let services = Arc::clone(&self.services);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let _ticket = ticket;
            let backend = &services.backend;
            let store = &services.store;
            let result = match action {
                Action::Register(form) => auth::register(backend, store, &form).await,
                Action::VerifyOtp(code) => auth::verify_otp(backend, store, &code).await,
                Action::Login(phone) => auth::login(backend, store, &phone).await,
                _ => return,
            };
            let _ = tx.send(AppEvent::AuthDone(result.map_err(|e| e.user_message())));
        });
    }

    fn spawn_reply(&mut self, turn: Option<PendingTurn>) {
        let (Some(turn), Some(chat)) = (turn, self.screens.home.chat.as_ref()) else {
            return;
        };
        self.screens.home.pending += 1;
        let session_id = chat.session_id().clone();
        let chat_generation = self.chat_generation;
        let services = Arc::clone(&self.services);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let text = fetch_reply(&services.client, &services.store, &session_id, &turn.text)
                .await
                .unwrap_or_else(|e| {
                    error!(error = %e, "chat turn failed");
                    NO_RESPONSE.to_string()
                });
            let _ = tx.send(AppEvent::ChatReply {
                chat_generation,
                turn,
                text,
            });
        });
    }
}

/// Entry point: sets up terminal, runs event loop, restores terminal.
pub(crate) async fn run(services: Services) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, services).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, services: Services) -> Result<()> {
    let mut app = App::new(services);
    let start = router::initial(&app.services.store).await?;
    app.navigate(start).await;

    loop {
        while let Ok(event) = app.rx.try_recv() {
            app.apply(event).await;
        }

        terminal.draw(|f| draw(f, &app))?;

        // Poll for events with 100ms timeout for responsive UI
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = handle_key(&mut app, key.code, key.modifiers) {
                        app.perform(action).await;
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    app.services.speech.stop();
    Ok(())
}

fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
    // Global keybindings (always active)
    match code {
        KeyCode::Char('q') | KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
            return None;
        }
        _ => {}
    }

    // Popups and help swallow the next key
    if app.popup.take().is_some() {
        return None;
    }
    if app.show_help {
        app.show_help = false;
        return None;
    }

    match code {
        KeyCode::Char('q') if !app.is_editing() => {
            app.should_quit = true;
            None
        }
        KeyCode::Char('?') if !app.is_editing() => {
            app.show_help = true;
            None
        }
        _ => app.screens.handle_key(app.route, code),
    }
}

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    let busy = app.guard.is_busy();
    let speaking = app.services.speech.is_speaking();
    app.screens.draw(app.route, f, chunks[0], busy, speaking);

    f.render_widget(status_bar(&app.status), chunks[1]);

    if let Some(message) = &app.popup {
        draw_popup(f, message);
    } else if app.show_help {
        draw_help_overlay(f);
    }
}

fn draw_popup(f: &mut Frame, message: &str) {
    let area = centered_rect(50, 30, f.area());
    let popup = Paragraph::new(message.to_string())
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Error, press any key ")
                .border_style(Style::default().fg(Color::Red)),
        );
    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn draw_help_overlay(f: &mut Frame) {
    let area = centered_rect(60, 60, f.area());

    let help_text = vec![
        Line::from("Keybindings").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::from("  Tab/↑/↓      Move between fields"),
        Line::from("  Enter        Submit / pick"),
        Line::from("  ?            Toggle this help"),
        Line::from("  q / Ctrl-C   Quit"),
        Line::from(""),
        Line::from("Chat:").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  Esc          Browse replies / back to typing"),
        Line::from("  ←/→ Enter    Pick an option"),
        Line::from("  s / x        Speak / stop"),
        Line::from("  c            Save diagnosis summary"),
        Line::from("  L            Log out"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help, press any key to close ")
                .style(Style::default().bg(Color::DarkGray)),
        )
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));

    f.render_widget(Clear, area);
    f.render_widget(help, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenantchat_core::SessionStore;
    use tenantchat_shared::{SessionConfig, TenantSession};

    async fn test_app(dir: &std::path::Path) -> App {
        let mut config = AppConfig::default();
        config.webhooks.base_url = "http://127.0.0.1:9".into();
        config.speech.enabled = false;
        config.session = SessionConfig {
            db_path: dir.join("session.db").display().to_string(),
        };
        let services = Services::open(config).await.unwrap();
        App::new(services)
    }

    fn temp_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("tenantchat-tui-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn home_without_phone_lands_on_login() {
        let dir = temp_dir("guard");
        let mut app = test_app(&dir).await;
        app.navigate(Route::Home).await;
        assert_eq!(app.route, Route::Login);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn signed_in_home_starts_conversation() {
        let dir = temp_dir("home");
        let mut app = test_app(&dir).await;
        let store: &SessionStore = &app.services.store;
        store.set(SessionKey::Phone, "+441234567").await.unwrap();
        store.set(SessionKey::Name, "Ada").await.unwrap();

        app.navigate(Route::Home).await;
        assert_eq!(app.route, Route::Home);
        assert_eq!(app.screens.home.tenant_name.as_deref(), Some("Ada"));
        assert_eq!(app.screens.home.chat.as_ref().map(|c| c.messages().len()), Some(1));

        app.perform(Action::Logout).await;
        assert_eq!(app.route, Route::Login);
        let session: TenantSession = app.services.store.load().await.unwrap();
        assert!(!session.is_signed_in());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn stale_replies_are_dropped() {
        let dir = temp_dir("stale");
        let mut app = test_app(&dir).await;
        app.screens
            .home
            .reset(ChatSession::with_session_id(tenantchat_shared::SessionId("s".into())), None);
        let turn = app.screens.home.chat.as_mut().unwrap().begin_send("hi").unwrap();

        app.apply(AppEvent::ChatReply {
            chat_generation: app.chat_generation + 1,
            turn,
            text: "late".into(),
        })
        .await;
        assert_eq!(app.screens.home.chat.as_ref().unwrap().messages().len(), 2);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn auth_failure_becomes_popup() {
        let dir = temp_dir("popup");
        let mut app = test_app(&dir).await;
        app.perform(Action::Login(String::new())).await;
        let event = app.rx.recv().await.unwrap();
        app.apply(event).await;
        assert_eq!(app.popup.as_deref(), Some("Please enter your phone number"));

        assert!(handle_key(&mut app, KeyCode::Char('x'), KeyModifiers::NONE).is_none());
        assert!(app.popup.is_none());
        let _ = std::fs::remove_dir_all(dir);
    }
}
