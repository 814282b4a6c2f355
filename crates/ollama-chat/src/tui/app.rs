use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use super::event::{AppEvent, EventHandler};
use super::{Tui, ui};
use crate::client::GatewayClient;
use crate::conversation::{ChatOutcome, Conversation, PendingChat};

/// Offered when the gateway cannot list installed models.
pub const FALLBACK_MODELS: [&str; 3] = ["llama3.2:latest", "mistral:latest", "codellama:latest"];

/// Work the loop must start on behalf of the app.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    SendChat(PendingChat),
    LoadModels,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub is_error: bool,
}

impl Status {
    fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

pub struct App {
    pub conversation: Conversation,
    pub models: Vec<String>,
    pub status: Status,
    /// Lines scrolled up from the bottom of the transcript.
    pub scroll: u16,
    pub tick: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            conversation: Conversation::new(model),
            models: Vec::new(),
            status: Status::info("Loading models..."),
            scroll: 0,
            tick: 0,
            should_quit: false,
        }
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Option<Command> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Resize(..) => None,
            AppEvent::Tick => {
                self.tick = self.tick.wrapping_add(1);
                None
            }
            AppEvent::ChatSettled(outcome) => {
                self.on_chat_settled(outcome);
                None
            }
            AppEvent::ModelsLoaded(result) => {
                self.on_models_loaded(result);
                None
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        // AltGr arrives as CONTROL | ALT on Windows and must still type.
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL)
            && !key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('l') if ctrl => {
                if self.conversation.clear() {
                    self.scroll = 0;
                    self.status = Status::info("Chat cleared");
                }
            }
            KeyCode::Char('r') if ctrl => {
                self.status = Status::info("Loading models...");
                return Some(Command::LoadModels);
            }
            KeyCode::Char(c) if !ctrl => self.conversation.push_char(c),
            KeyCode::Backspace => self.conversation.backspace(),
            KeyCode::Enter => return self.submit(),
            KeyCode::Tab => self.cycle_model(true),
            KeyCode::BackTab => self.cycle_model(false),
            KeyCode::Up => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Down => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_add(10),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_sub(10),
            _ => {}
        }
        None
    }

    fn submit(&mut self) -> Option<Command> {
        let pending = self.conversation.submit()?;
        self.scroll = 0;
        self.status = Status::info(format!(
            "Generating with {}... the first request may take a while to load the model",
            pending.model
        ));
        Some(Command::SendChat(pending))
    }

    fn on_chat_settled(&mut self, outcome: ChatOutcome) {
        self.status = match &outcome {
            ChatOutcome::Reply(_) => Status::info("Ready"),
            _ => Status::error("Error occurred"),
        };
        self.conversation.settle(outcome);
        self.scroll = 0;
    }

    fn on_models_loaded(&mut self, result: Result<Vec<String>, String>) {
        match result {
            Ok(models) if models.is_empty() => {
                self.models = FALLBACK_MODELS.iter().map(|m| m.to_string()).collect();
                self.status = Status::error("No models found; pull one with `ollama pull`");
            }
            Ok(models) => {
                if !models.iter().any(|m| m == self.conversation.model()) {
                    self.conversation.select_model(models[0].clone());
                }
                self.status = Status::info(format!("Loaded {} models", models.len()));
                self.models = models;
            }
            Err(e) => {
                self.models = FALLBACK_MODELS.iter().map(|m| m.to_string()).collect();
                self.status = Status::error(format!("Could not load models: {e}"));
            }
        }
    }

    fn cycle_model(&mut self, forward: bool) {
        if self.models.is_empty() || self.conversation.is_busy() {
            return;
        }
        let len = self.models.len();
        let next = match self
            .models
            .iter()
            .position(|m| m == self.conversation.model())
        {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        let model = self.models[next].clone();
        self.status = Status::info(format!("Switched to {model}"));
        self.conversation.select_model(model);
    }
}

pub(super) async fn run_loop(
    terminal: &mut Tui,
    events: &mut EventHandler,
    gateway: GatewayClient,
    model: String,
) -> Result<()> {
    let mut app = App::new(model);
    let tx = events.sender();
    dispatch(Command::LoadModels, &gateway, &tx);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(frame, &app))?;

        let Some(event) = events.next().await else {
            break;
        };
        if let Some(command) = app.handle_event(event) {
            dispatch(command, &gateway, &tx);
        }
    }

    Ok(())
}

/// Start a command on its own task; its result comes back as an event.
fn dispatch(command: Command, gateway: &GatewayClient, tx: &UnboundedSender<AppEvent>) {
    let gateway = gateway.clone();
    let tx = tx.clone();
    match command {
        Command::SendChat(pending) => {
            tokio::spawn(async move {
                // A panicking chat task still settles the conversation.
                let call = tokio::spawn(async move { gateway.chat(&pending).await });
                let outcome = match call.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(error = %e, "Chat task aborted");
                        ChatOutcome::ConnectionFailed
                    }
                };
                let _ = tx.send(AppEvent::ChatSettled(outcome));
            });
        }
        Command::LoadModels => {
            tokio::spawn(async move {
                let result = gateway.list_models().await.map_err(|e| e.to_string());
                if let Ok(models) = &result {
                    info!(count = models.len(), "Loaded models");
                }
                let _ = tx.send(AppEvent::ModelsLoaded(result));
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ChatTurn, TurnRole};

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> AppEvent {
        AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            assert!(app.handle_event(key(KeyCode::Char(c))).is_none());
        }
    }

    #[test]
    fn enter_sends_typed_message() {
        let mut app = App::new("llama3.2:latest");
        type_text(&mut app, "hi");

        let pending = match app.handle_event(key(KeyCode::Enter)) {
            Some(Command::SendChat(pending)) => pending,
            other => panic!("expected SendChat, got {other:?}"),
        };
        assert_eq!(pending.message, "hi");
        assert_eq!(pending.model, "llama3.2:latest");
        assert!(app.conversation.is_busy());
        assert_eq!(app.conversation.input(), "");
    }

    #[test]
    fn enter_on_blank_input_sends_nothing() {
        let mut app = App::new("m");
        type_text(&mut app, "   ");
        assert!(app.handle_event(key(KeyCode::Enter)).is_none());
        assert!(app.conversation.turns().is_empty());
    }

    #[test]
    fn enter_while_busy_sends_nothing() {
        let mut app = App::new("m");
        type_text(&mut app, "one");
        app.handle_event(key(KeyCode::Enter)).unwrap();
        type_text(&mut app, "two");

        assert!(app.handle_event(key(KeyCode::Enter)).is_none());
        assert_eq!(app.conversation.turns().len(), 1);
    }

    #[test]
    fn settled_failure_marks_status_error() {
        let mut app = App::new("m");
        type_text(&mut app, "hi");
        app.handle_event(key(KeyCode::Enter)).unwrap();

        app.handle_event(AppEvent::ChatSettled(ChatOutcome::ConnectionFailed));
        assert!(app.status.is_error);
        assert!(!app.conversation.is_busy());
        assert_eq!(app.conversation.turns()[1].role(), TurnRole::Error);
    }

    #[test]
    fn models_loaded_selects_installed_model() {
        let mut app = App::new("llama3.2:latest");
        app.handle_event(AppEvent::ModelsLoaded(Ok(vec![
            "qwen2.5:7b".to_string(),
            "phi3:mini".to_string(),
        ])));
        assert_eq!(app.conversation.model(), "qwen2.5:7b");
        assert_eq!(app.status.text, "Loaded 2 models");
    }

    #[test]
    fn models_loaded_keeps_current_when_installed() {
        let mut app = App::new("phi3:mini");
        app.handle_event(AppEvent::ModelsLoaded(Ok(vec![
            "qwen2.5:7b".to_string(),
            "phi3:mini".to_string(),
        ])));
        assert_eq!(app.conversation.model(), "phi3:mini");
    }

    #[test]
    fn models_failure_falls_back() {
        let mut app = App::new("llama3.2:latest");
        app.handle_event(AppEvent::ModelsLoaded(Err("connection refused".to_string())));
        assert_eq!(app.models, FALLBACK_MODELS.map(String::from).to_vec());
        assert!(app.status.is_error);
        assert_eq!(app.conversation.model(), "llama3.2:latest");
    }

    #[test]
    fn tab_cycles_models_both_ways() {
        let mut app = App::new("a");
        app.models = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        app.handle_event(key(KeyCode::Tab));
        assert_eq!(app.conversation.model(), "b");
        app.handle_event(key(KeyCode::BackTab));
        app.handle_event(key(KeyCode::BackTab));
        assert_eq!(app.conversation.model(), "c");
    }

    #[test]
    fn ctrl_l_clears_and_ctrl_r_reloads() {
        let mut app = App::new("m");
        type_text(&mut app, "hi");
        app.handle_event(key(KeyCode::Enter)).unwrap();
        app.handle_event(AppEvent::ChatSettled(ChatOutcome::Reply("yo".to_string())));
        assert_eq!(
            app.conversation.turns(),
            &[ChatTurn::user("hi"), ChatTurn::assistant("yo")]
        );

        assert!(app.handle_event(ctrl('l')).is_none());
        assert!(app.conversation.turns().is_empty());
        assert_eq!(app.handle_event(ctrl('r')), Some(Command::LoadModels));
    }

    #[test]
    fn altgr_characters_are_typed() {
        let mut app = App::new("m");
        let altgr = KeyModifiers::CONTROL | KeyModifiers::ALT;
        app.handle_event(AppEvent::Key(KeyEvent::new(KeyCode::Char('@'), altgr)));
        app.handle_event(AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), altgr)));
        assert_eq!(app.conversation.input(), "@c");
        assert!(!app.should_quit);
    }

    #[test]
    fn escape_and_ctrl_c_quit() {
        let mut app = App::new("m");
        app.handle_event(key(KeyCode::Esc));
        assert!(app.should_quit);

        let mut app = App::new("m");
        app.handle_event(ctrl('c'));
        assert!(app.should_quit);
        assert_eq!(app.conversation.input(), "");
    }
}
