//! Terminal chat application: event loop and drawing.

use crate::config::Config;
use crate::orchestrator::Orchestrator;
use crate::prompts;
use crate::store::{ConversationStore, Message, SharedStore};
use crate::ui::commands::{help_text, SlashCommand};
use crate::ui::composer::{Composer, ComposerResult};
use crate::ui::history::ChatHistory;
use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use std::io::{self, Stdout};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Full-screen chat session over one conversation.
pub struct ChatApp {
    orchestrator: Orchestrator,
    composer: Composer,
    model: String,
    should_quit: bool,
}

impl ChatApp {
    pub fn new(config: Config) -> Self {
        let mut store = ConversationStore::new();
        store.append(Message::assistant(prompts::GREETING));
        let store = SharedStore::new(store);

        let model = config.model.clone();
        Self {
            orchestrator: Orchestrator::new(config, store),
            composer: Composer::new("Say something cheerful..."),
            model,
            should_quit: false,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let mut terminal = init_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        restore_terminal()?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        let mut events = EventStream::new();
        let mut revision = self.orchestrator.store().subscribe();

        while !self.should_quit {
            self.draw(terminal)?;

            tokio::select! {
                maybe_event = events.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) => self.handle_key(key),
                        // Resize and the rest redraw on the next pass
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                        None => break,
                    }
                }
                // Streaming tasks bump the store revision; redraw
                _ = revision.changed() => {}
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.composer.handle_key(key) {
            ComposerResult::Submitted(draft) => {
                self.orchestrator.submit(draft, Utc::now());
            }
            ComposerResult::Command(command) => self.handle_command(command),
            ComposerResult::None => {}
        }
    }

    fn handle_command(&mut self, command: SlashCommand) {
        match command {
            SlashCommand::Help => {
                self.orchestrator.store().append(Message::assistant(help_text()));
            }
            SlashCommand::Model => {
                self.orchestrator
                    .store()
                    .append(Message::assistant(format!("Replies come from {}.", self.model)));
            }
            SlashCommand::Bye => self.should_quit = true,
        }
    }

    fn draw(&mut self, terminal: &mut Tui) -> Result<()> {
        let snapshot = self.orchestrator.store().snapshot();
        terminal.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Min(10),   // History
                    Constraint::Length(3), // Composer
                ])
                .split(frame.size());

            frame.render_widget(ChatHistory::new(&snapshot), chunks[0]);
            frame.render_widget(&self.composer, chunks[1]);
        })?;
        Ok(())
    }
}

pub fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

pub fn restore_terminal() -> Result<()> {
    execute!(io::stdout(), LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}
