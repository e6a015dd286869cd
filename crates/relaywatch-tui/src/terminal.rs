//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering.

use std::{
    io::{self, Stdout, stdout},
    time::{Duration, Instant},
};

use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use relaywatch_app::{Driver, UiEvent, View};
use relaywatch_core::ActionIntent;
use ratatui::{Terminal, backend::CrosstermBackend};
use thiserror::Error;

use crate::ui::{self, Screen};

const TICK: Duration = Duration::from_millis(100);
const HINT_TTL: Duration = Duration::from_secs(5);

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Keeps an owned copy of the last frame so it can redraw on resize and keep
/// countdowns moving between runtime renders.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    screen: Screen,
    drawn_at: Instant,
    hint: Option<(String, Instant)>,
}

impl TerminalDriver {
    /// Enter raw mode and the alternate screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be switched.
    pub fn new() -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            event_stream: EventStream::new(),
            screen: Screen::default(),
            drawn_at: Instant::now(),
            hint: None,
        })
    }

    /// Map a key press to a runtime input.
    pub fn map_key(code: KeyCode) -> Option<UiEvent> {
        match code {
            KeyCode::Char('q') => Some(UiEvent::Quit),
            KeyCode::Char('r') => Some(UiEvent::Reconnect),
            KeyCode::Char('m') => Some(UiEvent::ToggleMode),
            KeyCode::Char('s') => Some(UiEvent::ToggleStats),
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => Some(UiEvent::SelectNext),
            KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => Some(UiEvent::SelectPrevious),
            KeyCode::Char('d') | KeyCode::Delete | KeyCode::Esc => Some(UiEvent::DismissSelected),
            KeyCode::Enter => Some(UiEvent::ActivateSelected),
            _ => None,
        }
    }

    /// Hint shown for an intent the terminal carries out.
    ///
    /// Reconnect is handled by the runtime and never reaches the driver.
    pub fn intent_hint(intent: ActionIntent) -> Option<&'static str> {
        match intent {
            ActionIntent::OpenLogin => Some("Откройте страницу входа и войдите снова"),
            ActionIntent::Retry => Some("Повторите операцию"),
            ActionIntent::Reconnect => None,
        }
    }

    fn current_hint(&mut self) -> Option<String> {
        if self.hint.as_ref().is_some_and(|(_, at)| at.elapsed() >= HINT_TTL) {
            self.hint = None;
        }
        self.hint.as_ref().map(|(text, _)| text.clone())
    }

    fn redraw(&mut self) -> Result<(), TerminalError> {
        let mut screen = self.screen.aged(self.drawn_at.elapsed());
        screen.hint = self.current_hint();
        self.terminal.draw(|frame| ui::render(frame, &screen))?;
        Ok(())
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;
    type Instant = Instant;

    async fn poll_input(&mut self) -> Result<Option<UiEvent>, Self::Error> {
        tokio::select! {
            biased;

            maybe_event = self.event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) if key_event.kind == KeyEventKind::Press => {
                        Ok(Self::map_key(key_event.code))
                    },
                    Some(Ok(Event::Resize(..))) => {
                        self.redraw()?;
                        Ok(None)
                    },
                    Some(Err(e)) => Err(TerminalError::Io(e)),
                    _ => Ok(None),
                }
            }

            () = tokio::time::sleep(TICK) => {
                self.redraw()?;
                Ok(None)
            }
        }
    }

    fn render(&mut self, view: &View<'_, Self::Instant>) -> Result<(), Self::Error> {
        let now = Instant::now();
        self.screen = Screen::from_view(view, now);
        self.drawn_at = now;
        self.redraw()
    }

    fn execute(&mut self, intent: ActionIntent) -> Result<(), Self::Error> {
        tracing::info!(?intent, "action intent");
        let Some(hint) = Self::intent_hint(intent) else { return Ok(()) };
        self.hint = Some((hint.to_owned(), Instant::now()));
        self.redraw()
    }

    fn stop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
