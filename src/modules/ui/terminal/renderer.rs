use crate::application::state::PlayerView;
use crate::core::events::UiEvent;
use crate::core::models::TrackRef;
use crate::core::traits::{Prompt, UiRenderer};
use anyhow::{Context, Result};
use crossterm::{
    ExecutableCommand, cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{self, ClearType},
};
use std::io::{BufRead, Write, stdin, stdout};
use std::time::Duration;

const KEY_HINTS: &str = "[Space: Pause | N: Next | B: Prev | S: Shuffle | R: Repeat | ,/.: Seek | +/-: Volume | X: Remove | C: Cancel | Q: Quit]";

/// One volume key press, as a fraction of full scale.
const VOLUME_STEP: f32 = 0.1;

/// Single-line player UI in raw terminal mode.
pub struct TerminalRenderer {
    initialized: bool,
    seek_step_secs: i64,
}

impl TerminalRenderer {
    pub fn new(seek_step_secs: u64) -> Self {
        Self {
            initialized: false,
            seek_step_secs: i64::try_from(seek_step_secs).unwrap_or(i64::MAX),
        }
    }

    pub fn print_message(&self, message: &str) {
        println!("{}", message);
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("Error: {}", message);
    }

    pub fn print_track_list(&self, tracks: &[TrackRef]) {
        let total = tracks.len();
        for (index, track) in tracks.iter().enumerate() {
            let marker = if track.is_remote() { " [url]" } else { "" };
            println!("[{}/{}] {}{}", index + 1, total, track.display_name(), marker);
        }
    }

    /// Translate a key press into user intent.
    pub fn map_key(&self, key: KeyEvent) -> Option<UiEvent> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(UiEvent::QuitRequested);
        }

        let event = match key.code {
            KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Char('P') => {
                UiEvent::TogglePauseRequested
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Right => {
                UiEvent::NextTrackRequested
            }
            KeyCode::Char('b') | KeyCode::Char('B') | KeyCode::Left => {
                UiEvent::PreviousTrackRequested
            }
            KeyCode::Char('s') | KeyCode::Char('S') => UiEvent::ShuffleToggleRequested,
            KeyCode::Char('r') | KeyCode::Char('R') => UiEvent::RepeatCycleRequested,
            KeyCode::Char(',') => UiEvent::SeekByRequested {
                offset_secs: -self.seek_step_secs,
            },
            KeyCode::Char('.') => UiEvent::SeekByRequested {
                offset_secs: self.seek_step_secs,
            },
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Up => UiEvent::VolumeByRequested {
                delta: VOLUME_STEP,
            },
            KeyCode::Char('-') | KeyCode::Down => UiEvent::VolumeByRequested {
                delta: -VOLUME_STEP,
            },
            KeyCode::Char('x') | KeyCode::Char('X') => UiEvent::RemoveCurrentRequested,
            KeyCode::Char('c') | KeyCode::Char('C') => UiEvent::AcquisitionDismissed,
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => UiEvent::QuitRequested,
            _ => return None,
        };
        Some(event)
    }
}

impl UiRenderer for TerminalRenderer {
    fn init(&mut self) -> Result<()> {
        terminal::enable_raw_mode().context("failed to enable raw terminal mode")?;
        self.initialized = true;
        Ok(())
    }

    fn cleanup(&mut self) -> Result<()> {
        if self.initialized {
            terminal::disable_raw_mode()?;
            self.initialized = false;
            println!();
        }
        Ok(())
    }

    fn render(&mut self, view: &PlayerView) -> Result<()> {
        let mut stdout = stdout();

        stdout.execute(cursor::MoveToColumn(0))?;
        stdout.execute(terminal::Clear(ClearType::CurrentLine))?;

        let line = format!("{} | {}", view.status_line(), KEY_HINTS);
        let width = terminal::size().map(|(w, _)| w as usize).unwrap_or(120);
        print!("{}", fit_to_width(&line, width));

        stdout.flush()?;
        Ok(())
    }

    fn poll_input(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                events.extend(self.map_key(key));
            }
        }

        Ok(events)
    }
}

/// Keep a status line on one terminal row.
fn fit_to_width(line: &str, width: usize) -> String {
    if line.chars().count() <= width {
        return line.to_string();
    }
    let keep = width.saturating_sub(1);
    let mut fitted: String = line.chars().take(keep).collect();
    if width > 0 {
        fitted.push('…');
    }
    fitted
}

/// Yes/no questions on stdin.
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        print!("{question} [y/N] ");
        stdout().flush()?;

        let mut answer = String::new();
        stdin().lock().read_line(&mut answer)?;
        Ok(is_yes(&answer))
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
