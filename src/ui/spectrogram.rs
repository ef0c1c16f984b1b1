//! Terminal front end for the live spectrogram.
//!
//! The plot fills every row but the last, which holds a one-line status footer.

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::Paragraph,
};
use std::io::{stdout, Stdout};
use std::time::Duration;

use super::canvas::TerminalCanvas;
use crate::spectrogram::SessionState;

const FOOTER_HEIGHT: u16 = 1;

/// What the user asked for since the last poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewCommand {
    /// Nothing, or an unbound key
    Continue,
    /// Space: pause or resume sampling
    TogglePause,
    /// Escape, 'q' or Ctrl+C
    Quit,
}

/// Values shown in the footer line.
#[derive(Debug, Clone, Copy)]
pub struct FooterStatus<'a> {
    pub state: SessionState,
    pub toggle_label: &'a str,
    pub sample_rate: u32,
    pub frequency_bins: usize,
}

/// Owns the terminal while the spectrogram is on screen.
pub struct SpectrogramTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    canvas: TerminalCanvas,
    restored: bool,
}

impl SpectrogramTui {
    /// Enters the alternate screen and sizes the canvas to the terminal.
    ///
    /// # Errors
    /// - If raw mode or the alternate screen cannot be entered
    /// - If the terminal size cannot be read
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let size = terminal.size()?;
        let rows = size.height.saturating_sub(FOOTER_HEIGHT);
        tracing::debug!("Terminal is {}x{} cells", size.width, size.height);

        Ok(Self {
            terminal,
            canvas: TerminalCanvas::new(size.width, rows),
            restored: false,
        })
    }

    /// Canvas size in pixels.
    pub fn canvas_size(&self) -> (u32, u32) {
        use crate::spectrogram::Surface;
        self.canvas.size()
    }

    pub fn canvas_mut(&mut self) -> &mut TerminalCanvas {
        &mut self.canvas
    }

    /// Pushes the canvas and footer to the screen.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn draw(&mut self, status: &FooterStatus) -> anyhow::Result<()> {
        let canvas = &self.canvas;
        self.terminal.draw(|frame| {
            let area = frame.area();
            let plot_area = Rect {
                height: area.height.saturating_sub(FOOTER_HEIGHT),
                ..area
            };
            let footer_area = Rect {
                y: area.y + plot_area.height,
                height: area.height.min(FOOTER_HEIGHT),
                ..area
            };

            frame.render_widget(canvas, plot_area);
            frame.render_widget(footer(status), footer_area);
        })?;
        Ok(())
    }

    /// Waits up to `timeout` for a key press.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, timeout: Duration) -> anyhow::Result<ViewCommand> {
        if !event::poll(timeout)? {
            return Ok(ViewCommand::Continue);
        }
        let Event::Key(key) = event::read()? else {
            return Ok(ViewCommand::Continue);
        };
        if key.kind != KeyEventKind::Press {
            return Ok(ViewCommand::Continue);
        }

        Ok(match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                tracing::debug!("Escape or 'q' pressed: quitting");
                ViewCommand::Quit
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                tracing::debug!("Ctrl+C pressed: quitting");
                ViewCommand::Quit
            }
            KeyCode::Char(' ') => {
                tracing::debug!("Space pressed: toggling pause");
                ViewCommand::TogglePause
            }
            _ => ViewCommand::Continue,
        })
    }

    /// Restores the terminal. Safe to call more than once.
    ///
    /// # Errors
    /// - If raw mode cannot be disabled
    /// - If the screen cannot be switched back or the cursor shown
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for SpectrogramTui {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

fn footer(status: &FooterStatus) -> Paragraph<'static> {
    let indicator = match status.state {
        SessionState::Paused => Span::styled("⏸ ", Style::default().fg(Color::Yellow)),
        _ => Span::styled("● ", Style::default().fg(Color::Red)),
    };
    let key = Style::default().fg(Color::Rgb(0xee, 0xee, 0xee)).bold();

    let line = Line::from(vec![
        indicator,
        Span::styled("[Space]", key),
        Span::raw(format!(" {}", status.toggle_label)),
        Span::raw(format!(
            " / {:.1} kHz / {} bins / ",
            status.sample_rate as f64 / 1000.0,
            status.frequency_bins
        )),
        Span::styled("[q]", key),
        Span::raw(" Quit"),
    ]);

    Paragraph::new(line).style(
        Style::default()
            .fg(Color::Rgb(185, 207, 212))
            .bg(Color::Rgb(0, 0, 0)),
    )
}
