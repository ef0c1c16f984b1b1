//! Full-screen report for errors that stop the spectrogram from starting.

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Paragraph, Wrap},
};
use std::io::{self, Stdout};
use std::time::Duration;

const BACKGROUND: Color = Color::Rgb(120, 0, 0);
const FOREGROUND: Color = Color::Rgb(0xee, 0xee, 0xee);

/// Dismissible error screen on the alternate screen.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    restored: bool,
}

impl ErrorScreen {
    /// Enters the alternate screen in raw mode.
    ///
    /// # Errors
    /// - If the terminal cannot be put into raw mode or the alternate screen
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self {
            terminal,
            restored: false,
        })
    }

    /// Shows `message` centred on a dark red screen until a key is pressed.
    ///
    /// # Errors
    /// - If drawing or reading terminal events fails
    pub fn show(&mut self, message: &str) -> anyhow::Result<()> {
        loop {
            self.terminal.draw(|frame| render_error(frame, message))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(_) = event::read()? {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Leaves the alternate screen and restores the cursor.
    ///
    /// # Errors
    /// - If raw mode cannot be disabled or the screen cannot be switched back
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

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

fn render_error(frame: &mut Frame, message: &str) {
    let area = frame.area();
    let style = Style::default().fg(FOREGROUND).bg(BACKGROUND);
    frame.buffer_mut().set_style(area, style);
    frame.render_widget(error_paragraph(message, style), message_area(area));
}

fn error_paragraph(message: &str, style: Style) -> Paragraph<'_> {
    let mut text = vec![
        Line::from(Span::styled("spectro could not start", style.bold())),
        Line::default(),
    ];
    text.extend(message.lines().map(|line| Line::from(Span::styled(line, style))));
    text.push(Line::default());
    text.push(Line::from(Span::styled("Press any key to exit", style.italic())));

    Paragraph::new(text)
        .style(style)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
}

/// Middle 80% of the width, from a quarter of the way down to three quarters.
fn message_area(area: Rect) -> Rect {
    let width = area.width * 8 / 10;
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + area.height / 4,
        width,
        height: area.height / 2,
    }
}
