use super::draw::draw_figure;
use super::{ChartSink, ChartStyle, Figure};
use crate::error::Result;
use crossterm::event::{read, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;
use ratatui::Terminal;
use std::io::{self, Stdout};

const HINT: &str = " Enter/Space/n/→ next chart   q/Esc skip remaining charts";

/// Alternate screen in raw mode for the lifetime of the value.
struct Screen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Screen {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout));
        match terminal {
            Ok(terminal) => Ok(Self { terminal }),
            Err(e) => {
                let _ = execute!(io::stdout(), LeaveAlternateScreen);
                let _ = disable_raw_mode();
                Err(e.into())
            }
        }
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

enum Advance {
    Next,
    SkipRest,
}

fn wait_for_key() -> Result<Advance> {
    loop {
        if let Event::Key(key) = read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('n') | KeyCode::Right => {
                    return Ok(Advance::Next)
                }
                KeyCode::Char('q') | KeyCode::Esc => return Ok(Advance::SkipRest),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(Advance::SkipRest)
                }
                _ => {}
            }
        }
    }
}

/// Shows one figure at a time full-screen and waits for a key.
///
/// The normal screen is restored between figures, so anything printed
/// between two charts stays visible.
pub struct TerminalSink {
    style: ChartStyle,
    skip_rest: bool,
}

impl TerminalSink {
    pub fn new(style: ChartStyle) -> Self {
        Self { style, skip_rest: false }
    }
}

impl ChartSink for TerminalSink {
    fn show(&mut self, figure: &Figure) -> Result<()> {
        if self.skip_rest {
            tracing::debug!(title = %figure.title, "skipping chart");
            return Ok(());
        }

        let style = self.style;
        let mut screen = Screen::enter()?;
        screen.terminal.clear()?;
        screen.terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(1)])
                .split(f.size());
            draw_figure(f, chunks[0], figure, &style);
            f.render_widget(
                Paragraph::new(HINT).style(Style::default().fg(Color::DarkGray)),
                chunks[1],
            );
        })?;

        let advance = wait_for_key()?;
        drop(screen);
        if let Advance::SkipRest = advance {
            self.skip_rest = true;
        }
        Ok(())
    }
}
