//! Inspector application state and logic

use crate::errors::CompileError;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    Frame, Terminal,
    backend::Backend,
    layout::{Constraint, Direction, Layout},
};
use std::io;
use std::time::Duration;

/// Lines moved by PageUp/PageDown
const PAGE: usize = 20;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Ir,
}

impl FocusedPane {
    /// Move focus to the other pane
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Ir,
            FocusedPane::Ir => FocusedPane::Source,
        }
    }
}

/// The main application state
pub struct App {
    /// Name of the file being inspected, shown in the status bar
    pub file_name: String,

    /// The source code being compiled
    pub source_code: String,

    /// Generated IR, or the error that stopped compilation
    pub result: Result<String, CompileError>,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub source_scroll: usize,
    pub ir_scroll: usize,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,
}

impl App {
    /// Compile `source_code` and set up the panes for it
    pub fn new(file_name: impl Into<String>, source_code: String) -> Self {
        let file_name = file_name.into();
        let result = crate::compile(&source_code);
        let status_message = match &result {
            Ok(ir) => format!(
                "{}: {} function(s) compiled",
                file_name,
                function_starts(ir).len()
            ),
            Err(error) => format!("{}: {}", file_name, error),
        };

        let mut app = App {
            file_name,
            source_code,
            result,
            focused_pane: FocusedPane::Source,
            source_scroll: 0,
            ir_scroll: 0,
            should_quit: false,
            status_message,
        };
        // bring the offending line into view
        if let Err(error) = &app.result {
            app.source_scroll = error.line().saturating_sub(PAGE / 2);
        }
        app
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Two panes side by side, plus status bar at bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(main_chunks[0]);

        super::panes::render_source_pane(
            frame,
            columns[0],
            &self.source_code,
            self.result.as_ref().err().map(CompileError::line),
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        super::panes::render_ir_pane(
            frame,
            columns[1],
            &self.result,
            self.focused_pane == FocusedPane::Ir,
            &mut self.ir_scroll,
        );

        super::panes::render_status_bar(
            frame,
            main_chunks[1],
            &self.status_message,
            self.result.is_err(),
        );
    }

    fn focused_scroll(&mut self) -> &mut usize {
        match self.focused_pane {
            FocusedPane::Source => &mut self.source_scroll,
            FocusedPane::Ir => &mut self.ir_scroll,
        }
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Up => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_sub(1);
            }
            KeyCode::Down => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_add(1);
            }
            KeyCode::PageUp => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_sub(PAGE);
            }
            KeyCode::PageDown => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_add(PAGE);
            }
            KeyCode::Home => {
                *self.focused_scroll() = 0;
            }
            KeyCode::End => {
                // clamped to the last page when rendered
                *self.focused_scroll() = usize::MAX;
            }
            KeyCode::Char('n') => self.jump_to_function(true),
            KeyCode::Char('p') => self.jump_to_function(false),
            _ => {}
        }
    }

    /// Scroll the IR pane to the next (or previous) `define`
    fn jump_to_function(&mut self, forward: bool) {
        let Ok(ir) = &self.result else {
            self.status_message = "No IR to navigate".to_string();
            return;
        };
        let starts = function_starts(ir);
        let current = self.ir_scroll.min(ir.lines().count());
        let target = if forward {
            starts.iter().copied().find(|&line| line > current)
        } else {
            starts.iter().copied().rev().find(|&line| line < current)
        };

        match target {
            Some(line) => {
                self.ir_scroll = line;
                self.focused_pane = FocusedPane::Ir;
                let header = ir.lines().nth(line).unwrap_or_default();
                self.status_message = header.trim_end_matches(" {").to_string();
            }
            None => {
                self.status_message = if forward {
                    "Already at the last function".to_string()
                } else {
                    "Already at the first function".to_string()
                };
            }
        }
    }
}

/// Zero-based line numbers of every function header in `ir`
pub(crate) fn function_starts(ir: &str) -> Vec<usize> {
    ir.lines()
        .enumerate()
        .filter(|(_, line)| line.starts_with("define "))
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    const TWO_FUNCTIONS: &str = "[int one] { return 1; }\n[int two] { return 2; }\n";

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_new_app_compiles_source() {
        let app = App::new("two.brk", TWO_FUNCTIONS.to_string());
        let ir = app.result.as_ref().unwrap();
        assert_eq!(function_starts(ir).len(), 2);
        assert!(app.status_message.contains("2 function(s)"));
    }

    #[test]
    fn test_function_navigation() {
        let mut app = App::new("two.brk", TWO_FUNCTIONS.to_string());
        let starts = function_starts(app.result.as_ref().unwrap());

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.ir_scroll, starts[1]);
        assert_eq!(app.focused_pane, FocusedPane::Ir);
        assert!(app.status_message.starts_with("define i32 @two"));

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.ir_scroll, starts[1]);
        assert_eq!(app.status_message, "Already at the last function");

        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.ir_scroll, starts[0]);
    }

    #[test]
    fn test_failed_compilation_shows_error() {
        let mut app = App::new("bad.brk", "[int f] { return g; }".to_string());
        assert!(app.result.is_err());
        assert!(app.status_message.contains("undeclared identifier 'g'"));

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.status_message, "No IR to navigate");
    }

    #[test]
    fn test_focus_and_scrolling() {
        let mut app = App::new("two.brk", TWO_FUNCTIONS.to_string());
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.source_scroll, 2);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focused_pane, FocusedPane::Ir);
        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.ir_scroll, PAGE);
        press(&mut app, KeyCode::Home);
        assert_eq!(app.ir_scroll, 0);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.ir_scroll, 0);

        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
