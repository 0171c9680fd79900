//! Status bar rendering
//!
//! One line at the bottom of the screen: the outcome of the compilation on
//! the left, key bindings on the right.

use crate::ui::theme::PALETTE;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Render the status bar
pub fn render_status_bar(frame: &mut Frame, area: Rect, message: &str, failed: bool) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let message_style = if failed {
        Style::default()
            .fg(PALETTE.failed)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(PALETTE.compiled)
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(format!(" {}", message), message_style))),
        chunks[0],
    );

    let key_style = Style::default().bg(PALETTE.muted).fg(Color::Black);
    let text_style = Style::default().fg(PALETTE.text);
    let mut spans = Vec::new();
    for (key, action) in [
        ("Tab", "Focus"),
        ("↑↓", "Scroll"),
        ("n/p", "Function"),
        ("q", "Quit"),
    ] {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", action), text_style));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Right),
        chunks[1],
    );
}
