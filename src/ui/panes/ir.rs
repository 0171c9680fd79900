//! Generated IR pane
//!
//! Shows the output of the code generator with light highlighting, or the
//! diagnostic when compilation stopped early.

use crate::errors::CompileError;
use crate::ui::theme::PALETTE;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const OPCODES: &[&str] = &[
    "alloca", "load", "store", "getelementptr", "add", "sub", "mul", "sdiv", "fadd", "fsub",
    "fmul", "fdiv", "fneg", "icmp", "fcmp", "br", "ret", "call", "phi", "sitofp", "fptosi",
    "zext", "trunc", "unreachable", "type",
];

fn word_style(word: &str) -> Style {
    match word {
        "define" => Style::default()
            .fg(PALETTE.keyword)
            .add_modifier(Modifier::BOLD),
        "i1" | "i8" | "i32" | "double" | "void" | "label" => {
            Style::default().fg(PALETTE.type_name)
        }
        "true" | "false" | "zeroinitializer" => Style::default().fg(PALETTE.literal),
        _ if OPCODES.contains(&word) => Style::default().fg(PALETTE.keyword),
        _ if word.starts_with('@') => Style::default().fg(PALETTE.callee),
        _ if word.starts_with('%') => Style::default().fg(PALETTE.register),
        _ if word.starts_with(|c: char| c.is_ascii_digit() || c == '-') => {
            Style::default().fg(PALETTE.literal)
        }
        _ => Style::default().fg(PALETTE.text),
    }
}

/// Highlight one line of generated IR
pub(crate) fn highlight_ir(line: &str) -> Line<'_> {
    // block labels sit in column zero
    if line.ends_with(':') && !line.starts_with(' ') {
        return Line::from(Span::styled(
            line.to_string(),
            Style::default()
                .fg(PALETTE.label)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let mut spans = Vec::new();
    let mut word = String::new();
    for c in line.chars() {
        if c.is_alphanumeric() || matches!(c, '%' | '@' | '.' | '_' | '-') {
            word.push(c);
            continue;
        }
        if !word.is_empty() {
            spans.push(Span::styled(word.clone(), word_style(&word)));
            word.clear();
        }
        spans.push(Span::styled(
            c.to_string(),
            Style::default().fg(PALETTE.text),
        ));
    }
    if !word.is_empty() {
        let style = word_style(&word);
        spans.push(Span::styled(word, style));
    }
    Line::from(spans)
}

/// Render the IR pane, or the error that prevented generating it
pub fn render_ir_pane(
    frame: &mut Frame,
    area: Rect,
    result: &Result<String, CompileError>,
    is_focused: bool,
    scroll: &mut usize,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(PALETTE.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(PALETTE.border_idle)
    };

    let ir = match result {
        Ok(ir) => ir,
        Err(error) => {
            let block = Block::default()
                .title(" Error ")
                .borders(Borders::ALL)
                .border_style(border_style);
            let lines = vec![
                Line::from(Span::styled(
                    format!("{:?} error", error.kind()),
                    Style::default()
                        .fg(PALETTE.failed)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    error.to_string(),
                    Style::default().fg(PALETTE.text),
                )),
            ];
            let paragraph = Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, area);
            return;
        }
    };

    let block = Block::default()
        .title(" IR ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let lines: Vec<&str> = ir.lines().collect();
    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    *scroll = (*scroll).min(lines.len().saturating_sub(visible_height));

    let visible_lines: Vec<Line> = lines
        .iter()
        .skip(*scroll)
        .take(visible_height)
        .map(|line| highlight_ir(line))
        .collect();

    frame.render_widget(Paragraph::new(visible_lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_one_span() {
        let line = highlight_ir("L3:");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].style.fg, Some(PALETTE.label));
    }

    #[test]
    fn test_instruction_parts() {
        let line = highlight_ir("  %t.1 = call i32 @twice(i32 4)");
        let style_of = |text: &str| {
            line.spans
                .iter()
                .find(|s| s.content == text)
                .map(|s| s.style.fg)
        };
        assert_eq!(style_of("%t.1"), Some(Some(PALETTE.register)));
        assert_eq!(style_of("call"), Some(Some(PALETTE.keyword)));
        assert_eq!(style_of("i32"), Some(Some(PALETTE.type_name)));
        assert_eq!(style_of("@twice"), Some(Some(PALETTE.callee)));
        assert_eq!(style_of("4"), Some(Some(PALETTE.literal)));
    }
}
