//! Source code pane rendering with syntax highlighting
//!
//! This module renders the source pane, which displays the program being
//! compiled with basic syntax highlighting.
//!
//! # Features
//!
//! - Syntax highlighting for keywords, types, strings, numbers, and comments
//! - Callee names (the identifier after `[`) in the function color
//! - Error line highlighting when compilation failed
//! - Line numbering
//!
//! # Rendering
//!
//! The pane uses a simple character-by-character tokenizer to apply syntax
//! highlighting styles without running the real lexer, so it also works on
//! source that does not lex.

use crate::ui::theme::PALETTE;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Simple syntax highlighting for one line of source
pub(crate) fn highlight_source_code(line: &str) -> Line<'_> {
    let mut spans = Vec::new();
    let mut current_word = String::new();
    let mut after_bracket = false;

    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        // Handle comments
        if c == '/' && i + 1 < chars.len() && (chars[i + 1] == '/' || chars[i + 1] == '*') {
            if !current_word.is_empty() {
                spans.push(Span::raw(current_word.clone()));
                current_word.clear();
            }
            spans.push(Span::styled(
                chars[i..].iter().collect::<String>(),
                Style::default().fg(PALETTE.muted),
            ));
            break;
        }

        // Handle strings
        if c == '"' {
            if !current_word.is_empty() {
                spans.push(Span::raw(current_word.clone()));
                current_word.clear();
            }
            let mut end = i + 1;
            while end < chars.len() && chars[end] != '"' {
                end += if chars[end] == '\\' { 2 } else { 1 };
            }
            let end = (end + 1).min(chars.len());
            spans.push(Span::styled(
                chars[i..end].iter().collect::<String>(),
                Style::default().fg(PALETTE.literal),
            ));
            i = end;
            continue;
        }

        // Handle non-alphanumeric (delimiters)
        if !c.is_alphanumeric() && c != '_' && c != '.' {
            if !current_word.is_empty() {
                let style = get_keyword_style(&current_word, after_bracket);
                spans.push(Span::styled(current_word.clone(), style));
                current_word.clear();
                after_bracket = false;
            }
            if !c.is_whitespace() {
                after_bracket = c == '[';
            }

            let style = match c {
                '{' | '}' | '(' | ')' | '[' | ']' => Style::default().fg(PALETTE.delimiter),
                ':' => Style::default().fg(PALETTE.delimiter),
                _ => Style::default().fg(PALETTE.text),
            };

            spans.push(Span::styled(c.to_string(), style));
            i += 1;
            continue;
        }

        current_word.push(c);
        i += 1;
    }

    if !current_word.is_empty() {
        let style = get_keyword_style(&current_word, after_bracket);
        spans.push(Span::styled(current_word, style));
    }

    Line::from(spans)
}

fn get_keyword_style(word: &str, after_bracket: bool) -> Style {
    match word {
        "int" | "char" | "void" | "bool" | "float" => Style::default().fg(PALETTE.type_name),
        "struct" | "return" | "if" | "else" | "while" | "do" | "break" => Style::default()
            .fg(PALETTE.keyword)
            .add_modifier(Modifier::BOLD),
        "true" | "false" => Style::default().fg(PALETTE.literal),
        _ if word.starts_with(|c: char| c.is_ascii_digit()) => {
            Style::default().fg(PALETTE.literal)
        }
        _ if after_bracket => Style::default().fg(PALETTE.callee),
        _ => Style::default().fg(PALETTE.text),
    }
}

/// Render the source code pane
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    source_code: &str,
    error_line: Option<usize>,
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

    let block = Block::default()
        .title(" Source ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let lines: Vec<&str> = source_code.lines().collect();
    let visible_height = area.height.saturating_sub(2).max(1) as usize; // Account for borders (2), min 1

    // Clamp scroll offset to valid range
    *scroll = (*scroll).min(lines.len().saturating_sub(visible_height));

    let visible_lines: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(*scroll)
        .take(visible_height)
        .map(|(idx, line)| {
            let line_num = idx + 1;
            let is_error = error_line == Some(line_num);
            let line_num_str = format!("{:4} ", line_num);

            let mut content_line = highlight_source_code(line);
            let num_style = if is_error {
                // ERROR LINE: white on red, bold line number
                for span in &mut content_line.spans {
                    span.style = Style::default()
                        .bg(PALETTE.failed)
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD);
                }
                Style::default()
                    .fg(PALETTE.failed)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(PALETTE.muted) // Line numbers
            };

            let mut final_spans = vec![Span::styled(line_num_str, num_style)];
            final_spans.extend(content_line.spans);
            Line::from(final_spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_highlighting_preserves_text() {
        let source = "[int add: int a, int b] { return a + 1.5; } // done";
        assert_eq!(text(&highlight_source_code(source)), source);
    }

    #[test]
    fn test_callee_uses_function_color() {
        let line = highlight_source_code("x = [twice: 4];");
        let callee = line
            .spans
            .iter()
            .find(|s| s.content == "twice")
            .unwrap();
        assert_eq!(callee.style.fg, Some(PALETTE.callee));

        let line = highlight_source_code("int x;");
        assert_eq!(line.spans[0].style.fg, Some(PALETTE.type_name));
    }

    #[test]
    fn test_unterminated_string_is_safe() {
        let source = "s = \"abc\\";
        assert_eq!(text(&highlight_source_code(source)), source);
    }
}
