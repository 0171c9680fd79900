//! Colours shared by the source and IR panes
//!
//! Both panes colour the same kinds of things (types, literals, names of
//! functions), so one palette serves the source language and the IR alike.

use ratatui::style::Color;

pub struct Palette {
    pub text: Color,
    pub muted: Color,     // line numbers, comments, key hints
    pub delimiter: Color, // brackets, braces, ':'
    pub keyword: Color,   // statement keywords and IR opcodes
    pub type_name: Color, // `int` in source, `i32` in IR
    pub literal: Color,   // numbers, strings, `true`/`false`
    pub callee: Color,    // `[name: ...]` and `@name`
    pub register: Color,  // `%t.1`, `%x.main.2`
    pub label: Color,     // `L3:`
    pub compiled: Color,
    pub failed: Color,
    pub border_focused: Color,
    pub border_idle: Color,
}

pub const PALETTE: Palette = Palette {
    text: Color::Rgb(205, 214, 244),
    muted: Color::Rgb(108, 112, 134),
    delimiter: Color::Rgb(137, 180, 250),
    keyword: Color::Rgb(137, 180, 250),
    type_name: Color::Rgb(148, 226, 213),
    literal: Color::Rgb(250, 179, 135),
    callee: Color::Rgb(249, 226, 175),
    register: Color::Rgb(245, 194, 231),
    label: Color::Rgb(249, 226, 175),
    compiled: Color::Rgb(166, 227, 161),
    failed: Color::Rgb(243, 139, 168),
    border_focused: Color::Rgb(249, 226, 175),
    border_idle: Color::Rgb(108, 112, 134),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcomes_and_names_are_distinguishable() {
        assert_ne!(PALETTE.compiled, PALETTE.failed);
        assert_ne!(PALETTE.register, PALETTE.label);
        assert_ne!(PALETTE.type_name, PALETTE.keyword);
        assert_ne!(PALETTE.border_focused, PALETTE.border_idle);
    }
}
