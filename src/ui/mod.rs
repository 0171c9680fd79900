//! Terminal inspector
//!
//! Shows a source file next to the IR it compiles to, or next to the error
//! that stopped compilation.

pub mod app;
mod panes;
pub mod theme;

pub use app::App;
