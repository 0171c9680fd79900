//! Pane renderers for the inspector

mod ir;
mod source;
mod status;

pub use ir::render_ir_pane;
pub use source::render_source_pane;
pub use status::render_status_bar;
