//! Terminal UI module using ratatui.
//!
//! - `render`: one screen per gate view, plus overlays
//! - `input`: keyboard event handling
//! - `styles`: color scheme and text styling

pub mod input;
pub mod render;
pub mod styles;
