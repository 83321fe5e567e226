pub mod binding;
pub mod input;
pub mod keymap;
pub mod surface;
pub mod tui;
