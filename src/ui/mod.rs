//! Terminal-facing UI: event rendering and its settings.

pub mod render;
pub mod settings;

pub use render::Renderer;
