//! Template module
//!
//! Placeholder catalogue, substitution and project generation.

pub mod generate;
pub mod layout;
pub mod placeholder;
pub mod render;

pub use generate::{generate, render_layout, RenderedFile};
pub use layout::Layout;
pub use placeholder::Placeholder;
pub use render::{RuntimeSource, TemplateContext};
