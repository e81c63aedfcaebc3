//! Slide Markup Compiler
//!
//! Turns deck source into an immutable [`stardeck_core::Deck`]: slides are
//! split, frontmatter and speaker notes extracted, click markup parsed and
//! bound to steps, and the result rendered to HTML.

pub mod click;
pub mod code_block;
pub mod deck;
pub mod emit;
pub mod frontmatter;
pub mod ir;
pub mod renderer;
pub mod resolve;
pub mod slide_html;
pub mod split;
pub mod transform;

pub use click::{parse_clicks, ParsedClicks};
pub use deck::{load_deck, parse_deck, parse_deck_str, ParseOptions};
pub use emit::RenderMode;
pub use ir::{Node, RevealAttrs, RevealNode};
pub use renderer::{CmarkRenderer, MarkdownRenderer};
pub use resolve::{resolve, Resolution};
pub use slide_html::wrap_slide;
