pub mod deck;
pub mod diagnostic;
pub mod error;
pub mod position;
pub mod reveal;

pub use deck::{Deck, DeckConfig, DeckSource, Frontmatter, Slide};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use error::DeckError;
pub use position::{format_deep_link, parse_deep_link, Position};
pub use reveal::{AnimationDefaults, RevealKind, ResolvedReveal, StepSpec};
