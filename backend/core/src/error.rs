use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or loading a deck.
///
/// Authoring mistakes inside slide markup are not errors; they are reported
/// as [`crate::Diagnostic`]s on the slide that contains them.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("deck has no slides")]
    Empty,

    #[error("slide index {found} at position {expected}: slide indices must be dense")]
    NonDenseIndex { expected: usize, found: usize },

    #[error("failed to read deck source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
