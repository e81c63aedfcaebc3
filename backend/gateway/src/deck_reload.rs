//! Deck hot reload.
//!
//! Watches the deck file's directory (editors often replace files rather
//! than write in place) and rebuilds the deck when the file changes. The new
//! deck is parsed outside the presentation lock and swapped in atomically; a
//! failed read or parse keeps the current deck.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use stardeck_markdown::{parse_deck, CmarkRenderer, ParseOptions};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::presentation::Presentation;

pub struct DeckWatcher {
    path: PathBuf,
    options: ParseOptions,
    presentation: Presentation,
}

/// Whether a filesystem event should trigger a rebuild of `target`.
fn is_relevant(event: &notify::Event, target: &Path) -> bool {
    let touches_content = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_));
    let file_name = target.file_name();
    touches_content && event.paths.iter().any(|p| p.file_name() == file_name)
}

impl DeckWatcher {
    pub fn new(path: impl Into<PathBuf>, options: ParseOptions, presentation: Presentation) -> Self {
        Self {
            path: path.into(),
            options,
            presentation,
        }
    }

    /// Re-read and re-parse the deck; swap it in if the source changed.
    /// Returns whether a reload happened.
    pub async fn reload_now(&self) -> Result<bool> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read deck: {}", self.path.display()))?;

        let current = self.presentation.deck().await;
        let deck = parse_deck(&content, Some(self.path.clone()), self.options, &CmarkRenderer)
            .with_context(|| format!("Failed to parse deck: {}", self.path.display()))?;
        if deck.source.content_hash == current.source.content_hash {
            debug!(path = %self.path.display(), "Deck unchanged; skipping reload");
            return Ok(false);
        }

        self.presentation.reload(deck).await;
        Ok(true)
    }

    /// Start watching. The watcher lives in the spawned task.
    pub fn watch(self) -> Result<()> {
        let (tx, mut rx) = mpsc::channel(100);

        let mut watcher: RecommendedWatcher = notify::recommended_watcher(move |res| {
            if let Err(e) = tx.blocking_send(res) {
                error!("Failed to send file event: {:?}", e);
            }
        })?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        info!(path = %self.path.display(), "Watching deck for changes");

        tokio::spawn(async move {
            // keep watcher alive
            let _w = watcher;
            while let Some(res) = rx.recv().await {
                match res {
                    Ok(event) if is_relevant(&event, &self.path) => match self.reload_now().await {
                        Ok(true) => info!(path = %self.path.display(), "Deck source changed; reloaded"),
                        Ok(false) => {}
                        Err(e) => error!(error = %format!("{e:#}"), "Deck reload failed; keeping current deck"),
                    },
                    Ok(_) => {}
                    Err(e) => warn!("Watch error: {:?}", e),
                }
            }
        });

        Ok(())
    }
}
