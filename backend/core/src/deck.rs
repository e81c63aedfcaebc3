//! Immutable deck snapshot.
//!
//! A [`Deck`] is rebuilt wholesale whenever the source changes and shared
//! behind an `Arc`; nothing in it is mutated after construction.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diagnostic::Diagnostic;
use crate::error::DeckError;
use crate::position::Position;
use crate::reveal::{AnimationDefaults, ResolvedReveal};

// ---------------------------------------------------------------------------
// Frontmatter
// ---------------------------------------------------------------------------

/// Key/value metadata from a slide's `---` header block.
///
/// Values keep their YAML shape (converted to JSON); an empty value such as
/// `class:` is stored as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frontmatter(pub BTreeMap<String, Value>);

impl Frontmatter {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// String-ish value: strings as-is, numbers and bools stringified, null
    /// and empty strings treated as absent.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Non-negative integer value, accepting numeric strings.
    pub fn get_u32(&self, key: &str) -> Option<u32> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Extra CSS classes from `class:` (or its `cls:` alias).
    pub fn classes(&self) -> Vec<String> {
        self.get_str("class")
            .or_else(|| self.get_str("cls"))
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// The `click-*` animation keys as one cascade layer.
    pub fn animation_layer(&self) -> AnimationDefaults {
        AnimationDefaults {
            animation: self.get_str("click-animation"),
            duration: self.get_u32("click-duration"),
            delay: self.get_u32("click-delay"),
            ease: self.get_str("click-ease"),
            spring: self.get_str("click-spring"),
        }
    }
}

// ---------------------------------------------------------------------------
// Slide
// ---------------------------------------------------------------------------

/// One resolved slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slide {
    pub index: usize,
    /// First source line of the slide (0-based, inclusive).
    pub start_line: usize,
    /// Last source line of the slide (0-based, inclusive).
    pub end_line: usize,
    /// Raw markup of the slide, frontmatter included.
    pub raw: String,
    /// Rendered body HTML, reveal wrappers included.
    pub html: String,
    pub frontmatter: Frontmatter,
    pub notes: Option<String>,
    pub title: Option<String>,
    pub reveals: Vec<ResolvedReveal>,
    pub max_step: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl Slide {
    /// A slide with plain content and no reveal elements.
    pub fn plain(index: usize, html: impl Into<String>) -> Self {
        Self {
            index,
            start_line: 0,
            end_line: 0,
            raw: String::new(),
            html: html.into(),
            frontmatter: Frontmatter::default(),
            notes: None,
            title: None,
            reveals: Vec::new(),
            max_step: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn layout(&self) -> String {
        self.frontmatter
            .get_str("layout")
            .unwrap_or_else(|| "default".to_string())
    }

    /// The slide's transition, falling back to the deck default.
    pub fn transition(&self, deck_default: &str) -> String {
        self.frontmatter
            .get_str("transition")
            .unwrap_or_else(|| deck_default.to_string())
    }

    pub fn background(&self) -> Option<String> {
        self.frontmatter.get_str("background")
    }

    pub fn image(&self) -> Option<String> {
        self.frontmatter.get_str("image")
    }

    pub fn classes(&self) -> Vec<String> {
        self.frontmatter.classes()
    }

    /// Per-slide animation layer.
    pub fn animation(&self) -> AnimationDefaults {
        self.frontmatter.animation_layer()
    }

    /// Ordinals of the reveal elements visible at `step`.
    pub fn visible_at(&self, step: usize) -> Vec<usize> {
        self.reveals
            .iter()
            .filter(|r| r.is_visible(step))
            .map(|r| r.ordinal)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Deck
// ---------------------------------------------------------------------------

/// Deck-wide settings, taken from the first slide's frontmatter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckConfig {
    pub title: String,
    pub theme: String,
    pub transition: String,
    pub aspect_ratio: String,
    pub code_theme: Option<String>,
    pub animation: AnimationDefaults,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            title: "Untitled".to_string(),
            theme: "default".to_string(),
            transition: "fade".to_string(),
            aspect_ratio: "16/9".to_string(),
            code_theme: None,
            animation: AnimationDefaults::default(),
        }
    }
}

impl DeckConfig {
    pub fn from_frontmatter(fm: &Frontmatter) -> Self {
        let defaults = Self::default();
        Self {
            title: fm.get_str("title").unwrap_or(defaults.title),
            theme: fm.get_str("theme").unwrap_or(defaults.theme),
            transition: fm.get_str("transition").unwrap_or(defaults.transition),
            aspect_ratio: fm
                .get_str("aspect-ratio")
                .or_else(|| fm.get_str("aspectRatio"))
                .unwrap_or(defaults.aspect_ratio),
            code_theme: fm.get_str("code-theme"),
            animation: fm.animation_layer(),
        }
    }
}

/// Where a deck came from, for reload bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckSource {
    pub path: Option<PathBuf>,
    pub content_hash: u64,
}

impl DeckSource {
    pub fn from_content(path: Option<PathBuf>, content: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        Self {
            path,
            content_hash: hasher.finish(),
        }
    }
}

/// An immutable, non-empty sequence of slides plus deck configuration.
///
/// Deserialization goes through [`Deck::new`], so a decoded deck upholds the
/// same invariants as a parsed one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawDeck")]
pub struct Deck {
    slides: Vec<Slide>,
    pub config: DeckConfig,
    pub source: DeckSource,
}

#[derive(Deserialize)]
struct RawDeck {
    slides: Vec<Slide>,
    config: DeckConfig,
    source: DeckSource,
}

impl TryFrom<RawDeck> for Deck {
    type Error = DeckError;

    fn try_from(raw: RawDeck) -> Result<Self, Self::Error> {
        Deck::new(raw.slides, raw.config, raw.source)
    }
}

impl Deck {
    /// Build a deck, checking that it is non-empty and indices are dense.
    pub fn new(slides: Vec<Slide>, config: DeckConfig, source: DeckSource) -> Result<Self, DeckError> {
        if slides.is_empty() {
            return Err(DeckError::Empty);
        }
        for (expected, slide) in slides.iter().enumerate() {
            if slide.index != expected {
                return Err(DeckError::NonDenseIndex {
                    expected,
                    found: slide.index,
                });
            }
        }
        Ok(Self {
            slides,
            config,
            source,
        })
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.slides.len() - 1
    }

    pub fn slide(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    /// Slide at `index`, clamped into range.
    pub fn slide_clamped(&self, index: usize) -> &Slide {
        &self.slides[index.min(self.last_index())]
    }

    pub fn max_step(&self, index: usize) -> usize {
        self.slide_clamped(index).max_step
    }

    /// Clamp an arbitrary position into this deck's bounds.
    pub fn clamp(&self, pos: Position) -> Position {
        let slide = pos.slide.min(self.last_index());
        let step = pos.step.min(self.slides[slide].max_step);
        Position { slide, step }
    }

    /// All diagnostics across the deck, in slide order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.slides.iter().flat_map(|s| s.diagnostics.iter())
    }
}
