use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of an authoring problem found in click markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// `<after>` with no reveal element before it on the slide.
    OrphanAfter,
    /// `at="…"` that is not a number or an `n-m` range with `m > n`.
    MalformedRange,
    /// An opening tag that is never closed.
    UnterminatedTag,
    /// A closing tag with no matching opening tag.
    StrayClosingTag,
    /// An attribute value that could not be interpreted.
    InvalidAttribute,
    /// A frontmatter block that is not a YAML mapping.
    InvalidFrontmatter,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| format!("{:?}", self));
        write!(f, "{}", s)
    }
}

/// An authoring problem surfaced to the deck author.
///
/// `line` is 0-based and relative to the deck source once the slide has been
/// placed in a deck, relative to the slide body before that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub slide: Option<usize>,
    pub line: usize,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: usize, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            slide: None,
            line,
            kind,
            message: message.into(),
        }
    }

    /// Attach the diagnostic to a slide, shifting its line into deck coordinates.
    pub fn placed(mut self, slide: usize, line_offset: usize) -> Self {
        self.slide = Some(slide);
        self.line += line_offset;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slide {
            Some(slide) => write!(
                f,
                "slide {} line {}: {} ({})",
                slide + 1,
                self.line + 1,
                self.message,
                self.kind
            ),
            None => write!(f, "line {}: {} ({})", self.line + 1, self.message, self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(DiagnosticKind::OrphanAfter.to_string(), "orphan_after");
        assert_eq!(DiagnosticKind::MalformedRange.to_string(), "malformed_range");
    }

    #[test]
    fn test_placed_shifts_line() {
        let d = Diagnostic::new(2, DiagnosticKind::UnterminatedTag, "unclosed <click>").placed(3, 10);
        assert_eq!(d.slide, Some(3));
        assert_eq!(d.line, 12);
        assert_eq!(d.to_string(), "slide 4 line 13: unclosed <click> (unterminated_tag)");
    }
}
