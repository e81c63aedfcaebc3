//! Navigation position and its external `N[.S]` deep-link form.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A point in the presentation: slide index (0-based) and click step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub slide: usize,
    pub step: usize,
}

impl Position {
    pub const START: Position = Position { slide: 0, step: 0 };

    pub fn new(slide: usize, step: usize) -> Self {
        Self { slide, step }
    }

    pub fn deep_link(&self) -> String {
        format_deep_link(*self)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_deep_link(*self))
    }
}

/// Format a position as `<1-based slide>[.<step>]`; the step is omitted at 0.
pub fn format_deep_link(pos: Position) -> String {
    let slide = pos.slide.saturating_add(1);
    if pos.step > 0 {
        format!("{}.{}", slide, pos.step)
    } else {
        slide.to_string()
    }
}

/// Parse a deep link such as `#3.2` into an unclamped 0-based target.
///
/// Total: anything unparseable falls back to the start of the deck, slide
/// number `0` and negatives map to the first slide, and numbers too large
/// for `usize` saturate. Callers clamp the result against the deck.
pub fn parse_deep_link(link: &str) -> Position {
    let link = link.trim();
    let link = link.strip_prefix('#').unwrap_or(link);
    let (slide_part, step_part) = match link.split_once('.') {
        Some((slide, step)) => (slide, Some(step)),
        None => (link, None),
    };

    let slide = parse_count(slide_part).map_or(0, |n| n.saturating_sub(1));
    let step = step_part.and_then(parse_count).unwrap_or(0);
    Position { slide, step }
}

fn parse_count(s: &str) -> Option<usize> {
    let s = s.trim();
    let s = s.strip_prefix('+').unwrap_or(s);
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(s.parse::<usize>().unwrap_or(usize::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_omits_zero_step() {
        assert_eq!(format_deep_link(Position::new(0, 0)), "1");
        assert_eq!(format_deep_link(Position::new(2, 3)), "3.3");
    }

    #[test]
    fn test_parse_basic_forms() {
        assert_eq!(parse_deep_link("3"), Position::new(2, 0));
        assert_eq!(parse_deep_link("#3.2"), Position::new(2, 2));
        assert_eq!(parse_deep_link(" 1.0 "), Position::new(0, 0));
    }

    #[test]
    fn test_parse_never_fails() {
        for junk in ["", "#", "abc", "-4", "0", "3.x", ".5", "1.2.3", "🎉"] {
            let _ = parse_deep_link(junk);
        }
        assert_eq!(parse_deep_link("abc"), Position::START);
        assert_eq!(parse_deep_link("-4"), Position::START);
        assert_eq!(parse_deep_link("0"), Position::START);
        assert_eq!(parse_deep_link("3.x"), Position::new(2, 0));
        assert_eq!(parse_deep_link(".5"), Position::new(0, 5));
    }

    #[test]
    fn test_parse_saturates_huge_numbers() {
        let pos = parse_deep_link("99999999999999999999999999.7");
        assert_eq!(pos.slide, usize::MAX - 1);
        assert_eq!(pos.step, 7);
    }

    #[test]
    fn test_round_trip() {
        for slide in 0..5 {
            for step in 0..4 {
                let pos = Position::new(slide, step);
                assert_eq!(parse_deep_link(&format_deep_link(pos)), pos);
            }
        }
    }
}
