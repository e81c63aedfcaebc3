//! Presentation state machine.
//!
//! A [`Cursor`] is a position that can only move through the positions the
//! current deck allows. Every operation returns whether the position actually
//! changed, so callers publish exactly one delta per real transition.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use stardeck_core::{parse_deep_link, Deck, Position};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    position: Position,
}

impl Cursor {
    /// A cursor at `pos`, clamped into `deck`.
    pub fn at(deck: &Deck, pos: Position) -> Self {
        Self {
            position: deck.clamp(pos),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    fn set(&mut self, next: Position) -> bool {
        if next == self.position {
            return false;
        }
        self.position = next;
        true
    }

    /// Next step, or the first step of the next slide.
    pub fn advance(&mut self, deck: &Deck) -> bool {
        let Position { slide, step } = deck.clamp(self.position);
        let next = if step < deck.max_step(slide) {
            Position::new(slide, step + 1)
        } else if slide < deck.last_index() {
            Position::new(slide + 1, 0)
        } else {
            Position::new(slide, step)
        };
        self.set(next)
    }

    /// Previous step, or the last step of the previous slide.
    pub fn retreat(&mut self, deck: &Deck) -> bool {
        let Position { slide, step } = deck.clamp(self.position);
        let next = if step > 0 {
            Position::new(slide, step - 1)
        } else if slide > 0 {
            Position::new(slide - 1, deck.max_step(slide - 1))
        } else {
            Position::new(slide, step)
        };
        self.set(next)
    }

    pub fn goto_slide(&mut self, deck: &Deck, index: usize, step: Option<usize>) -> bool {
        let target = deck.clamp(Position::new(index, step.unwrap_or(0)));
        self.set(target)
    }

    /// Jump within the current slide.
    pub fn goto_step(&mut self, deck: &Deck, step: usize) -> bool {
        let target = deck.clamp(Position::new(self.position.slide, step));
        self.set(target)
    }

    /// Follow an `N[.S]` deep link. Never fails: junk lands on the first slide.
    pub fn goto_link(&mut self, deck: &Deck, link: &str) -> bool {
        let target = parse_deep_link(link);
        self.goto_slide(deck, target.slide, Some(target.step))
    }

    /// Pull the cursor back inside `deck` after a reload.
    pub fn reclamp(&mut self, deck: &Deck) -> bool {
        self.set(deck.clamp(self.position))
    }

    /// Move to `pos` (clamped), e.g. when following the presenter.
    pub fn sync_to(&mut self, deck: &Deck, pos: Position) -> bool {
        self.set(deck.clamp(pos))
    }
}

/// What happens to the shared position when the deck is rebuilt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadPolicy {
    /// Back to the first slide.
    #[default]
    Reset,
    /// Stay where we are, clamped to the new deck.
    Clamp,
}

impl ReloadPolicy {
    /// The position a cursor at `current` should take in `deck`.
    pub fn target(&self, deck: &Deck, current: Position) -> Position {
        match self {
            ReloadPolicy::Reset => Position::START,
            ReloadPolicy::Clamp => deck.clamp(current),
        }
    }
}

impl FromStr for ReloadPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reset" => Ok(ReloadPolicy::Reset),
            "clamp" => Ok(ReloadPolicy::Clamp),
            other => Err(format!("unknown reload policy '{other}' (expected reset or clamp)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stardeck_core::{DeckConfig, DeckSource, Slide};

    /// A deck whose slides have the given max steps.
    fn deck(max_steps: &[usize]) -> Deck {
        let slides = max_steps
            .iter()
            .enumerate()
            .map(|(i, &max_step)| Slide {
                max_step,
                ..Slide::plain(i, format!("<h1>Slide {}</h1>", i + 1))
            })
            .collect();
        Deck::new(slides, DeckConfig::default(), DeckSource::default()).unwrap()
    }

    #[test]
    fn test_advance_walks_steps_then_slides() {
        let d = deck(&[2, 0, 1]);
        let mut c = Cursor::default();
        let mut visited = vec![c.position()];
        while c.advance(&d) {
            visited.push(c.position());
        }
        let expected: Vec<Position> = [(0, 0), (0, 1), (0, 2), (1, 0), (2, 0), (2, 1)]
            .iter()
            .map(|&(s, t)| Position::new(s, t))
            .collect();
        assert_eq!(visited, expected);
    }

    #[test]
    fn test_boundaries_are_no_ops() {
        let d = deck(&[0, 2]);
        let mut c = Cursor::default();
        assert!(!c.retreat(&d));
        assert_eq!(c.position(), Position::START);

        c.goto_slide(&d, 1, Some(2));
        assert!(!c.advance(&d));
        assert_eq!(c.position(), Position::new(1, 2));
    }

    #[test]
    fn test_retreat_lands_on_last_step_of_previous_slide() {
        let d = deck(&[3, 1]);
        let mut c = Cursor::at(&d, Position::new(1, 0));
        assert!(c.retreat(&d));
        assert_eq!(c.position(), Position::new(0, 3));
    }

    #[test]
    fn test_goto_clamps() {
        let d = deck(&[1, 4]);
        let mut c = Cursor::default();
        assert!(c.goto_slide(&d, 99, Some(99)));
        assert_eq!(c.position(), Position::new(1, 4));
        assert!(c.goto_slide(&d, 0, None));
        assert_eq!(c.position(), Position::START);
        assert!(c.goto_step(&d, 7));
        assert_eq!(c.position(), Position::new(0, 1));
        assert!(!c.goto_step(&d, 1));
    }

    #[test]
    fn test_random_walk_stays_in_bounds() {
        let d = deck(&[2, 0, 5, 1]);
        let mut c = Cursor::default();
        // Linear congruential sequence; deterministic but irregular.
        let mut seed: u64 = 0x5eed;
        for _ in 0..2_000 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            if (seed >> 33) % 3 == 0 {
                c.retreat(&d);
            } else {
                c.advance(&d);
            }
            let p = c.position();
            assert!(p.slide <= d.last_index());
            assert!(p.step <= d.max_step(p.slide));
        }
    }

    #[test]
    fn test_deep_link_round_trip() {
        let d = deck(&[2, 0, 3]);
        for (slide, max) in [(0, 2), (1, 0), (2, 3)] {
            for step in 0..=max {
                let pos = Position::new(slide, step);
                let mut c = Cursor::default();
                c.goto_link(&d, &pos.deep_link());
                assert_eq!(c.position(), pos);
            }
        }
    }

    #[test]
    fn test_deep_link_junk_clamps() {
        let d = deck(&[1, 1]);
        let mut c = Cursor::at(&d, Position::new(1, 1));
        c.goto_link(&d, "#banana");
        assert_eq!(c.position(), Position::START);
        c.goto_link(&d, "40.9");
        assert_eq!(c.position(), Position::new(1, 1));
    }

    #[test]
    fn test_reload_policy() {
        let d = deck(&[0, 2]);
        let here = Position::new(5, 5);
        assert_eq!(ReloadPolicy::Reset.target(&d, here), Position::START);
        assert_eq!(ReloadPolicy::Clamp.target(&d, here), Position::new(1, 2));
        assert_eq!("Clamp".parse::<ReloadPolicy>(), Ok(ReloadPolicy::Clamp));
        assert!("rewind".parse::<ReloadPolicy>().is_err());
    }
}
