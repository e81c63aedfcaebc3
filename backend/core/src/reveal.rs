//! Resolved progressive-reveal model.
//!
//! A slide's reveal elements are bound to concrete integer steps by the
//! resolver in `stardeck-markdown`; this module holds the result and the
//! visibility rules the rest of the system queries.

use serde::{Deserialize, Serialize};

/// Animation preset used when no layer names one.
pub const DEFAULT_ANIMATION: &str = "fade";

/// Enter duration (ms) used when no layer names one.
pub const DEFAULT_DURATION_MS: u32 = 300;

/// How an element asked to be numbered, before resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepSpec {
    /// Next unused sequential number on the slide.
    Sequential,
    /// `at="n"`.
    Explicit { step: usize },
    /// `at="n-m"`, visible on `[n, m)`.
    Range { from: usize, until: usize },
}

/// Visibility shape of a resolved element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealKind {
    /// Appears at its step and stays.
    Show,
    /// Visible until its step, then disappears.
    Hide,
    /// Visible on a window of steps.
    Range,
}

/// A reveal element bound to a concrete step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedReveal {
    /// Position among the slide's reveal elements, in document order.
    pub ordinal: usize,
    pub step: usize,
    /// Exclusive end of the visibility window for ranges.
    pub until: Option<usize>,
    pub kind: RevealKind,
    /// Bound to the previous element's step instead of a fresh one.
    pub shares_previous: bool,
    /// 0-based line of the opening tag within the slide body.
    pub line: usize,
}

impl ResolvedReveal {
    /// Whether the element is visible when the slide is at `current` clicks.
    pub fn is_visible(&self, current: usize) -> bool {
        match self.kind {
            RevealKind::Show => current >= self.step,
            RevealKind::Hide => current < self.step,
            RevealKind::Range => {
                current >= self.step && self.until.map_or(true, |until| current < until)
            }
        }
    }

    /// Highest step this element references.
    pub fn highest_step(&self) -> usize {
        self.until.map_or(self.step, |until| until.max(self.step))
    }
}

/// One layer of the click animation cascade (deck, slide or element).
///
/// Unset fields fall through to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ease: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spring: Option<String>,
}

impl AnimationDefaults {
    /// Layer `self` over `lower`: each field of `self` wins when set.
    pub fn over(&self, lower: &AnimationDefaults) -> AnimationDefaults {
        AnimationDefaults {
            animation: self.animation.clone().or_else(|| lower.animation.clone()),
            duration: self.duration.or(lower.duration),
            delay: self.delay.or(lower.delay),
            ease: self.ease.clone().or_else(|| lower.ease.clone()),
            spring: self.spring.clone().or_else(|| lower.spring.clone()),
        }
    }

    /// The built-in bottom layer.
    pub fn builtin() -> AnimationDefaults {
        AnimationDefaults {
            animation: Some(DEFAULT_ANIMATION.to_string()),
            duration: Some(DEFAULT_DURATION_MS),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == AnimationDefaults::default()
    }
}
