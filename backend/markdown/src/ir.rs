//! Click Markup Intermediate Representation
//!
//! The parser turns a slide body into a flat list of [`Node`]s: literal
//! markup spans and reveal elements. Steps are not bound here; that is the
//! resolver's job, because a sequential element's number depends on every
//! element before it.

use serde::{Deserialize, Serialize};
use stardeck_core::{AnimationDefaults, StepSpec};

/// Explicit transform deltas on a reveal element. Values are kept as the
/// author wrote them (`"20"`, `"-4px"`, `"0.5"`) after validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<String>,
}

impl Transform {
    pub fn is_empty(&self) -> bool {
        *self == Transform::default()
    }

    /// Set fields as `(name, value)` pairs, in a fixed order.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("x", &self.x),
            ("y", &self.y),
            ("scale", &self.scale),
            ("rotate", &self.rotate),
            ("opacity", &self.opacity),
        ]
        .into_iter()
        .filter_map(|(name, v)| v.as_deref().map(|v| (name, v)))
        .collect()
    }

    pub(crate) fn slot(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "x" => Some(&mut self.x),
            "y" => Some(&mut self.y),
            "scale" => Some(&mut self.scale),
            "rotate" => Some(&mut self.rotate),
            "opacity" => Some(&mut self.opacity),
            _ => None,
        }
    }
}

/// Animation parameters for one direction (enter or exit).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Motion {
    #[serde(flatten)]
    pub layer: AnimationDefaults,
    #[serde(flatten)]
    pub transform: Transform,
}

impl Motion {
    pub fn is_empty(&self) -> bool {
        self.layer.is_empty() && self.transform.is_empty()
    }
}

/// Inline attributes on a reveal tag, beyond its step spec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealAttrs {
    pub enter: Motion,
    /// `exit-*` attributes, used when navigating backwards.
    pub exit: Motion,
    /// Extra classes from `class=`/`cls=`.
    pub class: Option<String>,
}

/// A reveal element before step resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealNode {
    pub spec: StepSpec,
    pub hide: bool,
    /// `<after>`: bind to the previous element's step.
    pub after: bool,
    /// Written inside a line of text rather than as its own block.
    pub inline: bool,
    pub attrs: RevealAttrs,
    /// Content, with any nested reveal tags already reduced to plain markup.
    pub content: String,
    /// 0-based line of the opening tag within the slide body.
    pub line: usize,
}

/// One piece of a parsed slide body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    Text(String),
    Reveal(RevealNode),
}

impl Node {
    pub fn as_reveal(&self) -> Option<&RevealNode> {
        match self {
            Node::Reveal(r) => Some(r),
            Node::Text(_) => None,
        }
    }
}

/// All reveal nodes of a parsed body, in document order.
pub fn reveals(nodes: &[Node]) -> impl Iterator<Item = &RevealNode> {
    nodes.iter().filter_map(Node::as_reveal)
}
