//! Annotation Relay
//!
//! Per-slide store of presenter annotation elements. Elements are opaque JSON
//! objects owned by the drawing client; the relay only understands the
//! change envelope (`type`, `element.id`, `elementId`, `order`).

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// An opaque annotation element. Only its `id` is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationElement(pub Map<String, Value>);

impl AnnotationElement {
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str).filter(|id| !id.is_empty())
    }
}

/// One entry of an annotation change batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnnotationChange {
    Create {
        element: AnnotationElement,
    },
    Update {
        element: AnnotationElement,
    },
    Delete {
        #[serde(rename = "elementId")]
        element_id: String,
    },
    Reorder {
        order: Vec<String>,
    },
    /// Remove every element on the slide.
    Clear,
}

/// Decode a raw batch. Entries that do not match the envelope are skipped
/// individually; the count of skipped entries is returned alongside.
pub fn parse_changes(raw: Vec<Value>) -> (Vec<AnnotationChange>, usize) {
    let mut skipped = 0;
    let changes = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<AnnotationChange>(value) {
            Ok(change) => Some(change),
            Err(e) => {
                warn!(error = %e, "Skipping malformed annotation change");
                skipped += 1;
                None
            }
        })
        .collect();
    (changes, skipped)
}

#[derive(Debug, Clone, Default)]
struct SlideLayer {
    elements: IndexMap<String, AnnotationElement>,
    order: Vec<String>,
}

/// Outcome of applying one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    slides: HashMap<usize, SlideLayer>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `changes` to `slide` in order.
    pub fn apply(&mut self, slide: usize, changes: &[AnnotationChange]) -> ApplyReport {
        self.apply_accepted(slide, changes).0
    }

    /// Like [`apply`](Self::apply), also returning the changes that took
    /// effect. Relaying only these keeps live viewers on the same layer a
    /// late joiner replays from [`snapshot`](Self::snapshot).
    pub fn apply_accepted(
        &mut self,
        slide: usize,
        changes: &[AnnotationChange],
    ) -> (ApplyReport, Vec<AnnotationChange>) {
        let layer = self.slides.entry(slide).or_default();
        let mut report = ApplyReport::default();
        let mut accepted = Vec::with_capacity(changes.len());

        for change in changes {
            match change {
                AnnotationChange::Create { element } | AnnotationChange::Update { element } => {
                    let Some(id) = element.id().map(str::to_string) else {
                        warn!(slide, "Annotation element without an id; skipped");
                        report.skipped += 1;
                        continue;
                    };
                    if layer.elements.insert(id.clone(), element.clone()).is_none() {
                        layer.order.push(id);
                    }
                }
                AnnotationChange::Delete { element_id } => {
                    layer.elements.shift_remove(element_id);
                    layer.order.retain(|id| id != element_id);
                }
                AnnotationChange::Reorder { order } => {
                    layer.order = order
                        .iter()
                        .filter(|id| layer.elements.contains_key(*id))
                        .cloned()
                        .collect();
                }
                AnnotationChange::Clear => {
                    layer.elements.clear();
                    layer.order.clear();
                }
            }
            report.applied += 1;
            accepted.push(change.clone());
        }
        (report, accepted)
    }

    /// The slide's current state as a replayable batch: every element as a
    /// `create`, then one `reorder`. Empty for slides without elements.
    pub fn snapshot(&self, slide: usize) -> Vec<AnnotationChange> {
        let Some(layer) = self.slides.get(&slide).filter(|l| !l.elements.is_empty()) else {
            return Vec::new();
        };
        let mut out: Vec<AnnotationChange> = layer
            .elements
            .values()
            .map(|element| AnnotationChange::Create {
                element: element.clone(),
            })
            .collect();
        if !layer.order.is_empty() {
            out.push(AnnotationChange::Reorder {
                order: layer.order.clone(),
            });
        }
        out
    }

    pub fn ids(&self, slide: usize) -> Vec<String> {
        self.slides
            .get(&slide)
            .map(|l| l.elements.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn order(&self, slide: usize) -> Vec<String> {
        self.slides.get(&slide).map(|l| l.order.clone()).unwrap_or_default()
    }

    pub fn clear_all(&mut self) {
        self.slides.clear();
    }
}
