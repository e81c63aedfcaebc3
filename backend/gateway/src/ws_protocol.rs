//! WebSocket protocol for the StarDeck gateway.
//!
//! The same [`ServerMessage`] values are delivered over WebSocket and SSE.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stardeck_core::{Deck, Position};

use crate::relay::AnnotationChange;

/// Role of a connected subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Viewer,
    Presenter,
}

/// Client -> Server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
    Advance,
    Retreat,
    GotoSlide {
        index: usize,
        #[serde(default)]
        step: Option<usize>,
    },
    GotoStep {
        step: usize,
    },
    GotoLink {
        link: String,
    },
    /// Raw change batch; entries are validated individually by the relay.
    Annotate {
        slide: usize,
        changes: Vec<Value>,
    },
    Pointer {
        x: f64,
        y: f64,
    },
}

/// Position plus the bounds a client needs to render controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionView {
    pub slide: usize,
    pub step: usize,
    pub max_step: usize,
    pub total: usize,
    pub deep_link: String,
}

impl PositionView {
    pub fn new(deck: &Deck, pos: Position) -> Self {
        Self {
            slide: pos.slide,
            step: pos.step,
            max_step: deck.max_step(pos.slide),
            total: deck.len(),
            deep_link: pos.deep_link(),
        }
    }
}

/// Server -> Client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full current state, sent once on subscribe.
    CatchUp {
        position: PositionView,
        html: String,
        annotations: Vec<AnnotationChange>,
        role: Role,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next_title: Option<String>,
        /// Presenter preview of the following slide.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next_html: Option<String>,
    },
    /// Position changed. `html` and `annotations` are present only when the
    /// slide changed; `annotations` then starts with a `clear`.
    Navigation {
        position: PositionView,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        html: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        annotations: Option<Vec<AnnotationChange>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next_title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next_html: Option<String>,
        /// True when only this connection's local cursor moved.
        #[serde(default)]
        local: bool,
    },
    Annotation {
        slide: usize,
        changes: Vec<AnnotationChange>,
    },
    Pointer {
        slide: usize,
        x: f64,
        y: f64,
    },
    /// The deck was rebuilt from source. `annotations` is always a single
    /// `clear`; a reload drops every layer.
    Reloaded {
        position: PositionView,
        html: String,
        annotations: Vec<AnnotationChange>,
        total: usize,
    },
    Error {
        code: String,
        message: String,
    },
    Pong,
}

impl ServerMessage {
    /// Deltas that may be dropped for a slow subscriber instead of tearing it down.
    pub fn is_droppable(&self) -> bool {
        matches!(self, ServerMessage::Pointer { .. } | ServerMessage::Pong)
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Event name used on the SSE stream.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::CatchUp { .. } => "catch_up",
            ServerMessage::Navigation { .. } => "navigation",
            ServerMessage::Annotation { .. } => "annotation",
            ServerMessage::Pointer { .. } => "pointer",
            ServerMessage::Reloaded { .. } => "reloaded",
            ServerMessage::Error { .. } => "error",
            ServerMessage::Pong => "pong",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_messages_decode() {
        let msg: ClientMessage = serde_json::from_value(json!({"type": "goto_slide", "index": 3})).unwrap();
        assert_eq!(msg, ClientMessage::GotoSlide { index: 3, step: None });

        let msg: ClientMessage = serde_json::from_value(json!({"type": "goto_link", "link": "#2.1"})).unwrap();
        assert_eq!(msg, ClientMessage::GotoLink { link: "#2.1".into() });

        assert!(serde_json::from_value::<ClientMessage>(json!({"type": "self_destruct"})).is_err());
    }

    #[test]
    fn test_navigation_wire_shape() {
        let msg = ServerMessage::Navigation {
            position: PositionView {
                slide: 1,
                step: 2,
                max_step: 3,
                total: 4,
                deep_link: "2.2".into(),
            },
            html: None,
            annotations: None,
            notes: None,
            next_title: None,
            next_html: None,
            local: false,
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "type": "navigation",
                "position": {"slide": 1, "step": 2, "max_step": 3, "total": 4, "deep_link": "2.2"},
                "local": false,
            })
        );
        assert!(!msg.is_droppable());
        assert!(ServerMessage::Pointer { slide: 0, x: 1.0, y: 2.0 }.is_droppable());
    }
}
