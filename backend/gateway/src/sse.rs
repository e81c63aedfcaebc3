//! Server-Sent Events stream of presentation deltas.
//!
//! Same payloads as the WebSocket, one event per [`ServerMessage`], named
//! after its `type`. Read-only: commands go through WS or the REST routes.

use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::auth::TokenQuery;
use crate::presentation::Presentation;
use crate::ws_protocol::ServerMessage;

/// Build one SSE event from a server message.
pub fn to_event(msg: &ServerMessage) -> Event {
    Event::default().event(msg.kind()).json_data(msg).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to encode SSE event");
        Event::default().event("error").data("encoding failed")
    })
}

/// Handler for `GET /api/events`
pub async fn events_handler(
    Query(query): Query<TokenQuery>,
    State(presentation): State<Presentation>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let grant = query
        .token
        .as_deref()
        .and_then(|token| presentation.authorize(Some(token), "sse_connect").ok());
    let subscription = match &grant {
        Some(grant) => presentation.subscribe_presenter(grant).await,
        None => presentation.subscribe_viewer().await,
    };
    info!(subscriber = %subscription.id, role = ?subscription.role, "SSE stream opened");

    // The registry prunes this subscriber on the first publish after the
    // client goes away and the stream (and its receiver) is dropped.
    let stream = ReceiverStream::new(subscription.rx).map(|msg| Ok(to_event(&msg)));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_is_built_for_every_kind() {
        for msg in [ServerMessage::Pong, ServerMessage::error("unauthorized", "no"), ServerMessage::Pointer { slide: 1, x: 0.5, y: 0.5 }] {
            let _ = to_event(&msg);
        }
    }
}
