//! WebSocket entrypoint and connection handler.
//!
//! Upgrades HTTP to WS, subscribes the connection to the presentation and
//! routes client commands. A valid `?token=` makes the connection a
//! presenter.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tracing::{debug, info, warn};

use crate::auth::{PresenterGrant, TokenQuery};
use crate::broadcaster::SubscriberId;
use crate::presentation::{GatewayError, Presentation};
use crate::ws_protocol::{ClientMessage, ServerMessage};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<TokenQuery>,
    State(presentation): State<Presentation>,
) -> impl IntoResponse {
    // A token that fails verification downgrades to a viewer connection.
    let grant = query
        .token
        .as_deref()
        .and_then(|token| presentation.authorize(Some(token), "ws_connect").ok());
    ws.on_upgrade(move |socket| handle_connection(socket, presentation, grant))
}

async fn handle_connection(socket: WebSocket, presentation: Presentation, grant: Option<PresenterGrant>) {
    let subscription = match &grant {
        Some(grant) => presentation.subscribe_presenter(grant).await,
        None => presentation.subscribe_viewer().await,
    };
    let id = subscription.id;
    let mut rx = subscription.rx;
    info!(subscriber = %id, role = ?subscription.role, "WebSocket connection opened");

    let (mut sender, mut receiver) = socket.split();

    // Forward the subscriber channel to the websocket.
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "Failed to encode server message");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Receive from websocket and route to the presentation.
    let hub = presentation.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(cmd) => handle_incoming_message(cmd, id, grant.as_ref(), &hub).await,
                    Err(e) => {
                        warn!(subscriber = %id, error = %e, "Received invalid client message");
                        hub.reply(&id, ServerMessage::error("bad_request", e.to_string())).await;
                    }
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // If either task exits, abort the other.
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    presentation.unsubscribe(&id).await;
    info!(subscriber = %id, "WebSocket connection closed");
}

async fn handle_incoming_message(
    msg: ClientMessage,
    id: SubscriberId,
    grant: Option<&PresenterGrant>,
    hub: &Presentation,
) {
    let outcome: Result<bool, GatewayError> = match (msg, grant) {
        (ClientMessage::Ping, _) => {
            hub.reply(&id, ServerMessage::Pong).await;
            return;
        }

        // Presenter: shared navigation.
        (ClientMessage::Advance, Some(g)) => Ok(hub.advance(g).await),
        (ClientMessage::Retreat, Some(g)) => Ok(hub.retreat(g).await),
        (ClientMessage::GotoSlide { index, step }, Some(g)) => Ok(hub.goto_slide(g, index, step).await),
        (ClientMessage::GotoStep { step }, Some(g)) => Ok(hub.goto_step(g, step).await),
        (ClientMessage::GotoLink { link }, Some(g)) => Ok(hub.goto_link(g, &link).await),
        (ClientMessage::Annotate { slide, changes }, Some(g)) => {
            hub.submit_annotations(g, slide, changes).await.map(|report| report.applied > 0)
        }
        (ClientMessage::Pointer { x, y }, Some(g)) => {
            hub.pointer(g, x, y).await;
            Ok(true)
        }

        // Viewer: local cursor only.
        (ClientMessage::Advance, None) => hub.viewer_advance(&id).await,
        (ClientMessage::Retreat, None) => hub.viewer_retreat(&id).await,
        (ClientMessage::GotoSlide { index, step }, None) => hub.viewer_goto_slide(&id, index, step).await,
        (ClientMessage::GotoLink { link }, None) => hub.viewer_goto_link(&id, &link).await,
        (ClientMessage::GotoStep { .. }, None) => hub.authorize(None, "goto_step").map(|_| false),
        (ClientMessage::Annotate { .. }, None) => hub.authorize(None, "annotate").map(|_| false),
        (ClientMessage::Pointer { .. }, None) => hub.authorize(None, "pointer").map(|_| false),
    };

    match outcome {
        Ok(changed) => debug!(subscriber = %id, changed, "Handled client command"),
        Err(e) => hub.reply(&id, ServerMessage::error(e.code(), e.to_string())).await,
    }
}
