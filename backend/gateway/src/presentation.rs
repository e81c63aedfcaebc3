//! Presentation hub.
//!
//! The single serialized entry point for everything that reads or mutates
//! the live presentation: navigation, annotations, subscriptions and deck
//! reloads all take the same lock, so deltas are published in the order the
//! commands arrived and catch-up payloads see one consistent snapshot.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stardeck_core::{Deck, Position};
use stardeck_logging::{EventLogger, PresentationEvent};
use stardeck_markdown::wrap_slide;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::auth::{PresenterGrant, PresenterToken};
use crate::broadcaster::{Broadcaster, PublishReport, Subscriber, SubscriberId};
use crate::relay::{parse_changes, AnnotationChange, AnnotationStore, ApplyReport};
use crate::state::{Cursor, ReloadPolicy};
use crate::ws_protocol::{PositionView, Role, ServerMessage};

pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("presenter token missing or invalid")]
    Unauthorized,
    #[error("unknown subscriber {0}")]
    UnknownSubscriber(SubscriberId),
    #[error("slide {slide} does not exist; the deck has {total} slides")]
    SlideOutOfRange { slide: usize, total: usize },
}

impl GatewayError {
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::Unauthorized => "unauthorized",
            GatewayError::UnknownSubscriber(_) => "unknown_subscriber",
            GatewayError::SlideOutOfRange { .. } => "slide_out_of_range",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationOptions {
    pub subscriber_buffer: usize,
    pub reload_policy: ReloadPolicy,
}

impl Default for PresentationOptions {
    fn default() -> Self {
        Self {
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
            reload_policy: ReloadPolicy::default(),
        }
    }
}

/// A live subscription. Dropping `rx` disconnects it; the registry notices on
/// the next publish.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    pub role: Role,
    pub rx: mpsc::Receiver<ServerMessage>,
}

struct Inner {
    deck: Arc<Deck>,
    cursor: Cursor,
    annotations: AnnotationStore,
    broadcaster: Broadcaster,
    policy: ReloadPolicy,
}

#[derive(Clone)]
pub struct Presentation {
    inner: Arc<Mutex<Inner>>,
    token: PresenterToken,
}

fn slide_html(deck: &Deck, index: usize) -> String {
    wrap_slide(deck.slide_clamped(index), &deck.config.transition)
}

fn notes(deck: &Deck, index: usize) -> Option<String> {
    deck.slide(index).and_then(|s| s.notes.clone())
}

fn next_title(deck: &Deck, index: usize) -> Option<String> {
    deck.slide(index + 1).map(|s| s.title.clone().unwrap_or_else(|| format!("Slide {}", index + 2)))
}

fn next_html(deck: &Deck, index: usize) -> Option<String> {
    deck.slide(index + 1).map(|_| slide_html(deck, index + 1))
}

/// The navigation delta for `sub` moving to `pos`. Slide content and the
/// annotation replay ride along only when the subscriber changes slide.
fn navigation_for(
    sub: &mut Subscriber,
    deck: &Deck,
    annotations: &AnnotationStore,
    pos: Position,
    local: bool,
) -> ServerMessage {
    let slide_changed = sub.last_slide != pos.slide;
    sub.last_slide = pos.slide;
    let presenter = sub.role == Role::Presenter && !local;

    let (html, replay) = if slide_changed {
        let mut replay = vec![AnnotationChange::Clear];
        replay.extend(annotations.snapshot(pos.slide));
        (Some(slide_html(deck, pos.slide)), Some(replay))
    } else {
        (None, None)
    };
    ServerMessage::Navigation {
        position: PositionView::new(deck, pos),
        html,
        annotations: replay,
        notes: if presenter && slide_changed { notes(deck, pos.slide) } else { None },
        next_title: if presenter && slide_changed { next_title(deck, pos.slide) } else { None },
        next_html: if presenter && slide_changed { next_html(deck, pos.slide) } else { None },
        local,
    }
}

fn log_removed(report: &PublishReport) {
    for (id, role, reason) in &report.removed {
        debug!(subscriber = %id, ?role, reason = reason.as_str(), "Subscriber removed");
        EventLogger::log_event(PresentationEvent::SubscriberLeft {
            subscriber: id.to_string(),
            reason: reason.as_str().to_string(),
        });
    }
}

fn send_direct(broadcaster: &mut Broadcaster, id: &SubscriberId, msg: ServerMessage) {
    let Some(role) = broadcaster.get(id).map(|s| s.role) else { return };
    if let Some(reason) = broadcaster.send_to(id, msg) {
        log_removed(&PublishReport {
            removed: vec![(*id, role, reason)],
            ..Default::default()
        });
    }
}

impl Presentation {
    pub fn new(deck: Deck, token: PresenterToken, options: PresentationOptions) -> Self {
        let deck = Arc::new(deck);
        let cursor = Cursor::at(&deck, Position::START);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                deck,
                cursor,
                annotations: AnnotationStore::new(),
                broadcaster: Broadcaster::new(options.subscriber_buffer),
                policy: options.reload_policy,
            })),
            token,
        }
    }

    pub fn token(&self) -> &PresenterToken {
        &self.token
    }

    /// Check a presenter token. Failures are logged and change nothing.
    pub fn authorize(&self, token: Option<&str>, command: &str) -> Result<PresenterGrant, GatewayError> {
        match token {
            Some(candidate) if self.token.verify(candidate) => Ok(PresenterGrant::new()),
            other => {
                let detail = if other.is_some() { "invalid token" } else { "missing token" };
                warn!(command, detail, "Rejected presenter command");
                EventLogger::log_event(PresentationEvent::Unauthorized {
                    command: command.to_string(),
                    detail: detail.to_string(),
                });
                Err(GatewayError::Unauthorized)
            }
        }
    }

    // -- subscriptions ----------------------------------------------------

    pub async fn subscribe_viewer(&self) -> Subscription {
        self.subscribe(Role::Viewer).await
    }

    pub async fn subscribe_presenter(&self, _grant: &PresenterGrant) -> Subscription {
        self.subscribe(Role::Presenter).await
    }

    async fn subscribe(&self, role: Role) -> Subscription {
        let mut inner = self.inner.lock().await;
        let Inner {
            deck,
            cursor,
            annotations,
            broadcaster,
            ..
        } = &mut *inner;
        let deck: &Deck = deck;
        let pos = cursor.position();
        let (id, rx) = broadcaster.register(role, *cursor);

        let presenter = role == Role::Presenter;
        let catch_up = ServerMessage::CatchUp {
            position: PositionView::new(deck, pos),
            html: slide_html(deck, pos.slide),
            annotations: annotations.snapshot(pos.slide),
            role,
            notes: if presenter { notes(deck, pos.slide) } else { None },
            next_title: if presenter { next_title(deck, pos.slide) } else { None },
            next_html: if presenter { next_html(deck, pos.slide) } else { None },
        };
        // A fresh channel always has room for the first message.
        broadcaster.send_to(&id, catch_up);

        info!(subscriber = %id, ?role, subscribers = broadcaster.len(), "Subscriber joined");
        EventLogger::log_event(PresentationEvent::SubscriberJoined {
            subscriber: id.to_string(),
            role: format!("{role:?}").to_lowercase(),
        });
        Subscription { id, role, rx }
    }

    pub async fn unsubscribe(&self, id: &SubscriberId) {
        let mut inner = self.inner.lock().await;
        if inner.broadcaster.remove(id).is_some() {
            debug!(subscriber = %id, subscribers = inner.broadcaster.len(), "Subscriber left");
            EventLogger::log_event(PresentationEvent::SubscriberLeft {
                subscriber: id.to_string(),
                reason: "disconnected".to_string(),
            });
        }
    }

    /// Send a direct reply (pong, error) to one subscriber.
    pub async fn reply(&self, id: &SubscriberId, msg: ServerMessage) {
        let mut inner = self.inner.lock().await;
        send_direct(&mut inner.broadcaster, id, msg);
    }

    pub async fn subscriber_count(&self) -> usize {
        self.inner.lock().await.broadcaster.len()
    }

    // -- shared navigation ------------------------------------------------

    async fn navigate(&self, via: &str, op: impl FnOnce(&mut Cursor, &Deck) -> bool) -> bool {
        let mut inner = self.inner.lock().await;
        let Inner {
            deck,
            cursor,
            annotations,
            broadcaster,
            ..
        } = &mut *inner;
        let deck: &Deck = deck;
        if !op(&mut *cursor, deck) {
            return false;
        }
        let pos = cursor.position();
        let report = broadcaster.publish_with(|sub| {
            sub.cursor.sync_to(deck, pos);
            Some(navigation_for(sub, deck, annotations, pos, false))
        });
        log_removed(&report);

        info!(slide = pos.slide, step = pos.step, via, delivered = report.delivered, "Navigated");
        EventLogger::log_event(PresentationEvent::Navigated {
            slide: pos.slide,
            step: pos.step,
            via: via.to_string(),
        });
        true
    }

    pub async fn advance(&self, _grant: &PresenterGrant) -> bool {
        self.navigate("advance", |c, d| c.advance(d)).await
    }

    pub async fn retreat(&self, _grant: &PresenterGrant) -> bool {
        self.navigate("retreat", |c, d| c.retreat(d)).await
    }

    pub async fn goto_slide(&self, _grant: &PresenterGrant, index: usize, step: Option<usize>) -> bool {
        self.navigate("goto_slide", |c, d| c.goto_slide(d, index, step)).await
    }

    pub async fn goto_step(&self, _grant: &PresenterGrant, step: usize) -> bool {
        self.navigate("goto_step", |c, d| c.goto_step(d, step)).await
    }

    pub async fn goto_link(&self, _grant: &PresenterGrant, link: &str) -> bool {
        self.navigate("goto_link", |c, d| c.goto_link(d, link)).await
    }

    // -- viewer-local navigation ------------------------------------------

    /// Move one viewer's local cursor; only that viewer is told.
    async fn navigate_local(
        &self,
        id: &SubscriberId,
        op: impl FnOnce(&mut Cursor, &Deck) -> bool,
    ) -> Result<bool, GatewayError> {
        let mut inner = self.inner.lock().await;
        let Inner {
            deck,
            annotations,
            broadcaster,
            ..
        } = &mut *inner;
        let deck: &Deck = deck;
        let sub = broadcaster.get_mut(id).ok_or(GatewayError::UnknownSubscriber(*id))?;
        if !op(&mut sub.cursor, deck) {
            return Ok(false);
        }
        let pos = sub.cursor.position();
        let msg = navigation_for(sub, deck, annotations, pos, true);
        send_direct(broadcaster, id, msg);
        Ok(true)
    }

    pub async fn viewer_advance(&self, id: &SubscriberId) -> Result<bool, GatewayError> {
        self.navigate_local(id, |c, d| c.advance(d)).await
    }

    pub async fn viewer_retreat(&self, id: &SubscriberId) -> Result<bool, GatewayError> {
        self.navigate_local(id, |c, d| c.retreat(d)).await
    }

    pub async fn viewer_goto_slide(
        &self,
        id: &SubscriberId,
        index: usize,
        step: Option<usize>,
    ) -> Result<bool, GatewayError> {
        self.navigate_local(id, |c, d| c.goto_slide(d, index, step)).await
    }

    pub async fn viewer_goto_link(&self, id: &SubscriberId, link: &str) -> Result<bool, GatewayError> {
        self.navigate_local(id, |c, d| c.goto_link(d, link)).await
    }

    // -- annotations and pointer ------------------------------------------

    /// Apply a raw change batch to `slide` and relay the accepted changes.
    /// Layers are per slide, so an index past the end is rejected rather
    /// than clamped.
    pub async fn submit_annotations(
        &self,
        _grant: &PresenterGrant,
        slide: usize,
        raw: Vec<Value>,
    ) -> Result<ApplyReport, GatewayError> {
        let mut inner = self.inner.lock().await;
        let total = inner.deck.len();
        if slide >= total {
            warn!(slide, total, "Annotation batch for a missing slide");
            return Err(GatewayError::SlideOutOfRange { slide, total });
        }
        let (changes, malformed) = parse_changes(raw);

        let (mut report, accepted) = inner.annotations.apply_accepted(slide, &changes);
        report.skipped += malformed;

        if !accepted.is_empty() {
            let publish = inner
                .broadcaster
                .publish(&ServerMessage::Annotation { slide, changes: accepted });
            log_removed(&publish);
        }
        debug!(slide, applied = report.applied, skipped = report.skipped, "Annotation batch");
        EventLogger::log_event(PresentationEvent::AnnotationBatch {
            slide,
            applied: report.applied,
            skipped: report.skipped,
        });
        Ok(report)
    }

    /// Relay the presenter's pointer to viewers. Slow viewers may miss some.
    pub async fn pointer(&self, _grant: &PresenterGrant, x: f64, y: f64) {
        if !(x.is_finite() && y.is_finite()) {
            return;
        }
        let mut inner = self.inner.lock().await;
        let slide = inner.cursor.position().slide;
        let msg = ServerMessage::Pointer { slide, x, y };
        let report = inner
            .broadcaster
            .publish_with(|sub| (sub.role == Role::Viewer).then(|| msg.clone()));
        log_removed(&report);
    }

    // -- reads ---------------------------------------------------------------

    pub async fn position(&self) -> Position {
        self.inner.lock().await.cursor.position()
    }

    pub async fn state_view(&self) -> PositionView {
        let inner = self.inner.lock().await;
        PositionView::new(&inner.deck, inner.cursor.position())
    }

    pub async fn deck(&self) -> Arc<Deck> {
        self.inner.lock().await.deck.clone()
    }

    /// Wrapped HTML for a slide; the index is clamped. Returns the index used.
    pub async fn slide_html(&self, index: usize) -> (usize, String) {
        let deck = self.deck().await;
        let index = index.min(deck.last_index());
        (index, slide_html(&deck, index))
    }

    pub async fn annotation_snapshot(&self, slide: usize) -> Vec<AnnotationChange> {
        self.inner.lock().await.annotations.snapshot(slide)
    }

    // -- reload --------------------------------------------------------------

    /// Swap in a rebuilt deck. Annotations are dropped; the position follows
    /// the reload policy; every subscriber gets a `reloaded` payload.
    pub async fn reload(&self, deck: Deck) -> Position {
        let slides = deck.len();
        let diagnostics = deck.diagnostics().count();
        let deck = Arc::new(deck);

        let mut inner = self.inner.lock().await;
        let target = inner.policy.target(&deck, inner.cursor.position());
        inner.deck = deck.clone();
        inner.cursor = Cursor::at(&deck, target);
        inner.annotations.clear_all();

        let html = slide_html(&deck, target.slide);
        let view = PositionView::new(&deck, target);
        let report = inner.broadcaster.publish_with(|sub| {
            sub.cursor = Cursor::at(&deck, target);
            sub.last_slide = target.slide;
            Some(ServerMessage::Reloaded {
                position: view.clone(),
                html: html.clone(),
                annotations: vec![AnnotationChange::Clear],
                total: slides,
            })
        });
        log_removed(&report);

        info!(slides, diagnostics, slide = target.slide, step = target.step, "Deck reloaded");
        EventLogger::log_event(PresentationEvent::DeckReloaded { slides, diagnostics });
        target
    }
}
