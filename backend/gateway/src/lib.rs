//! StarDeck Gateway
//!
//! Live presentation state shared by an audience and a presenter: the
//! navigation state machine, the subscriber broadcaster, the annotation
//! relay, and the HTTP/WS/SSE transport in front of them.

pub mod auth;
pub mod broadcaster;
pub mod deck_reload;
pub mod presentation;
pub mod relay;
pub mod server;
pub mod sse;
pub mod state;
pub mod ws_protocol;
pub mod ws_server;

pub use auth::{PresenterGrant, PresenterToken, RequirePresenter};
pub use deck_reload::DeckWatcher;
pub use presentation::{GatewayError, Presentation, PresentationOptions, Subscription};
pub use relay::{AnnotationChange, AnnotationStore};
pub use server::{build_router, start_server};
pub use state::{Cursor, ReloadPolicy};
pub use ws_protocol::{ClientMessage, PositionView, Role, ServerMessage};
