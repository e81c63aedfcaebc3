//! Presenter capability.
//!
//! A single shared token gates every mutating command. It is accepted from a
//! `?token=` query parameter or an `Authorization: Bearer` header.

use std::fmt;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::presentation::Presentation;

#[derive(Clone, PartialEq, Eq)]
pub struct PresenterToken(Arc<str>);

impl PresenterToken {
    /// A fresh random token, `sd_` followed by 32 hex digits.
    pub fn generate() -> Self {
        Self(format!("sd_{}", Uuid::new_v4().simple()).into())
    }

    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare without short-circuiting on the first differing byte.
    pub fn verify(&self, candidate: &str) -> bool {
        let expected = self.0.as_bytes();
        let candidate = candidate.as_bytes();
        if expected.len() != candidate.len() {
            return false;
        }
        expected.iter().zip(candidate).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
    }
}

impl fmt::Debug for PresenterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PresenterToken([REDACTED])")
    }
}

/// Proof that a command passed the capability check. Only
/// [`Presentation::authorize`] hands these out.
#[derive(Debug)]
pub struct PresenterGrant {
    _sealed: (),
}

impl PresenterGrant {
    pub(crate) fn new() -> Self {
        Self { _sealed: () }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// Token from the query string, else from a bearer header.
pub fn token_from_parts(parts: &Parts) -> Option<String> {
    let from_query = Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(q)| q.token)
        .filter(|t| !t.is_empty());
    from_query.or_else(|| {
        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|val| val.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
    })
}

pub type AuthRejection = (StatusCode, Json<Value>);

pub fn unauthorized(message: impl fmt::Display) -> AuthRejection {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "unauthorized", "message": message.to_string() })),
    )
}

/// Extractor for presenter-only routes.
pub struct RequirePresenter(pub PresenterGrant);

#[async_trait]
impl FromRequestParts<Presentation> for RequirePresenter {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &Presentation) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts);
        state
            .authorize(token.as_deref(), parts.uri.path())
            .map(RequirePresenter)
            .map_err(unauthorized)
    }
}
