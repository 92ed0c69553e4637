//! Identity middleware
//!
//! Derives the acting user from request parameters. There is no real
//! authentication: `userId` and `role` are taken from the query string and
//! fall back to the configured defaults.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, Uri},
    middleware::Next,
    response::Response,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::ops::Deref;
use std::sync::Arc;

use crate::state::AppState;

/// Database connection wrapper for use in handlers via Extension
#[derive(Clone)]
pub struct DbConn(pub Arc<DatabaseConnection>);

impl Deref for DbConn {
    type Target = DatabaseConnection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// User role
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Applicant,
    Approver,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "APPLICANT" => Some(Role::Applicant),
            "APPROVER" => Some(Role::Approver),
            _ => None,
        }
    }
}

/// Extension to store current user in request
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i64,
    /// Role given on the query string, if any
    pub role: Option<Role>,
}

impl CurrentUser {
    /// Effective role, falling back to a role named in the request body
    pub fn role_or(&self, fallback: Option<&str>) -> Role {
        self.role
            .or_else(|| fallback.and_then(Role::parse))
            .unwrap_or(Role::Applicant)
    }

    pub fn role(&self) -> Role {
        self.role_or(None)
    }
}

#[derive(Debug, Default, Deserialize)]
struct IdentityQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
    role: Option<String>,
}

/// Parse the identity parameters out of the request URI
fn identity_from_uri(uri: &Uri, default_user_id: i64) -> CurrentUser {
    let params = Query::<IdentityQuery>::try_from_uri(uri)
        .map(|q| q.0)
        .unwrap_or_default();

    CurrentUser {
        id: params
            .user_id
            .and_then(|id| id.trim().parse().ok())
            .unwrap_or(default_user_id),
        role: params.role.as_deref().and_then(Role::parse),
    }
}

/// Identity middleware
///
/// Inserts [`DbConn`] and [`CurrentUser`] into the request extensions.
pub async fn identity_layer(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let user = identity_from_uri(request.uri(), state.config.approval.default_user_id);
    tracing::debug!("Request identity: user {} role {:?}", user.id, user.role);

    request.extensions_mut().insert(DbConn(state.db.clone()));
    request.extensions_mut().insert(user);

    next.run(request).await
}
