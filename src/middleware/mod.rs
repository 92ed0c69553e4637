//! Request middleware

pub mod auth;

pub use auth::{identity_layer, CurrentUser, DbConn, Role};
