//! Approval Desk - departmental approval workflow backend
//!
//! Approval forms move from applicant to approver through a small status
//! machine. Department hierarchies are resolved into display paths so forms
//! can be listed and filtered by department.

pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod hierarchy;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod task;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use hierarchy::{resolve_path_index, resolve_paths, PathResolver};
pub use state::AppState;
