//! Background tasks
//!
//! Housekeeping that runs alongside the HTTP server

pub mod cleanup;
