//! Request handlers module

pub mod approval;
pub mod attachment;
pub mod department;
pub mod form_schema;
pub mod user;
