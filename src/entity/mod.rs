//! Entity module - SeaORM 实体定义
//!
//! 包含所有数据库表对应的实体模型

pub mod approval_attachment;
pub mod approval_form;
pub mod approval_log;
pub mod department;
pub mod form_schema;
pub mod user;
