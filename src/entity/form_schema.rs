//! FormSchema entity - 动态表单配置表
//!
//! 表名: form_schemas

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "form_schemas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// 配置 Key
    #[sea_orm(column_type = "String(Some(64))", unique)]
    pub schema_key: String,

    /// 表单 Schema (JSON)
    pub schema_content: Json,

    /// 是否启用
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
