//! Department entity - 部门表
//!
//! 表名: departments

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::hierarchy::DepartmentRecord;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "departments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// 父部门ID (NULL 表示顶级部门)
    pub parent_id: Option<i64>,

    /// 部门名称
    #[sea_orm(column_type = "String(Some(64))")]
    pub name: String,

    /// 部门级别
    pub level: i32,

    /// 是否启用
    pub is_active: bool,

    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// 自引用关系通过 hierarchy 模块在内存中处理

impl ActiveModelBehavior for ActiveModel {}

impl DepartmentRecord for Model {
    fn id(&self) -> i64 {
        self.id
    }

    fn parent_id(&self) -> Option<i64> {
        self.parent_id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
