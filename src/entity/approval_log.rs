//! ApprovalLog entity - 审批流转记录表
//!
//! 表名: approval_logs

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 流转动作
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogAction {
    Create,
    Update,
    Withdraw,
    Approve,
    Reject,
}

impl LogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogAction::Create => "CREATE",
            LogAction::Update => "UPDATE",
            LogAction::Withdraw => "WITHDRAW",
            LogAction::Approve => "APPROVE",
            LogAction::Reject => "REJECT",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// 审批单ID
    pub form_id: i64,

    /// 操作人ID
    pub operator_id: i64,

    /// 动作
    #[sea_orm(column_type = "String(Some(16))")]
    pub action: String,

    /// 备注
    #[sea_orm(column_type = "Text")]
    pub comment: String,

    pub action_time: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// 创建流转记录的辅助结构
#[derive(Clone, Debug)]
pub struct NewLog {
    pub form_id: i64,
    pub operator_id: i64,
    pub action: LogAction,
    pub comment: String,
}

impl NewLog {
    pub fn new(form_id: i64, operator_id: i64, action: LogAction) -> Self {
        Self {
            form_id,
            operator_id,
            action,
            comment: String::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn into_active_model(self, now: DateTimeUtc) -> ActiveModel {
        use sea_orm::Set;

        ActiveModel {
            form_id: Set(self.form_id),
            operator_id: Set(self.operator_id),
            action: Set(self.action.as_str().to_string()),
            comment: Set(self.comment),
            action_time: Set(now),
            ..Default::default()
        }
    }
}
