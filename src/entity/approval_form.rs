//! ApprovalForm entity - 审批单表
//!
//! 表名: approval_forms

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 审批单状态
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalStatus {
    /// 待审批
    Pending,
    /// 已通过
    Approved,
    /// 已拒绝
    Rejected,
    /// 已撤回
    Withdrawn,
}

impl ApprovalStatus {
    /// Stored column value
    pub fn code(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "0",
            ApprovalStatus::Approved => "1",
            ApprovalStatus::Rejected => "2",
            ApprovalStatus::Withdrawn => "3",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "0" => Some(ApprovalStatus::Pending),
            "1" => Some(ApprovalStatus::Approved),
            "2" => Some(ApprovalStatus::Rejected),
            "3" => Some(ApprovalStatus::Withdrawn),
            _ => None,
        }
    }

    /// Whether the approver may still approve or reject
    pub fn is_reviewable(&self) -> bool {
        matches!(self, ApprovalStatus::Pending)
    }

    /// Whether the applicant may still edit or withdraw
    pub fn is_amendable(&self) -> bool {
        matches!(self, ApprovalStatus::Pending | ApprovalStatus::Rejected)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_forms")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// 项目名称
    #[sea_orm(column_type = "String(Some(128))")]
    pub project_name: String,

    /// 审批内容
    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// 申请部门ID
    pub department_id: i64,

    /// 执行日期
    pub execute_date: Date,

    /// 申请人ID
    pub applicant_id: i64,

    /// 当前审批人ID (审批完成后清空)
    pub current_approver_id: Option<i64>,

    /// 状态: 0=待审批, 1=通过, 2=拒绝, 3=已撤回
    #[sea_orm(column_type = "String(Some(1))")]
    pub status: String,

    /// 软删除标记
    pub is_deleted: bool,

    pub created_at: DateTimeUtc,

    /// 审批时间
    pub approval_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Parsed status; unknown codes are treated as pending
    pub fn status(&self) -> ApprovalStatus {
        ApprovalStatus::from_code(&self.status).unwrap_or(ApprovalStatus::Pending)
    }
}
