//! ApprovalAttachment entity - 审批附件表
//!
//! 表名: approval_attachments

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 附件类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    Image,
    Excel,
    Other,
}

impl FileType {
    /// Classify by the original file name's extension
    pub fn classify(file_name: &str) -> Self {
        let ext = std::path::Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" => FileType::Image,
            "xls" | "xlsx" => FileType::Excel,
            _ => FileType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Image => "IMAGE",
            FileType::Excel => "EXCEL",
            FileType::Other => "OTHER",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_attachments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// 关联审批单ID (上传后、提交前为空)
    pub form_id: Option<i64>,

    /// 原始文件名
    #[sea_orm(column_type = "String(Some(255))")]
    pub file_name: String,

    /// 访问 URL (/upload/<存储名>)
    #[sea_orm(column_type = "String(Some(255))")]
    pub file_url: String,

    /// 文件类型: IMAGE / EXCEL / OTHER
    #[sea_orm(column_type = "String(Some(16))")]
    pub file_type: String,

    /// 上传人ID
    pub uploader_id: i64,

    pub uploaded_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
