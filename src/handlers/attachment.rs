//! Attachment handlers
//!
//! Uploads are streamed to the upload directory under a random name and
//! recorded unlinked; creating an approval claims them.

use axum::{
    extract::{Multipart, State},
    response::Json,
    Extension,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::entity::approval_attachment::{self, FileType};
use crate::error::{AppError, AppResult, OptionExt};
use crate::middleware::{CurrentUser, DbConn};
use crate::routes::ApiResponse;
use crate::state::AppState;

/// URL prefix uploaded files are served under
pub const UPLOAD_URL_PREFIX: &str = "/upload/";

/// Random on-disk name, keeping a short alphanumeric extension
pub fn stored_name(original: &str) -> String {
    let ext = Path::new(original)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 10 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_lowercase());

    let id = uuid::Uuid::new_v4().simple().to_string();
    match ext {
        Some(ext) => format!("{}.{}", id, ext),
        None => id,
    }
}

/// Map a stored file URL back to its location under `upload_dir`
///
/// Returns `None` for anything that is not a plain `/upload/<name>` URL.
pub fn stored_path(upload_dir: &Path, file_url: &str) -> Option<PathBuf> {
    let name = file_url.strip_prefix(UPLOAD_URL_PREFIX)?;
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return None;
    }
    Some(upload_dir.join(name))
}

/// Upload response
#[derive(Debug, Serialize)]
pub struct UploadData {
    pub id: i64,
    #[serde(rename = "fileUrl")]
    pub file_url: String,
    #[serde(rename = "originalName")]
    pub original_name: String,
}

struct SavedFile {
    original_name: String,
    stored_name: String,
    path: PathBuf,
}

/// Stream one multipart field to disk, enforcing the size limit
async fn save_field(
    mut field: axum::extract::multipart::Field<'_>,
    upload_dir: &Path,
    max_size: usize,
) -> AppResult<SavedFile> {
    let original_name = field
        .file_name()
        .map(|n| n.to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    let stored = stored_name(&original_name);
    let path = upload_dir.join(&stored);

    fs::create_dir_all(upload_dir).await?;
    let mut file = fs::File::create(&path).await?;

    let mut written: usize = 0;
    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                let _ = fs::remove_file(&path).await;
                return Err(e.into());
            }
        };

        written += chunk.len();
        if written > max_size {
            tracing::warn!("Upload rejected: size exceeds limit {}", max_size);
            let _ = fs::remove_file(&path).await;
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds the {}MB limit",
                max_size / (1024 * 1024)
            )));
        }

        if let Err(e) = file.write_all(&chunk).await {
            let _ = fs::remove_file(&path).await;
            return Err(e.into());
        }
    }
    file.flush().await?;

    tracing::debug!("Stored upload {} as {:?} ({} bytes)", original_name, path, written);

    Ok(SavedFile {
        original_name,
        stored_name: stored,
        path,
    })
}

/// POST /api/attachments/upload
pub async fn upload_attachment(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<UploadData>>> {
    let mut form_id: Option<i64> = None;
    let mut saved: Option<SavedFile> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "formId" | "form_id" => {
                let text = field.text().await?;
                let text = text.trim();
                if !text.is_empty() {
                    form_id = Some(text.parse().map_err(|_| {
                        AppError::BadRequest(format!("Invalid formId: {}", text))
                    })?);
                }
            }
            "file" if saved.is_none() => {
                saved = Some(
                    save_field(field, &state.config.upload_dir, state.config.max_upload_size)
                        .await?,
                );
            }
            _ => {
                tracing::debug!("Ignoring multipart field: {}", name);
            }
        }
    }

    let saved = saved.ok_or_else(|| AppError::BadRequest("No file uploaded".to_string()))?;
    let file_url = format!("{}{}", UPLOAD_URL_PREFIX, saved.stored_name);

    let record = approval_attachment::ActiveModel {
        form_id: Set(form_id),
        file_name: Set(saved.original_name.clone()),
        file_url: Set(file_url.clone()),
        file_type: Set(FileType::classify(&saved.original_name).as_str().to_string()),
        uploader_id: Set(user.id),
        uploaded_at: Set(Utc::now()),
        ..Default::default()
    };

    let inserted = match record.insert(&*db).await {
        Ok(m) => m,
        Err(e) => {
            let _ = fs::remove_file(&saved.path).await;
            return Err(e.into());
        }
    };

    tracing::info!("User {} uploaded {} as {}", user.id, saved.original_name, file_url);

    Ok(Json(ApiResponse::success(
        "Upload succeeded",
        UploadData {
            id: inserted.id,
            file_url,
            original_name: saved.original_name,
        },
    )))
}

/// Delete attachment request
#[derive(Debug, Deserialize)]
pub struct DeleteAttachmentRequest {
    #[serde(rename = "formId")]
    pub form_id: Option<serde_json::Value>,
    #[serde(rename = "fileUrl")]
    pub file_url: Option<String>,
}

/// Compare a loosely typed form id (number or numeric string) against `id`
fn form_id_matches(value: &serde_json::Value, id: i64) -> bool {
    match value {
        serde_json::Value::Number(n) => n.as_i64() == Some(id),
        serde_json::Value::String(s) => s.trim() == id.to_string(),
        _ => false,
    }
}

fn form_id_given(value: &Option<serde_json::Value>) -> Option<&serde_json::Value> {
    value.as_ref().filter(|v| match v {
        serde_json::Value::Null => false,
        serde_json::Value::String(s) => !s.trim().is_empty(),
        serde_json::Value::Number(n) => n.as_i64() != Some(0),
        _ => true,
    })
}

/// POST /api/attachments/delete
pub async fn delete_attachment(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Json(req): Json<DeleteAttachmentRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let file_url = req
        .file_url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("fileUrl is required".to_string()))?;

    let attachment = approval_attachment::Entity::find()
        .filter(approval_attachment::Column::FileUrl.eq(&file_url))
        .one(&*db)
        .await?
        .ok_or_not_found("Attachment not found")?;

    if let (Some(given), Some(linked)) = (form_id_given(&req.form_id), attachment.form_id) {
        if !form_id_matches(given, linked) {
            return Err(AppError::BadRequest(
                "Attachment does not belong to this approval".to_string(),
            ));
        }
    }

    match stored_path(&state.config.upload_dir, &attachment.file_url) {
        Some(path) => {
            if let Err(e) = fs::remove_file(&path).await {
                tracing::warn!("Failed to remove file {:?} (may already be gone): {}", path, e);
            }
        }
        None => tracing::warn!("Attachment {} has unexpected url {}", attachment.id, attachment.file_url),
    }

    approval_attachment::Entity::delete_by_id(attachment.id)
        .exec(&*db)
        .await?;

    Ok(Json(ApiResponse::success_msg("Attachment deleted")))
}
