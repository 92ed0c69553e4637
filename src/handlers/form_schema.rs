//! Form schema handlers
//!
//! Serves the JSON schema the frontend renders dynamic approval forms from

use axum::{extract::Query, response::Json, Extension};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Deserialize;

use crate::entity::form_schema;
use crate::error::{AppResult, OptionExt};
use crate::middleware::DbConn;
use crate::routes::ApiResponse;

const DEFAULT_SCHEMA_KEY: &str = "basic_approval";

#[derive(Debug, Deserialize)]
pub struct SchemaQuery {
    #[serde(default = "default_key")]
    pub key: String,
}

fn default_key() -> String {
    DEFAULT_SCHEMA_KEY.to_string()
}

/// GET /api/form/schema?key=basic_approval
pub async fn get_form_schema(
    Extension(db): Extension<DbConn>,
    Query(query): Query<SchemaQuery>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let key = if query.key.trim().is_empty() {
        default_key()
    } else {
        query.key
    };

    let schema = form_schema::Entity::find()
        .filter(form_schema::Column::SchemaKey.eq(&key))
        .filter(form_schema::Column::IsActive.eq(true))
        .one(&*db)
        .await?
        .ok_or_not_found(format!("No form schema for key: {}", key))?;

    Ok(Json(ApiResponse::success("success", schema.schema_content)))
}
