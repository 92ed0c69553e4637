//! User handlers

use axum::{response::Json, Extension};
use sea_orm::{EntityTrait, QueryOrder};

use crate::entity::user;
use crate::error::AppResult;
use crate::middleware::DbConn;
use crate::routes::ApiResponse;

/// GET /api/users
pub async fn list_users(
    Extension(db): Extension<DbConn>,
) -> AppResult<Json<ApiResponse<Vec<user::Model>>>> {
    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(&*db)
        .await?;

    Ok(Json(ApiResponse::success("Users loaded", users)))
}
