//! Department handlers
//!
//! Read-only department listing for cascading selectors and path display

use axum::{
    extract::{Path, Query},
    response::Json,
    Extension,
};
use sea_orm::{EntityTrait, QueryOrder};
use serde::{Deserialize, Serialize};

use crate::entity::department;
use crate::error::{AppResult, OptionExt};
use crate::hierarchy::{
    build_tree_with_paths, resolve_path_index, to_options, DepartmentOption, PathResolver, Pathed,
    TreeNode,
};
use crate::middleware::DbConn;
use crate::routes::ApiResponse;

/// Query parameters for department listing
#[derive(Debug, Default, Deserialize)]
pub struct DeptQuery {
    /// Nest children under parents (default true)
    pub tree: Option<String>,
    /// Only active departments (default true)
    pub active: Option<String>,
    /// `options` / `select` reshapes the tree for cascader widgets
    pub format: Option<String>,
}

impl DeptQuery {
    fn tree(&self) -> bool {
        match self.tree.as_deref() {
            None => true,
            Some(v) => v == "true" || v == "1",
        }
    }

    fn only_active(&self) -> bool {
        self.active.as_deref() != Some("false")
    }

    fn as_options(&self) -> bool {
        matches!(self.format.as_deref(), Some("options") | Some("select"))
    }
}

/// Department listing in one of its three shapes
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DepartmentList {
    Tree(Vec<TreeNode<department::Model>>),
    Options(Vec<DepartmentOption>),
    Flat(Vec<Pathed<department::Model>>),
}

/// Shape already-fetched rows according to the query
///
/// `rows` must be the whole table: paths are resolved before the active
/// filter, so a department under an inactive parent keeps its full path.
pub fn shape_departments(rows: Vec<department::Model>, query: &DeptQuery) -> DepartmentList {
    let paths = resolve_path_index(&rows);

    let rows: Vec<department::Model> = if query.only_active() {
        rows.into_iter().filter(|d| d.is_active).collect()
    } else {
        rows
    };

    if !query.tree() {
        return DepartmentList::Flat(
            rows.into_iter()
                .map(|record| {
                    let path = paths.get(&record.id).cloned().unwrap_or_default();
                    Pathed { record, path }
                })
                .collect(),
        );
    }

    let tree = build_tree_with_paths(rows, &paths);
    if query.as_options() {
        DepartmentList::Options(to_options(&tree))
    } else {
        DepartmentList::Tree(tree)
    }
}

/// GET /api/departments
pub async fn get_departments(
    Extension(db): Extension<DbConn>,
    Query(query): Query<DeptQuery>,
) -> AppResult<Json<ApiResponse<DepartmentList>>> {
    // Path resolution needs every ancestor, so the whole table is read
    let rows = department::Entity::find()
        .order_by_asc(department::Column::Level)
        .order_by_asc(department::Column::Id)
        .all(&*db)
        .await?;

    tracing::debug!("Loaded {} departments", rows.len());

    Ok(Json(ApiResponse::success(
        "Departments loaded",
        shape_departments(rows, &query),
    )))
}

/// GET /api/departments/:id
pub async fn get_department(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Pathed<department::Model>>>> {
    // Path resolution needs every ancestor, so the whole table is read
    let rows = department::Entity::find().all(&*db).await?;

    let mut resolver = PathResolver::new(&rows);
    let path = resolver
        .resolve(id)
        .ok_or_not_found(format!("Department {} not found", id))?;

    let record = rows
        .iter()
        .rev()
        .find(|d| d.id == id)
        .cloned()
        .ok_or_not_found(format!("Department {} not found", id))?;

    Ok(Json(ApiResponse::success("Department loaded", Pathed { record, path })))
}
