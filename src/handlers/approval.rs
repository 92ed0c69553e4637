//! Approval handlers
//!
//! Implements approval form listing, detail, creation and the fixed
//! single-approver flow (approve / reject / withdraw)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::entity::approval_form::{self, ApprovalStatus};
use crate::entity::approval_log::{self, LogAction, NewLog};
use crate::entity::{approval_attachment, department, user};
use crate::error::{AppError, AppResult, OptionExt};
use crate::hierarchy::resolve_path_index;
use crate::middleware::{CurrentUser, DbConn, Role};
use crate::routes::ApiResponse;
use crate::state::AppState;

const MAX_PAGE_SIZE: u64 = 100;

/// Query parameters for the approval list
///
/// Every filter is optional; empty strings are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u64>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<u64>,
    pub status: Option<String>,
    #[serde(rename = "projectName")]
    pub project_name: Option<String>,
    #[serde(rename = "departmentId")]
    pub department_id: Option<String>,
    #[serde(rename = "createTimeStart")]
    pub create_time_start: Option<String>,
    #[serde(rename = "createTimeEnd")]
    pub create_time_end: Option<String>,
    #[serde(rename = "approvalTimeStart")]
    pub approval_time_start: Option<String>,
    #[serde(rename = "approvalTimeEnd")]
    pub approval_time_end: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ListQuery {
    /// (page, page_size), page is 1-based and page_size clamped to 1..=100
    pub fn pagination(&self) -> (u64, u64) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self.page_size.unwrap_or(10).clamp(1, MAX_PAGE_SIZE);
        (page, page_size)
    }

    /// Build the WHERE condition for the given role
    pub fn condition(&self, role: Role) -> AppResult<Condition> {
        let mut cond = Condition::all().add(approval_form::Column::IsDeleted.eq(false));

        // Approvers only see what is waiting on them
        if role == Role::Approver {
            cond = cond.add(approval_form::Column::Status.eq(ApprovalStatus::Pending.code()));
        }

        if let Some(status) = non_empty(&self.status) {
            cond = cond.add(approval_form::Column::Status.eq(status));
        }
        if let Some(name) = non_empty(&self.project_name) {
            cond = cond.add(approval_form::Column::ProjectName.contains(name));
        }
        if let Some(dept) = non_empty(&self.department_id) {
            let dept: i64 = dept
                .parse()
                .map_err(|_| AppError::BadRequest(format!("Invalid departmentId: {}", dept)))?;
            cond = cond.add(approval_form::Column::DepartmentId.eq(dept));
        }
        if let Some(start) = non_empty(&self.create_time_start) {
            cond = cond.add(approval_form::Column::CreatedAt.gte(parse_time(start)?));
        }
        if let Some(end) = non_empty(&self.create_time_end) {
            cond = cond.add(approval_form::Column::CreatedAt.lte(parse_time(end)?));
        }
        if let Some(start) = non_empty(&self.approval_time_start) {
            cond = cond.add(approval_form::Column::ApprovalAt.gte(parse_time(start)?));
        }
        if let Some(end) = non_empty(&self.approval_time_end) {
            cond = cond.add(approval_form::Column::ApprovalAt.lte(parse_time(end)?));
        }

        Ok(cond)
    }
}

/// Parse a filter timestamp: RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`
///
/// Timestamps without an offset are taken as UTC; bare dates mean midnight.
pub fn parse_time(value: &str) -> AppResult<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(value) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(t.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc());
    }
    Err(AppError::BadRequest(format!("Invalid time: {}", value)))
}

/// Parse an execute date, accepting a bare date or a full timestamp
pub fn parse_execute_date(value: &str) -> AppResult<NaiveDate> {
    let value = value.trim();
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(d);
    }
    parse_time(value)
        .map(|t| t.date_naive())
        .map_err(|_| AppError::BadRequest(format!("Invalid executeDate: {}", value)))
}

/// Approval list item
#[derive(Debug, Serialize)]
pub struct ApprovalItem {
    pub id: i64,
    pub project_name: String,
    pub content: String,
    pub status: String,
    pub execute_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub approval_at: Option<DateTime<Utc>>,
    pub department_id: i64,
    pub department_name: String,
    pub department_path: String,
    pub applicant_id: i64,
    pub applicant_name: String,
    pub current_approver_id: Option<i64>,
    pub current_approver_name: Option<String>,
}

/// Lookup tables used to decorate forms
#[derive(Debug, Default)]
pub struct Decorations {
    pub department_names: HashMap<i64, String>,
    pub department_paths: HashMap<i64, String>,
    pub user_names: HashMap<i64, String>,
}

impl Decorations {
    pub fn from_rows(departments: &[department::Model], users: Vec<user::Model>) -> Self {
        Self {
            department_names: departments.iter().map(|d| (d.id, d.name.clone())).collect(),
            department_paths: resolve_path_index(departments),
            user_names: users.into_iter().map(|u| (u.id, u.display_name)).collect(),
        }
    }

    pub fn item(&self, form: approval_form::Model) -> ApprovalItem {
        let user_name = |id: i64| self.user_names.get(&id).cloned();

        ApprovalItem {
            department_name: self
                .department_names
                .get(&form.department_id)
                .cloned()
                .unwrap_or_default(),
            department_path: self
                .department_paths
                .get(&form.department_id)
                .cloned()
                .unwrap_or_default(),
            applicant_name: user_name(form.applicant_id).unwrap_or_default(),
            current_approver_name: form.current_approver_id.and_then(user_name),
            id: form.id,
            project_name: form.project_name,
            content: form.content,
            status: form.status,
            execute_date: form.execute_date,
            created_at: form.created_at,
            approval_at: form.approval_at,
            department_id: form.department_id,
            applicant_id: form.applicant_id,
            current_approver_id: form.current_approver_id,
        }
    }
}

/// Load department paths and the names of the given users
async fn load_decorations<C: ConnectionTrait>(db: &C, user_ids: Vec<i64>) -> AppResult<Decorations> {
    let departments = department::Entity::find().all(db).await?;

    let users = if user_ids.is_empty() {
        Vec::new()
    } else {
        user::Entity::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(db)
            .await?
    };

    Ok(Decorations::from_rows(&departments, users))
}

#[derive(Debug, Serialize)]
pub struct ApprovalPage {
    pub list: Vec<ApprovalItem>,
    pub total: u64,
    pub page: u64,
    #[serde(rename = "pageSize")]
    pub page_size: u64,
}

/// GET /api/approvals
pub async fn list_approvals(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<ApprovalPage>>> {
    let role = user.role();
    let cond = query.condition(role)?;
    let (page, page_size) = query.pagination();

    tracing::debug!("Listing approvals for user {} as {:?}", user.id, role);

    let total = approval_form::Entity::find()
        .filter(cond.clone())
        .count(&*db)
        .await?;

    let forms = approval_form::Entity::find()
        .filter(cond)
        .order_by_desc(approval_form::Column::CreatedAt)
        .offset((page - 1) * page_size)
        .limit(page_size)
        .all(&*db)
        .await?;

    let user_ids = forms
        .iter()
        .flat_map(|f| std::iter::once(f.applicant_id).chain(f.current_approver_id))
        .collect();
    let decorations = load_decorations(&*db, user_ids).await?;

    let list = forms.into_iter().map(|f| decorations.item(f)).collect();

    Ok(Json(ApiResponse::success(
        "Query succeeded",
        ApprovalPage {
            list,
            total,
            page,
            page_size,
        },
    )))
}

/// Flow log entry with operator name
#[derive(Debug, Serialize)]
pub struct LogItem {
    #[serde(flatten)]
    pub log: approval_log::Model,
    pub operator_name: String,
}

#[derive(Debug, Serialize)]
pub struct ApprovalDetail {
    #[serde(flatten)]
    pub form: ApprovalItem,
    pub logs: Vec<LogItem>,
    pub attachments: Vec<approval_attachment::Model>,
}

/// Find a form that has not been withdrawn/deleted
async fn find_active_form<C: ConnectionTrait>(db: &C, id: i64) -> AppResult<approval_form::Model> {
    approval_form::Entity::find_by_id(id)
        .filter(approval_form::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or_not_found(format!("Approval {} not found", id))
}

/// GET /api/approvals/:id
pub async fn get_approval(
    Extension(db): Extension<DbConn>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<ApprovalDetail>>> {
    let form = find_active_form(&*db, id).await?;

    let logs = approval_log::Entity::find()
        .filter(approval_log::Column::FormId.eq(id))
        .order_by_asc(approval_log::Column::ActionTime)
        .order_by_asc(approval_log::Column::Id)
        .all(&*db)
        .await?;

    let attachments = approval_attachment::Entity::find()
        .filter(approval_attachment::Column::FormId.eq(id))
        .order_by_asc(approval_attachment::Column::Id)
        .all(&*db)
        .await?;

    let mut user_ids: Vec<i64> = logs.iter().map(|l| l.operator_id).collect();
    user_ids.push(form.applicant_id);
    user_ids.extend(form.current_approver_id);
    user_ids.sort_unstable();
    user_ids.dedup();

    let decorations = load_decorations(&*db, user_ids).await?;

    let logs = logs
        .into_iter()
        .map(|log| LogItem {
            operator_name: decorations
                .user_names
                .get(&log.operator_id)
                .cloned()
                .unwrap_or_default(),
            log,
        })
        .collect();

    Ok(Json(ApiResponse::success(
        "Detail loaded",
        ApprovalDetail {
            form: decorations.item(form),
            logs,
            attachments,
        },
    )))
}

/// Create / update approval request body
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ApprovalRequest {
    #[serde(rename = "projectName")]
    pub project_name: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "departmentId")]
    pub department_id: Option<i64>,
    #[serde(rename = "executeDate")]
    pub execute_date: Option<String>,
    #[serde(rename = "attachmentIds", default)]
    pub attachment_ids: Vec<i64>,
}

/// A validated new approval form
#[derive(Debug, Clone, PartialEq)]
pub struct NewApproval {
    pub project_name: String,
    pub content: String,
    pub department_id: i64,
    pub execute_date: NaiveDate,
    pub attachment_ids: Vec<i64>,
}

impl ApprovalRequest {
    pub fn validate(self) -> AppResult<NewApproval> {
        let missing = || AppError::BadRequest("Missing required form fields".to_string());

        let project_name = self.project_name.filter(|s| !s.trim().is_empty()).ok_or_else(missing)?;
        let content = self.content.filter(|s| !s.trim().is_empty()).ok_or_else(missing)?;
        let department_id = self.department_id.filter(|&id| id != 0).ok_or_else(missing)?;
        let execute_date = self
            .execute_date
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(missing)?;

        Ok(NewApproval {
            project_name,
            content,
            department_id,
            execute_date: parse_execute_date(&execute_date)?,
            attachment_ids: self.attachment_ids,
        })
    }
}

/// Insert a pending form, its CREATE log entry and link its attachments
async fn insert_approval<C: ConnectionTrait>(
    db: &C,
    new: NewApproval,
    applicant_id: i64,
    approver_id: i64,
) -> AppResult<i64> {
    let now = Utc::now();

    let form = approval_form::ActiveModel {
        project_name: Set(new.project_name),
        content: Set(new.content),
        department_id: Set(new.department_id),
        execute_date: Set(new.execute_date),
        applicant_id: Set(applicant_id),
        current_approver_id: Set(Some(approver_id)),
        status: Set(ApprovalStatus::Pending.code().to_string()),
        is_deleted: Set(false),
        created_at: Set(now),
        approval_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    NewLog::new(form.id, applicant_id, LogAction::Create)
        .with_comment("Approval created")
        .into_active_model(now)
        .insert(db)
        .await?;

    if !new.attachment_ids.is_empty() {
        // Only the applicant's own, still unlinked uploads are claimed
        let linked = approval_attachment::Entity::update_many()
            .col_expr(approval_attachment::Column::FormId, Expr::value(form.id))
            .filter(approval_attachment::Column::Id.is_in(new.attachment_ids))
            .filter(approval_attachment::Column::UploaderId.eq(applicant_id))
            .filter(approval_attachment::Column::FormId.is_null())
            .exec(db)
            .await?;
        tracing::debug!("Linked {} attachments to approval {}", linked.rows_affected, form.id);
    }

    Ok(form.id)
}

#[derive(Debug, Serialize)]
pub struct IdData {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct IdsData {
    pub ids: Vec<i64>,
}

/// POST /api/approvals
pub async fn create_approval(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<ApprovalRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<IdData>>)> {
    let new = req.validate()?;

    let txn = db.begin().await?;
    let id = insert_approval(&txn, new, user.id, state.config.approval.default_approver_id).await?;
    txn.commit().await?;

    tracing::info!("Approval {} created by user {}", id, user.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Approval created", IdData { id })),
    ))
}

/// POST /api/approvals/batch
///
/// All forms are validated first and inserted in one transaction.
pub async fn batch_create_approvals(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Json(reqs): Json<Vec<ApprovalRequest>>,
) -> AppResult<(StatusCode, Json<ApiResponse<IdsData>>)> {
    if reqs.is_empty() {
        return Err(AppError::BadRequest("No approvals provided".to_string()));
    }

    let forms = reqs
        .into_iter()
        .enumerate()
        .map(|(i, req)| {
            req.validate().map_err(|e| match e {
                AppError::BadRequest(msg) => AppError::BadRequest(format!("Item {}: {}", i, msg)),
                other => other,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let approver_id = state.config.approval.default_approver_id;
    let txn = db.begin().await?;
    let mut ids = Vec::with_capacity(forms.len());
    for new in forms {
        ids.push(insert_approval(&txn, new, user.id, approver_id).await?);
    }
    txn.commit().await?;

    tracing::info!("{} approvals created by user {}", ids.len(), user.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Approvals created", IdsData { ids })),
    ))
}

/// Ensure the acting user may amend (edit / withdraw) the form
fn check_amendable(form: &approval_form::Model, user: &CurrentUser) -> AppResult<()> {
    if form.applicant_id != user.id {
        return Err(AppError::Forbidden(
            "Only the applicant may modify this approval".to_string(),
        ));
    }
    if !form.status().is_amendable() {
        return Err(AppError::Conflict(format!(
            "Approval {} is {:?} and can no longer be modified",
            form.id,
            form.status()
        )));
    }
    Ok(())
}

/// PUT /api/approvals/:id
///
/// Only provided fields change. Editing a rejected form resubmits it.
pub async fn update_approval(
    State(state): State<AppState>,
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(req): Json<ApprovalRequest>,
) -> AppResult<Json<ApiResponse<IdData>>> {
    let txn = db.begin().await?;

    let form = find_active_form(&txn, id).await?;
    check_amendable(&form, &user)?;

    let resubmit = form.status() == ApprovalStatus::Rejected;
    let mut active: approval_form::ActiveModel = form.into();

    if let Some(name) = req.project_name.filter(|s| !s.trim().is_empty()) {
        active.project_name = Set(name);
    }
    if let Some(content) = req.content.filter(|s| !s.trim().is_empty()) {
        active.content = Set(content);
    }
    if let Some(dept) = req.department_id.filter(|&d| d != 0) {
        active.department_id = Set(dept);
    }
    if let Some(date) = req.execute_date.filter(|s| !s.trim().is_empty()) {
        active.execute_date = Set(parse_execute_date(&date)?);
    }
    if resubmit {
        active.status = Set(ApprovalStatus::Pending.code().to_string());
        active.current_approver_id = Set(Some(state.config.approval.default_approver_id));
        active.approval_at = Set(None);
    }
    active.update(&txn).await?;

    NewLog::new(id, user.id, LogAction::Update)
        .with_comment(if resubmit { "Approval resubmitted" } else { "Approval modified" })
        .into_active_model(Utc::now())
        .insert(&txn)
        .await?;

    txn.commit().await?;

    Ok(Json(ApiResponse::success("Approval updated", IdData { id })))
}

/// POST /api/approvals/:id/withdraw
pub async fn withdraw_approval(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<IdData>>> {
    let txn = db.begin().await?;

    let form = find_active_form(&txn, id).await?;
    check_amendable(&form, &user)?;

    let mut active: approval_form::ActiveModel = form.into();
    active.status = Set(ApprovalStatus::Withdrawn.code().to_string());
    active.is_deleted = Set(true);
    active.current_approver_id = Set(None);
    active.update(&txn).await?;

    NewLog::new(id, user.id, LogAction::Withdraw)
        .with_comment("Applicant withdrew the approval")
        .into_active_model(Utc::now())
        .insert(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!("Approval {} withdrawn by user {}", id, user.id);
    Ok(Json(ApiResponse::success("Approval withdrawn", IdData { id })))
}

/// Approve / reject request body
#[derive(Debug, Default, Deserialize)]
pub struct ReviewRequest {
    pub comment: Option<String>,
    pub role: Option<String>,
}

/// Approver decision
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn status(self) -> ApprovalStatus {
        match self {
            Decision::Approve => ApprovalStatus::Approved,
            Decision::Reject => ApprovalStatus::Rejected,
        }
    }

    fn action(self) -> LogAction {
        match self {
            Decision::Approve => LogAction::Approve,
            Decision::Reject => LogAction::Reject,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }

    fn default_comment(self) -> &'static str {
        match self {
            Decision::Approve => "Approved",
            Decision::Reject => "Rejected",
        }
    }
}

async fn review(
    db: DbConn,
    user: CurrentUser,
    id: i64,
    body: ReviewRequest,
    decision: Decision,
) -> AppResult<Json<ApiResponse<IdData>>> {
    if user.role_or(body.role.as_deref()) != Role::Approver {
        return Err(AppError::Forbidden(format!(
            "Only approvers may {} approvals",
            decision.verb()
        )));
    }

    let txn = db.begin().await?;

    let form = find_active_form(&txn, id).await?;
    if !form.status().is_reviewable() {
        return Err(AppError::Conflict(format!(
            "Approval {} is {:?}, not pending",
            id,
            form.status()
        )));
    }

    let now = Utc::now();
    let mut active: approval_form::ActiveModel = form.into();
    active.status = Set(decision.status().code().to_string());
    active.approval_at = Set(Some(now));
    active.current_approver_id = Set(None);
    active.update(&txn).await?;

    let comment = body
        .comment
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| decision.default_comment().to_string());

    NewLog::new(id, user.id, decision.action())
        .with_comment(comment)
        .into_active_model(now)
        .insert(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!("Approval {} {:?} by user {}", id, decision.status(), user.id);
    Ok(Json(ApiResponse::success(
        format!("Approval {}", decision.default_comment().to_lowercase()),
        IdData { id },
    )))
}

/// POST /api/approvals/:id/approve
pub async fn approve_approval(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    body: Option<Json<ReviewRequest>>,
) -> AppResult<Json<ApiResponse<IdData>>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    review(db, user, id, body, Decision::Approve).await
}

/// POST /api/approvals/:id/reject
pub async fn reject_approval(
    Extension(db): Extension<DbConn>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
    body: Option<Json<ReviewRequest>>,
) -> AppResult<Json<ApiResponse<IdData>>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    review(db, user, id, body, Decision::Reject).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    fn request() -> ApprovalRequest {
        ApprovalRequest {
            project_name: Some("Lab refit".to_string()),
            content: Some("New benches".to_string()),
            department_id: Some(3),
            execute_date: Some("2025-03-01".to_string()),
            attachment_ids: vec![7, 8],
        }
    }

    fn form(status: ApprovalStatus, applicant_id: i64) -> approval_form::Model {
        approval_form::Model {
            id: 1,
            project_name: "Lab refit".to_string(),
            content: "New benches".to_string(),
            department_id: 3,
            execute_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            applicant_id,
            current_approver_id: Some(102),
            status: status.code().to_string(),
            is_deleted: false,
            created_at: Utc::now(),
            approval_at: None,
        }
    }

    #[test]
    fn test_validate_ok() {
        let new = request().validate().unwrap();
        assert_eq!(new.department_id, 3);
        assert_eq!(new.execute_date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(new.attachment_ids, vec![7, 8]);
    }

    #[test]
    fn test_validate_missing_fields() {
        for req in [
            ApprovalRequest { project_name: None, ..request() },
            ApprovalRequest { content: Some("  ".to_string()), ..request() },
            ApprovalRequest { department_id: None, ..request() },
            ApprovalRequest { execute_date: None, ..request() },
        ] {
            assert!(matches!(req.validate(), Err(AppError::BadRequest(_))));
        }
    }

    #[test]
    fn test_parse_execute_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        assert_eq!(parse_execute_date("2025-03-01").unwrap(), expected);
        assert_eq!(parse_execute_date("2025-03-01T08:30:00Z").unwrap(), expected);
        assert_eq!(parse_execute_date("2025-03-01 08:30:00").unwrap(), expected);
        assert!(parse_execute_date("March first").is_err());
    }

    #[test]
    fn test_pagination_clamped() {
        assert_eq!(ListQuery::default().pagination(), (1, 10));

        let query = ListQuery {
            page: Some(0),
            page_size: Some(1000),
            ..Default::default()
        };
        assert_eq!(query.pagination(), (1, 100));
    }

    #[test]
    fn test_condition_filters() {
        let query = ListQuery {
            status: Some("2".to_string()),
            project_name: Some("refit".to_string()),
            department_id: Some("3".to_string()),
            create_time_start: Some("2025-01-01".to_string()),
            approval_time_end: Some(String::new()),
            ..Default::default()
        };
        let cond = query.condition(Role::Applicant).unwrap();
        let sql = approval_form::Entity::find()
            .filter(cond)
            .build(DbBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""is_deleted" = FALSE"#));
        assert!(sql.contains(r#""status" = '2'"#));
        assert!(sql.contains(r#""project_name" LIKE '%refit%'"#));
        assert!(sql.contains(r#""department_id" = 3"#));
        assert!(sql.contains(r#""created_at" >="#));
        assert!(!sql.contains(r#""approval_at" <="#));
    }

    #[test]
    fn test_condition_approver_sees_pending() {
        let cond = ListQuery::default().condition(Role::Approver).unwrap();
        let sql = approval_form::Entity::find()
            .filter(cond)
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains(r#""status" = '0'"#));
    }

    #[test]
    fn test_condition_rejects_bad_input() {
        let query = ListQuery {
            department_id: Some("abc".to_string()),
            ..Default::default()
        };
        assert!(query.condition(Role::Applicant).is_err());

        let query = ListQuery {
            create_time_end: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert!(query.condition(Role::Applicant).is_err());
    }

    #[test]
    fn test_check_amendable() {
        let applicant = CurrentUser { id: 101, role: None };
        let stranger = CurrentUser { id: 999, role: None };

        assert!(check_amendable(&form(ApprovalStatus::Pending, 101), &applicant).is_ok());
        assert!(check_amendable(&form(ApprovalStatus::Rejected, 101), &applicant).is_ok());
        assert!(matches!(
            check_amendable(&form(ApprovalStatus::Pending, 101), &stranger),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            check_amendable(&form(ApprovalStatus::Approved, 101), &applicant),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_decorations_item() {
        let departments = vec![
            department::Model {
                id: 1,
                parent_id: None,
                name: "Eng".to_string(),
                level: 1,
                is_active: true,
                created_at: Utc::now(),
            },
            department::Model {
                id: 3,
                parent_id: Some(1),
                name: "Backend".to_string(),
                level: 2,
                is_active: true,
                created_at: Utc::now(),
            },
        ];
        let users = vec![user::Model {
            id: 101,
            username: "zhangsan".to_string(),
            display_name: "Zhang San".to_string(),
            department_id: Some(3),
            created_at: Utc::now(),
        }];

        let decorations = Decorations::from_rows(&departments, users);
        let item = decorations.item(form(ApprovalStatus::Pending, 101));

        assert_eq!(item.department_name, "Backend");
        assert_eq!(item.department_path, "Eng/Backend");
        assert_eq!(item.applicant_name, "Zhang San");
        assert_eq!(item.current_approver_name, None);

        let mut orphan = form(ApprovalStatus::Pending, 101);
        orphan.department_id = 99;
        assert_eq!(decorations.item(orphan).department_path, "");
    }
}
