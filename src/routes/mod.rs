use axum::{
    extract::DefaultBodyLimit,
    http::{Method, StatusCode, Uri},
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::handlers;
use crate::middleware::identity_layer;
use crate::state::AppState;

pub mod health;

/// Room for multipart boundaries and headers on top of the file size limit
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            code: 200,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn success_msg(message: impl Into<String>) -> Self {
        Self {
            code: 200,
            message: message.into(),
            data: None,
        }
    }
}

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // User routes
        .route("/users", get(handlers::user::list_users))
        // Department routes
        .route("/departments", get(handlers::department::get_departments))
        .route("/departments/:id", get(handlers::department::get_department))
        // Approval routes (/batch must be registered alongside /:id)
        .route(
            "/approvals",
            get(handlers::approval::list_approvals).post(handlers::approval::create_approval),
        )
        .route("/approvals/batch", post(handlers::approval::batch_create_approvals))
        .route(
            "/approvals/:id",
            get(handlers::approval::get_approval).put(handlers::approval::update_approval),
        )
        .route("/approvals/:id/withdraw", post(handlers::approval::withdraw_approval))
        .route("/approvals/:id/approve", post(handlers::approval::approve_approval))
        .route("/approvals/:id/reject", post(handlers::approval::reject_approval))
        // Attachment routes
        .route(
            "/attachments/upload",
            post(handlers::attachment::upload_attachment)
                .layer(DefaultBodyLimit::max(state.config.max_upload_size + MULTIPART_OVERHEAD)),
        )
        .route("/attachments/delete", post(handlers::attachment::delete_attachment))
        // Form schema routes
        .route("/form/schema", get(handlers::form_schema::get_form_schema));

    // Uploaded files are served as-is
    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .nest("/api", api_routes)
        .nest_service("/upload", uploads)
        .fallback(fallback)
        .layer(middleware::from_fn_with_state(state.clone(), identity_layer))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Fallback handler for 404
#[derive(Serialize)]
pub struct NotFoundBody {
    pub code: u16,
    pub error: &'static str,
    pub message: String,
}

pub async fn fallback(method: Method, uri: Uri) -> (StatusCode, Json<NotFoundBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundBody {
            code: 404,
            error: "Not Found",
            message: format!("Resource not found: {} {}", method, uri),
        }),
    )
}
