use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::FocusError;
use crate::models::{StudentId, StudentState};
use crate::service::FocusService;
use crate::store::FocusStore;

#[derive(Debug, Deserialize)]
pub struct CheckinRequest {
    #[serde(alias = "studentId")]
    pub student_id: StudentId,
    #[serde(alias = "quizScore")]
    pub quiz_score: i32,
    #[serde(alias = "focusMinutes")]
    pub focus_minutes: i32,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    #[serde(alias = "taskTitle")]
    pub task_title: String,
    #[serde(default, alias = "taskDescription")]
    pub task_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    #[serde(alias = "studentId")]
    pub student_id: StudentId,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: String,
    code: &'a str,
}

impl FocusError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NoLockedStudent | Self::InvalidState(_) | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::DanglingIntervention { .. } | Self::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for FocusError {
    fn into_response(self) -> Response {
        // Internal detail stays in the log.
        let error = if self.is_client_error() {
            self.to_string()
        } else {
            tracing::error!(error = %self, "request failed");
            "Server error".to_string()
        };
        let body = ErrorBody {
            error,
            code: self.code(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for FocusError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for FocusError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

type Shared<S> = State<Arc<FocusService<S>>>;
type ApiResult = Result<Json<StudentState>, FocusError>;

/// Browser access for the client surface. No origins means any origin.
pub fn cors_layer(origins: Vec<HeaderValue>) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn router<S: FocusStore + 'static>(service: Arc<FocusService<S>>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/student-state/:id", get(student_state::<S>))
        .route("/daily-checkin", post(daily_checkin::<S>))
        .route("/assign-intervention", post(assign_intervention::<S>))
        .route("/complete-intervention", post(complete_intervention::<S>))
        .with_state(service)
        .layer(cors)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn student_state<S: FocusStore>(
    State(service): Shared<S>,
    id: Result<Path<StudentId>, PathRejection>,
) -> ApiResult {
    let Path(id) = id?;
    Ok(Json(service.get_state(id).await?))
}

async fn daily_checkin<S: FocusStore>(
    State(service): Shared<S>,
    body: Result<Json<CheckinRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = body?;
    let state = service
        .submit_daily_checkin(request.student_id, request.quiz_score, request.focus_minutes)
        .await?;
    Ok(Json(state))
}

async fn assign_intervention<S: FocusStore>(
    State(service): Shared<S>,
    body: Result<Json<AssignRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = body?;
    tracing::info!(title = %request.task_title, "intervention request from dispatcher");
    let state = service
        .assign_intervention(&request.task_title, request.task_description.as_deref())
        .await?;
    Ok(Json(state))
}

async fn complete_intervention<S: FocusStore>(
    State(service): Shared<S>,
    body: Result<Json<CompleteRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = body?;
    Ok(Json(service.complete_intervention(request.student_id).await?))
}
