use crate::config::ServerConfig;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use trestle_core::errors::StoreError;
use trestle_core::model::{AssessmentStatus, FormData, FormType};
use trestle_core::storage::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
}

/// Submission body: metadata fields plus whatever the page sends. The
/// flattened remainder rides through opaque as the page's field data.
#[derive(Debug, Deserialize)]
struct SubmitBody {
    assessment_id: Option<String>,
    form_type: Option<String>,
    action_type: Option<String>,
    #[serde(flatten)]
    data: FormData,
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    status: &'static str,
    assessment_id: String,
    submission_id: String,
}

#[derive(Debug, Serialize)]
struct FinalizeResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    ok: bool,
}

#[derive(Debug, Serialize)]
struct FormEntry {
    action_type: String,
    data: FormData,
    updated_at: String,
}

#[derive(Debug, Serialize)]
struct FetchResponse {
    assessment_id: String,
    status: AssessmentStatus,
    created_at: String,
    updated_at: String,
    forms: std::collections::BTreeMap<String, FormEntry>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub fn router(store: Store, cfg: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/forms", post(submit_form))
        .route(
            "/api/assessments/{assessment_id}/finalize",
            post(finalize_assessment),
        )
        .route("/api/assessments/{assessment_id}", get(fetch_assessment))
        .layer(DefaultBodyLimit::max(cfg.max_body_bytes))
        .with_state(AppState { store })
}

pub async fn run(cfg: ServerConfig, store: Store) -> anyhow::Result<()> {
    let app = router(store, &cfg);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!(event = "listening", addr = %cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

async fn submit_form(State(state): State<AppState>, Json(body): Json<SubmitBody>) -> Response {
    let Some(form_type) = body.form_type.as_deref().and_then(FormType::parse) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "form_type is required and must be one of form1, form2, form3",
        );
    };

    let Some(action_type) = body.action_type else {
        return error_response(StatusCode::BAD_REQUEST, "action_type is required");
    };

    match state.store.upsert_submission(
        body.assessment_id.as_deref(),
        form_type,
        &action_type,
        &body.data,
    ) {
        Ok(outcome) => {
            tracing::info!(
                event = "form_saved",
                assessment_id = %outcome.assessment_id,
                form_type = form_type.as_str(),
                action_type = %action_type,
                submission_id = outcome.submission_id,
            );
            (
                StatusCode::OK,
                Json(SubmitResponse {
                    status: "success",
                    assessment_id: outcome.assessment_id,
                    submission_id: outcome.submission_id.to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => store_error_response("form_save_failed", e),
    }
}

async fn finalize_assessment(
    State(state): State<AppState>,
    Path(assessment_id): Path<String>,
) -> Response {
    match state.store.finalize(&assessment_id) {
        Ok(()) => {
            tracing::info!(event = "assessment_finalized", assessment_id = %assessment_id);
            (StatusCode::OK, Json(FinalizeResponse { status: "success" })).into_response()
        }
        Err(e) => store_error_response("finalize_failed", e),
    }
}

async fn fetch_assessment(
    State(state): State<AppState>,
    Path(assessment_id): Path<String>,
) -> Response {
    match state.store.fetch_assessment(&assessment_id) {
        Ok(Some((assessment, submissions))) => {
            let forms = submissions
                .into_iter()
                .map(|s| {
                    (
                        s.form_type.as_str().to_string(),
                        FormEntry {
                            action_type: s.action_type,
                            data: s.data,
                            updated_at: s.updated_at,
                        },
                    )
                })
                .collect();
            (
                StatusCode::OK,
                Json(FetchResponse {
                    assessment_id: assessment.assessment_id,
                    status: assessment.status,
                    created_at: assessment.created_at,
                    updated_at: assessment.updated_at,
                    forms,
                }),
            )
                .into_response()
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, "assessment not found"),
        Err(e) => store_error_response("fetch_failed", e),
    }
}

fn store_error_response(event: &'static str, e: StoreError) -> Response {
    let status = match &e {
        StoreError::Invalid(_) => StatusCode::BAD_REQUEST,
        StoreError::NotFound => StatusCode::NOT_FOUND,
        StoreError::Storage(_) | StoreError::Serde(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(event = event, error = %e, "storage failure");
        // Internal detail stays out of the wire shape
        return error_response(status, "internal server error");
    }
    tracing::warn!(event = event, error = %e);
    error_response(status, &e.to_string())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}
