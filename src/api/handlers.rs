//! HTTP request handlers for the attendance payroll API.
//!
//! This module contains the router and the handler functions for all API
//! endpoints. Handlers parse the request, run the service call through
//! [`AppState`] and map engine errors to JSON error bodies.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{Assignment, PayrollOverrides, ReviewContext};

use super::request::{
    AssignmentRequest, DateRangeQuery, GenerateRequest, MaterializeRequest, ProofRequest,
    RemarkRequest, StageEditRequest, TimestampRequest,
};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Header carrying the acting reviewer's id.
pub const REVIEWER_HEADER: &str = "x-reviewer-id";
/// Header carrying the reviewer's session id.
pub const SESSION_HEADER: &str = "x-session-id";

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/assignments", post(register_assignment_handler))
        .route("/assignments/:id/attendance", get(list_attendance_handler))
        .route(
            "/assignments/:id/payrolls/:year/:month",
            get(find_payroll_handler),
        )
        .route("/attendance", post(materialize_handler))
        .route("/attendance/:id", get(get_attendance_handler))
        .route("/attendance/:id/check-in", post(check_in_handler))
        .route("/attendance/:id/check-out", post(check_out_handler))
        .route("/attendance/:id/proof", post(proof_handler))
        .route("/attendance/:id/auto-absent", post(auto_absent_handler))
        .route("/attendance/:id/approve", post(approve_handler))
        .route("/attendance/:id/reject", post(reject_handler))
        .route("/attendance/:id/half-day", post(half_day_handler))
        .route("/attendance/:id/reset", post(reset_handler))
        .route(
            "/attendance/:id/edits",
            get(pending_edits_handler)
                .post(stage_edit_handler)
                .delete(discard_edits_handler),
        )
        .route("/attendance/:id/edits/commit", post(commit_edits_handler))
        .route("/payrolls/generate", post(generate_payroll_handler))
        .route(
            "/payrolls/:id",
            get(get_payroll_handler).patch(edit_payroll_handler),
        )
        .route("/payrolls/:id/lock", post(lock_payroll_handler))
        .with_state(state)
}

// =============================================================================
// Assignments
// =============================================================================

async fn register_assignment_handler(
    State(state): State<AppState>,
    payload: Result<Json<AssignmentRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection(rejection),
    };
    let assignment: Assignment = request.into();
    let result = state
        .run("register_assignment", move |s| {
            s.attendance().register_assignment(assignment)
        })
        .await;
    respond(StatusCode::CREATED, result)
}

async fn list_attendance_handler(
    State(state): State<AppState>,
    Path(assignment_id): Path<Uuid>,
    query: Result<Query<DateRangeQuery>, QueryRejection>,
) -> Response {
    let range = match query {
        Ok(Query(range)) => range,
        Err(rejection) => {
            warn!(error = %rejection, "Query string error");
            return ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::validation_error(rejection.body_text()),
            )
            .into_response();
        }
    };
    let result = state
        .run("list_attendance", move |s| {
            s.attendance().list(assignment_id, range.from, range.to)
        })
        .await;
    respond(StatusCode::OK, result)
}

async fn find_payroll_handler(
    State(state): State<AppState>,
    Path((assignment_id, year, month)): Path<(Uuid, i32, u32)>,
) -> Response {
    let result = state
        .run("find_payroll", move |s| {
            s.payrolls()
                .find(assignment_id, year, month)?
                .ok_or_else(|| {
                    EngineError::not_found(
                        "monthly payroll",
                        format!("{}/{}-{:02}", assignment_id, year, month),
                    )
                })
        })
        .await;
    respond(StatusCode::OK, result)
}

// =============================================================================
// Attendance: worker and scheduler actions
// =============================================================================

async fn materialize_handler(
    State(state): State<AppState>,
    payload: Result<Json<MaterializeRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection(rejection),
    };
    let result = state
        .run("materialize", move |s| {
            s.attendance().materialize(request.assignment_id, request.date)
        })
        .await;
    respond(StatusCode::OK, result)
}

async fn get_attendance_handler(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
) -> Response {
    let result = state
        .run("get_attendance", move |s| s.attendance().get(record_id))
        .await;
    respond(StatusCode::OK, result)
}

async fn check_in_handler(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
    payload: Result<Json<TimestampRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection(rejection),
    };
    let result = state
        .run("check_in", move |s| s.attendance().check_in(record_id, request.at))
        .await;
    respond(StatusCode::OK, result)
}

async fn check_out_handler(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
    payload: Result<Json<TimestampRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection(rejection),
    };
    let result = state
        .run("check_out", move |s| s.attendance().check_out(record_id, request.at))
        .await;
    respond(StatusCode::OK, result)
}

async fn proof_handler(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
    payload: Result<Json<ProofRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection(rejection),
    };
    let result = state
        .run("submit_proof", move |s| {
            s.attendance()
                .submit_proof(record_id, request.proof_ref, request.metadata)
        })
        .await;
    respond(StatusCode::OK, result)
}

async fn auto_absent_handler(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
) -> Response {
    let result = state
        .run("auto_mark_absent", move |s| {
            s.attendance().auto_mark_absent(record_id)
        })
        .await;
    respond(StatusCode::OK, result)
}

// =============================================================================
// Attendance: reviewer transitions
// =============================================================================

async fn approve_handler(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
    headers: HeaderMap,
    payload: Result<Json<RemarkRequest>, JsonRejection>,
) -> Response {
    let (ctx, request) = match reviewer_request(&headers, payload) {
        Ok(parts) => parts,
        Err(response) => return response,
    };
    let result = state
        .run("approve", move |s| {
            s.review().approve(&ctx, record_id, request.remark)
        })
        .await;
    respond(StatusCode::OK, result)
}

async fn reject_handler(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
    headers: HeaderMap,
    payload: Result<Json<RemarkRequest>, JsonRejection>,
) -> Response {
    let (ctx, request) = match reviewer_request(&headers, payload) {
        Ok(parts) => parts,
        Err(response) => return response,
    };
    let result = state
        .run("reject", move |s| {
            s.review()
                .reject(&ctx, record_id, request.remark.unwrap_or_default())
        })
        .await;
    respond(StatusCode::OK, result)
}

async fn half_day_handler(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
    headers: HeaderMap,
    payload: Result<Json<RemarkRequest>, JsonRejection>,
) -> Response {
    let (ctx, request) = match reviewer_request(&headers, payload) {
        Ok(parts) => parts,
        Err(response) => return response,
    };
    let result = state
        .run("mark_half_day", move |s| {
            s.review().mark_half_day(&ctx, record_id, request.remark)
        })
        .await;
    respond(StatusCode::OK, result)
}

async fn reset_handler(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
    headers: HeaderMap,
    payload: Result<Json<RemarkRequest>, JsonRejection>,
) -> Response {
    let (ctx, request) = match reviewer_request(&headers, payload) {
        Ok(parts) => parts,
        Err(response) => return response,
    };
    let result = state
        .run("reset_to_review", move |s| {
            s.review().reset_to_review(&ctx, record_id, request.remark)
        })
        .await;
    respond(StatusCode::OK, result)
}

// =============================================================================
// Attendance: staged edits
// =============================================================================

async fn pending_edits_handler(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    let ctx = match review_context(&headers) {
        Ok(ctx) => ctx,
        Err(err) => return err.into_response(),
    };
    let result = state
        .run("pending_edits", move |s| s.review().pending(&ctx, record_id))
        .await;
    respond(StatusCode::OK, result)
}

async fn stage_edit_handler(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
    headers: HeaderMap,
    payload: Result<Json<StageEditRequest>, JsonRejection>,
) -> Response {
    let (ctx, request) = match reviewer_request(&headers, payload) {
        Ok(parts) => parts,
        Err(response) => return response,
    };
    let result = state
        .run("stage_edit", move |s| {
            s.review()
                .stage_edit(&ctx, record_id, request.field, request.value)
        })
        .await;
    respond(StatusCode::OK, result)
}

async fn discard_edits_handler(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    let ctx = match review_context(&headers) {
        Ok(ctx) => ctx,
        Err(err) => return err.into_response(),
    };
    let result = state
        .run("discard_edits", move |s| {
            let discarded = s.review().discard(&ctx, record_id)?;
            Ok(json!({ "record_id": record_id, "discarded": discarded }))
        })
        .await;
    respond(StatusCode::OK, result)
}

async fn commit_edits_handler(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    let ctx = match review_context(&headers) {
        Ok(ctx) => ctx,
        Err(err) => return err.into_response(),
    };
    let result = state
        .run("commit_edits", move |s| s.review().commit(&ctx, record_id))
        .await;
    respond(StatusCode::OK, result)
}

// =============================================================================
// Monthly payrolls
// =============================================================================

async fn generate_payroll_handler(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => return json_rejection(rejection),
    };
    let result = state
        .run("generate_payroll", move |s| {
            s.payrolls().generate(
                request.assignment_id,
                &request.worker_id,
                request.year,
                request.month,
            )
        })
        .await;
    respond(StatusCode::OK, result)
}

async fn get_payroll_handler(
    State(state): State<AppState>,
    Path(payroll_id): Path<Uuid>,
) -> Response {
    let result = state
        .run("get_payroll", move |s| s.payrolls().get(payroll_id))
        .await;
    respond(StatusCode::OK, result)
}

async fn edit_payroll_handler(
    State(state): State<AppState>,
    Path(payroll_id): Path<Uuid>,
    headers: HeaderMap,
    payload: Result<Json<PayrollOverrides>, JsonRejection>,
) -> Response {
    let (ctx, overrides) = match reviewer_request(&headers, payload) {
        Ok(parts) => parts,
        Err(response) => return response,
    };
    let result = state
        .run("edit_payroll", move |s| {
            s.payrolls().edit(&ctx, payroll_id, overrides)
        })
        .await;
    respond(StatusCode::OK, result)
}

async fn lock_payroll_handler(
    State(state): State<AppState>,
    Path(payroll_id): Path<Uuid>,
    headers: HeaderMap,
) -> Response {
    let ctx = match review_context(&headers) {
        Ok(ctx) => ctx,
        Err(err) => return err.into_response(),
    };
    let result = state
        .run("lock_payroll", move |s| s.payrolls().lock(&ctx, payroll_id))
        .await;
    respond(StatusCode::OK, result)
}

// =============================================================================
// Helpers
// =============================================================================

fn respond<T: Serialize>(status: StatusCode, result: EngineResult<T>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(err) => ApiErrorResponse::from(err).into_response(),
    }
}

/// Reads the reviewer context from the request headers.
fn review_context(headers: &HeaderMap) -> Result<ReviewContext, ApiErrorResponse> {
    let reviewer_id = header_value(headers, REVIEWER_HEADER)?;
    let session_id = header_value(headers, SESSION_HEADER)?;
    Ok(ReviewContext::new(reviewer_id, session_id))
}

fn header_value(headers: &HeaderMap, name: &str) -> Result<String, ApiErrorResponse> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| EngineError::validation(name, format!("header '{}' is required", name)).into())
}

fn reviewer_request<T>(
    headers: &HeaderMap,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<(ReviewContext, T), Response> {
    let ctx = review_context(headers).map_err(IntoResponse::into_response)?;
    match payload {
        Ok(Json(req)) => Ok((ctx, req)),
        Err(rejection) => Err(json_rejection(rejection)),
    }
}

/// Maps a JSON body rejection to a 400 response.
fn json_rejection(rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            // The body text carries serde's detailed error
            let body_text = err.body_text();
            warn!(error = %body_text, "JSON data error");
            if body_text.contains("missing field") || body_text.contains("unknown variant") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(error = %err, "JSON syntax error");
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => ApiError::malformed_json("Failed to parse request body"),
    };
    ApiErrorResponse::new(StatusCode::BAD_REQUEST, error).into_response()
}
