//! Call Handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::CreateCallRequest;
use crate::domain::{Call, CallWithTranscript, Page, PageQuery};
use crate::presentation::http::extractors::ValidatedJson;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Calls returned per page when no limit is given
pub const DEFAULT_HISTORY_PAGE: i64 = 50;

/// Start a call
pub async fn create_call(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(body): ValidatedJson<CreateCallRequest>,
) -> Result<(StatusCode, Json<Call>), AppError> {
    let call = state.calls.create_call(auth.user_id, body.participants).await?;

    tracing::info!(
        call_id = %call.id,
        user_id = %auth.user_id,
        participants = call.participants.len(),
        "Call created"
    );

    Ok((StatusCode::CREATED, Json(call)))
}

/// Calls the caller took part in
pub async fn call_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<CallWithTranscript>>, AppError> {
    let page = Page::resolve(query, DEFAULT_HISTORY_PAGE);
    let calls = state.calls.history(auth.user_id, page).await?;
    Ok(Json(calls))
}
