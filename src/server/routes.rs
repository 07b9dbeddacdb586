use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::agent::{AgentError, RATE_LIMIT_MESSAGE};
use crate::record::DermatologistRecord;
use crate::server::page::{self, PageView};
use crate::server::AppState;

#[derive(Deserialize)]
pub struct PageParams {
    pub q: Option<String>,
}

#[derive(Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub sql: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Per-request failures. None of these stop the server.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            ApiError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE.to_string()),
            ApiError::Upstream(detail) => (StatusCode::BAD_GATEWAY, detail),
            ApiError::Internal(detail) => {
                tracing::error!(%detail, "API internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, detail)
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::EmptyQuestion => ApiError::BadRequest(err.user_message()),
            e if e.is_rate_limited() => ApiError::RateLimited,
            AgentError::Database(e) => ApiError::Internal(e.to_string()),
            e => ApiError::Upstream(e.user_message()),
        }
    }
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Html<String> {
    let question = params.q.unwrap_or_default();

    let connection = state
        .agent
        .store()
        .lock()
        .await
        .count()
        .map_err(|e| e.to_string());

    let result = if question.trim().is_empty() {
        None
    } else {
        let result = state.agent.answer(&question).await;
        if let Err(e) = &result {
            tracing::warn!("Question failed: {}", e);
        }
        Some(result)
    };

    Html(page::render(&PageView {
        model: &state.model,
        question: &question,
        connection,
        result: result.as_ref(),
    }))
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let answer = state.agent.answer(&request.question).await.map_err(|e| {
        tracing::warn!("Question failed: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(AskResponse {
        answer: answer.text,
        sql: answer.sql,
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let records = state
        .agent
        .store()
        .lock()
        .await
        .count()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "records": records,
        "model": state.model,
        "database": state.database_path.display().to_string(),
    })))
}

pub async fn records(State(state): State<Arc<AppState>>) -> Result<Json<Vec<DermatologistRecord>>, ApiError> {
    let records = state
        .agent
        .store()
        .lock()
        .await
        .all_records()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(records))
}
