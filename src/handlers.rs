use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_macros::debug_handler;
use lettre::message::Mailbox;
use serde_json::{Map, Value};

use std::sync::Arc;

use crate::{
    dto::{
        Draft, DraftRequest, HealthResponse, PolishedResult, SendEmailRequest, SendEmailResponse,
    },
    error::ApiError,
    mailer::{Mailer, OutgoingEmail},
    service::PolishService,
};

/// Upper bound on subject + body, in characters, for one polishing request.
pub const MAX_INPUT_LENGTH: usize = 5000;

#[derive(Clone)]
pub struct AppState {
    pub polisher: PolishService,
    pub mailer: Arc<dyn Mailer>,
}

#[debug_handler]
pub async fn analyze_email(
    State(state): State<AppState>,
    payload: Result<Json<Option<Map<String, Value>>>, JsonRejection>,
) -> Result<Json<PolishedResult>, ApiError> {
    let Json(fields) = payload.map_err(|e| ApiError::InvalidJson(e.body_text()))?;
    // Only `null` and `{}` count as missing; unknown keys fall through to defaults
    let fields = fields
        .filter(|f| !f.is_empty())
        .ok_or(ApiError::MissingData)?;
    let request: DraftRequest = serde_json::from_value(Value::Object(fields))
        .map_err(|e| ApiError::InvalidJson(e.to_string()))?;

    let draft = Draft::from(request);
    let length = draft.char_count();
    if length > MAX_INPUT_LENGTH {
        return Err(ApiError::InputTooLong(length));
    }

    let polished = state.polisher.polish(&draft).await?;
    Ok(Json(polished))
}

#[debug_handler]
pub async fn send_email(
    State(state): State<AppState>,
    payload: Result<Json<SendEmailRequest>, JsonRejection>,
) -> Result<Json<SendEmailResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidJson(e.body_text()))?;

    let to = request
        .to
        .map(|to| to.trim().to_string())
        .filter(|to| !to.is_empty())
        .ok_or(ApiError::MissingRecipient)?;
    let to: Mailbox = to.parse().map_err(|_| ApiError::InvalidRecipient(to))?;

    let email = OutgoingEmail {
        to,
        subject: request.subject.unwrap_or_default(),
        body: request.body.unwrap_or_default(),
    };
    state.mailer.send(email).await?;

    Ok(Json(SendEmailResponse {
        message: "Email sent successfully".to_string(),
    }))
}

#[debug_handler]
pub async fn health_check(State(state): State<AppState>) -> Response {
    let health = HealthResponse {
        status: "healthy".to_string(),
        ai_available: state.polisher.ai_available(),
    };
    (StatusCode::OK, Json(health)).into_response()
}
