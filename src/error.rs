use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    dto::ErrorResponse, gateway::GatewayError, handlers::MAX_INPUT_LENGTH, mailer::MailError,
};

/// Every way a request can fail, as seen by the client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("request body is empty")]
    MissingData,

    #[error("draft is {0} characters long")]
    InputTooLong(usize),

    #[error("no recipient given")]
    MissingRecipient,

    #[error("recipient '{0}' is not a valid address")]
    InvalidRecipient(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Mail(#[from] MailError),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidJson(_)
            | Self::MissingData
            | Self::MissingRecipient
            | Self::InvalidRecipient(_) => StatusCode::BAD_REQUEST,
            Self::InputTooLong(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Gateway(_) | Self::Mail(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The text shown to the client. Upstream detail never appears here.
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidJson(_) => "Invalid JSON format or malformed request.".to_string(),
            Self::MissingData => "Missing JSON data in request.".to_string(),
            Self::InputTooLong(_) => {
                format!("Input too long. Max length is {MAX_INPUT_LENGTH} characters.")
            }
            Self::MissingRecipient => "Recipient address is required.".to_string(),
            Self::InvalidRecipient(_) => "Invalid recipient address.".to_string(),
            Self::Gateway(GatewayError::ModelUnavailable) => {
                "AI service not available. Check API Key.".to_string()
            }
            Self::Gateway(GatewayError::ResponseFormat { .. }) => {
                "AI response format error.".to_string()
            }
            Self::Gateway(_) => "Failed to process email with AI.".to_string(),
            Self::Mail(MailError::ConfigurationMissing) => {
                "Email configuration missing in environment variables.".to_string()
            }
            Self::Mail(MailError::Authentication(_)) => {
                "Authentication failed. Check credentials.".to_string()
            }
            Self::Mail(_) => "An error occurred while sending the email.".to_string(),
        }
    }

    fn log(&self) {
        match self {
            Self::Gateway(GatewayError::ResponseFormat { reason, raw }) => {
                tracing::error!(
                    "AI returned invalid JSON ({reason}). Raw output received:\n{raw}"
                );
            }
            Self::Gateway(e) => tracing::error!("Error calling AI API: {e}"),
            Self::Mail(MailError::Authentication(e)) => tracing::error!(
                "Failed to log in to SMTP server, check SENDER_EMAIL/SENDER_PASSWORD: {e}"
            ),
            Self::Mail(e) => tracing::error!("Error sending email: {e}"),
            other => tracing::warn!("Rejected request: {other}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        let body = ErrorResponse {
            error: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(
            ApiError::InvalidJson(String::new()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::MissingRecipient.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::InputTooLong(5001).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn upstream_detail_is_not_exposed() {
        let err = ApiError::from(GatewayError::UpstreamCall("quota exceeded for key abc".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Failed to process email with AI.");

        let err = ApiError::from(MailError::Delivery("connection reset by 10.0.0.4".into()));
        assert!(!err.public_message().contains("10.0.0.4"));
    }

    #[test]
    fn authentication_has_its_own_message() {
        let auth = ApiError::from(MailError::Authentication("535".into())).public_message();
        let delivery = ApiError::from(MailError::Delivery("timeout".into())).public_message();
        assert_ne!(auth, delivery);
        assert!(auth.contains("Authentication failed"));
    }

    #[test]
    fn too_long_message_names_the_limit() {
        assert_eq!(
            ApiError::InputTooLong(9000).public_message(),
            "Input too long. Max length is 5000 characters."
        );
    }
}
