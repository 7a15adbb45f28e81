use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::{info, instrument};
use validator::Validate;

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::mail::EmailMessage;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SendEmailRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[validate(length(min = 1, max = 998))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub text: String,
}

/// Send a plain-text email to the caller's own address
#[instrument(skip_all)]
pub async fn send_email(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SendEmailRequest>,
) -> Result<StatusCode, ApiError> {
    let claims = state.authenticate(request.token.as_deref())?;
    request.validate()?;

    let mailer = state.mailer.as_ref().ok_or(ApiError::MailUnavailable)?;
    mailer
        .send(EmailMessage::new(claims.email.clone(), request.subject, request.text))
        .await?;

    info!("Sent email to account {}", claims.account_id());
    Ok(StatusCode::OK)
}
