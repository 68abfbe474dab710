//! `POST /send-message`: relay a message into the review channel.
//!
//! The body is `multipart/form-data` with a `payload_json` text field
//! (`{"content": ..., "embeds": [...]}`) and an optional `file` part.

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Router, routing::post};
use tracing::{info, instrument};

use crate::discord::Attachment;
use crate::error::AppError;
use crate::services::RelayPayload;
use crate::state::AppState;

/// Largest accepted request body; matches Discord's upload ceiling.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Relay routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/send-message", post(send_message))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

/// Relay one message through the configured delivery strategy.
#[instrument(skip_all)]
async fn send_message(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut payload_json = None;
    let mut attachment = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("payload_json") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid payload_json: {e}")))?;
                payload_json = Some(text);
            }
            Some("file") => {
                let filename = field.file_name().unwrap_or("file").to_string();
                let content_type = field.content_type().map(str::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid file: {e}")))?;
                attachment = Some(Attachment {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let payload_json =
        payload_json.ok_or_else(|| AppError::BadRequest("Missing payload_json".to_string()))?;

    let payload: RelayPayload = serde_json::from_str(&payload_json)
        .map_err(|e| AppError::Internal(format!("Malformed payload_json: {e}")))?;

    let message = payload.into_message(attachment);
    let has_file = message.attachment.is_some();
    state.delivery().deliver(message).await?;

    info!(delivery = state.delivery().name(), has_file, "Message relayed");

    Ok((
        StatusCode::OK,
        format!("Message sent via {}", state.delivery().name()),
    ))
}
