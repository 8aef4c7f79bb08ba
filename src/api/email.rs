use axum::{
    extract::{multipart::Field, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};

use crate::error::{AppError, Result};
use crate::mail::Attachment;
use crate::models::SendResponse;
use crate::send::{self, SendForm};
use crate::state::AppState;

/// Headroom for the text fields and multipart framing around the attachment
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Email routes
pub fn email_routes(max_attachment_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/send", post(send_email))
        .layer(DefaultBodyLimit::max(
            max_attachment_bytes.saturating_add(FORM_OVERHEAD_BYTES),
        ))
}

/// POST /api/email/send - Send one message per recipient
async fn send_email(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SendResponse>)> {
    let form = read_form(multipart, state.config.max_attachment_bytes).await?;

    let request = form
        .validate(state.config.sender_display_name.as_deref())
        .inspect_err(|e| tracing::warn!(error = %e, "Send request rejected"))?;

    tracing::info!(
        sender = %request.credentials.email,
        recipients = request.recipients.len(),
        attachment = request.attachment.is_some(),
        "Preparing bulk send"
    );

    let transport = state
        .transports
        .connect(&request.credentials)
        .inspect_err(|e| tracing::error!(error = %e, "Failed to create mail transport"))?;

    let outcomes = send::send_all(transport.as_ref(), &request).await;
    let (status, response) =
        send::summarize(&outcomes, &request.credentials.email, transport.host());

    tracing::info!(
        status = status.as_u16(),
        total = outcomes.len(),
        "Bulk send finished"
    );

    Ok((status, Json(response)))
}

async fn read_form(mut multipart: Multipart, max_attachment_bytes: usize) -> Result<SendForm> {
    let mut form = SendForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "attachment" => form.attachment = read_attachment(field, max_attachment_bytes).await?,
            "senderEmail" => form.sender_email = Some(field.text().await?),
            "senderPassword" => form.sender_password = Some(field.text().await?),
            "senderDisplayName" => form.sender_display_name = Some(field.text().await?),
            "recipients" => form.recipients = Some(field.text().await?),
            "subject" => form.subject = Some(field.text().await?),
            "body" => form.body = Some(field.text().await?),
            other => tracing::debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

/// Buffer the file part, aborting as soon as it passes the cap
async fn read_attachment(
    mut field: Field<'_>,
    max_attachment_bytes: usize,
) -> Result<Option<Attachment>> {
    let filename = field.file_name().unwrap_or_default().to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let mut content = Vec::new();
    while let Some(chunk) = field.chunk().await? {
        if content.len() + chunk.len() > max_attachment_bytes {
            return Err(AppError::PayloadTooLarge(max_attachment_bytes));
        }
        content.extend_from_slice(&chunk);
    }

    // Browsers submit an empty part when no file was chosen
    if filename.is_empty() && content.is_empty() {
        return Ok(None);
    }

    Ok(Some(Attachment {
        filename: if filename.is_empty() {
            "attachment".to_string()
        } else {
            filename
        },
        content,
        content_type,
    }))
}
