//! Bulk send workflow: validate the form, deliver to each recipient in
//! order, then fold the per-recipient outcomes into one response.

pub mod request;

pub use request::{parse_recipients, SendForm, SendRequest};

use axum::http::StatusCode;

use crate::mail::{DeliveryFailure, MailTransport, OutboundMessage};
use crate::models::{FailedSend, SendDetails, SendResponse};

/// Raw transport errors are cut to this many characters for display
const MAX_ERROR_CHARS: usize = 300;

/// Result of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub recipient: String,
    pub result: Result<(), DeliveryFailure>,
}

/// Plain-text body to HTML line breaks
pub fn to_html(body: &str) -> String {
    body.replace('\n', "<br>")
}

pub fn build_message(request: &SendRequest, recipient: &str) -> OutboundMessage {
    OutboundMessage {
        from_address: request.credentials.email.clone(),
        display_name: request.display_name.clone(),
        to: recipient.to_string(),
        subject: request.subject.clone(),
        html_body: to_html(&request.body),
        attachment: request.attachment.clone(),
    }
}

/// Deliver to every recipient one at a time, in list order
pub async fn send_all(transport: &dyn MailTransport, request: &SendRequest) -> Vec<DeliveryOutcome> {
    let mut outcomes = Vec::with_capacity(request.recipients.len());

    for recipient in &request.recipients {
        tracing::info!(recipient = %recipient, subject = %request.subject, "Sending email");
        let message = build_message(request, recipient);
        let result = transport.deliver(&message).await;
        if let Err(failure) = &result {
            tracing::warn!(recipient = %recipient, error = %failure, "Delivery failed");
        }
        outcomes.push(DeliveryOutcome {
            recipient: recipient.clone(),
            result,
        });
    }

    outcomes
}

/// User-facing text for a failed delivery
pub fn describe_failure(failure: &DeliveryFailure, sender: &str, host: &str) -> String {
    match failure {
        DeliveryFailure::Authentication { response } => format!(
            "Authentication failed for sender {}. Please check credentials. (Server: {})",
            sender, response
        ),
        DeliveryFailure::Connection(_) => format!(
            "Could not connect to email server {}. Please check server settings and network.",
            host
        ),
        DeliveryFailure::Rejected(raw) => truncate(raw, MAX_ERROR_CHARS),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Three-way status decision over the ordered outcomes
pub fn summarize(outcomes: &[DeliveryOutcome], sender: &str, host: &str) -> (StatusCode, SendResponse) {
    let total = outcomes.len();
    let errors: Vec<FailedSend> = outcomes
        .iter()
        .filter_map(|o| {
            o.result.as_ref().err().map(|failure| FailedSend {
                recipient: o.recipient.clone(),
                error: describe_failure(failure, sender, host),
            })
        })
        .collect();
    let successful = total - errors.len();

    if errors.is_empty() {
        return (
            StatusCode::OK,
            SendResponse {
                success: true,
                message: format!("Email successfully sent to all {} recipients.", successful),
                details: None,
            },
        );
    }

    let details = SendDetails {
        successful,
        failed: errors.len(),
        errors,
    };

    if successful > 0 {
        return (
            StatusCode::MULTI_STATUS,
            SendResponse {
                success: true,
                message: format!(
                    "Email sent to {} of {} recipients. Some deliveries failed.",
                    successful, total
                ),
                details: Some(details),
            },
        );
    }

    let first_failure = outcomes.iter().find_map(|o| o.result.as_ref().err());
    let message = match first_failure {
        Some(DeliveryFailure::Authentication { .. }) => format!(
            "Authentication failed for sender {}. Please check credentials.",
            sender
        ),
        Some(DeliveryFailure::Connection(_)) => format!(
            "Could not connect to email server {}. Please check server settings and network.",
            host
        ),
        _ => "Failed to send email to any recipients.".to_string(),
    };

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        SendResponse {
            success: false,
            message,
            details: Some(details),
        },
    )
}
