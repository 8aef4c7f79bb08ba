use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use axum_extra::headers::{HeaderMapExt, UserAgent};
use chrono::Utc;

use crate::error::Result;
use crate::models::{AccessVisit, UNKNOWN};
use crate::state::AppState;
use crate::store::RecordOutcome;
use crate::tracking;

/// Tracking routes
pub fn tracking_routes() -> Router<AppState> {
    Router::new().route("/file/{tracking_id}", get(track_file))
}

/// Only these parameters are read; anything else on the link is ignored.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TrackQuery {
    pub recipient_email: Option<String>,
    pub subject: Option<String>,
}

impl TrackQuery {
    /// First occurrence wins when a link repeats a parameter
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = TrackQuery::default();
        for (name, value) in pairs {
            let slot = match name.as_str() {
                "recipient_email" => &mut query.recipient_email,
                "subject" => &mut query.subject,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

/// GET /api/track/file/:tracking_id - Record the access, then serve the document
async fn track_file(
    State(state): State<AppState>,
    Path(tracking_id): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Response> {
    let query = TrackQuery::from_pairs(pairs);
    let user_agent = headers
        .typed_get::<UserAgent>()
        .map(|ua| ua.as_str().to_string())
        .unwrap_or_default();
    let operating_system = tracking::classify_os(&user_agent);
    let ip_address = tracking::client_ip(peer, &headers, state.config.trust_proxy);

    let recipient_email = query
        .recipient_email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());

    tracing::info!(
        tracking_id = %tracking_id,
        recipient = recipient_email.unwrap_or(UNKNOWN),
        ip = %ip_address,
        os = operating_system,
        "Tracking link accessed"
    );

    match recipient_email {
        Some(recipient_email) => {
            let visit = AccessVisit {
                tracking_id: tracking_id.clone(),
                recipient_email: recipient_email.to_string(),
                email_subject: query.subject.clone(),
                accessed_at: Utc::now(),
                ip_address: Some(ip_address),
                user_agent: Some(user_agent),
                operating_system: operating_system.to_string(),
            };

            // Persistence problems never block the document
            match state.access_store.record_access(&visit).await {
                Ok(RecordOutcome::Created) => {
                    tracing::info!(tracking_id = %tracking_id, "New access logged")
                }
                Ok(RecordOutcome::Updated) => {
                    tracing::info!(tracking_id = %tracking_id, "Access log updated")
                }
                Err(e) => tracing::error!(
                    tracking_id = %tracking_id,
                    recipient = %visit.recipient_email,
                    error = %e,
                    "Failed to record tracked access"
                ),
            }
        }
        None => tracing::warn!(
            tracking_id = %tracking_id,
            "Skipping access log, recipient_email missing or empty"
        ),
    }

    let document = tracking::load_tracked_file(&state.config.tracked_file_path)
        .await
        .inspect_err(|e| {
            tracing::error!(tracking_id = %tracking_id, error = %e, "Failed to serve tracked file")
        })?;

    Ok(([(header::CONTENT_TYPE, "text/plain")], document).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_repeated_parameter_keeps_first() {
        let query = TrackQuery::from_pairs(pairs(&[
            ("recipient_email", "a@x.com"),
            ("subject", "Hi"),
            ("recipient_email", "b@x.com"),
        ]));
        assert_eq!(query.recipient_email.as_deref(), Some("a@x.com"));
        assert_eq!(query.subject.as_deref(), Some("Hi"));
    }

    #[test]
    fn test_unknown_parameters_dropped() {
        let query = TrackQuery::from_pairs(pairs(&[("password", "hunter2")]));
        assert_eq!(query, TrackQuery::default());
    }
}
