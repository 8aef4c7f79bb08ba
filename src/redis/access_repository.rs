use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_redis::Pool;
use redis::AsyncCommands;

use crate::error::{AppError, Result};
use crate::models::{AccessVisit, TrackedAccess};
use crate::store::{AccessStore, RecordOutcome};

/// Tracked access records stored as Redis hashes
#[derive(Clone)]
pub struct AccessRepository {
    pool: Pool,
    prefix: String,
}

impl AccessRepository {
    pub fn new(pool: Pool, prefix: impl Into<String>) -> Self {
        Self {
            pool,
            prefix: prefix.into(),
        }
    }

    /// `{prefix}:{tracking_id}:{recipient_email}` with `%` and `:` escaped in
    /// both parts, so distinct pairs never share a key.
    fn record_key(&self, tracking_id: &str, recipient_email: &str) -> String {
        format!(
            "{}:{}:{}",
            self.prefix,
            escape_key_part(tracking_id),
            escape_key_part(recipient_email)
        )
    }
}

fn escape_key_part(part: &str) -> String {
    part.replace('%', "%25").replace(':', "%3A")
}

#[async_trait]
impl AccessStore for AccessRepository {
    /// One MULTI/EXEC: identity and subject are written only when absent,
    /// per-access fields are always overwritten.
    async fn record_access(&self, visit: &AccessVisit) -> Result<RecordOutcome> {
        let mut conn = self.pool.get().await?;
        let key = self.record_key(&visit.tracking_id, &visit.recipient_email);
        let record = visit.clone().into_record();
        let accessed_at = record.accessed_at.to_rfc3339();

        let (created,): (bool,) = redis::pipe()
            .atomic()
            .hset_nx(&key, "trackingId", &record.tracking_id)
            .hset_nx(&key, "recipientEmail", &record.recipient_email)
            .ignore()
            .hset_nx(&key, "emailSubject", &record.email_subject)
            .ignore()
            .hset_multiple(
                &key,
                &[
                    ("accessedAt", accessed_at.as_str()),
                    ("ipAddress", record.ip_address.as_str()),
                    ("userAgent", record.user_agent.as_str()),
                    ("operatingSystem", record.operating_system.as_str()),
                ],
            )
            .ignore()
            .query_async(&mut *conn)
            .await?;

        if created {
            tracing::info!(
                tracking_id = %record.tracking_id,
                recipient = %record.recipient_email,
                "Tracked access created"
            );
            Ok(RecordOutcome::Created)
        } else {
            tracing::info!(
                tracking_id = %record.tracking_id,
                recipient = %record.recipient_email,
                "Tracked access updated"
            );
            Ok(RecordOutcome::Updated)
        }
    }

    async fn find(
        &self,
        tracking_id: &str,
        recipient_email: &str,
    ) -> Result<Option<TrackedAccess>> {
        let mut conn = self.pool.get().await?;
        let key = self.record_key(tracking_id, recipient_email);

        let fields: HashMap<String, String> = conn.hgetall(&key).await?;
        if fields.is_empty() {
            return Ok(None);
        }

        from_hash(fields).map(Some)
    }

    async fn health_check(&self) -> Result<bool> {
        let mut conn = self.pool.get().await?;

        let pong: String = redis::cmd("PING").query_async(&mut *conn).await?;

        Ok(pong == "PONG")
    }
}

fn from_hash(mut fields: HashMap<String, String>) -> Result<TrackedAccess> {
    let mut take = |name: &str| {
        fields
            .remove(name)
            .ok_or_else(|| AppError::Store(format!("Tracked access is missing field {}", name)))
    };

    let accessed_at = take("accessedAt")?;
    let accessed_at = DateTime::parse_from_rfc3339(&accessed_at)
        .map_err(|e| AppError::Store(format!("Invalid accessedAt '{}': {}", accessed_at, e)))?
        .with_timezone(&Utc);

    Ok(TrackedAccess {
        tracking_id: take("trackingId")?,
        recipient_email: take("recipientEmail")?,
        accessed_at,
        email_subject: take("emailSubject")?,
        ip_address: take("ipAddress")?,
        user_agent: take("userAgent")?,
        operating_system: take("operatingSystem")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hash() -> HashMap<String, String> {
        [
            ("trackingId", "trk-1"),
            ("recipientEmail", "a@x.com"),
            ("accessedAt", "2026-01-02T03:04:05+00:00"),
            ("emailSubject", "N/A"),
            ("ipAddress", "127.0.0.1"),
            ("userAgent", "Mozilla/5.0"),
            ("operatingSystem", "Linux"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_from_hash_round_trips_fields() {
        let record = from_hash(hash()).expect("valid hash");
        assert_eq!(record.tracking_id, "trk-1");
        assert_eq!(record.accessed_at.to_rfc3339(), "2026-01-02T03:04:05+00:00");
        assert_eq!(record.operating_system, "Linux");
    }

    #[test]
    fn test_from_hash_reports_missing_field() {
        let mut fields = hash();
        fields.remove("userAgent");
        assert!(matches!(from_hash(fields), Err(AppError::Store(_))));
    }

    fn repo() -> AccessRepository {
        let pool = deadpool_redis::Config::from_url("redis://localhost:6379")
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .unwrap();
        AccessRepository::new(pool, "tracked_accesses")
    }

    #[test]
    fn test_record_key_includes_pair() {
        assert_eq!(
            repo().record_key("trk-1", "a@x.com"),
            "tracked_accesses:trk-1:a@x.com"
        );
    }

    #[test]
    fn test_record_key_separators_in_parts_do_not_collide() {
        let repo = repo();
        assert_ne!(
            repo.record_key("trk:a", "b@x.com"),
            repo.record_key("trk", "a:b@x.com")
        );
        assert_ne!(
            repo.record_key("trk%3Aa", "b@x.com"),
            repo.record_key("trk:a", "b@x.com")
        );
        assert_eq!(
            repo.record_key("trk:a", "b@x.com"),
            "tracked_accesses:trk%3Aa:b@x.com"
        );
    }
}
