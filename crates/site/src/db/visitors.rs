//! Visitor session repository.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use faqbase_core::{SessionId, UserId};

use super::RepositoryError;
use crate::models::{DailyVisits, VisitorSession};

const SESSION_COLUMNS: &str = "sid, uuid, user_id, ip, created_at, last_seen";

/// Repository for `faq.visitor_session`.
pub struct VisitorRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VisitorRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Start a new visitor session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        uuid: Uuid,
        user_id: Option<UserId>,
        ip: &str,
    ) -> Result<VisitorSession, RepositoryError> {
        let sql = format!(
            "INSERT INTO faq.visitor_session (uuid, user_id, ip) VALUES ($1, $2, $3)
             RETURNING {SESSION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, VisitorSession>(&sql)
            .bind(uuid)
            .bind(user_id)
            .bind(ip)
            .fetch_one(self.pool)
            .await?;
        Ok(row)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, sid: SessionId) -> Result<Option<VisitorSession>, RepositoryError> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM faq.visitor_session WHERE sid = $1");
        let row = sqlx::query_as::<_, VisitorSession>(&sql)
            .bind(sid)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Find a session that may be continued: same id, same IP, and seen
    /// within `window`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_active(
        &self,
        sid: SessionId,
        ip: &str,
        window: Duration,
    ) -> Result<Option<VisitorSession>, RepositoryError> {
        let now = Utc::now();
        Ok(self
            .get(sid)
            .await?
            .filter(|row| row.can_continue(ip, window, now)))
    }

    /// Mark a session as seen now, attaching a user once one logs in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn touch(&self, sid: SessionId, user_id: Option<UserId>) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE faq.visitor_session
             SET last_seen = NOW(), user_id = COALESCE($2, user_id)
             WHERE sid = $1",
        )
        .bind(sid)
        .bind(user_id)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Sessions started on a UTC day, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_day(&self, day: NaiveDate) -> Result<Vec<VisitorSession>, RepositoryError> {
        let (from, to) = day_bounds(day);
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM faq.visitor_session
             WHERE created_at >= $1 AND created_at < $2
             ORDER BY created_at, sid"
        );
        let rows = sqlx::query_as::<_, VisitorSession>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }

    /// Number of sessions started in `[from, to)`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM faq.visitor_session WHERE created_at >= $1 AND created_at < $2",
        )
        .bind(from)
        .bind(to)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Sessions per UTC day over the last `days` days, oldest first.
    /// Days without sessions are omitted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn visits_per_day(&self, days: u32) -> Result<Vec<DailyVisits>, RepositoryError> {
        let today = Utc::now().date_naive();
        let first = today - Duration::days(i64::from(days.saturating_sub(1)));
        let rows = sqlx::query_as::<_, DailyVisits>(
            "SELECT (created_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS visits
             FROM faq.visitor_session
             WHERE created_at >= $1
             GROUP BY day
             ORDER BY day",
        )
        .bind(day_bounds(first).0)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    /// Delete sessions started before `cutoff`. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM faq.visitor_session WHERE created_at < $1")
            .bind(cutoff)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete every session. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM faq.visitor_session")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Start (inclusive) and end (exclusive) of a UTC day.
#[must_use]
pub fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(chrono::NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_day_bounds_cover_one_utc_day() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 29).unwrap();
        let (from, to) = day_bounds(day);
        assert_eq!(from.to_rfc3339(), "2026-03-29T00:00:00+00:00");
        assert_eq!(to.to_rfc3339(), "2026-03-30T00:00:00+00:00");
    }
}
