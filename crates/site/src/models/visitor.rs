//! Visitor tracking and statistics types.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use faqbase_core::{SessionId, UserId};

/// A row of `faq.visitor_session`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct VisitorSession {
    pub sid: SessionId,
    pub uuid: Uuid,
    pub user_id: Option<UserId>,
    pub ip: String,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl VisitorSession {
    /// Whether a request from `ip` at `now` may continue this session:
    /// the stored IP must match and the session must have been seen
    /// within `window`.
    #[must_use]
    pub fn can_continue(&self, ip: &str, window: Duration, now: DateTime<Utc>) -> bool {
        self.ip == ip && now.signed_duration_since(self.last_seen) <= window
    }
}

/// Number of sessions started on a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DailyVisits {
    pub day: NaiveDate,
    pub visits: i64,
}

/// A search term and how often it was searched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SearchTermCount {
    pub term: String,
    pub count: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn session(ip: &str, last_seen: DateTime<Utc>) -> VisitorSession {
        VisitorSession {
            sid: SessionId::new(7),
            uuid: Uuid::nil(),
            user_id: None,
            ip: ip.to_owned(),
            created_at: last_seen,
            last_seen,
        }
    }

    #[test]
    fn test_same_ip_within_window_continues() {
        let seen = Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap();
        let row = session("198.51.100.0", seen);
        let window = Duration::hours(24);
        assert!(row.can_continue("198.51.100.0", window, seen + Duration::hours(23)));
        assert!(row.can_continue("198.51.100.0", window, seen + Duration::hours(24)));
    }

    #[test]
    fn test_expired_session_does_not_continue() {
        let seen = Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap();
        let row = session("198.51.100.0", seen);
        let late = seen + Duration::hours(24) + Duration::seconds(1);
        assert!(!row.can_continue("198.51.100.0", Duration::hours(24), late));
    }

    #[test]
    fn test_other_ip_does_not_continue() {
        let seen = Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap();
        let row = session("198.51.100.0", seen);
        assert!(!row.can_continue("203.0.113.0", Duration::hours(24), seen));
    }
}
