//! Visitor tracking.
//!
//! Each tracked page view resolves a visitor session (a row in
//! `faq.visitor_session`) and appends a line to the daily tracking log.
//! Tracking never fails a request: errors are logged and dropped.

mod log;

pub use log::{TrackingEntry, TrackingLog};

use std::net::IpAddr;

use chrono::{DateTime, Duration, TimeDelta, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::Session;
use uuid::Uuid;

use faqbase_core::network::anonymize;
use faqbase_core::{SessionId, TrackingAction, UserId};

use crate::db::{RepositoryError, VisitorRepository};
use crate::models::session_keys;
use crate::settings::Settings;

/// How long a visitor session may be idle and still be continued.
pub const SESSION_WINDOW_HOURS: i64 = 24;

/// Errors raised while tracking a request.
#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("tracking log: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("session store: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Request facts the tracker records.
#[derive(Debug, Clone)]
pub struct VisitorContext {
    pub ip: IpAddr,
    pub user_agent: String,
    pub referer: String,
    pub query: String,
}

/// Whether a request from `visitor` should be tracked at all.
#[must_use]
pub fn should_track(settings: &Settings, visitor: &VisitorContext) -> bool {
    settings.tracking_enabled
        && !settings.bots().is_bot(&visitor.user_agent)
        && !settings.banned_ips().is_banned(visitor.ip)
}

/// The IP as stored in sessions and log lines.
#[must_use]
pub fn stored_ip(settings: &Settings, ip: IpAddr) -> String {
    if settings.anonymize_ip {
        anonymize(ip).to_string()
    } else {
        ip.to_string()
    }
}

/// Outcome of resolving the visitor session of a tracked request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionResolution {
    /// The presented session is continued.
    Continue(SessionId),
    /// A new session starts. `stale` is the presented id that could not
    /// be continued.
    Start { stale: Option<SessionId> },
}

impl SessionResolution {
    /// Decide from the id stored in the request's session and the
    /// continuable row found for it, if any.
    #[must_use]
    pub fn resolve(presented: Option<SessionId>, active: Option<SessionId>) -> Self {
        match (presented, active) {
            (Some(sid), Some(found)) if sid == found => Self::Continue(sid),
            (stale, _) => Self::Start { stale },
        }
    }

    /// Action and data of the first log line of a new session.
    #[must_use]
    pub fn opening(stale: Option<SessionId>) -> (TrackingAction, String) {
        match stale {
            Some(stale) => (TrackingAction::OldSession, stale.to_string()),
            None => (TrackingAction::NewSession, String::new()),
        }
    }
}

/// Start of a retention window of `days` before `now`, or `None` when
/// it lies outside the representable date range.
#[must_use]
pub fn retention_cutoff(now: DateTime<Utc>, days: u32) -> Option<DateTime<Utc>> {
    now.checked_sub_signed(TimeDelta::try_days(i64::from(days))?)
}

/// Records visitor actions.
pub struct VisitorTracker<'a> {
    pool: &'a PgPool,
    log: &'a TrackingLog,
}

impl<'a> VisitorTracker<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, log: &'a TrackingLog) -> Self {
        Self { pool, log }
    }

    /// Track `action` for the visitor. Returns the visitor session id when
    /// the request was tracked.
    pub async fn track(
        &self,
        settings: &Settings,
        session: &Session,
        visitor: &VisitorContext,
        user_id: Option<UserId>,
        action: TrackingAction,
        data: &str,
    ) -> Option<SessionId> {
        if !should_track(settings, visitor) {
            return None;
        }
        match self
            .try_track(settings, session, visitor, user_id, action, data)
            .await
        {
            Ok(sid) => Some(sid),
            Err(e) => {
                tracing::warn!(error = %e, action = %action, "Failed to track visitor");
                None
            }
        }
    }

    async fn try_track(
        &self,
        settings: &Settings,
        session: &Session,
        visitor: &VisitorContext,
        user_id: Option<UserId>,
        action: TrackingAction,
        data: &str,
    ) -> Result<SessionId, TrackingError> {
        let ip = stored_ip(settings, visitor.ip);
        let visitors = VisitorRepository::new(self.pool);
        let presented: Option<SessionId> = session.get(session_keys::VISITOR_SID).await?;

        let active = match presented {
            Some(sid) => visitors
                .find_active(sid, &ip, Duration::hours(SESSION_WINDOW_HOURS))
                .await?
                .map(|row| row.sid),
            None => None,
        };

        let sid = match SessionResolution::resolve(presented, active) {
            SessionResolution::Continue(sid) => {
                visitors.touch(sid, user_id).await?;
                sid
            }
            SessionResolution::Start { stale } => {
                let created = visitors.create(Uuid::new_v4(), user_id, &ip).await?;
                session
                    .insert(session_keys::VISITOR_SID, created.sid)
                    .await?;
                let (opening, opening_data) = SessionResolution::opening(stale);
                self.log
                    .append(&self.entry(created.sid, opening, &opening_data, &ip, visitor))
                    .await?;
                tracing::debug!(sid = %created.sid, "Started visitor session");
                created.sid
            }
        };

        self.log
            .append(&self.entry(sid, action, data, &ip, visitor))
            .await?;
        Ok(sid)
    }

    #[allow(clippy::unused_self)]
    fn entry(
        &self,
        sid: SessionId,
        action: TrackingAction,
        data: &str,
        ip: &str,
        visitor: &VisitorContext,
    ) -> TrackingEntry {
        TrackingEntry {
            sid,
            action,
            data: data.to_owned(),
            ip: ip.to_owned(),
            query: visitor.query.clone(),
            referer: visitor.referer.clone(),
            user_agent: visitor.user_agent.clone(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::settings::keys;

    fn visitor(ip: &str, agent: &str) -> VisitorContext {
        VisitorContext {
            ip: ip.parse().unwrap(),
            user_agent: agent.to_owned(),
            referer: String::new(),
            query: String::new(),
        }
    }

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let stored: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Settings::from_entries(&stored)
    }

    #[test]
    fn test_browsers_are_tracked() {
        let s = settings(&[]);
        assert!(should_track(&s, &visitor("198.51.100.7", "Mozilla/5.0 (X11; Linux)")));
    }

    #[test]
    fn test_bots_and_empty_agents_are_skipped() {
        let s = settings(&[]);
        assert!(!should_track(&s, &visitor("198.51.100.7", "Googlebot/2.1")));
        assert!(!should_track(&s, &visitor("198.51.100.7", "")));
    }

    #[test]
    fn test_banned_ips_are_skipped() {
        let s = settings(&[(keys::BANNED_IPS, "198.51.100.0/24")]);
        assert!(!should_track(&s, &visitor("198.51.100.7", "Mozilla/5.0")));
        assert!(should_track(&s, &visitor("198.51.101.7", "Mozilla/5.0")));
    }

    #[test]
    fn test_disabled_tracking() {
        let s = settings(&[(keys::TRACKING_ENABLED, "false")]);
        assert!(!should_track(&s, &visitor("198.51.100.7", "Mozilla/5.0")));
    }

    #[test]
    fn test_presented_active_session_is_continued() {
        let sid = SessionId::new(41);
        assert_eq!(
            SessionResolution::resolve(Some(sid), Some(sid)),
            SessionResolution::Continue(sid)
        );
    }

    #[test]
    fn test_stale_session_starts_new_one() {
        let stale = SessionId::new(41);
        let resolution = SessionResolution::resolve(Some(stale), None);
        assert_eq!(resolution, SessionResolution::Start { stale: Some(stale) });
        assert_eq!(
            SessionResolution::opening(Some(stale)),
            (TrackingAction::OldSession, "41".to_owned())
        );
    }

    #[test]
    fn test_first_visit_starts_new_session() {
        let resolution = SessionResolution::resolve(None, None);
        assert_eq!(resolution, SessionResolution::Start { stale: None });
        assert_eq!(
            SessionResolution::opening(None),
            (TrackingAction::NewSession, String::new())
        );
    }

    #[test]
    fn test_retention_cutoff() {
        let now = Utc::now();
        let cutoff = retention_cutoff(now, 30).unwrap();
        assert_eq!(now - cutoff, Duration::days(30));
    }

    #[test]
    fn test_retention_cutoff_out_of_range() {
        assert!(retention_cutoff(Utc::now(), u32::MAX).is_none());
    }

    #[test]
    fn test_stored_ip_anonymization() {
        let ip = "198.51.100.7".parse().unwrap();
        assert_eq!(stored_ip(&settings(&[]), ip), "198.51.100.0");
        assert_eq!(
            stored_ip(&settings(&[(keys::ANONYMIZE_IP, "false")]), ip),
            "198.51.100.7"
        );
    }
}
