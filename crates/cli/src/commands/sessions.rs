//! Visitor session retention.

use chrono::Utc;

use faqbase_site::db::VisitorRepository;
use faqbase_site::services::TrackingLog;
use faqbase_site::services::tracking::retention_cutoff;

use super::{CliError, connect, tracking_dir};

/// Delete visitor sessions and tracking log files older than `days`.
///
/// # Errors
///
/// Returns an error for `days == 0`, or if the database or log
/// directory cannot be cleaned.
pub async fn prune(days: u32) -> Result<(), CliError> {
    if days == 0 {
        return Err(CliError::Invalid(
            "--days must be at least 1, use the admin panel to clear all sessions".to_string(),
        ));
    }
    let cutoff = retention_cutoff(Utc::now(), days)
        .ok_or_else(|| CliError::Invalid(format!("--days {days} is out of range")))?;

    let pool = connect().await?;
    let sessions = VisitorRepository::new(&pool).delete_before(cutoff).await?;
    let logs = TrackingLog::new(tracking_dir())
        .delete_before(cutoff.date_naive())
        .await?;

    tracing::info!(days, sessions, logs, "Pruned visitor sessions");

    #[allow(clippy::print_stdout)]
    {
        println!("Deleted {sessions} sessions and {logs} tracking log files older than {days} days");
    }
    Ok(())
}
