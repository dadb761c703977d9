//! Daily append-only tracking log files.
//!
//! One file per UTC day, `tracking-YYYY-MM-DD.log`, one line per action:
//!
//! ```text
//! sid;action;data;ip;query;referer;user_agent;unix_timestamp
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use faqbase_core::{SessionId, TrackingAction};

const FILE_PREFIX: &str = "tracking-";
const FILE_SUFFIX: &str = ".log";
const FIELD_COUNT: usize = 8;

/// One line of the tracking log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingEntry {
    pub sid: SessionId,
    pub action: TrackingAction,
    pub data: String,
    pub ip: String,
    pub query: String,
    pub referer: String,
    pub user_agent: String,
    pub timestamp: DateTime<Utc>,
}

impl TrackingEntry {
    /// Render the entry as a log line (without the trailing newline).
    #[must_use]
    pub fn to_line(&self) -> String {
        [
            self.sid.to_string(),
            self.action.as_str().to_owned(),
            sanitize(&self.data),
            sanitize(&self.ip),
            sanitize(&self.query),
            sanitize(&self.referer),
            sanitize(&self.user_agent),
            self.timestamp.timestamp().to_string(),
        ]
        .join(";")
    }

    /// Parse a log line. Returns `None` for malformed lines.
    #[must_use]
    pub fn parse_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line
            .trim_end_matches(['\r', '\n'])
            .splitn(FIELD_COUNT + 1, ';')
            .collect();
        let [sid, action, data, ip, query, referer, user_agent, timestamp] = fields.as_slice()
        else {
            return None;
        };
        Some(Self {
            sid: sid.parse().ok()?,
            action: action.parse().ok()?,
            data: (*data).to_owned(),
            ip: (*ip).to_owned(),
            query: (*query).to_owned(),
            referer: (*referer).to_owned(),
            user_agent: (*user_agent).to_owned(),
            timestamp: DateTime::from_timestamp(timestamp.parse().ok()?, 0)?,
        })
    }
}

/// Replace field separators and line breaks so a value stays in its field.
fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if matches!(c, ';' | '\n' | '\r') { ' ' } else { c })
        .collect()
}

fn file_name(day: NaiveDate) -> String {
    format!("{FILE_PREFIX}{}{FILE_SUFFIX}", day.format("%Y-%m-%d"))
}

fn day_of(file_name: &str) -> Option<NaiveDate> {
    let date = file_name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Directory of daily tracking files.
///
/// Appends are serialized through a mutex so concurrent requests never
/// interleave partial lines.
#[derive(Debug)]
pub struct TrackingLog {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl TrackingLog {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, day: NaiveDate) -> PathBuf {
        self.dir.join(file_name(day))
    }

    /// Append an entry to the file of the entry's day, creating the
    /// directory and file as needed.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be written.
    pub async fn append(&self, entry: &TrackingEntry) -> std::io::Result<()> {
        let mut line = entry.to_line();
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        fs::create_dir_all(&self.dir).await?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(entry.timestamp.date_naive()))
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }

    /// All entries of a day in file order. A missing file is an empty day;
    /// malformed lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file exists but cannot be read.
    pub async fn read_day(&self, day: NaiveDate) -> std::io::Result<Vec<TrackingEntry>> {
        let contents = match fs::read_to_string(self.path_for(day)).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        Ok(contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| {
                let entry = TrackingEntry::parse_line(line);
                if entry.is_none() {
                    tracing::debug!(%day, line, "Skipping malformed tracking line");
                }
                entry
            })
            .collect())
    }

    /// Entries of one session on a day.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read.
    pub async fn entries_for_session(
        &self,
        day: NaiveDate,
        sid: SessionId,
    ) -> std::io::Result<Vec<TrackingEntry>> {
        let mut entries = self.read_day(day).await?;
        entries.retain(|e| e.sid == sid);
        Ok(entries)
    }

    /// Days with a log file, newest first.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the directory exists but cannot be listed.
    pub async fn days(&self) -> std::io::Result<Vec<NaiveDate>> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut days = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            if let Some(day) = item.file_name().to_str().and_then(day_of) {
                days.push(day);
            }
        }
        days.sort_unstable_by(|a, b| b.cmp(a));
        Ok(days)
    }

    /// Delete the files of every day before `day`. Returns how many were
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error encountered.
    pub async fn delete_before(&self, day: NaiveDate) -> std::io::Result<usize> {
        let _guard = self.write_lock.lock().await;
        let mut removed = 0;
        for old in self.days().await?.into_iter().filter(|d| *d < day) {
            fs::remove_file(self.path_for(old)).await?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Whether the log directory can be created and written to.
    pub async fn is_writable(&self) -> bool {
        if fs::create_dir_all(&self.dir).await.is_err() {
            return false;
        }
        let marker = self.dir.join(".write-check");
        let ok = fs::write(&marker, b"ok").await.is_ok();
        let _ = fs::remove_file(&marker).await;
        ok
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entry(sid: i32, action: TrackingAction, at: i64) -> TrackingEntry {
        TrackingEntry {
            sid: SessionId::new(sid),
            action,
            data: String::new(),
            ip: "203.0.113.0".to_owned(),
            query: "q=vpn".to_owned(),
            referer: "https://example.org/".to_owned(),
            user_agent: "Mozilla/5.0".to_owned(),
            timestamp: DateTime::from_timestamp(at, 0).unwrap(),
        }
    }

    #[test]
    fn test_line_format() {
        let mut e = entry(12, TrackingAction::FaqShow, 1_760_000_000);
        e.data = "42".to_owned();
        assert_eq!(
            e.to_line(),
            "12;faq_show;42;203.0.113.0;q=vpn;https://example.org/;Mozilla/5.0;1760000000"
        );
    }

    #[test]
    fn test_separators_and_newlines_are_blanked() {
        let mut e = entry(1, TrackingAction::Search, 1_760_000_000);
        e.data = "a;b\nc".to_owned();
        e.user_agent = "evil;agent\r\n".to_owned();
        let line = e.to_line();
        assert_eq!(line.matches(';').count(), FIELD_COUNT - 1);
        assert!(!line.contains('\n'));

        let parsed = TrackingEntry::parse_line(&line).unwrap();
        assert_eq!(parsed.data, "a b c");
        assert_eq!(parsed.user_agent, "evil agent  ");
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert!(TrackingEntry::parse_line("").is_none());
        assert!(TrackingEntry::parse_line("1;home;;ip;q;r;ua").is_none());
        assert!(TrackingEntry::parse_line("x;home;;ip;q;r;ua;1").is_none());
        assert!(TrackingEntry::parse_line("1;dance;;ip;q;r;ua;1").is_none());
        assert!(TrackingEntry::parse_line("1;home;;ip;q;r;ua;soon").is_none());
    }

    #[test]
    fn test_file_names() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(file_name(day), "tracking-2026-03-09.log");
        assert_eq!(day_of("tracking-2026-03-09.log"), Some(day));
        assert_eq!(day_of("tracking-latest.log"), None);
        assert_eq!(day_of("notes.txt"), None);
    }

    #[tokio::test]
    async fn test_append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let log = TrackingLog::new(dir.path().join("tracking"));

        log.append(&entry(1, TrackingAction::NewSession, 1_760_000_000))
            .await
            .unwrap();
        log.append(&entry(1, TrackingAction::Home, 1_760_000_010))
            .await
            .unwrap();
        log.append(&entry(2, TrackingAction::NewSession, 1_760_000_020))
            .await
            .unwrap();

        let day = DateTime::from_timestamp(1_760_000_000, 0).unwrap().date_naive();
        let all = log.read_day(day).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all.first().map(|e| e.action), Some(TrackingAction::NewSession));

        let one = log.entries_for_session(day, SessionId::new(1)).await.unwrap();
        assert_eq!(one.len(), 2);
        assert_eq!(log.days().await.unwrap(), vec![day]);
    }

    #[tokio::test]
    async fn test_missing_day_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = TrackingLog::new(dir.path().join("nothing-here"));
        let day = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(log.read_day(day).await.unwrap().is_empty());
        assert!(log.days().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_before_keeps_newer_days() {
        let dir = tempfile::tempdir().unwrap();
        let log = TrackingLog::new(dir.path());
        let day_one = 1_760_000_000;
        let day_three = day_one + 2 * 86_400;
        log.append(&entry(1, TrackingAction::Home, day_one)).await.unwrap();
        log.append(&entry(2, TrackingAction::Home, day_three)).await.unwrap();

        let cutoff = DateTime::from_timestamp(day_three, 0).unwrap().date_naive();
        assert_eq!(log.delete_before(cutoff).await.unwrap(), 1);
        assert_eq!(log.days().await.unwrap(), vec![cutoff]);
        assert!(log.is_writable().await);
    }
}
