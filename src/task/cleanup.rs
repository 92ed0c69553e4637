//! Orphaned attachment cleanup
//!
//! Attachments are uploaded before the form they belong to exists. Rows that
//! never got linked to a form are swept once a day, together with their files.

use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::entity::approval_attachment;
use crate::error::AppResult;
use crate::handlers::attachment::stored_path;

/// Outcome of one sweep
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Orphaned rows found past the retention window
    pub scanned: usize,
    /// Rows deleted, their files gone
    pub removed: usize,
    /// Rows kept because their file could not be removed
    pub kept: usize,
}

/// Time left until the next `hour:00` in `now`'s time zone, strictly in the future
pub fn until_next_run<Tz: TimeZone>(now: &DateTime<Tz>, hour: u32) -> Duration {
    let tz = now.timezone();
    let mut date = now.date_naive();

    // Two days always contain a valid hour:00, even across a DST gap
    for _ in 0..3 {
        if let Some(at) = date
            .and_hms_opt(hour, 0, 0)
            .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        {
            if at > *now {
                return at - now.clone();
            }
        }
        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    Duration::hours(24)
}

/// Oldest upload time that is still kept
pub fn retention_cutoff(now: DateTime<Utc>, retention_days: i64) -> DateTime<Utc> {
    now - Duration::days(retention_days)
}

/// Remove the files behind `rows`, returning the ids whose rows may be deleted
///
/// A file that is already gone counts as removed.
pub async fn remove_files(upload_dir: &Path, rows: &[approval_attachment::Model]) -> Vec<i64> {
    let mut removable = Vec::with_capacity(rows.len());

    for row in rows {
        let Some(path) = stored_path(upload_dir, &row.file_url) else {
            tracing::warn!("Skipping attachment {} with unexpected url {}", row.id, row.file_url);
            continue;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => removable.push(row.id),
            Err(e) if e.kind() == ErrorKind::NotFound => removable.push(row.id),
            Err(e) => {
                tracing::warn!("Failed to remove orphaned file {:?}: {}", path, e);
            }
        }
    }

    removable
}

/// Delete orphaned attachments uploaded before `cutoff`
pub async fn sweep<C: ConnectionTrait>(
    db: &C,
    upload_dir: &Path,
    cutoff: DateTime<Utc>,
) -> AppResult<SweepReport> {
    let rows = approval_attachment::Entity::find()
        .filter(approval_attachment::Column::FormId.is_null())
        .filter(approval_attachment::Column::UploadedAt.lt(cutoff))
        .all(db)
        .await?;

    let mut report = SweepReport {
        scanned: rows.len(),
        ..Default::default()
    };
    if rows.is_empty() {
        return Ok(report);
    }

    let ids = remove_files(upload_dir, &rows).await;
    if !ids.is_empty() {
        approval_attachment::Entity::delete_many()
            .filter(approval_attachment::Column::Id.is_in(ids.clone()))
            .exec(db)
            .await?;
    }

    report.removed = ids.len();
    report.kept = report.scanned - report.removed;
    Ok(report)
}

/// Start the daily sweep, unless disabled in config
pub fn spawn(db: Arc<DatabaseConnection>, config: Arc<Config>) -> Option<JoinHandle<()>> {
    if !config.cleanup.enabled {
        tracing::info!("Attachment cleanup disabled");
        return None;
    }

    tracing::info!(
        "Attachment cleanup scheduled daily at {:02}:00, retention {} days",
        config.cleanup.hour,
        config.cleanup.retention_days
    );

    let handle = tokio::spawn(async move {
        let hour = config.cleanup.hour;
        loop {
            let wait = until_next_run(&chrono::Local::now(), hour);
            tracing::debug!("Next attachment cleanup in {}s", wait.num_seconds());
            tokio::time::sleep(wait.to_std().unwrap_or(std::time::Duration::from_secs(3600))).await;

            let cutoff = retention_cutoff(Utc::now(), config.cleanup.retention_days);
            match sweep(db.as_ref(), &config.upload_dir, cutoff).await {
                Ok(report) => tracing::info!(
                    "Attachment cleanup: {} orphaned, {} removed, {} kept",
                    report.scanned,
                    report.removed,
                    report.kept
                ),
                Err(e) => tracing::error!("Attachment cleanup failed: {}", e),
            }
        }
    });

    Some(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    fn orphan(id: i64, url: &str) -> approval_attachment::Model {
        approval_attachment::Model {
            id,
            form_id: None,
            file_name: format!("file{}.png", id),
            file_url: url.to_string(),
            file_type: "image".to_string(),
            uploader_id: 101,
            uploaded_at: at(0, 0) - Duration::days(60),
        }
    }

    #[test]
    fn test_next_run_later_today() {
        assert_eq!(until_next_run(&at(2, 30), 3), Duration::minutes(30));
    }

    #[test]
    fn test_next_run_tomorrow() {
        assert_eq!(until_next_run(&at(3, 0), 3), Duration::hours(24));
        assert_eq!(until_next_run(&at(4, 0), 3), Duration::hours(23));
    }

    #[test]
    fn test_retention_cutoff() {
        assert_eq!(retention_cutoff(at(3, 0), 30), at(3, 0) - Duration::days(30));
        assert_eq!(retention_cutoff(at(3, 0), 0), at(3, 0));
    }

    #[test]
    fn test_cutoff_at_retention_limit() {
        let cutoff = retention_cutoff(at(3, 0), crate::config::MAX_RETENTION_DAYS);
        assert!(cutoff < at(3, 0));
    }

    #[tokio::test]
    async fn test_spawn_respects_enabled_flag() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let mut config = Config::default();
        config.cleanup.enabled = false;
        assert!(spawn(db.clone(), Arc::new(config.clone())).is_none());

        config.cleanup.enabled = true;
        let handle = spawn(db, Arc::new(config)).unwrap();
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test]
    async fn test_remove_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("busy")).unwrap();

        let rows = vec![
            orphan(1, "/upload/a.png"),
            orphan(2, "/upload/missing.png"),
            orphan(3, "/upload/busy"),
            orphan(4, "/elsewhere/x.png"),
        ];

        let ids = remove_files(dir.path(), &rows).await;
        assert_eq!(ids, vec![1, 2]);
        assert!(!dir.path().join("a.png").exists());
        assert!(dir.path().join("busy").exists());
    }

    #[tokio::test]
    async fn test_sweep_deletes_rows() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("busy")).unwrap();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                orphan(1, "/upload/a.png"),
                orphan(2, "/upload/busy"),
            ]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let report = sweep(&db, dir.path(), at(3, 0)).await.unwrap();
        assert_eq!(
            report,
            SweepReport {
                scanned: 2,
                removed: 1,
                kept: 1
            }
        );

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 2);
        let delete = format!("{:?}", log[1]);
        assert!(delete.contains("DELETE FROM"));
        assert!(delete.contains("approval_attachments"));
    }

    #[tokio::test]
    async fn test_sweep_nothing_to_do() {
        let dir = tempfile::tempdir().unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<approval_attachment::Model>::new()])
            .into_connection();

        let report = sweep(&db, dir.path(), at(3, 0)).await.unwrap();
        assert_eq!(report, SweepReport::default());
    }
}
