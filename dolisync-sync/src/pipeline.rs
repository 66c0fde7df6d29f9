//! Batch import entrypoint used by the CLI.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use dolisync_core::{ContactStore, IncomingContactRecord, RunStatistics};

use crate::error::{io_err, SyncError};
use crate::reconcile::{RecordOutcome, Reconciler};

/// Outcome of one import run.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stats: RunStatistics,
    pub outcomes: Vec<RecordOutcome>,
}

/// One element of the input array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputRecord {
    Parsed(IncomingContactRecord),
    /// The element could not be read as a contact record.
    Malformed { index: usize, reason: String },
}

impl From<IncomingContactRecord> for InputRecord {
    fn from(record: IncomingContactRecord) -> Self {
        InputRecord::Parsed(record)
    }
}

/// Anything [`run_import`] can take as a batch element.
pub trait ImportItem {
    /// The record, or why it cannot be reconciled.
    fn record(&self) -> Result<&IncomingContactRecord, String>;
}

impl ImportItem for IncomingContactRecord {
    fn record(&self) -> Result<&IncomingContactRecord, String> {
        Ok(self)
    }
}

impl ImportItem for InputRecord {
    fn record(&self) -> Result<&IncomingContactRecord, String> {
        match self {
            InputRecord::Parsed(record) => Ok(record),
            InputRecord::Malformed { index, reason } => {
                Err(format!("malformed record #{index}: {reason}"))
            }
        }
    }
}

/// Read a JSON array of contact records from `path`.
///
/// Only an unreadable file or a body that is not a JSON array fails the
/// call. An element that does not fit [`IncomingContactRecord`] comes back
/// as [`InputRecord::Malformed`] so the rest of the batch still runs.
pub fn load_records(path: &Path) -> Result<Vec<InputRecord>, SyncError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let items: Vec<Value> = serde_json::from_str(&contents).map_err(|source| SyncError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match serde_json::from_value(item) {
            Ok(record) => InputRecord::Parsed(record),
            Err(err) => InputRecord::Malformed {
                index,
                reason: err.to_string(),
            },
        })
        .collect())
}

/// Reconcile every record in order against `store`.
///
/// Statistics start from zero on every call. A failing or malformed record
/// is counted and the loop continues; this function itself cannot fail.
pub fn run_import<S, R>(store: &S, records: &[R], dry_run: bool) -> ImportReport
where
    S: ContactStore + ?Sized,
    R: ImportItem,
{
    let started_at = Utc::now();
    let reconciler = Reconciler::new(store).dry_run(dry_run);
    let mut stats = RunStatistics::new();

    let outcomes: Vec<RecordOutcome> = records
        .iter()
        .map(|item| match item.record() {
            Ok(record) => reconciler.reconcile(record, &mut stats),
            Err(reason) => {
                tracing::warn!(reason = %reason, "skipping malformed record");
                let outcome = RecordOutcome::Invalid { reason };
                outcome.tally(&mut stats);
                outcome
            }
        })
        .collect();

    tracing::info!(
        created = stats.created(),
        updated = stats.updated(),
        existing = stats.existing(),
        error = stats.error(),
        "import finished"
    );

    ImportReport {
        dry_run,
        started_at,
        finished_at: Utc::now(),
        stats,
        outcomes,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn parsed(item: &InputRecord) -> &IncomingContactRecord {
        match item {
            InputRecord::Parsed(record) => record,
            other => panic!("expected a parsed record, got {other:?}"),
        }
    }

    #[test]
    fn load_records_reads_array() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("users.json");
        fs::write(
            &path,
            r#"[{"name":"Ana","mail":"ana@x.com","clima_bulletin":true},{"name":"Sin correo"}]"#,
        )
        .expect("write");

        let records = load_records(&path).expect("load");
        assert_eq!(records.len(), 2);
        assert!(parsed(&records[0]).clima_bulletin);
        assert_eq!(parsed(&records[1]).mail, None);
    }

    #[test]
    fn malformed_element_does_not_reject_the_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("users.json");
        fs::write(
            &path,
            r#"[{"mail":"ana@x.com"},{"mail":"bob@x.com","clima_bulletin":{"on":true}},{"mail":["x"]}]"#,
        )
        .expect("write");

        let records = load_records(&path).expect("load");
        assert_eq!(records.len(), 3);
        assert_eq!(parsed(&records[0]).mail.as_deref(), Some("ana@x.com"));
        let InputRecord::Malformed { index, reason } = &records[1] else {
            panic!("expected malformed, got {:?}", records[1]);
        };
        assert_eq!(*index, 1);
        assert!(reason.contains("boolean flag"), "got: {reason}");
        assert!(matches!(records[2], InputRecord::Malformed { index: 2, .. }));
    }

    #[test]
    fn malformed_reason_names_the_position() {
        let item = InputRecord::Malformed {
            index: 4,
            reason: "bad".to_owned(),
        };
        assert_eq!(item.record().unwrap_err(), "malformed record #4: bad");
    }

    #[test]
    fn load_records_missing_file_names_path() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("absent.json");
        let err = load_records(&path).unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn load_records_rejects_non_array() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("users.json");
        fs::write(&path, r#"{"mail":"ana@x.com"}"#).expect("write");
        let err = load_records(&path).unwrap_err();
        assert!(matches!(err, SyncError::Parse { .. }));
        assert!(err.to_string().contains("users.json"));
    }
}
