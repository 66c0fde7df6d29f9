//! # dolisync-sync
//!
//! Reconciliation engine and bulletin dispatch.
//!
//! Call [`run_import`] to reconcile a batch of incoming contacts against a
//! [`ContactStore`](dolisync_core::ContactStore), or drive a
//! [`BulletinDispatcher`] to send the bulletin to flagged contacts.

pub mod diff;
pub mod dispatch;
pub mod error;
pub mod pipeline;
pub mod reconcile;

pub use diff::diff;
pub use dispatch::{BulletinDispatcher, DispatchOutcome, DispatchReport, DispatchStep};
pub use error::SyncError;
pub use pipeline::{load_records, run_import, ImportItem, ImportReport, InputRecord};
pub use reconcile::{Lookup, RecordOutcome, Reconciler, Stage};
