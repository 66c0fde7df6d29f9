//! Per-record create / update / skip decision.
//!
//! ## Record lifecycle
//!
//! 1. Map the incoming record onto a [`CanonicalContact`].
//! 2. Empty email → `Invalid`, no remote calls.
//! 3. Look the contact up by email → `Found`, `Absent` or `Failed`.
//! 4. `Absent` → create. `Found` → diff; empty diff is a no-op, anything
//!    else becomes a partial update keyed by the remote id.
//! 5. Tally the outcome into [`RunStatistics`].
//!
//! Every remote call is attempted once. A failure is counted and the caller
//! moves on to the next record.

use std::fmt;

use serde::{Serialize, Serializer};

use dolisync_core::{
    to_canonical, CanonicalContact, ContactId, ContactStore, FieldDiff, IncomingContactRecord,
    RemoteContact, RemoteError, RunStatistics,
};

use crate::diff::diff;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of looking a contact up by its natural key.
#[derive(Debug)]
pub enum Lookup {
    Found(RemoteContact),
    /// The store confirmed there is no such contact.
    Absent,
    /// The store could not answer; never treated as `Absent`.
    Failed(RemoteError),
}

/// The remote call that failed for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Lookup,
    Create,
    Update,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Lookup => write!(f, "lookup"),
            Stage::Create => write!(f, "create"),
            Stage::Update => write!(f, "update"),
        }
    }
}

/// What happened to a single incoming record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    /// Contact did not exist and was created.
    Created { email: String, id: ContactId },
    /// Dry run: the contact would have been created.
    WouldCreate { email: String },
    /// Contact existed and the diff was written.
    Updated {
        email: String,
        id: ContactId,
        diff: FieldDiff,
    },
    /// Dry run: the diff would have been written.
    WouldUpdate {
        email: String,
        id: ContactId,
        diff: FieldDiff,
    },
    /// Contact existed and already matched.
    Unchanged {
        email: String,
        id: Option<ContactId>,
    },
    /// The record has no usable email; nothing was sent.
    Invalid { reason: String },
    /// A remote call failed.
    Failed {
        email: String,
        stage: Stage,
        #[serde(serialize_with = "display")]
        error: RemoteError,
    },
}

impl RecordOutcome {
    /// Bump the matching counter. Dry-run outcomes count as what they would
    /// have been.
    pub fn tally(&self, stats: &mut RunStatistics) {
        match self {
            RecordOutcome::Created { .. } | RecordOutcome::WouldCreate { .. } => {
                stats.record_created()
            }
            RecordOutcome::Updated { .. } | RecordOutcome::WouldUpdate { .. } => {
                stats.record_updated()
            }
            RecordOutcome::Unchanged { .. } => stats.record_existing(),
            RecordOutcome::Invalid { .. } | RecordOutcome::Failed { .. } => stats.record_error(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            RecordOutcome::Invalid { .. } | RecordOutcome::Failed { .. }
        )
    }
}

fn display<T: fmt::Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Reconciles incoming records against a [`ContactStore`].
///
/// Holds no state between records besides what the caller passes in.
pub struct Reconciler<'a, S: ?Sized> {
    store: &'a S,
    dry_run: bool,
}

impl<'a, S: ContactStore + ?Sized> Reconciler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            dry_run: false,
        }
    }

    /// Look contacts up as usual but never create or update.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Reconcile one record and count the outcome into `stats`.
    pub fn reconcile(
        &self,
        record: &IncomingContactRecord,
        stats: &mut RunStatistics,
    ) -> RecordOutcome {
        let outcome = self.decide(record);
        outcome.tally(stats);
        outcome
    }

    fn decide(&self, record: &IncomingContactRecord) -> RecordOutcome {
        let proposed = to_canonical(record);
        if proposed.email.is_empty() {
            tracing::warn!("record has no mail; skipping");
            return RecordOutcome::Invalid {
                reason: "missing mail".to_owned(),
            };
        }

        match self.lookup(&proposed.email) {
            Lookup::Absent => self.create(proposed),
            Lookup::Found(current) => self.update(proposed, &current),
            Lookup::Failed(error) => {
                tracing::error!(email = %proposed.email, error = %error, "contact lookup failed");
                RecordOutcome::Failed {
                    email: proposed.email,
                    stage: Stage::Lookup,
                    error,
                }
            }
        }
    }

    /// Classify the store's answer for `email`.
    pub fn lookup(&self, email: &str) -> Lookup {
        tracing::debug!(email = %email, "looking up contact");
        match self.store.find_contact_by_email(email) {
            Ok(Some(contact)) => Lookup::Found(contact),
            Ok(None) => Lookup::Absent,
            Err(error) => Lookup::Failed(error),
        }
    }

    fn create(&self, proposed: CanonicalContact) -> RecordOutcome {
        if self.dry_run {
            tracing::info!(email = %proposed.email, "[dry-run] would create contact");
            return RecordOutcome::WouldCreate {
                email: proposed.email,
            };
        }

        match self.store.create_contact(&proposed) {
            Ok(id) => {
                tracing::info!(email = %proposed.email, id = %id, "contact created");
                RecordOutcome::Created {
                    email: proposed.email,
                    id,
                }
            }
            Err(error) => {
                tracing::error!(email = %proposed.email, error = %error, "contact create failed");
                RecordOutcome::Failed {
                    email: proposed.email,
                    stage: Stage::Create,
                    error,
                }
            }
        }
    }

    fn update(&self, proposed: CanonicalContact, current: &RemoteContact) -> RecordOutcome {
        let changes = diff(&proposed, current);
        if changes.is_empty() {
            tracing::debug!(email = %proposed.email, "contact already up to date");
            return RecordOutcome::Unchanged {
                email: proposed.email,
                id: current.id.clone(),
            };
        }

        let Some(id) = current.id.clone() else {
            tracing::error!(email = %proposed.email, "stored contact has no id; cannot update");
            return RecordOutcome::Failed {
                email: proposed.email,
                stage: Stage::Update,
                error: RemoteError::Decode("stored contact has no id".to_owned()),
            };
        };

        if self.dry_run {
            tracing::info!(
                email = %proposed.email,
                id = %id,
                fields = %changes,
                "[dry-run] would update contact"
            );
            return RecordOutcome::WouldUpdate {
                email: proposed.email,
                id,
                diff: changes,
            };
        }

        match self.store.update_contact(&id, &changes) {
            Ok(id) => {
                tracing::info!(
                    email = %proposed.email,
                    id = %id,
                    fields = %changes,
                    "contact updated"
                );
                RecordOutcome::Updated {
                    email: proposed.email,
                    id,
                    diff: changes,
                }
            }
            Err(error) => {
                tracing::error!(
                    email = %proposed.email,
                    id = %id,
                    error = %error,
                    "contact update failed"
                );
                RecordOutcome::Failed {
                    email: proposed.email,
                    stage: Stage::Update,
                    error,
                }
            }
        }
    }
}
