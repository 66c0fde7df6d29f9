//! Bulletin dispatch: one single-recipient campaign per flagged contact.
//!
//! For every contact whose flag is set:
//!
//! 1. create a campaign labelled for that contact,
//! 2. register the contact as its only recipient,
//! 3. trigger the send.
//!
//! The first failing step ends that contact's sequence. A campaign created
//! before a later step failed is left in place. Nothing records what was
//! already sent, so every run sends again to every flagged contact.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use dolisync_core::{
    BulletinConfig, CampaignId, ContactId, ContactStore, DispatchStatistics, ExtraKey,
    MailingService, RemoteContact, RemoteError,
};

use crate::error::SyncError;

/// The step of the send sequence that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStep {
    /// The listed contact carried no id.
    ResolveContact,
    CreateCampaign,
    RegisterRecipient,
    TriggerSend,
}

impl fmt::Display for DispatchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchStep::ResolveContact => write!(f, "resolve contact"),
            DispatchStep::CreateCampaign => write!(f, "create campaign"),
            DispatchStep::RegisterRecipient => write!(f, "register recipient"),
            DispatchStep::TriggerSend => write!(f, "trigger send"),
        }
    }
}

/// What happened for one flagged contact.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Sent {
        contact_id: ContactId,
        email: String,
        campaign_id: CampaignId,
    },
    /// Dry run: the contact would have received the bulletin.
    WouldSend { contact_id: ContactId, email: String },
    Failed {
        contact_id: Option<ContactId>,
        email: String,
        step: DispatchStep,
        /// Campaign left behind when a later step failed.
        campaign_id: Option<CampaignId>,
        #[serde(serialize_with = "display")]
        error: RemoteError,
    },
}

impl DispatchOutcome {
    pub fn tally(&self, stats: &mut DispatchStatistics) {
        match self {
            DispatchOutcome::Sent { .. } | DispatchOutcome::WouldSend { .. } => stats.record_sent(),
            DispatchOutcome::Failed { .. } => stats.record_failed(),
        }
    }
}

fn display<T: fmt::Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Outcome of one dispatch run.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReport {
    pub flag: String,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stats: DispatchStatistics,
    pub outcomes: Vec<DispatchOutcome>,
}

/// Sends the bulletin to every contact flagged in the store.
pub struct BulletinDispatcher<'a, S: ?Sized, M: ?Sized> {
    store: &'a S,
    mailer: &'a M,
    template: &'a BulletinConfig,
    dry_run: bool,
}

impl<'a, S, M> BulletinDispatcher<'a, S, M>
where
    S: ContactStore + ?Sized,
    M: MailingService + ?Sized,
{
    pub fn new(store: &'a S, mailer: &'a M, template: &'a BulletinConfig) -> Self {
        Self {
            store,
            mailer,
            template,
            dry_run: false,
        }
    }

    /// List recipients but create no campaigns.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Send to every contact whose `flag` attribute is set.
    ///
    /// Only a failure to list the contacts is returned as an error; each
    /// contact's own failure is counted in the report.
    pub fn dispatch(&self, flag: ExtraKey) -> Result<DispatchReport, SyncError> {
        let started_at = Utc::now();
        let contacts = self.store.list_contacts_by_flag(flag).map_err(|err| {
            tracing::error!(flag = %flag, error = %err, "listing flagged contacts failed");
            err
        })?;

        if contacts.is_empty() {
            tracing::warn!(flag = %flag, "no flagged contacts found");
        }

        let mut stats = DispatchStatistics::default();
        let outcomes: Vec<DispatchOutcome> = contacts
            .iter()
            .map(|contact| {
                let outcome = self.send_one(contact);
                outcome.tally(&mut stats);
                outcome
            })
            .collect();

        tracing::info!(
            flag = %flag,
            sent = stats.sent(),
            failed = stats.failed(),
            "bulletin dispatch finished"
        );

        Ok(DispatchReport {
            flag: flag.as_str().to_owned(),
            dry_run: self.dry_run,
            started_at,
            finished_at: Utc::now(),
            stats,
            outcomes,
        })
    }

    fn send_one(&self, contact: &RemoteContact) -> DispatchOutcome {
        let email = contact.email();
        let Some(contact_id) = contact.id.clone() else {
            tracing::error!(email = %email, "flagged contact has no id");
            return DispatchOutcome::Failed {
                contact_id: None,
                email,
                step: DispatchStep::ResolveContact,
                campaign_id: None,
                error: RemoteError::Decode("listed contact has no id".to_owned()),
            };
        };

        if self.dry_run {
            tracing::info!(id = %contact_id, email = %email, "[dry-run] would send bulletin");
            return DispatchOutcome::WouldSend { contact_id, email };
        }

        let fail = |step: DispatchStep, campaign_id: Option<CampaignId>, error: RemoteError| {
            tracing::error!(id = %contact_id, step = %step, error = %error, "bulletin send failed");
            DispatchOutcome::Failed {
                contact_id: Some(contact_id.clone()),
                email: email.clone(),
                step,
                campaign_id,
                error,
            }
        };

        let draft = self.template.draft_for(&email);
        let campaign_id = match self.mailer.create_campaign(&draft) {
            Ok(id) => id,
            Err(error) => return fail(DispatchStep::CreateCampaign, None, error),
        };
        if let Err(error) = self.mailer.register_recipient(&campaign_id, &contact_id) {
            return fail(DispatchStep::RegisterRecipient, Some(campaign_id), error);
        }
        if let Err(error) = self.mailer.trigger_send(&campaign_id) {
            return fail(DispatchStep::TriggerSend, Some(campaign_id), error);
        }

        tracing::info!(id = %contact_id, campaign = %campaign_id, "bulletin sent");
        DispatchOutcome::Sent {
            contact_id,
            email,
            campaign_id,
        }
    }
}
