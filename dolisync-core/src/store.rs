//! Seams to the remote services.
//!
//! The reconciler and the dispatcher only ever talk to these traits; the
//! HTTP implementation lives in `dolisync-client`.

use crate::error::RemoteError;
use crate::types::{
    CampaignDraft, CampaignId, CanonicalContact, ContactId, ExtraKey, FieldDiff, RemoteContact,
};

/// Remote store of record for contacts.
pub trait ContactStore {
    /// Look a contact up by email. `Ok(None)` means the store confirmed
    /// there is no such contact; any other failure is an `Err`.
    fn find_contact_by_email(&self, email: &str) -> Result<Option<RemoteContact>, RemoteError>;

    fn create_contact(&self, contact: &CanonicalContact) -> Result<ContactId, RemoteError>;

    /// Apply a partial update. Returns the id the store confirmed.
    fn update_contact(&self, id: &ContactId, diff: &FieldDiff) -> Result<ContactId, RemoteError>;

    /// Every contact whose extra attribute `flag` is set, in store order.
    fn list_contacts_by_flag(&self, flag: ExtraKey) -> Result<Vec<RemoteContact>, RemoteError>;
}

/// Remote bulk-send service.
pub trait MailingService {
    fn create_campaign(&self, draft: &CampaignDraft) -> Result<CampaignId, RemoteError>;

    fn register_recipient(
        &self,
        campaign: &CampaignId,
        contact: &ContactId,
    ) -> Result<(), RemoteError>;

    fn trigger_send(&self, campaign: &CampaignId) -> Result<(), RemoteError>;
}
