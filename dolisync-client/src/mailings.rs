//! [`MailingService`] over `/mailings`.

use serde_json::{json, Value};

use dolisync_core::{CampaignDraft, CampaignId, ContactId, MailingService, RemoteError};

use crate::client::{decode_id, DolibarrClient};

impl MailingService for DolibarrClient {
    fn create_campaign(&self, draft: &CampaignDraft) -> Result<CampaignId, RemoteError> {
        let body = self.send("POST", "mailings", Some(draft))?;
        let id = decode_id("mailings", &body)?;
        Ok(CampaignId(id))
    }

    fn register_recipient(
        &self,
        campaign: &CampaignId,
        contact: &ContactId,
    ) -> Result<(), RemoteError> {
        let path = format!("mailings/{}/receivers", urlencoding::encode(&campaign.0));
        let body = json!({ "contact_ids": [contact.0] });
        self.send("POST", &path, Some(&body))?;
        Ok(())
    }

    fn trigger_send(&self, campaign: &CampaignId) -> Result<(), RemoteError> {
        let path = format!("mailings/{}/send", urlencoding::encode(&campaign.0));
        self.send("POST", &path, None::<&Value>)?;
        Ok(())
    }
}
