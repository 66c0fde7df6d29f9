//! [`ContactStore`] over `/contacts`.

use serde_json::Value;

use dolisync_core::{
    CanonicalContact, ContactId, ContactStore, ExtraKey, FieldDiff, RemoteContact, RemoteError,
};

use crate::client::{decode_id, DolibarrClient};
use crate::error::ClientError;

/// Page size used when listing contacts.
pub const PAGE_SIZE: usize = 100;

/// Upper bound on pages fetched for one listing.
pub const MAX_PAGES: usize = 1_000;

/// Dolibarr `sqlfilters` expression selecting contacts whose extra field
/// `flag` is `'1'`.
pub fn flag_filter(flag: ExtraKey) -> String {
    format!("(te.{}:=:'1')", flag.as_str())
}

impl ContactStore for DolibarrClient {
    fn find_contact_by_email(&self, email: &str) -> Result<Option<RemoteContact>, RemoteError> {
        let path = format!("contacts/email/{}", urlencoding::encode(email));
        let Some(body) = self.get(&path, &[])? else {
            return Ok(None);
        };
        let contact = parse_contact(&path, body)?;
        Ok(Some(contact))
    }

    fn create_contact(&self, contact: &CanonicalContact) -> Result<ContactId, RemoteError> {
        let body = self.send("POST", "contacts", Some(contact))?;
        let id = decode_id("contacts", &body)?;
        Ok(ContactId(id))
    }

    fn update_contact(&self, id: &ContactId, diff: &FieldDiff) -> Result<ContactId, RemoteError> {
        let path = format!("contacts/{}", urlencoding::encode(&id.0));
        self.send("PUT", &path, Some(diff))?;
        Ok(id.clone())
    }

    fn list_contacts_by_flag(&self, flag: ExtraKey) -> Result<Vec<RemoteContact>, RemoteError> {
        let filter = flag_filter(flag);
        let limit = PAGE_SIZE.to_string();
        let mut contacts = Vec::new();
        let mut previous_first: Option<ContactId> = None;
        for page in 0..MAX_PAGES {
            let page_param = page.to_string();
            let query = [
                ("sqlfilters", filter.as_str()),
                ("limit", limit.as_str()),
                ("page", page_param.as_str()),
            ];
            // Dolibarr answers 404 once a listing has no (more) rows.
            let Some(body) = self.get("contacts", &query)? else {
                break;
            };
            let items = match body {
                Value::Array(items) => items,
                other => {
                    return Err(ClientError::Decode {
                        url: "contacts".to_owned(),
                        message: format!("expected a list of contacts, got {other}"),
                    }
                    .into());
                }
            };
            let fetched = items.len();
            let batch = items
                .into_iter()
                .map(|item| parse_contact("contacts", item))
                .collect::<Result<Vec<_>, _>>()?;

            // A server that ignores `page` hands back the same rows forever.
            let first = batch.first().and_then(|contact| contact.id.clone());
            if page > 0 && first.is_some() && first == previous_first {
                tracing::warn!(flag = %flag, page, "listing repeated the previous page; stopping");
                break;
            }
            previous_first = first;

            contacts.extend(batch);
            if fetched < PAGE_SIZE {
                tracing::debug!(flag = %flag, count = contacts.len(), "listed flagged contacts");
                return Ok(contacts);
            }
        }

        if contacts.len() >= PAGE_SIZE * MAX_PAGES {
            return Err(ClientError::Decode {
                url: "contacts".to_owned(),
                message: format!("listing did not end after {MAX_PAGES} pages"),
            }
            .into());
        }
        tracing::debug!(flag = %flag, count = contacts.len(), "listed flagged contacts");
        Ok(contacts)
    }
}

fn parse_contact(path: &str, body: Value) -> Result<RemoteContact, ClientError> {
    serde_json::from_value(body).map_err(|e| ClientError::Decode {
        url: path.to_owned(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_matches_dolibarr_syntax() {
        assert_eq!(flag_filter(ExtraKey::ClimaBulletin), "(te.clima_bulletin:=:'1')");
        assert_eq!(
            flag_filter(ExtraKey::ForecastBulletin),
            "(te.forecast_bulletin:=:'1')"
        );
    }
}
