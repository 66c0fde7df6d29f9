//! Incoming record → canonical contact.

use crate::normalize::normalize_text;
use crate::types::{CanonicalContact, ExtraKey, IncomingContactRecord};

/// Map an import record onto the shape we propose to the store.
///
/// Pure and total: missing fields become empty strings or `"0"`. A missing
/// `mail` is not rejected here; the reconciler checks it before any remote
/// call.
pub fn to_canonical(record: &IncomingContactRecord) -> CanonicalContact {
    let text = |value: &Option<String>| value.as_deref().map(normalize_text).unwrap_or_default();
    let raw = |value: &Option<String>| value.clone().unwrap_or_default();

    let mut contact = CanonicalContact {
        firstname: text(&record.name),
        lastname: text(&record.last_name),
        email: text(&record.mail),
        phone_mobile: text(&record.phone_mobile),
        town: text(&record.primary_address_city),
        ..CanonicalContact::default()
    };

    contact
        .extra
        .insert(ExtraKey::ClimaBulletin, flag(record.clima_bulletin).into());
    contact
        .extra
        .insert(ExtraKey::ForecastBulletin, flag(record.forecast_bulletin).into());
    // Raw on purpose: spacing is preserved and only ignored when diffing.
    contact.extra.insert(
        ExtraKey::FullName,
        format!("{} {}", raw(&record.name), raw(&record.last_name)),
    );
    contact
        .extra
        .insert(ExtraKey::City, raw(&record.primary_address_city));

    contact
}

impl From<&IncomingContactRecord> for CanonicalContact {
    fn from(record: &IncomingContactRecord) -> Self {
        to_canonical(record)
    }
}

fn flag(on: bool) -> &'static str {
    if on {
        "1"
    } else {
        "0"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> IncomingContactRecord {
        IncomingContactRecord {
            name: Some("Ana".into()),
            last_name: Some("Ruiz".into()),
            mail: Some("ana@x.com".into()),
            ..IncomingContactRecord::default()
        }
    }

    #[test]
    fn maps_native_fields_with_empty_defaults() {
        let contact = to_canonical(&record());
        assert_eq!(contact.firstname, "Ana");
        assert_eq!(contact.lastname, "Ruiz");
        assert_eq!(contact.email, "ana@x.com");
        assert_eq!(contact.phone_mobile, "");
        assert_eq!(contact.town, "");
    }

    #[test]
    fn builds_extra_bundle() {
        let mut rec = record();
        rec.clima_bulletin = true;
        rec.primary_address_city = Some("Lima".into());
        let contact = to_canonical(&rec);
        assert_eq!(contact.extra[&ExtraKey::ClimaBulletin], "1");
        assert_eq!(contact.extra[&ExtraKey::ForecastBulletin], "0");
        assert_eq!(contact.extra[&ExtraKey::FullName], "Ana Ruiz");
        assert_eq!(contact.extra[&ExtraKey::City], "Lima");
        assert_eq!(contact.town, "Lima");
    }

    #[test]
    fn full_name_keeps_raw_spacing() {
        let rec = IncomingContactRecord {
            name: Some(" Ana".into()),
            last_name: None,
            ..IncomingContactRecord::default()
        };
        let contact = to_canonical(&rec);
        assert_eq!(contact.extra[&ExtraKey::FullName], " Ana ");
        assert_eq!(contact.firstname, "Ana");
    }

    #[test]
    fn missing_mail_maps_to_empty_email() {
        let contact = to_canonical(&IncomingContactRecord::default());
        assert!(contact.email.is_empty());
    }
}
