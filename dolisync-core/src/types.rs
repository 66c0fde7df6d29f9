//! Domain types for contact reconciliation.
//!
//! Wire names follow the Dolibarr REST API: native contact fields are
//! top-level keys, custom attributes live under `array_options` with an
//! `options_` prefix.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::lenient;
use crate::normalize::normalize;

/// JSON key of the extra-attribute container on a contact.
pub const EXTRA_CONTAINER: &str = "array_options";

/// Prefix Dolibarr puts in front of every extra-attribute code.
pub const EXTRA_PREFIX: &str = "options_";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque identifier of a contact in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ContactId(pub String);

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ContactId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ContactId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl<'de> Deserialize<'de> for ContactId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient::id_string(deserializer)?
            .map(ContactId)
            .ok_or_else(|| serde::de::Error::custom("contact id is empty"))
    }
}

fn optional_contact_id<'de, D>(deserializer: D) -> Result<Option<ContactId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient::id_string(deserializer)?.map(ContactId))
}

/// Opaque identifier of a send-campaign (a Dolibarr "mailing").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CampaignId(pub String);

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CampaignId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CampaignId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Field names
// ---------------------------------------------------------------------------

/// Native contact fields compared during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NativeField {
    Firstname,
    Lastname,
    Email,
    PhoneMobile,
    Town,
}

impl NativeField {
    /// Every native field, in wire order.
    pub const ALL: [NativeField; 5] = [
        NativeField::Firstname,
        NativeField::Lastname,
        NativeField::Email,
        NativeField::PhoneMobile,
        NativeField::Town,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NativeField::Firstname => "firstname",
            NativeField::Lastname => "lastname",
            NativeField::Email => "email",
            NativeField::PhoneMobile => "phone_mobile",
            NativeField::Town => "town",
        }
    }
}

impl fmt::Display for NativeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys of the extra-attribute bundle, by their logical (unprefixed) code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExtraKey {
    ClimaBulletin,
    ForecastBulletin,
    FullName,
    City,
}

impl ExtraKey {
    pub const ALL: [ExtraKey; 4] = [
        ExtraKey::ClimaBulletin,
        ExtraKey::ForecastBulletin,
        ExtraKey::FullName,
        ExtraKey::City,
    ];

    /// Logical code, as configured in Dolibarr's extra-field setup.
    pub fn as_str(self) -> &'static str {
        match self {
            ExtraKey::ClimaBulletin => "clima_bulletin",
            ExtraKey::ForecastBulletin => "forecast_bulletin",
            ExtraKey::FullName => "full_name",
            ExtraKey::City => "city",
        }
    }

    /// Key inside `array_options`, e.g. `options_clima_bulletin`.
    pub fn wire_key(self) -> String {
        format!("{EXTRA_PREFIX}{}", self.as_str())
    }

    /// Whether this key is a boolean bulletin subscription flag.
    pub fn is_flag(self) -> bool {
        matches!(self, ExtraKey::ClimaBulletin | ExtraKey::ForecastBulletin)
    }
}

impl fmt::Display for ExtraKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtraKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        let code = code.strip_prefix(EXTRA_PREFIX).unwrap_or(code);
        ExtraKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(code))
            .ok_or_else(|| {
                format!(
                    "unknown attribute '{s}'; expected one of: clima_bulletin, forecast_bulletin, full_name, city"
                )
            })
    }
}

// ---------------------------------------------------------------------------
// Incoming record
// ---------------------------------------------------------------------------

/// One contact as found in the import file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IncomingContactRecord {
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub last_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub mail: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub phone_mobile: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub primary_address_city: Option<String>,
    #[serde(deserialize_with = "lenient::flag")]
    pub clima_bulletin: bool,
    #[serde(deserialize_with = "lenient::flag")]
    pub forecast_bulletin: bool,
}

// ---------------------------------------------------------------------------
// Canonical contact
// ---------------------------------------------------------------------------

/// The normalized shape we propose to the remote store.
///
/// Serializes to the body of a create request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalContact {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub phone_mobile: String,
    pub town: String,
    pub extra: BTreeMap<ExtraKey, String>,
}

impl CanonicalContact {
    pub fn native(&self, field: NativeField) -> &str {
        match field {
            NativeField::Firstname => &self.firstname,
            NativeField::Lastname => &self.lastname,
            NativeField::Email => &self.email,
            NativeField::PhoneMobile => &self.phone_mobile,
            NativeField::Town => &self.town,
        }
    }
}

impl Serialize for CanonicalContact {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(NativeField::ALL.len() + 1))?;
        for field in NativeField::ALL {
            map.serialize_entry(field.as_str(), self.native(field))?;
        }
        map.serialize_entry(EXTRA_CONTAINER, &WireExtras(&self.extra))?;
        map.end()
    }
}

/// Serializes an extra bundle with `options_`-prefixed keys.
struct WireExtras<'a>(&'a BTreeMap<ExtraKey, String>);

impl Serialize for WireExtras<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(&key.wire_key(), value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Remote contact
// ---------------------------------------------------------------------------

/// A contact as returned by the remote store.
///
/// Only `id` and `array_options` are typed; every other key is kept as raw
/// JSON so that comparisons see exactly what the server sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteContact {
    #[serde(
        default,
        deserialize_with = "optional_contact_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<ContactId>,
    #[serde(default, deserialize_with = "lenient::attribute_bundle")]
    pub array_options: Map<String, Value>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RemoteContact {
    pub fn new(id: impl Into<ContactId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Builder-style setter for a native field.
    pub fn with_native(mut self, field: NativeField, value: impl Into<Value>) -> Self {
        self.fields.insert(field.as_str().to_owned(), value.into());
        self
    }

    /// Builder-style setter for an extra attribute.
    pub fn with_extra(mut self, key: ExtraKey, value: impl Into<Value>) -> Self {
        self.array_options.insert(key.wire_key(), value.into());
        self
    }

    /// The record a store would hold right after creating `contact`.
    pub fn from_created(id: impl Into<ContactId>, contact: &CanonicalContact) -> Self {
        let mut remote = Self::new(id);
        for field in NativeField::ALL {
            remote = remote.with_native(field, contact.native(field));
        }
        for (key, value) in &contact.extra {
            remote = remote.with_extra(*key, value.as_str());
        }
        remote
    }

    /// Applies a partial update in place, the way the store would.
    pub fn apply(&mut self, diff: &FieldDiff) {
        for (field, value) in diff.native() {
            self.fields
                .insert(field.as_str().to_owned(), Value::String(value.clone()));
        }
        for (key, value) in diff.extra() {
            self.array_options
                .insert(key.wire_key(), Value::String(value.clone()));
        }
    }

    pub fn native(&self, field: NativeField) -> Option<&Value> {
        self.fields.get(field.as_str())
    }

    pub fn extra(&self, key: ExtraKey) -> Option<&Value> {
        self.array_options.get(&key.wire_key())
    }

    /// Normalized email, empty if the server sent none.
    pub fn email(&self) -> String {
        normalize(self.native(NativeField::Email))
    }
}

// ---------------------------------------------------------------------------
// Field diff
// ---------------------------------------------------------------------------

/// Fields whose normalized value differs between proposal and remote.
///
/// Serializes to the body of a partial update; `array_options` is present
/// only when at least one extra attribute changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDiff {
    native: BTreeMap<NativeField, String>,
    extra: BTreeMap<ExtraKey, String>,
}

impl FieldDiff {
    pub fn is_empty(&self) -> bool {
        self.native.is_empty() && self.extra.is_empty()
    }

    pub fn insert_native(&mut self, field: NativeField, value: impl Into<String>) {
        self.native.insert(field, value.into());
    }

    pub fn insert_extra(&mut self, key: ExtraKey, value: impl Into<String>) {
        self.extra.insert(key, value.into());
    }

    pub fn native(&self) -> &BTreeMap<NativeField, String> {
        &self.native
    }

    pub fn extra(&self) -> &BTreeMap<ExtraKey, String> {
        &self.extra
    }

    /// Changed keys in display form (`phone_mobile`, `array_options.city`).
    pub fn keys(&self) -> Vec<String> {
        self.native
            .keys()
            .map(|field| field.as_str().to_owned())
            .chain(
                self.extra
                    .keys()
                    .map(|key| format!("{EXTRA_CONTAINER}.{}", key.as_str())),
            )
            .collect()
    }
}

impl fmt::Display for FieldDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.keys().join(", "))
    }
}

impl Serialize for FieldDiff {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra_len = usize::from(!self.extra.is_empty());
        let mut map = serializer.serialize_map(Some(self.native.len() + extra_len))?;
        for (field, value) in &self.native {
            map.serialize_entry(field.as_str(), value)?;
        }
        if !self.extra.is_empty() {
            map.serialize_entry(EXTRA_CONTAINER, &WireExtras(&self.extra))?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Counters for one import run. Only ever incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStatistics {
    created: u64,
    updated: u64,
    existing: u64,
    error: u64,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_created(&mut self) {
        self.created += 1;
    }

    pub fn record_updated(&mut self) {
        self.updated += 1;
    }

    pub fn record_existing(&mut self) {
        self.existing += 1;
    }

    pub fn record_error(&mut self) {
        self.error += 1;
    }

    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn updated(&self) -> u64 {
        self.updated
    }

    pub fn existing(&self) -> u64 {
        self.existing
    }

    pub fn error(&self) -> u64 {
        self.error
    }

    pub fn total(&self) -> u64 {
        self.created + self.updated + self.existing + self.error
    }
}

/// Counters for one bulletin dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStatistics {
    sent: u64,
    failed: u64,
}

impl DispatchStatistics {
    pub fn record_sent(&mut self) {
        self.sent += 1;
    }

    pub fn record_failed(&mut self) {
        self.failed += 1;
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }
}

// ---------------------------------------------------------------------------
// Campaigns
// ---------------------------------------------------------------------------

/// Everything needed to create a one-recipient send-campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignDraft {
    pub label: String,
    pub subject: String,
    pub body: String,
    pub email_from: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
