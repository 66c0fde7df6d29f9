//! dolisync core library: domain types, remote service traits and
//! configuration.
//!
//! - [`types`]: records, canonical contacts, diffs, counters
//! - [`normalize`] / [`mapper`]: comparison keys and record mapping
//! - [`store`]: [`ContactStore`] and [`MailingService`]
//! - [`config`]: file + environment configuration
//! - [`error`]: [`RemoteError`], [`ConfigError`]

pub mod config;
pub mod error;
mod lenient;
pub mod mapper;
pub mod normalize;
pub mod store;
pub mod types;

pub use config::{ApiConfig, BulletinConfig, Config};
pub use error::{ConfigError, RemoteError};
pub use lenient::parse_flag;
pub use mapper::to_canonical;
pub use normalize::{normalize, normalize_text};
pub use store::{ContactStore, MailingService};
pub use types::{
    CampaignDraft, CampaignId, CanonicalContact, ContactId, DispatchStatistics, ExtraKey,
    FieldDiff, IncomingContactRecord, NativeField, RemoteContact, RunStatistics,
};
