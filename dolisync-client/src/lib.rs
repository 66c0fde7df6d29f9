//! # dolisync-client
//!
//! Blocking [`DolibarrClient`] implementing
//! [`ContactStore`](dolisync_core::ContactStore) and
//! [`MailingService`](dolisync_core::MailingService) against the Dolibarr
//! REST API.

mod client;
pub mod contacts;
pub mod error;
mod mailings;

pub use client::{DolibarrClient, API_KEY_HEADER};
pub use contacts::{flag_filter, MAX_PAGES, PAGE_SIZE};
pub use error::ClientError;
