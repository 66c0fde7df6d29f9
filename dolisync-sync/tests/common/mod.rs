//! In-memory stand-ins for the remote services.
//!
//! Both fakes record every call so tests can assert on remote traffic, and
//! can be told to fail a given operation.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;

use dolisync_core::{
    normalize, CampaignDraft, CampaignId, CanonicalContact, ContactId, ContactStore, ExtraKey,
    FieldDiff, MailingService, RemoteContact, RemoteError,
};

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Find(String),
    Create(CanonicalContact),
    Update(ContactId, FieldDiff),
    List(ExtraKey),
}

impl StoreCall {
    pub fn is_write(&self) -> bool {
        matches!(self, StoreCall::Create(_) | StoreCall::Update(..))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StoreOp {
    Find,
    Create,
    Update,
    List,
}

/// Contact store that keeps whatever it is told to write.
#[derive(Default)]
pub struct FakeStore {
    contacts: RefCell<Vec<RemoteContact>>,
    calls: RefCell<Vec<StoreCall>>,
    failing: RefCell<BTreeSet<StoreOp>>,
    next_id: Cell<u64>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(100),
            ..Self::default()
        }
    }

    pub fn with_contact(self, contact: RemoteContact) -> Self {
        self.contacts.borrow_mut().push(contact);
        self
    }

    pub fn fail(&self, op: StoreOp) {
        self.failing.borrow_mut().insert(op);
    }

    pub fn heal(&self) {
        self.failing.borrow_mut().clear();
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.borrow().clone()
    }

    pub fn writes(&self) -> Vec<StoreCall> {
        self.calls().into_iter().filter(StoreCall::is_write).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn contacts(&self) -> Vec<RemoteContact> {
        self.contacts.borrow().clone()
    }

    fn check(&self, op: StoreOp) -> Result<(), RemoteError> {
        if self.failing.borrow().contains(&op) {
            return Err(RemoteError::Transport(format!("{op:?} unavailable")));
        }
        Ok(())
    }
}

impl ContactStore for FakeStore {
    fn find_contact_by_email(&self, email: &str) -> Result<Option<RemoteContact>, RemoteError> {
        self.calls.borrow_mut().push(StoreCall::Find(email.to_owned()));
        self.check(StoreOp::Find)?;
        Ok(self
            .contacts
            .borrow()
            .iter()
            .find(|c| c.email() == email)
            .cloned())
    }

    fn create_contact(&self, contact: &CanonicalContact) -> Result<ContactId, RemoteError> {
        self.calls.borrow_mut().push(StoreCall::Create(contact.clone()));
        self.check(StoreOp::Create)?;
        let id = ContactId(self.next_id.get().to_string());
        self.next_id.set(self.next_id.get() + 1);
        self.contacts
            .borrow_mut()
            .push(RemoteContact::from_created(id.clone(), contact));
        Ok(id)
    }

    fn update_contact(&self, id: &ContactId, diff: &FieldDiff) -> Result<ContactId, RemoteError> {
        self.calls
            .borrow_mut()
            .push(StoreCall::Update(id.clone(), diff.clone()));
        self.check(StoreOp::Update)?;
        let mut contacts = self.contacts.borrow_mut();
        let stored = contacts
            .iter_mut()
            .find(|c| c.id.as_ref() == Some(id))
            .ok_or_else(|| RemoteError::Status {
                code: 404,
                body: "not found".into(),
            })?;
        stored.apply(diff);
        Ok(id.clone())
    }

    fn list_contacts_by_flag(&self, flag: ExtraKey) -> Result<Vec<RemoteContact>, RemoteError> {
        self.calls.borrow_mut().push(StoreCall::List(flag));
        self.check(StoreOp::List)?;
        Ok(self
            .contacts
            .borrow()
            .iter()
            .filter(|c| normalize(c.extra(flag)) == "1")
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MailCall {
    Create(CampaignDraft),
    Register(CampaignId, ContactId),
    Send(CampaignId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MailOp {
    Create,
    Register,
    Send,
}

/// Mailing service that fails a step only for the listed contacts
/// (or for everyone when `fail_all` is set).
#[derive(Default)]
pub struct FakeMailer {
    calls: RefCell<Vec<MailCall>>,
    failing: RefCell<Vec<(MailOp, Option<ContactId>)>>,
    next_id: Cell<u64>,
    campaign_owner: RefCell<Vec<(CampaignId, ContactId)>>,
}

impl FakeMailer {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            ..Self::default()
        }
    }

    pub fn fail_all(&self, op: MailOp) {
        self.failing.borrow_mut().push((op, None));
    }

    /// Fail `op` only when it concerns `contact`. Only `Register` and `Send`
    /// can be targeted, since campaign creation happens before we know the
    /// campaign's recipient.
    pub fn fail_for(&self, op: MailOp, contact: impl Into<ContactId>) {
        self.failing.borrow_mut().push((op, Some(contact.into())));
    }

    pub fn calls(&self) -> Vec<MailCall> {
        self.calls.borrow().clone()
    }

    fn owner(&self, campaign: &CampaignId) -> Option<ContactId> {
        self.campaign_owner
            .borrow()
            .iter()
            .find(|(c, _)| c == campaign)
            .map(|(_, owner)| owner.clone())
    }

    fn check(&self, op: MailOp, contact: Option<&ContactId>) -> Result<(), RemoteError> {
        let hit = self.failing.borrow().iter().any(|(failing_op, target)| {
            *failing_op == op && (target.is_none() || target.as_ref() == contact)
        });
        if hit {
            return Err(RemoteError::Status {
                code: 500,
                body: format!("{op:?} failed"),
            });
        }
        Ok(())
    }
}

impl MailingService for FakeMailer {
    fn create_campaign(&self, draft: &CampaignDraft) -> Result<CampaignId, RemoteError> {
        self.calls.borrow_mut().push(MailCall::Create(draft.clone()));
        self.check(MailOp::Create, None)?;
        let id = CampaignId(self.next_id.get().to_string());
        self.next_id.set(self.next_id.get() + 1);
        Ok(id)
    }

    fn register_recipient(
        &self,
        campaign: &CampaignId,
        contact: &ContactId,
    ) -> Result<(), RemoteError> {
        self.calls
            .borrow_mut()
            .push(MailCall::Register(campaign.clone(), contact.clone()));
        self.check(MailOp::Register, Some(contact))?;
        self.campaign_owner
            .borrow_mut()
            .push((campaign.clone(), contact.clone()));
        Ok(())
    }

    fn trigger_send(&self, campaign: &CampaignId) -> Result<(), RemoteError> {
        self.calls.borrow_mut().push(MailCall::Send(campaign.clone()));
        let owner = self.owner(campaign);
        self.check(MailOp::Send, owner.as_ref())
    }
}
