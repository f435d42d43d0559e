//! Cached user records and their identifiers.

use std::fmt;

use crate::types::{Address, Company, User, UserEcho, UserPatch};

/// Identifier of a cached record.
///
/// Records created optimistically carry a `Pending` id from a local counter
/// until the server confirms them; only then do they get a `Committed` id.
/// The two spaces never mix, so a pending record can never be mistaken for a
/// server record no matter what values the server hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordId {
    Pending(u64),
    Committed(u64),
}

impl RecordId {
    pub fn is_pending(&self) -> bool {
        matches!(self, RecordId::Pending(_))
    }

    /// Server id, if the record has one.
    pub fn server_id(&self) -> Option<u64> {
        match self {
            RecordId::Committed(id) => Some(*id),
            RecordId::Pending(_) => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Pending(local) => write!(f, "pending-{local}"),
            RecordId::Committed(id) => write!(f, "{id}"),
        }
    }
}

/// A user as held in the dashboard cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: Company,
    pub address: Option<Address>,
    pub username: Option<String>,
    pub website: Option<String>,
}

impl From<User> for UserRecord {
    fn from(user: User) -> Self {
        Self {
            id: RecordId::Committed(user.id),
            name: user.name,
            email: user.email,
            phone: user.phone,
            company: user.company,
            address: user.address,
            username: user.username,
            website: user.website,
        }
    }
}

impl UserRecord {
    pub fn company_name(&self) -> &str {
        &self.company.name
    }

    pub(crate) fn apply_patch(&mut self, patch: &UserPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(phone) = &patch.phone {
            self.phone = phone.clone();
        }
        if let Some(company) = &patch.company {
            self.company = company.clone();
        }
    }

    /// Overlay every field the server returned. The id is left alone; the
    /// caller decides what a returned id means.
    pub(crate) fn merge_echo(&mut self, echo: UserEcho) {
        if let Some(name) = echo.name {
            self.name = name;
        }
        if let Some(email) = echo.email {
            self.email = email;
        }
        if let Some(phone) = echo.phone {
            self.phone = phone;
        }
        if let Some(company) = echo.company {
            self.company = company;
        }
        if echo.address.is_some() {
            self.address = echo.address;
        }
        if echo.username.is_some() {
            self.username = echo.username;
        }
        if echo.website.is_some() {
            self.website = echo.website;
        }
    }
}
