use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::id::{ClientId, UserId};
use crate::schema::Table;
use crate::value_object::{EmailAddress, blank_to_none};

/// An audited organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Client {
    type Id = ClientId;
    const TABLE: Table = Table::Clients;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Insert payload; `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_by: Option<UserId>,
}

/// Full-record update written by the edit form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientPatch {
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Raw client form input. Blank optional fields are stored as null.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientForm {
    pub name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

struct ClientFields {
    name: String,
    contact_person: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
}

impl ClientForm {
    fn validate(self) -> DomainResult<ClientFields> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("client name is required"));
        }
        let email = match blank_to_none(self.email) {
            Some(raw) => Some(EmailAddress::parse(&raw)?.to_string()),
            None => None,
        };
        Ok(ClientFields {
            name,
            contact_person: blank_to_none(self.contact_person),
            email,
            phone: blank_to_none(self.phone),
            address: blank_to_none(self.address),
        })
    }

    pub fn into_new(self, created_by: Option<UserId>) -> DomainResult<NewClient> {
        let f = self.validate()?;
        Ok(NewClient {
            name: f.name,
            contact_person: f.contact_person,
            email: f.email,
            phone: f.phone,
            address: f.address,
            created_by,
        })
    }

    pub fn into_patch(self, now: DateTime<Utc>) -> DomainResult<ClientPatch> {
        let f = self.validate()?;
        Ok(ClientPatch {
            name: f.name,
            contact_person: f.contact_person,
            email: f.email,
            phone: f.phone,
            address: f.address,
            updated_at: now,
        })
    }
}

impl From<&Client> for ClientForm {
    fn from(client: &Client) -> Self {
        Self {
            name: client.name.clone(),
            contact_person: client.contact_person.clone().unwrap_or_default(),
            email: client.email.clone().unwrap_or_default(),
            phone: client.phone.clone().unwrap_or_default(),
            address: client.address.clone().unwrap_or_default(),
        }
    }
}
