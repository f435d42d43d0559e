//! Wire DTOs for the users resource.
//!
//! # Design
//! These types mirror the remote schema but are defined independently from
//! the mock-server crate; integration tests catch any schema drift. Optional
//! fields the dashboard never reads (address, username, website) are carried
//! through so that edits do not silently drop them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Company {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "catchPhrase", default, skip_serializing_if = "Option::is_none")]
    pub catch_phrase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bs: Option<String>,
}

impl Company {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Geo {
    pub lat: String,
    pub lng: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub street: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suite: Option<String>,
    pub city: String,
    pub zipcode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
}

impl Address {
    /// Single-line form used by the detail view: `street, city zipcode`.
    pub fn one_line(&self) -> String {
        format!("{}, {} {}", self.street, self.city, self.zipcode)
    }
}

/// A user as returned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub company: Company,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// Request payload for creating a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: Company,
}

/// Request payload for a partial update. Only the fields present in the JSON
/// are applied; omitted fields remain unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none() && self.company.is_none()
    }
}

/// Whatever subset of a user the server echoes back after a create or
/// update. Every field present here is authoritative.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEcho {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<Company>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_accepts_jsonplaceholder_shape() {
        let raw = r#"{
            "id": 1,
            "name": "Leanne Graham",
            "username": "Bret",
            "email": "Sincere@april.biz",
            "address": {
                "street": "Kulas Light",
                "suite": "Apt. 556",
                "city": "Gwenborough",
                "zipcode": "92998-3874",
                "geo": { "lat": "-37.3159", "lng": "81.1496" }
            },
            "phone": "1-770-736-8031 x56442",
            "website": "hildegard.org",
            "company": {
                "name": "Romaguera-Crona",
                "catchPhrase": "Multi-layered client-server neural-net",
                "bs": "harness real-time e-markets"
            }
        }"#;
        let user: User = serde_json::from_str(raw).unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.company.name, "Romaguera-Crona");
        assert_eq!(user.username.as_deref(), Some("Bret"));
        assert_eq!(
            user.address.as_ref().unwrap().one_line(),
            "Kulas Light, Gwenborough 92998-3874"
        );
    }

    #[test]
    fn user_without_company_defaults_to_empty_name() {
        let user: User =
            serde_json::from_str(r#"{"id":2,"name":"A","email":"a@x.io","phone":"1"}"#).unwrap();
        assert_eq!(user.company.name, "");
        assert!(user.address.is_none());
    }

    #[test]
    fn patch_omits_absent_fields() {
        let patch = UserPatch {
            email: Some("new@x.io".to_string()),
            ..UserPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "email": "new@x.io" }));
    }

    #[test]
    fn company_serializes_catch_phrase_in_camel_case() {
        let company = Company {
            name: "Deckow-Crist".to_string(),
            catch_phrase: Some("Proactive didactic contingency".to_string()),
            bs: None,
        };
        let json = serde_json::to_value(&company).unwrap();
        assert_eq!(json["catchPhrase"], "Proactive didactic contingency");
        assert!(json.get("bs").is_none());
    }

    #[test]
    fn echo_tolerates_partial_body() {
        let echo: UserEcho = serde_json::from_str(r#"{"id":11}"#).unwrap();
        assert_eq!(echo.id, Some(11));
        assert!(echo.name.is_none());
    }
}
