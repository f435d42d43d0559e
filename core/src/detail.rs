//! Single-user detail lookup.
//!
//! A missing user is a normal outcome here, not an error: the detail screen
//! shows "User not found." and the rest of the app carries on.

use crate::client::UsersClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::User;

const EMPTY: &str = "—";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailState {
    Found(User),
    NotFound,
}

impl DetailState {
    /// Labelled values shown on the detail card, with a dash for blanks.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let DetailState::Found(user) = self else {
            return Vec::new();
        };
        let or_dash = |value: &str| {
            if value.is_empty() {
                EMPTY.to_string()
            } else {
                value.to_string()
            }
        };
        vec![
            ("Email", or_dash(&user.email)),
            ("Phone", or_dash(&user.phone)),
            ("Company", or_dash(&user.company.name)),
            (
                "Address",
                user.address
                    .as_ref()
                    .map(|a| a.one_line())
                    .unwrap_or_else(|| EMPTY.to_string()),
            ),
        ]
    }
}

pub fn build_detail(client: &UsersClient, id: u64) -> HttpRequest {
    client.build_get_user(id)
}

pub fn parse_detail(client: &UsersClient, response: HttpResponse) -> Result<DetailState, ApiError> {
    match client.parse_get_user(response) {
        Ok(user) => Ok(DetailState::Found(user)),
        Err(ApiError::NotFound) => Ok(DetailState::NotFound),
        Err(e) => Err(e),
    }
}
