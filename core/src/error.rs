//! Error types for the users client and the dashboard.
//!
//! # Design
//! `ApiError` covers everything that can go wrong between building a request
//! and parsing its response. `NotFound` gets a dedicated variant because the
//! detail view turns it into a regular state instead of an error. Validation
//! failures are collected per field so a form can show them inline.
//! `DashboardError` is what the coordinator hands back when an operation is
//! refused before anything is applied.

use std::fmt;

use thiserror::Error;

use crate::mutation::MutationId;
use crate::record::RecordId;

/// Errors returned by `UsersClient` and by settled mutations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a status other than the expected one.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The host could not complete the round-trip (connection refused,
    /// timeout, ...).
    #[error("transport failed: {0}")]
    Transport(String),

    /// A create succeeded but the response carried no identifier.
    #[error("server response is missing the record id")]
    MissingId,

    /// The server confirmed an id that another cached record already uses.
    #[error("server id {0} is already used by another record")]
    IdConflict(u64),
}

/// Form field a validation problem is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Email,
    Phone,
    CompanyName,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::CompanyName => "company name",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Problem {
    Missing,
    InvalidEmail,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Problem::Missing => "is required",
            Problem::InvalidEmail => "is not a valid email address",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {problem}")]
pub struct FieldError {
    pub field: Field,
    pub problem: Problem,
}

/// One or more rejected form fields, in form order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid form: ")?;
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn for_field(&self, field: Field) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }
}

/// Errors from coordinator operations that are refused up front.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("no cached user with id {0}")]
    UnknownRecord(RecordId),

    #[error("no in-flight mutation {0}")]
    UnknownMutation(MutationId),
}
