//! Form validation for create and edit submissions.
//!
//! Values are trimmed before they are checked and stored. The email rule is
//! the one browsers apply to `<input type="email">`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Field, FieldError, Problem, ValidationErrors};
use crate::record::UserRecord;
use crate::types::{Company, NewUser, UserPatch};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern is valid")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Raw values of the add/edit user form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company_name: String,
}

impl UserForm {
    /// Form pre-filled from an existing record, as shown by the edit dialog.
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            name: record.name.clone(),
            email: record.email.clone(),
            phone: record.phone.clone(),
            company_name: record.company.name.clone(),
        }
    }

    /// Validate every field and build the create payload.
    pub fn validate(&self) -> Result<NewUser, ValidationErrors> {
        let mut errors = Vec::new();
        let name = required(Field::Name, &self.name, &mut errors);
        let email = required(Field::Email, &self.email, &mut errors);
        if !email.is_empty() && !is_valid_email(&email) {
            errors.push(FieldError {
                field: Field::Email,
                problem: Problem::InvalidEmail,
            });
        }
        let phone = required(Field::Phone, &self.phone, &mut errors);
        let company_name = required(Field::CompanyName, &self.company_name, &mut errors);

        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }
        Ok(NewUser {
            name,
            email,
            phone,
            company: Company::named(company_name),
        })
    }

    /// Validate and turn a submitted edit form into a patch carrying all four
    /// fields. The company keeps its other attributes from `current`.
    pub fn to_patch(&self, current: &UserRecord) -> Result<UserPatch, ValidationErrors> {
        let new_user = self.validate()?;
        let company = Company {
            name: new_user.company.name,
            ..current.company.clone()
        };
        Ok(UserPatch {
            name: Some(new_user.name),
            email: Some(new_user.email),
            phone: Some(new_user.phone),
            company: Some(company),
        })
    }
}

/// Check the fields a patch carries. Absent fields are left alone and are
/// therefore always valid. Present fields are trimmed in place.
pub fn validate_patch(patch: &mut UserPatch) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    if let Some(name) = patch.name.as_mut() {
        *name = required(Field::Name, name, &mut errors);
    }
    if let Some(email) = patch.email.as_mut() {
        *email = required(Field::Email, email, &mut errors);
        if !email.is_empty() && !is_valid_email(email) {
            errors.push(FieldError {
                field: Field::Email,
                problem: Problem::InvalidEmail,
            });
        }
    }
    if let Some(phone) = patch.phone.as_mut() {
        *phone = required(Field::Phone, phone, &mut errors);
    }
    if let Some(company) = patch.company.as_mut() {
        company.name = required(Field::CompanyName, &company.name, &mut errors);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

fn required(field: Field, value: &str, errors: &mut Vec<FieldError>) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(FieldError {
            field,
            problem: Problem::Missing,
        });
    }
    trimmed.to_string()
}
