//! User profile and sign-up payloads.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::contact::ContactNumber;
use super::email::Email;
use super::id::UserId;
use super::role::Role;

/// Profile returned by `POST /auth/signin` and persisted in the `userInfo` slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl UserProfile {
    #[must_use]
    pub fn role(&self) -> Role {
        Role::from_roles(self.roles.iter().map(String::as_str))
    }
}

/// Body of `POST /auth/signup`. The confirmation password never leaves the form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: Email,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub contact_number: ContactNumber,
}
