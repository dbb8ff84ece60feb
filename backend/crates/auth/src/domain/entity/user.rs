//! User Entity

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;

use crate::domain::value_object::{UserId, email::Email, person_name::PersonName};

/// Registered account.
///
/// `email` is unique across users; `password` is the self-describing
/// Argon2id hash and is never exposed outside the auth crate's responses.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub name: PersonName,
    pub surname: PersonName,
    pub email: Email,
    pub password: HashedPassword,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// New non-admin user created at `now`.
    pub fn new(
        name: PersonName,
        surname: PersonName,
        email: Email,
        password: HashedPassword,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: UserId::new(),
            name,
            surname,
            email,
            password,
            is_admin: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_password(&mut self, password: HashedPassword, now: DateTime<Utc>) {
        self.password = password;
        self.updated_at = now;
    }
}
