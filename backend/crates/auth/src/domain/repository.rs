//! Store Contracts
//!
//! Persistence interfaces consumed by the application layer. Implementations
//! live in `infra`. Absence is always `Ok(None)`, never an error.

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;

use crate::domain::entity::{
    token::{Token, TokenType},
    user::User,
};
use crate::domain::value_object::{UserId, email::Email};
use crate::error::AuthResult;

/// User store
#[trait_variant::make(UserStore: Send)]
pub trait LocalUserStore {
    /// Insert a new user.
    ///
    /// Must fail with [`AuthError::UserExists`](crate::error::AuthError::UserExists)
    /// when the e-mail is already taken. This is the authoritative uniqueness
    /// check; callers may pre-check with [`exists_by_email`](Self::exists_by_email)
    /// but can still lose the race.
    async fn create(&self, user: &User) -> AuthResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Replace the stored password hash.
    async fn update_password(
        &self,
        user_id: &UserId,
        password: &HashedPassword,
        updated_at: DateTime<Utc>,
    ) -> AuthResult<()>;

    /// Remove a user. Missing user is not an error.
    async fn delete(&self, user_id: &UserId) -> AuthResult<()>;
}

/// Token store
#[trait_variant::make(TokenStore: Send)]
pub trait LocalTokenStore {
    /// Insert a token. Never overwrites: a value collision fails with
    /// [`AuthError::TokenExists`](crate::error::AuthError::TokenExists).
    async fn create(&self, token: &Token) -> AuthResult<()>;

    async fn find(&self, value: &str, token_type: TokenType) -> AuthResult<Option<Token>>;

    /// Idempotent: deleting an unknown token succeeds.
    async fn delete(&self, value: &str, token_type: TokenType) -> AuthResult<()>;

    /// Delete every token of `token_type` owned by `user_id`. Returns the count.
    async fn delete_all_for_user(&self, user_id: &UserId, token_type: TokenType) -> AuthResult<u64>;

    /// Delete tokens whose `valid_until` is before `now`. Returns the count.
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64>;
}
