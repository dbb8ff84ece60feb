//! Password reset and password change
//!
//! Delivering the reset token (e-mail) is the caller's job.

use crate::application::authentication::Authentication;
use crate::domain::entity::token::{Token, TokenType, validate_token};
use crate::domain::entity::user::User;
use crate::domain::repository::{TokenStore, UserStore};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

impl<U, T> Authentication<U, T>
where
    U: UserStore,
    T: TokenStore,
{
    /// Issue a reset token for the account registered under `email`,
    /// replacing any outstanding one.
    ///
    /// Returns [`AuthError::UnregisteredEmail`] for unknown addresses. HTTP
    /// callers must answer that case exactly like a success.
    pub async fn generate_password_reset_token(&self, email: &str) -> AuthResult<(User, String)> {
        let email = Email::new(email)?;
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UnregisteredEmail)?;

        self.tokens
            .delete_all_for_user(&user.user_id, TokenType::PasswordReset)
            .await?;

        let token = Token::issue(
            user.user_id,
            TokenType::PasswordReset,
            None,
            self.reset_token_lifetime,
            self.now(),
        )?;
        self.tokens.create(&token).await?;

        tracing::info!(user_id = %user.user_id, "Password reset token issued");

        Ok((user, token.value))
    }

    pub async fn validate_password_reset_token(&self, value: &str) -> AuthResult<bool> {
        Ok(self.live_reset_token(value).await?.is_some())
    }

    /// Owner of a live reset token, `None` if the token is unusable.
    pub async fn user_from_password_reset_token(&self, value: &str) -> AuthResult<Option<User>> {
        match self.live_reset_token(value).await? {
            Some(token) => self.users.find_by_id(&token.user_id).await,
            None => Ok(None),
        }
    }

    /// Set a new password using a reset token. The token is consumed.
    pub async fn reset_password(&self, value: &str, new_password: String) -> AuthResult<User> {
        let mut user = self
            .user_from_password_reset_token(value)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        self.change_password(&mut user, new_password).await?;
        Ok(user)
    }

    /// Store a new password hash and revoke every session and reset token
    /// of the user.
    pub async fn change_password(&self, user: &mut User, new_password: String) -> AuthResult<()> {
        let hashed = self.hash_password(new_password).await?;
        let now = self.now();

        self.users
            .update_password(&user.user_id, &hashed, now)
            .await?;
        user.set_password(hashed, now);

        let sessions = self
            .tokens
            .delete_all_for_user(&user.user_id, TokenType::Authentication)
            .await?;
        let resets = self
            .tokens
            .delete_all_for_user(&user.user_id, TokenType::PasswordReset)
            .await?;

        tracing::info!(
            user_id = %user.user_id,
            sessions_revoked = sessions,
            reset_tokens_revoked = resets,
            "Password changed"
        );

        Ok(())
    }

    async fn live_reset_token(&self, value: &str) -> AuthResult<Option<Token>> {
        if value.is_empty() {
            return Ok(None);
        }

        let now = self.now();
        let token = self.tokens.find(value, TokenType::PasswordReset).await?;
        Ok(token.filter(|t| {
            t.value == value && validate_token(Some(t), TokenType::PasswordReset, now)
        }))
    }
}
