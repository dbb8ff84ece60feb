//! In-memory stores

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;
use tokio::sync::RwLock;

use crate::domain::entity::{
    token::{Token, TokenType},
    user::User,
};
use crate::domain::repository::{TokenStore, UserStore};
use crate::domain::value_object::{UserId, email::Email};
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Flip the admin flag. There is no store operation for this; admins are
    /// granted out of band.
    pub async fn set_admin(&self, user_id: &UserId, is_admin: bool) -> bool {
        match self.users.write().await.get_mut(user_id) {
            Some(user) => {
                user.is_admin = is_admin;
                true
            }
            None => false,
        }
    }
}

impl UserStore for MemoryUserStore {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) || users.contains_key(&user.user_id) {
            return Err(AuthError::UserExists);
        }
        users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.users.read().await.values().any(|u| &u.email == email))
    }

    async fn update_password(
        &self,
        user_id: &UserId,
        password: &HashedPassword,
        updated_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        match self.users.write().await.get_mut(user_id) {
            Some(user) => {
                user.set_password(password.clone(), updated_at);
                Ok(())
            }
            None => Err(AuthError::Internal(format!("User {} not found", user_id))),
        }
    }

    async fn delete(&self, user_id: &UserId) -> AuthResult<()> {
        self.users.write().await.remove(user_id);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<(String, TokenType), Token>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    /// Number of live-or-expired tokens of `token_type` held by `user_id`.
    pub async fn count_for_user(&self, user_id: &UserId, token_type: TokenType) -> usize {
        self.tokens
            .read()
            .await
            .values()
            .filter(|t| &t.user_id == user_id && t.token_type == token_type)
            .count()
    }
}

impl TokenStore for MemoryTokenStore {
    async fn create(&self, token: &Token) -> AuthResult<()> {
        let mut tokens = self.tokens.write().await;
        let key = (token.value.clone(), token.token_type);
        if tokens.contains_key(&key) {
            return Err(AuthError::TokenExists);
        }
        tokens.insert(key, token.clone());
        Ok(())
    }

    async fn find(&self, value: &str, token_type: TokenType) -> AuthResult<Option<Token>> {
        Ok(self
            .tokens
            .read()
            .await
            .get(&(value.to_string(), token_type))
            .cloned())
    }

    async fn delete(&self, value: &str, token_type: TokenType) -> AuthResult<()> {
        self.tokens
            .write()
            .await
            .remove(&(value.to_string(), token_type));
        Ok(())
    }

    async fn delete_all_for_user(
        &self,
        user_id: &UserId,
        token_type: TokenType,
    ) -> AuthResult<u64> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| !(&t.user_id == user_id && t.token_type == token_type));
        Ok((before - tokens.len()) as u64)
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, t| t.valid_until >= now);
        Ok((before - tokens.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use crate::domain::value_object::person_name::PersonName;

    const PHC: &str = "$argon2id$v=19$m=1024,t=1,p=1$c2FsdHNhbHQ$aGFzaGhhc2hoYXNoaGFzaA";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn session(user_id: UserId, lifetime: Duration) -> Token {
        Token::issue(user_id, TokenType::Authentication, None, lifetime, now()).unwrap()
    }

    fn user(email: &str) -> User {
        User::new(
            PersonName::new("Ada", "Name").unwrap(),
            PersonName::new("Lovelace", "Surname").unwrap(),
            Email::new(email).unwrap(),
            HashedPassword::from_phc_string(PHC).unwrap(),
            now(),
        )
    }

    #[tokio::test]
    async fn test_user_email_is_unique() {
        let store = MemoryUserStore::new();
        store.create(&user("ada@example.com")).await.unwrap();

        let result = store.create(&user("ada@example.com")).await;
        assert!(matches!(result, Err(AuthError::UserExists)));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_user_lookup_and_delete() {
        let store = MemoryUserStore::new();
        let ada = user("ada@example.com");
        store.create(&ada).await.unwrap();

        let email = Email::new("ADA@example.com").unwrap();
        assert!(store.exists_by_email(&email).await.unwrap());
        assert_eq!(
            store.find_by_email(&email).await.unwrap().map(|u| u.user_id),
            Some(ada.user_id)
        );

        store.delete(&ada.user_id).await.unwrap();
        store.delete(&ada.user_id).await.unwrap();
        assert!(store.find_by_id(&ada.user_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_token_create_never_overwrites() {
        let store = MemoryTokenStore::new();
        let user_id = UserId::new();
        let token = session(user_id, Duration::hours(1));

        store.create(&token).await.unwrap();
        assert!(matches!(store.create(&token).await, Err(AuthError::TokenExists)));

        // Same value under another type is a different key
        let mut reset = token.clone();
        reset.token_type = TokenType::PasswordReset;
        store.create(&reset).await.unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_token_delete_is_idempotent() {
        let store = MemoryTokenStore::new();
        store.delete("missing", TokenType::Authentication).await.unwrap();

        let token = session(UserId::new(), Duration::hours(1));
        store.create(&token).await.unwrap();
        store.delete(&token.value, TokenType::Authentication).await.unwrap();
        store.delete(&token.value, TokenType::Authentication).await.unwrap();
        assert!(store.find(&token.value, TokenType::Authentication).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_all_for_user_and_cleanup() {
        let store = MemoryTokenStore::new();
        let owner = UserId::new();
        let other = UserId::new();

        for _ in 0..3 {
            let t = session(owner, Duration::hours(1));
            store.create(&t).await.unwrap();
        }
        let kept = session(other, Duration::minutes(5));
        store.create(&kept).await.unwrap();

        assert_eq!(store.delete_all_for_user(&owner, TokenType::Authentication).await.unwrap(), 3);
        assert_eq!(store.count_for_user(&other, TokenType::Authentication).await, 1);

        assert_eq!(store.cleanup_expired(now() + Duration::minutes(5)).await.unwrap(), 0);
        assert_eq!(store.cleanup_expired(now() + Duration::minutes(6)).await.unwrap(), 1);
    }
}
