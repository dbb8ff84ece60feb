//! PostgreSQL Store Implementations

use chrono::{DateTime, Utc};
use kernel::error::conversions::is_unique_violation;
use platform::password::HashedPassword;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{
    token::{Token, TokenType},
    user::User,
};
use crate::domain::repository::{TokenStore, UserStore};
use crate::domain::value_object::{UserId, email::Email, person_name::PersonName};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed user store
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// PostgreSQL-backed token store
#[derive(Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// User Store Implementation
// ============================================================================

impl UserStore for PgUserStore {
    async fn create(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                name,
                surname,
                email,
                password_hash,
                is_admin,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.name.as_str())
        .bind(user.surname.as_str())
        .bind(user.email.as_str())
        .bind(user.password.as_phc_string())
        .bind(user.is_admin)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::UserExists
            } else {
                AuthError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                name,
                surname,
                email,
                password_hash,
                is_admin,
                created_at,
                updated_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                user_id,
                name,
                surname,
                email,
                password_hash,
                is_admin,
                created_at,
                updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn update_password(
        &self,
        user_id: &UserId,
        password: &HashedPassword,
        updated_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE users SET
                password_hash = $2,
                updated_at = $3
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(password.as_phc_string())
        .bind(updated_at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(AuthError::Internal(format!("User {} not found", user_id)));
        }

        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> AuthResult<()> {
        sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

// ============================================================================
// Token Store Implementation
// ============================================================================

impl TokenStore for PgTokenStore {
    async fn create(&self, token: &Token) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tokens (
                token,
                token_type,
                user_id,
                ip_address,
                valid_until,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&token.value)
        .bind(token.token_type.as_str())
        .bind(token.user_id.as_uuid())
        .bind(&token.ip_address)
        .bind(token.valid_until)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::TokenExists
            } else {
                AuthError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn find(&self, value: &str, token_type: TokenType) -> AuthResult<Option<Token>> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT
                token,
                token_type,
                user_id,
                ip_address,
                valid_until,
                created_at
            FROM tokens
            WHERE token = $1 AND token_type = $2
            "#,
        )
        .bind(value)
        .bind(token_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_token()).transpose()
    }

    async fn delete(&self, value: &str, token_type: TokenType) -> AuthResult<()> {
        sqlx::query("DELETE FROM tokens WHERE token = $1 AND token_type = $2")
            .bind(value)
            .bind(token_type.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_all_for_user(
        &self,
        user_id: &UserId,
        token_type: TokenType,
    ) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM tokens WHERE user_id = $1 AND token_type = $2")
            .bind(user_id.as_uuid())
            .bind(token_type.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted)
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM tokens WHERE valid_until < $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(tokens_deleted = deleted, "Cleaned up expired tokens");

        Ok(deleted)
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    name: String,
    surname: String,
    email: String,
    password_hash: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let password = HashedPassword::from_phc_string(self.password_hash).map_err(|e| {
            AuthError::Internal(format!("Invalid password hash for {}: {}", self.user_id, e))
        })?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            name: PersonName::from_db(self.name),
            surname: PersonName::from_db(self.surname),
            email: Email::from_db(self.email),
            password,
            is_admin: self.is_admin,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    token: String,
    token_type: String,
    user_id: Uuid,
    ip_address: Option<String>,
    valid_until: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TokenRow {
    fn into_token(self) -> AuthResult<Token> {
        let token_type = TokenType::from_db(&self.token_type).ok_or_else(|| {
            AuthError::Internal(format!("Invalid token_type: {}", self.token_type))
        })?;

        Ok(Token {
            value: self.token,
            token_type,
            user_id: UserId::from_uuid(self.user_id),
            ip_address: self.ip_address,
            valid_until: self.valid_until,
            created_at: self.created_at,
        })
    }
}
