//! Sign Up

use std::fmt;
use std::net::IpAddr;

use crate::application::authentication::{Authentication, SignedIn};
use crate::domain::entity::user::User;
use crate::domain::repository::{TokenStore, UserStore};
use crate::domain::value_object::{email::Email, person_name::PersonName};
use crate::error::{AuthError, AuthResult};

pub struct SignUpInput {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
    /// Persistent cookie instead of a browser-session one
    pub remember_me: bool,
}

impl fmt::Debug for SignUpInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpInput")
            .field("name", &self.name)
            .field("surname", &self.surname)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("remember_me", &self.remember_me)
            .finish()
    }
}

impl<U, T> Authentication<U, T>
where
    U: UserStore,
    T: TokenStore,
{
    /// Register a user and log them in.
    ///
    /// Fails with [`AuthError::UserExists`] when the e-mail is taken, whether
    /// detected by the pre-check or by the store on insert. If the session
    /// cannot be opened the new user row is removed again.
    pub async fn sign_up(&self, input: SignUpInput, ip: Option<IpAddr>) -> AuthResult<SignedIn> {
        let SignUpInput {
            name,
            surname,
            email,
            password,
            remember_me,
        } = input;

        let name = PersonName::new(&name, "Name")?;
        let surname = PersonName::new(&surname, "Surname")?;
        let email = Email::new(&email)?;

        if self.users.exists_by_email(&email).await? {
            return Err(AuthError::UserExists);
        }

        let password = self.hash_password(password).await?;
        let now = self.now();
        let user = User::new(name, surname, email, password, now);

        self.users.create(&user).await?;

        let cookie = match self.open_session(&user, ip, remember_me, now).await {
            Ok(cookie) => cookie,
            Err(e) => {
                self.discard_user(&user).await;
                return Err(e);
            }
        };

        tracing::info!(user_id = %user.user_id, "User signed up");

        Ok(SignedIn { user, cookie })
    }

    async fn discard_user(&self, user: &User) {
        if let Err(e) = self.users.delete(&user.user_id).await {
            tracing::error!(
                user_id = %user.user_id,
                error = %e,
                "Failed to remove user after session creation failed"
            );
        }
    }
}
