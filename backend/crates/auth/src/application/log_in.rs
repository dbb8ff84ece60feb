//! Log In

use std::net::IpAddr;

use platform::password::ClearTextPassword;

use crate::application::authentication::{Authentication, SignedIn};
use crate::domain::repository::{TokenStore, UserStore};
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

impl<U, T> Authentication<U, T>
where
    U: UserStore,
    T: TokenStore,
{
    /// Check credentials and open a new session.
    ///
    /// Unknown e-mail and wrong password both yield
    /// [`AuthError::InvalidCredentials`]; no token is written on failure.
    pub async fn log_in(
        &self,
        email: &str,
        password: String,
        remember_me: bool,
        ip: Option<IpAddr>,
    ) -> AuthResult<SignedIn> {
        let password = ClearTextPassword::new(password);

        let user = match Email::new(email) {
            Ok(email) => self.users.find_by_email(&email).await?,
            Err(_) => None,
        };

        let Some(user) = user else {
            // Burn one verification so unknown e-mails cost the same as wrong passwords
            let _ = self.verify_password(password, &self.decoy_hash).await;
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify_password(password, &user.password).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let now = self.now();
        let cookie = self.open_session(&user, ip, remember_me, now).await?;

        tracing::info!(user_id = %user.user_id, "User logged in");

        Ok(SignedIn { user, cookie })
    }
}
