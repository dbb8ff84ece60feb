//! Cookie attribute policy
//!
//! Every auth cookie gets the same fixed attributes:
//! `HttpOnly`, `Path=/`, configured `Domain`, `SameSite` and `Secure`.
//! Only persistent cookies carry `Expires` and `Max-Age`.

use std::fmt;
use std::str::FromStr;

use axum_extra::extract::cookie::{self, Cookie};
use chrono::{DateTime, Duration, Utc};
use time::OffsetDateTime;

/// SameSite policy for cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown SameSite policy: {0}")]
pub struct ParseSameSiteError(String);

impl FromStr for SameSite {
    type Err = ParseSameSiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(SameSite::Strict),
            "lax" => Ok(SameSite::Lax),
            "none" => Ok(SameSite::None),
            _ => Err(ParseSameSiteError(s.to_string())),
        }
    }
}

impl From<SameSite> for cookie::SameSite {
    fn from(value: SameSite) -> Self {
        match value {
            SameSite::Strict => cookie::SameSite::Strict,
            SameSite::Lax => cookie::SameSite::Lax,
            SameSite::None => cookie::SameSite::None,
        }
    }
}

/// Attributes shared by the issued and the expired form of one cookie.
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    pub name: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub same_site: SameSite,
}

impl CookiePolicy {
    /// Persistent cookie carrying `value` until `expires_at`.
    pub fn issue(
        &self,
        value: String,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Cookie<'static> {
        let max_age = (expires_at - now).num_seconds().max(0);
        let mut cookie = self.base(value);
        cookie.set_expires(to_offset(expires_at));
        cookie.set_max_age(time::Duration::seconds(max_age));
        cookie
    }

    /// Browser-session cookie: no `Expires` and no `Max-Age`, so the browser
    /// drops it when it closes.
    pub fn issue_session(&self, value: String) -> Cookie<'static> {
        self.base(value)
    }

    /// Empty cookie that makes the browser drop the current one.
    ///
    /// Built from the policy only, so it can be produced even when no key
    /// material is usable.
    pub fn expired(&self, now: DateTime<Utc>) -> Cookie<'static> {
        let mut cookie = self.base(String::new());
        cookie.set_expires(to_offset(now - Duration::hours(24)));
        cookie.set_max_age(time::Duration::ZERO);
        cookie
    }

    fn base(&self, value: String) -> Cookie<'static> {
        let mut cookie = Cookie::build((self.name.clone(), value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(cookie::SameSite::from(self.same_site))
            .build();

        if let Some(domain) = &self.domain {
            cookie.set_domain(domain.clone());
        }
        cookie
    }
}

fn to_offset(instant: DateTime<Utc>) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(instant.timestamp()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> CookiePolicy {
        CookiePolicy {
            name: "auth".to_string(),
            domain: Some("example.com".to_string()),
            secure: true,
            same_site: SameSite::Lax,
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_750_000_000, 0).unwrap()
    }

    #[test]
    fn test_issued_cookie_attributes() {
        let expires_at = now() + Duration::minutes(30);
        let cookie = policy().issue("abc".to_string(), now(), expires_at);

        assert_eq!(cookie.name(), "auth");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(cookie::SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(30 * 60)));
        assert_eq!(
            cookie.expires_datetime().map(|e| e.unix_timestamp()),
            Some(expires_at.timestamp())
        );
    }

    #[test]
    fn test_session_cookie_has_no_lifetime() {
        let cookie = policy().issue_session("abc".to_string());

        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.max_age(), None);
        assert_eq!(cookie.expires(), None);

        let header = cookie.to_string();
        assert!(!header.contains("Max-Age"));
        assert!(!header.contains("Expires"));
    }

    #[test]
    fn test_expired_cookie() {
        let cookie = policy().expired(now());

        assert_eq!(cookie.name(), "auth");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(
            cookie.expires_datetime().map(|e| e.unix_timestamp()),
            Some((now() - Duration::hours(24)).timestamp())
        );
    }

    #[test]
    fn test_insecure_policy_without_domain() {
        let policy = CookiePolicy {
            domain: None,
            secure: false,
            ..policy()
        };
        let cookie = policy.issue("v".to_string(), now(), now() + Duration::hours(1));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.domain(), None);
        assert!(!cookie.to_string().contains("Secure"));
    }

    #[test]
    fn test_same_site_from_str() {
        assert_eq!("strict".parse::<SameSite>(), Ok(SameSite::Strict));
        assert_eq!(" LAX ".parse::<SameSite>(), Ok(SameSite::Lax));
        assert_eq!("None".parse::<SameSite>(), Ok(SameSite::None));
        assert!("sometimes".parse::<SameSite>().is_err());
    }
}
