//! Secure cookie key generator
//!
//! Prints a fresh `hashKey$blockKey` pair for `CURRENT_SECURE_COOKIE_KEY`.
//! To rotate: move the current value into `PREVIOUS_SECURE_COOKIE_KEY`,
//! deploy the new pair as current, and clear the previous one after one full
//! `AUTH_TOKEN_LIFETIME`.

use platform::secure_cookie::CookieKeyPair;

fn main() -> anyhow::Result<()> {
    let pair = CookieKeyPair::generate()?;
    println!("{}", pair.to_key_string());
    Ok(())
}
