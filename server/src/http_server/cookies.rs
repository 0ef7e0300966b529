use std::{fmt::Debug, ops::Deref};

use base64::{DecodeError, Engine};

#[derive(Clone)]
pub struct CookieKey(pub tower_cookies::Key);

impl Deref for CookieKey {
    type Target = tower_cookies::Key;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl CookieKey {
    /// Reads a base64 master key from `COOKIE_KEY`. Without one a random key
    /// is generated, so sessions and search caches do not survive a restart.
    pub fn from_env_or_generate() -> Result<Self, DecodeError> {
        let key = match std::env::var("COOKIE_KEY") {
            Ok(encoded) => {
                let raw = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;

                tower_cookies::Key::derive_from(&raw)
            }
            Err(_) => {
                tracing::warn!("COOKIE_KEY is not set, generating a temporary cookie key");

                tower_cookies::Key::generate()
            }
        };

        Ok(Self(key))
    }
}

impl Debug for CookieKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieKey")
            .field("value", &"[omitted]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_the_key() {
        let key = CookieKey(tower_cookies::Key::generate());

        assert_eq!(format!("{key:?}"), "CookieKey { value: \"[omitted]\" }");
    }
}
