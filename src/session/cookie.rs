//! Signed session cookie: a v4 UUID plus a keyed BLAKE3 MAC.
//!
//! The session id is random, but clients must not be able to forge one that
//! the server will trust blindly, so the cookie value is `<uuid>.<mac>` with
//! the MAC keyed by a derivation of the configured secret. Anything that
//! fails verification is treated as absent and a fresh session is minted.

use uuid::Uuid;

pub const COOKIE_NAME: &str = "bathtub_session";

const KEY_CONTEXT: &str = "ai-bathtub 2025 session cookie v1";

/// Mints and verifies session cookie values. Cheap to clone.
#[derive(Clone)]
pub struct CookieSigner {
    key: [u8; 32],
}

impl CookieSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            key: blake3::derive_key(KEY_CONTEXT, secret.as_bytes()),
        }
    }

    fn mac(&self, id: Uuid) -> blake3::Hash {
        blake3::keyed_hash(&self.key, id.as_bytes())
    }

    /// Cookie value for a session id: `<uuid>.<mac-hex>`.
    pub fn mint(&self, id: Uuid) -> String {
        format!("{}.{}", id, self.mac(id).to_hex())
    }

    /// Recovers the session id from a cookie value, or `None` if the value
    /// is malformed or its MAC does not check out. `blake3::Hash` equality
    /// is constant-time.
    pub fn verify(&self, value: &str) -> Option<Uuid> {
        let (id_part, mac_part) = value.split_once('.')?;
        let id = Uuid::parse_str(id_part).ok()?;
        let claimed = blake3::Hash::from_hex(mac_part).ok()?;
        (claimed == self.mac(id)).then_some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_cookies_verify() {
        let signer = CookieSigner::new("secret");
        let id = Uuid::new_v4();
        assert_eq!(signer.verify(&signer.mint(id)), Some(id));
    }

    #[test]
    fn tampered_id_is_rejected() {
        let signer = CookieSigner::new("secret");
        let minted = signer.mint(Uuid::new_v4());
        let (_, mac) = minted.split_once('.').unwrap();
        let forged = format!("{}.{}", Uuid::new_v4(), mac);
        assert_eq!(signer.verify(&forged), None);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let id = Uuid::new_v4();
        let minted = CookieSigner::new("secret-a").mint(id);
        assert_eq!(CookieSigner::new("secret-b").verify(&minted), None);
    }

    #[test]
    fn garbage_values_are_rejected() {
        let signer = CookieSigner::new("secret");
        assert_eq!(signer.verify(""), None);
        assert_eq!(signer.verify("no-dot-here"), None);
        assert_eq!(signer.verify("not-a-uuid.abcd"), None);
        assert_eq!(signer.verify(&format!("{}.nothex", Uuid::new_v4())), None);
    }
}
