//! Anti-forgery tokens for state-changing admin actions.
//!
//! A nonce is an HMAC-SHA256 over the action name, the operator identity and
//! a 12-hour tick. It is accepted during the tick it was issued in and the one
//! after, so a token lives between 12 and 24 hours.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use strum::{AsRefStr, EnumString};
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

const NONCE_KEY_SIZE: usize = 32;
const TICK_SECONDS: i64 = 12 * 60 * 60;

/// The admin action a nonce is bound to. A token minted for one action is
/// rejected for every other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum NonceAction {
    Sync,
    Toggle,
    Settings,
    ValidateKey,
}

#[derive(Clone)]
pub struct NonceKey {
    key: [u8; NONCE_KEY_SIZE],
}

impl std::fmt::Debug for NonceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NonceKey(<redacted>)")
    }
}

impl NonceKey {
    pub fn from_bytes(key: [u8; NONCE_KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Parse a hex-encoded 32-byte secret.
    pub fn from_hex(encoded: &str) -> Result<Self> {
        let decoded = hex::decode(encoded.trim())
            .map_err(|e| AppError::Internal(format!("Invalid nonce secret: {}", e)))?;
        if decoded.len() != NONCE_KEY_SIZE {
            return Err(AppError::Internal(format!(
                "Nonce secret must be {} bytes, got {}",
                NONCE_KEY_SIZE,
                decoded.len()
            )));
        }
        let mut key = [0u8; NONCE_KEY_SIZE];
        key.copy_from_slice(&decoded);
        Ok(Self { key })
    }

    /// Random key; nonces issued with it do not survive a restart.
    pub fn generate() -> Self {
        use rand::RngCore;
        use rand::rngs::OsRng;
        let mut key = [0u8; NONCE_KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    fn sign(&self, action: NonceAction, operator_id: &str, tick: i64) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|_| AppError::Internal("Invalid nonce key".into()))?;
        mac.update(format!("{}|{}|{}", action.as_ref(), operator_id, tick).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    pub fn create(&self, action: NonceAction, operator_id: &str) -> Result<String> {
        self.create_at(action, operator_id, Utc::now().timestamp())
    }

    pub fn create_at(&self, action: NonceAction, operator_id: &str, now: i64) -> Result<String> {
        self.sign(action, operator_id, now.div_euclid(TICK_SECONDS))
    }

    pub fn verify(&self, action: NonceAction, operator_id: &str, nonce: &str) -> Result<bool> {
        self.verify_at(action, operator_id, nonce, Utc::now().timestamp())
    }

    pub fn verify_at(
        &self,
        action: NonceAction,
        operator_id: &str,
        nonce: &str,
        now: i64,
    ) -> Result<bool> {
        let tick = now.div_euclid(TICK_SECONDS);
        let provided = nonce.trim().as_bytes();

        for candidate_tick in [tick, tick - 1] {
            let expected = self.sign(action, operator_id, candidate_tick)?;
            let expected = expected.as_bytes();
            // Length is public (always 64 hex chars), only the content is compared in constant time
            if expected.len() == provided.len() && bool::from(expected.ct_eq(provided)) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
