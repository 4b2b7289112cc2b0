// src/utils/crypto.rs

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Salt mixed into the key derivation so the raw secret never doubles as key
/// material elsewhere.
const KEY_DERIVATION_SALT: &[u8] = b"visionmatch-salt";

/// Nonce size for AES-256-GCM.
const NONCE_LEN: usize = 12;

/// Prefix marking the degraded (reversible but non-confidential) encoding
/// written when encryption itself fails.
const FALLBACK_PREFIX: &str = "b64:";

/// Field-level encryption for PII at rest, plus the one-way hash and token
/// generation used for audit identifiers.
///
/// Constructed once at startup and injected; never a process-wide global.
#[derive(Clone)]
pub struct CryptoContext {
    key: [u8; 32],
}

impl std::fmt::Debug for CryptoContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 鍵をログに出さない
        f.debug_struct("CryptoContext").finish_non_exhaustive()
    }
}

impl CryptoContext {
    /// Derive the AES-256-GCM key from the configured secret.
    ///
    /// Without a secret a random per-process key is generated, which means
    /// encrypted columns become permanently unreadable after a restart. That
    /// is a deployment hazard, so it is logged loudly rather than hidden.
    pub fn new(secret: Option<&str>) -> Self {
        let key = match secret {
            Some(secret) => {
                let mut hasher = Sha256::new();
                hasher.update(secret.as_bytes());
                hasher.update(KEY_DERIVATION_SALT);
                hasher.finalize().into()
            }
            None => {
                tracing::warn!(
                    "No ENCRYPTION_KEY configured. Using a random per-process key - \
                     encrypted data will NOT be readable after a restart!"
                );
                let mut key = [0u8; 32];
                rand::rngs::OsRng.fill_bytes(&mut key);
                key
            }
        };
        Self { key }
    }

    /// Encrypt a PII field. Output format is `hex(nonce):hex(ciphertext)`.
    ///
    /// Fails soft: if the cipher errors the value is stored as
    /// `b64:<base64>` so that writes never block on encryption failure. The
    /// degraded mode is not confidential and is logged as an error every
    /// time it happens.
    pub fn encrypt(&self, plaintext: &str) -> String {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        match cipher.encrypt(nonce, plaintext.as_bytes()) {
            Ok(ciphertext) => {
                format!("{}:{}", hex::encode(nonce_bytes), hex::encode(ciphertext))
            }
            Err(_) => {
                tracing::error!(
                    "PII encryption failed - falling back to reversible base64 encoding. \
                     This value is stored WITHOUT confidentiality."
                );
                format!("{}{}", FALLBACK_PREFIX, BASE64.encode(plaintext))
            }
        }
    }

    /// Decrypt a stored PII field. Returns `None` on malformed or tampered
    /// input; callers must treat `None` as "unavailable", not "empty".
    pub fn decrypt(&self, stored: &str) -> Option<String> {
        if let Some(encoded) = stored.strip_prefix(FALLBACK_PREFIX) {
            let bytes = BASE64.decode(encoded).ok()?;
            return String::from_utf8(bytes).ok();
        }

        let (nonce_hex, ciphertext_hex) = stored.split_once(':')?;
        let nonce_bytes = hex::decode(nonce_hex).ok()?;
        if nonce_bytes.len() != NONCE_LEN {
            return None;
        }
        let ciphertext = hex::decode(ciphertext_hex).ok()?;

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .ok()?;
        String::from_utf8(plaintext).ok()
    }

    /// One-way SHA-256 hex digest, for audit identifiers that must never be
    /// recoverable (e.g. email-log recipients).
    pub fn hash(&self, data: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// High-entropy hex token used as the public consent identifier.
    pub fn generate_token(&self) -> String {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}
