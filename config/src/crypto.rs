//! Sealing of secrets kept on disk (the session's bearer token).
//!
//! Uses AES-256-GCM with a machine-specific key derived from the hostname and
//! username, so a copied token file is useless on another machine.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use rand::Rng;
use sha2::{Digest, Sha256};

const NONCE_SIZE: usize = 12;
const KEY_SALT: &[u8] = b"math-buddy-session-token-v1";

fn derive_key() -> [u8; 32] {
    let hostname = whoami::fallible::hostname().unwrap_or_else(|_| "unknown".to_string());
    let username = whoami::username();

    let mut hasher = Sha256::new();
    hasher.update(KEY_SALT);
    hasher.update(hostname.as_bytes());
    hasher.update(b":");
    hasher.update(username.as_bytes());

    let result = hasher.finalize();
    let mut key = [0u8; 32];
    key.copy_from_slice(&result);
    key
}

/// Seal a secret. Output is base64(nonce || ciphertext).
pub fn seal(plaintext: &str) -> Result<String, String> {
    let key = derive_key();
    let cipher =
        Aes256Gcm::new_from_slice(&key).map_err(|e| format!("Failed to create cipher: {}", e))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rng().fill(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| format!("Encryption failed: {}", e))?;

    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(&sealed))
}

/// Open a value produced by [`seal`].
pub fn unseal(sealed: &str) -> Result<String, String> {
    let key = derive_key();
    let cipher =
        Aes256Gcm::new_from_slice(&key).map_err(|e| format!("Failed to create cipher: {}", e))?;

    let raw = BASE64
        .decode(sealed.trim())
        .map_err(|e| format!("Failed to decode base64: {}", e))?;

    if raw.len() < NONCE_SIZE {
        return Err("Sealed data too short".to_string());
    }

    let (nonce_bytes, ciphertext) = raw.split_at(NONCE_SIZE);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|e| format!("Decryption failed: {}", e))?;

    String::from_utf8(plaintext).map_err(|e| format!("Invalid UTF-8 in sealed data: {}", e))
}
