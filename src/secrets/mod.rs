//! At-rest secret handling for the encrypted env file.
//!
//! The config surface only ever sees plain `KEY=VALUE` pairs; this module is
//! the collaborator that turns `key.key` + `.env.enc` into those pairs.
//! Wire format of the encrypted file: 12-byte random nonce followed by the
//! ChaCha20Poly1305 ciphertext.

use chacha20poly1305::aead::Aead;
use chacha20poly1305::{ChaCha20Poly1305, Key, KeyInit, Nonce};
use rand::RngCore;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

pub type SecretsError = Box<dyn std::error::Error + Send + Sync>;

pub const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Load the symmetric key from `path`, generating and persisting a fresh one
/// when the file does not exist yet.
pub fn load_key(path: impl AsRef<Path>) -> Result<[u8; KEY_LEN], SecretsError> {
    let path = path.as_ref();
    if !path.exists() {
        return generate_key(path);
    }
    let bytes = fs::read(path)?;
    let key: [u8; KEY_LEN] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| data_err(format!("key file {} is not {} bytes", path.display(), KEY_LEN)))?;
    Ok(key)
}

/// Generate a random key and write it to `path`.
pub fn generate_key(path: impl AsRef<Path>) -> Result<[u8; KEY_LEN], SecretsError> {
    let mut key = [0u8; KEY_LEN];
    rand::thread_rng().fill_bytes(&mut key);
    fs::write(path.as_ref(), key)?;
    info!(path = %path.as_ref().display(), "generated new secrets key");
    Ok(key)
}

/// Encrypt UTF-8 text under `key`. Output is nonce || ciphertext.
pub fn encrypt_text(plain: &str, key: &[u8; KEY_LEN]) -> Result<Vec<u8>, SecretsError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plain.as_bytes())
        .map_err(|_| data_err("encryption failed".to_string()))?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt a nonce || ciphertext token back into UTF-8 text.
pub fn decrypt_text(token: &[u8], key: &[u8; KEY_LEN]) -> Result<String, SecretsError> {
    if token.len() < NONCE_LEN {
        return Err(data_err("encrypted token too short".to_string()));
    }
    let (nonce, ciphertext) = token.split_at(NONCE_LEN);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let plain = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| data_err("decryption failed: wrong key or corrupt file".to_string()))?;
    String::from_utf8(plain).map_err(|e| data_err(format!("decrypted data is not UTF-8: {}", e)))
}

/// Decrypt `env_path` and parse its `KEY=VALUE` lines.
///
/// A missing file is not an error - the service runs fine without secrets -
/// so it yields an empty map. A present-but-undecryptable file is an error.
pub fn load_encrypted_env(
    env_path: impl AsRef<Path>,
    key: &[u8; KEY_LEN],
) -> Result<HashMap<String, String>, SecretsError> {
    let path = env_path.as_ref();
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let token = fs::read(path)?;
    let plain = decrypt_text(&token, key)?;

    let mut vars = HashMap::new();
    for line in plain.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            vars.insert(k.trim().to_string(), v.trim().to_string());
        }
    }
    Ok(vars)
}

/// Export decrypted vars into the process environment, without overriding
/// anything already set there.
pub fn apply_env(vars: &HashMap<String, String>) {
    for (k, v) in vars {
        if std::env::var_os(k).is_none() {
            std::env::set_var(k, v);
        }
    }
}

fn data_err(msg: String) -> SecretsError {
    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, msg))
}
