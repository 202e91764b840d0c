//! AES-256-GCM encryption for credentials carried by callers.
//!
//! Wire format: `base64(nonce[12] || ciphertext || tag[16])` over the JSON
//! form of [`Credentials`].

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use zeroize::Zeroize;

use crate::credentials::Credentials;
use crate::error::{Error, ErrorKind, Result};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// A 256-bit key held by the server. Zeroized on drop.
#[derive(Clone)]
pub struct EncryptionKey([u8; 32]);

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}

impl Drop for EncryptionKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl EncryptionKey {
    /// Decode a base64 key. It must decode to exactly 32 bytes.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let mut decoded = BASE64.decode(encoded.trim()).map_err(|e| {
            Error::with_source(ErrorKind::InvalidKey("key is not valid base64".to_string()), e)
        })?;

        if decoded.len() != 32 {
            let len = decoded.len();
            decoded.zeroize();
            return Err(Error::new(ErrorKind::InvalidKey(format!(
                "expected 32 bytes, got {}",
                len
            ))));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(Self(key))
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let generated = Aes256Gcm::generate_key(&mut OsRng);
        let mut key = [0u8; 32];
        key.copy_from_slice(&generated);
        Self(key)
    }

    /// Base64 form, suitable for `ENCRYPTION_KEY`.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new((&self.0).into())
    }
}

/// Encrypt credentials into the transport blob.
///
/// The blob is `base64(nonce || AES-256-GCM ciphertext and tag)` with a
/// fresh 12-byte nonce. It is not a Fernet token, so blobs produced by
/// Fernet-based tooling cannot be decrypted here and vice versa.
pub fn encrypt_credentials(credentials: &Credentials, key: &EncryptionKey) -> Result<String> {
    let mut plaintext = serde_json::to_vec(credentials)?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let sealed = key.cipher().encrypt(&nonce, plaintext.as_ref());
    plaintext.zeroize();
    let ciphertext = sealed
        .map_err(|_| Error::new(ErrorKind::Config("encryption failed".to_string())))?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(blob))
}

/// Decrypt a transport blob back into credentials.
pub fn decrypt_credentials(blob: &str, key: &EncryptionKey) -> Result<Credentials> {
    let raw = BASE64.decode(blob.trim()).map_err(|e| {
        Error::with_source(
            ErrorKind::Decryption("credentials are not valid base64".to_string()),
            e,
        )
    })?;

    if raw.len() < NONCE_LEN + TAG_LEN {
        return Err(Error::new(ErrorKind::Decryption(format!(
            "blob too short ({} bytes)",
            raw.len()
        ))));
    }

    let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
    let mut plaintext = key
        .cipher()
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| {
            Error::new(ErrorKind::Decryption(
                "authentication failed; wrong key or tampered data".to_string(),
            ))
        })?;

    let parsed = serde_json::from_slice::<serde_json::Value>(&plaintext);
    plaintext.zeroize();
    let value = parsed.map_err(|e| {
        Error::with_source(
            ErrorKind::Decryption("decrypted payload is not JSON".to_string()),
            e,
        )
    })?;

    Credentials::from_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let key = EncryptionKey::generate();
        let creds = Credentials::new("admin@example.com", "pw&<>\"", "");

        let blob = encrypt_credentials(&creds, &key).unwrap();
        assert_eq!(decrypt_credentials(&blob, &key).unwrap(), creds);
    }

    #[test]
    fn test_nonce_is_fresh_per_encryption() {
        let key = EncryptionKey::generate();
        let creds = Credentials::new("a", "b", "c");
        assert_ne!(
            encrypt_credentials(&creds, &key).unwrap(),
            encrypt_credentials(&creds, &key).unwrap()
        );
    }

    #[test]
    fn test_wrong_key_fails() {
        let blob =
            encrypt_credentials(&Credentials::new("a", "b", "c"), &EncryptionKey::generate())
                .unwrap();
        let err = decrypt_credentials(&blob, &EncryptionKey::generate()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Decryption(_)));
    }

    #[test]
    fn test_tampered_blob_fails() {
        let key = EncryptionKey::generate();
        let blob = encrypt_credentials(&Credentials::new("a", "b", "c"), &key).unwrap();
        let mut raw = BASE64.decode(&blob).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;

        let err = decrypt_credentials(&BASE64.encode(raw), &key).unwrap_err();
        assert!(err.is_credential_error());
    }

    #[test]
    fn test_short_and_garbage_blobs() {
        let key = EncryptionKey::generate();
        assert!(decrypt_credentials("%%%", &key).is_err());
        assert!(decrypt_credentials(&BASE64.encode([0u8; 8]), &key).is_err());
    }

    #[test]
    fn test_key_from_base64() {
        let key = EncryptionKey::generate();
        let restored = EncryptionKey::from_base64(&key.to_base64()).unwrap();
        let blob = encrypt_credentials(&Credentials::new("a", "b", ""), &key).unwrap();
        assert!(decrypt_credentials(&blob, &restored).is_ok());

        let err = EncryptionKey::from_base64(&BASE64.encode([1u8; 16])).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidKey(_)));
        assert!(format!("{:?}", key).contains("REDACTED"));
    }
}
