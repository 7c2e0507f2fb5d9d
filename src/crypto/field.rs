use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::{rngs::OsRng, RngCore};
use scrypt::{scrypt, Params};
use std::sync::atomic::{AtomicU64, Ordering};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{AppError, Result};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// The size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;
/// The size of the AES-CBC initialization vector in bytes.
pub const IV_SIZE: usize = 16;

/// Fixed salt used when stretching a non-hex secret into a key.
///
/// Matches the salt the legacy deployment used, so keys derived from the same
/// secret decrypt the same records.
const KDF_SALT: &[u8] = b"salt";

/// A secure key wrapper that ensures the key is zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecureKey([u8; KEY_SIZE]);

impl SecureKey {
    /// Creates a new `SecureKey` from a byte array.
    pub fn new(key: [u8; KEY_SIZE]) -> Self {
        Self(key)
    }

    /// Returns a reference to the key as a byte slice.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

/// Codec for sensitive at-rest fields (identity numbers, stored passwords).
///
/// Values are stored as `hex(iv):hex(ciphertext)` (AES-256-CBC, PKCS7).
/// Values without a `:` are legacy plaintext and pass through `decrypt`
/// unchanged, so pre-encryption rows keep working.
pub struct FieldCodec {
    key: SecureKey,
    fallback_count: AtomicU64,
}

impl FieldCodec {
    /// Builds the codec from the configured secret.
    ///
    /// A 64-character hex secret is used directly as the 32-byte key; anything
    /// else is stretched with scrypt (N=2^14, r=8, p=1) over a fixed salt.
    pub fn from_secret(secret: &str) -> Result<Self> {
        let key = derive_key(secret)?;
        Ok(Self {
            key,
            fallback_count: AtomicU64::new(0),
        })
    }

    /// Encrypts a single field value.
    ///
    /// Empty input passes through unchanged. Each call draws a fresh random
    /// IV, so two encryptions of the same plaintext are byte-different and
    /// ciphertexts must never be compared for equality.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let mut iv = [0u8; IV_SIZE];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new(self.key.as_bytes().into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        Ok(format!("{}:{}", hex::encode(iv), hex::encode(ciphertext)))
    }

    /// Decrypts a single field value, failing open to the original input.
    ///
    /// Legacy values (no `:`) are returned as-is. A value that looks
    /// encrypted but fails to decrypt (corrupt hex, foreign key, bad padding)
    /// is also returned as-is; the branch is logged and counted so silent
    /// degradation shows up in operations.
    pub fn decrypt(&self, value: &str) -> String {
        if value.is_empty() || !value.contains(':') {
            return value.to_string();
        }

        match self.decrypt_strict(value) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                self.fallback_count.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("⚠️  Field decryption failed, returning value unchanged: {}", e);
                value.to_string()
            }
        }
    }

    /// Decrypts a value or returns an error.
    ///
    /// Used where fail-open is wrong, e.g. password verification, which must
    /// skip an undecryptable candidate instead of comparing against
    /// ciphertext.
    pub fn decrypt_strict(&self, value: &str) -> Result<String> {
        let parts: Vec<&str> = value.split(':').collect();
        if parts.len() != 2 {
            return Err(AppError::Encryption(format!(
                "expected iv:ciphertext, got {} segments",
                parts.len()
            )));
        }

        let iv_bytes = hex::decode(parts[0])
            .map_err(|e| AppError::Encryption(format!("invalid IV hex: {}", e)))?;
        let iv: [u8; IV_SIZE] = iv_bytes
            .try_into()
            .map_err(|_| AppError::Encryption("IV must be 16 bytes".to_string()))?;

        let ciphertext = hex::decode(parts[1])
            .map_err(|e| AppError::Encryption(format!("invalid ciphertext hex: {}", e)))?;

        let plaintext = Aes256CbcDec::new(self.key.as_bytes().into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|e| AppError::Encryption(format!("decryption failed: {}", e)))?;

        String::from_utf8(plaintext)
            .map_err(|e| AppError::Encryption(format!("decrypted value is not UTF-8: {}", e)))
    }

    /// Encrypts a sequence of values element-wise, preserving order.
    pub fn encrypt_batch<I, S>(&self, items: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        items.into_iter().map(|s| self.encrypt(s.as_ref())).collect()
    }

    /// Decrypts a sequence of values element-wise, preserving order.
    pub fn decrypt_batch<I, S>(&self, items: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        items.into_iter().map(|s| self.decrypt(s.as_ref())).collect()
    }

    /// Number of times `decrypt` fell back to returning its input unchanged.
    pub fn fallback_count(&self) -> u64 {
        self.fallback_count.load(Ordering::Relaxed)
    }
}

/// Derives the 32-byte field key from the configured secret.
fn derive_key(secret: &str) -> Result<SecureKey> {
    if secret.len() == 64 {
        if let Ok(bytes) = hex::decode(secret) {
            let key: [u8; KEY_SIZE] = bytes
                .try_into()
                .map_err(|_| AppError::Encryption("invalid key length".to_string()))?;
            return Ok(SecureKey::new(key));
        }
        // 64 chars but not hex: fall through to stretching.
    }

    let params = Params::new(14, 8, 1, KEY_SIZE)
        .map_err(|e| AppError::Encryption(format!("scrypt params: {}", e)))?;

    let mut key = [0u8; KEY_SIZE];
    scrypt(secret.as_bytes(), KDF_SALT, &params, &mut key)
        .map_err(|e| AppError::Encryption(format!("scrypt derivation failed: {}", e)))?;

    Ok(SecureKey::new(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> FieldCodec {
        FieldCodec::from_secret("test-secret").unwrap()
    }

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let c = codec();
        for plaintext in ["420106199001017710", "p@ssw0rd", "张三", "x"] {
            let encrypted = c.encrypt(plaintext).unwrap();
            assert_ne!(encrypted, plaintext);
            assert_eq!(c.decrypt(&encrypted), plaintext);
        }
    }

    #[test]
    fn encrypted_shape_is_iv_colon_ciphertext() {
        let c = codec();
        let encrypted = c.encrypt("hello").unwrap();
        let parts: Vec<&str> = encrypted.split(':').collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].len(), 32);
        assert!(parts[0].chars().all(|ch| ch.is_ascii_hexdigit()));
        assert!(!parts[1].is_empty());
    }

    #[test]
    fn fresh_iv_per_call() {
        let c = codec();
        let a = c.encrypt("same-plaintext").unwrap();
        let b = c.encrypt("same-plaintext").unwrap();
        assert_ne!(a, b);
        assert_eq!(c.decrypt(&a), "same-plaintext");
        assert_eq!(c.decrypt(&b), "same-plaintext");
    }

    #[test]
    fn empty_input_passes_through() {
        let c = codec();
        assert_eq!(c.encrypt("").unwrap(), "");
        assert_eq!(c.decrypt(""), "");
    }

    #[test]
    fn legacy_value_without_colon_is_returned_unchanged() {
        let c = codec();
        assert_eq!(c.decrypt("plain-old-password"), "plain-old-password");
        assert_eq!(c.fallback_count(), 0);
    }

    #[test]
    fn malformed_colon_value_falls_back_to_input() {
        let c = codec();
        // Looks tagged but the IV segment is not valid hex.
        assert_eq!(c.decrypt("not-hex:deadbeef"), "not-hex:deadbeef");
        // More than one delimiter.
        assert_eq!(c.decrypt("a:b:c"), "a:b:c");
        // Valid hex but wrong IV length.
        assert_eq!(c.decrypt("abcd:deadbeef"), "abcd:deadbeef");
        assert_eq!(c.fallback_count(), 3);
    }

    #[test]
    fn foreign_key_falls_back_to_input() {
        let ours = codec();
        let theirs = FieldCodec::from_secret("some-other-secret").unwrap();
        let encrypted = theirs.encrypt("secret-value").unwrap();
        assert_eq!(ours.decrypt(&encrypted), encrypted);
        assert!(ours.fallback_count() >= 1);
    }

    #[test]
    fn strict_decrypt_errors_instead_of_falling_back() {
        let c = codec();
        assert!(c.decrypt_strict("not-hex:deadbeef").is_err());
        assert!(c.decrypt_strict("a:b:c").is_err());
    }

    #[test]
    fn hex_secret_used_directly_and_stretched_secret_differ() {
        let hex_secret = "00".repeat(32);
        let direct = FieldCodec::from_secret(&hex_secret).unwrap();
        let stretched = FieldCodec::from_secret("short").unwrap();
        let value = direct.encrypt("v").unwrap();
        // The stretched key cannot read the direct key's output.
        assert_eq!(stretched.decrypt(&value), value);
        assert_eq!(direct.decrypt(&value), "v");
    }

    #[test]
    fn batch_variants_preserve_order_and_length() {
        let c = codec();
        let inputs = vec!["one", "", "three"];
        let encrypted = c.encrypt_batch(inputs.clone()).unwrap();
        assert_eq!(encrypted.len(), 3);
        assert_eq!(encrypted[1], "");
        let decrypted = c.decrypt_batch(&encrypted);
        assert_eq!(decrypted, inputs);
    }
}
