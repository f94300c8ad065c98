//! Request envelope codec for the metadata service.
//!
//! The upstream validates every request against a fixed shape: the JSON
//! payload is 3DES-CBC encrypted with a key embedded in the mobile client,
//! and accompanied by an MD5 verification tag. None of this is a security
//! boundary; it only has to match what the server checks.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use serde::{Deserialize, Serialize};
use thiserror::Error;

type TdesCbcEnc = cbc::Encryptor<des::TdesEde3>;
type TdesCbcDec = cbc::Decryptor<des::TdesEde3>;

/// Seconds an envelope claims to stay valid.
const EXPIRY_WINDOW_SECS: i64 = 60 * 60 * 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("invalid {what} length: expected {expected} bytes, got {got}")]
    InvalidKeyLength {
        what: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("ciphertext is not valid base64: {0}")]
    Encoding(String),
    #[error("ciphertext does not decrypt with the configured key")]
    Decrypt,
    #[error("decrypted payload is not UTF-8")]
    Utf8,
    #[error("verification tag does not match the ciphertext")]
    VerifyMismatch,
}

/// Key material for the envelope.
#[derive(Clone)]
pub struct CipherKeys {
    /// Application key; only its MD5 travels on the wire.
    pub app_key: String,
    /// 24-byte 3DES key, also mixed into the verification tag.
    pub key: String,
    /// 8-byte CBC initialization vector.
    pub iv: String,
}

impl CipherKeys {
    /// The secret embedded in the Android client.
    pub fn mobile_client() -> Self {
        Self {
            app_key: "moviebox".to_string(),
            key: "123d6cedf626dy54233aa1w6".to_string(),
            iv: "wEiphTn!".to_string(),
        }
    }
}

impl Default for CipherKeys {
    fn default() -> Self {
        Self::mobile_client()
    }
}

impl std::fmt::Debug for CipherKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherKeys")
            .field("app_key", &self.app_key)
            .field("key", &"[REDACTED]")
            .field("iv", &"[REDACTED]")
            .finish()
    }
}

/// Symmetric cipher applied to the serialized payload.
pub trait PayloadCipher: Send + Sync {
    fn encrypt(&self, plaintext: &[u8]) -> Vec<u8>;
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError>;
}

/// 3DES (EDE, three keys) in CBC mode with PKCS7 padding.
#[derive(Clone)]
pub struct TripleDesCbc {
    enc: TdesCbcEnc,
    dec: TdesCbcDec,
}

impl TripleDesCbc {
    pub const KEY_LEN: usize = 24;
    pub const IV_LEN: usize = 8;

    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self, CipherError> {
        if key.len() != Self::KEY_LEN {
            return Err(CipherError::InvalidKeyLength {
                what: "key",
                expected: Self::KEY_LEN,
                got: key.len(),
            });
        }
        if iv.len() != Self::IV_LEN {
            return Err(CipherError::InvalidKeyLength {
                what: "iv",
                expected: Self::IV_LEN,
                got: iv.len(),
            });
        }

        let invalid = |_| CipherError::InvalidKeyLength {
            what: "key",
            expected: Self::KEY_LEN,
            got: key.len(),
        };
        Ok(Self {
            enc: TdesCbcEnc::new_from_slices(key, iv).map_err(invalid)?,
            dec: TdesCbcDec::new_from_slices(key, iv).map_err(invalid)?,
        })
    }
}

impl PayloadCipher for TripleDesCbc {
    fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        self.enc.clone().encrypt_padded_vec_mut::<Pkcs7>(plaintext)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        self.dec
            .clone()
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CipherError::Decrypt)
    }
}

/// The `data` field of a request, before base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub app_key: String,
    pub verify: String,
    pub encrypt_data: String,
}

/// Builds and checks request envelopes. Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct CipherCodec {
    cipher: Arc<dyn PayloadCipher>,
    app_key: String,
    shared_secret: String,
}

impl CipherCodec {
    pub fn new(keys: &CipherKeys) -> Result<Self, CipherError> {
        let cipher = TripleDesCbc::new(keys.key.as_bytes(), keys.iv.as_bytes())?;
        Ok(Self::with_cipher(Arc::new(cipher), keys))
    }

    /// Use a different block cipher with the same tag scheme.
    pub fn with_cipher(cipher: Arc<dyn PayloadCipher>, keys: &CipherKeys) -> Self {
        Self {
            cipher,
            app_key: keys.app_key.clone(),
            shared_secret: keys.key.clone(),
        }
    }

    /// Encrypt and base64-encode.
    pub fn encrypt(&self, plaintext: &str) -> String {
        BASE64.encode(self.cipher.encrypt(plaintext.as_bytes()))
    }

    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        let raw = BASE64
            .decode(ciphertext)
            .map_err(|e| CipherError::Encoding(e.to_string()))?;
        let plain = self.cipher.decrypt(&raw)?;
        String::from_utf8(plain).map_err(|_| CipherError::Utf8)
    }

    pub fn app_key_hash(&self) -> String {
        md5_hex(self.app_key.as_bytes())
    }

    /// `md5(md5(app_key) + secret + ciphertext)`, lowercase hex.
    pub fn generate_verify(&self, ciphertext: &str) -> String {
        let input = format!("{}{}{}", self.app_key_hash(), self.shared_secret, ciphertext);
        md5_hex(input.as_bytes())
    }

    /// Unix seconds twelve hours from now. Advisory; nothing here enforces it.
    pub fn expiry_timestamp() -> i64 {
        chrono::Utc::now().timestamp() + EXPIRY_WINDOW_SECS
    }

    pub fn seal(&self, payload_json: &str) -> Envelope {
        let encrypt_data = self.encrypt(payload_json);
        Envelope {
            app_key: self.app_key_hash(),
            verify: self.generate_verify(&encrypt_data),
            encrypt_data,
        }
    }

    /// Check the tag and recover the payload.
    pub fn open(&self, envelope: &Envelope) -> Result<String, CipherError> {
        if envelope.app_key != self.app_key_hash()
            || envelope.verify != self.generate_verify(&envelope.encrypt_data)
        {
            return Err(CipherError::VerifyMismatch);
        }
        self.decrypt(&envelope.encrypt_data)
    }
}

impl std::fmt::Debug for CipherCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherCodec")
            .field("app_key", &self.app_key)
            .field("cipher", &"[REDACTED]")
            .finish()
    }
}

fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_keys() -> CipherKeys {
        CipherKeys {
            app_key: "fixture-app".into(),
            key: "abcdefghijklmnopqrstuvwx".into(),
            iv: "12345678".into(),
        }
    }

    #[test]
    fn round_trip_reproduces_payload() {
        let codec = CipherCodec::new(&fixture_keys()).unwrap();
        let payload = serde_json::json!({
            "module": "Search5",
            "keyword": "ratatouille",
            "page": 1,
            "pagelimit": 20,
            "type": "movie",
            "expired_date": 1_700_000_000
        })
        .to_string();

        let ct = codec.encrypt(&payload);
        assert_ne!(ct, payload);
        assert_eq!(codec.decrypt(&ct).unwrap(), payload);
    }

    #[test]
    fn round_trip_handles_block_boundaries() {
        let codec = CipherCodec::new(&fixture_keys()).unwrap();
        for len in [0usize, 1, 7, 8, 9, 16, 63] {
            let text = "x".repeat(len);
            let ct = codec.encrypt(&text);
            // PKCS7 always adds at least one byte of padding.
            let raw = BASE64.decode(&ct).unwrap();
            assert_eq!(raw.len(), (len / 8 + 1) * 8);
            assert_eq!(codec.decrypt(&ct).unwrap(), text);
        }
    }

    #[test]
    fn encryption_is_deterministic_for_fixed_key_and_iv() {
        let codec = CipherCodec::new(&fixture_keys()).unwrap();
        assert_eq!(codec.encrypt("{\"a\":1}"), codec.encrypt("{\"a\":1}"));
    }

    #[test]
    fn verify_tag_is_deterministic_and_sensitive() {
        let codec = CipherCodec::new(&fixture_keys()).unwrap();
        let tag = codec.generate_verify("QUJDRA==");
        assert_eq!(tag, codec.generate_verify("QUJDRA=="));
        assert_eq!(tag.len(), 32);
        assert!(tag.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(tag, codec.generate_verify("QUJDRQ=="));
    }

    #[test]
    fn verify_tag_matches_documented_scheme() {
        let codec = CipherCodec::new(&fixture_keys()).unwrap();
        let inner = format!("{:x}", md5::compute(b"fixture-app"));
        let expected = format!(
            "{:x}",
            md5::compute(format!("{inner}abcdefghijklmnopqrstuvwxCIPHER").as_bytes())
        );
        assert_eq!(codec.app_key_hash(), inner);
        assert_eq!(codec.generate_verify("CIPHER"), expected);
    }

    #[test]
    fn key_debug_hides_secrets() {
        let shown = format!("{:?}", CipherKeys::default());
        assert!(shown.contains("moviebox"));
        assert!(!shown.contains("123d6cedf626dy54233aa1w6"));
        assert!(!shown.contains("wEiphTn!"));
    }

    #[test]
    fn mobile_client_keys_have_valid_lengths() {
        let keys = CipherKeys::mobile_client();
        assert!(CipherCodec::new(&keys).is_ok());
        // md5("moviebox")
        assert_eq!(
            CipherCodec::new(&keys).unwrap().app_key_hash(),
            format!("{:x}", md5::compute(b"moviebox"))
        );
    }

    #[test]
    fn rejects_wrong_key_lengths() {
        let mut keys = fixture_keys();
        keys.key = "short".into();
        assert_eq!(
            CipherCodec::new(&keys).unwrap_err(),
            CipherError::InvalidKeyLength {
                what: "key",
                expected: 24,
                got: 5
            }
        );

        let mut keys = fixture_keys();
        keys.iv = "1234".into();
        assert!(matches!(
            CipherCodec::new(&keys),
            Err(CipherError::InvalidKeyLength { what: "iv", .. })
        ));
    }

    #[test]
    fn sealed_envelope_opens_and_detects_tampering() {
        let codec = CipherCodec::new(&fixture_keys()).unwrap();
        let env = codec.seal("{\"module\":\"Movie_detail\",\"mid\":42}");
        assert_eq!(codec.open(&env).unwrap(), "{\"module\":\"Movie_detail\",\"mid\":42}");

        let mut tampered = env.clone();
        tampered.encrypt_data = codec.encrypt("{\"module\":\"Movie_detail\",\"mid\":43}");
        assert_eq!(codec.open(&tampered), Err(CipherError::VerifyMismatch));
    }

    #[test]
    fn decrypt_with_other_key_fails_cleanly() {
        let codec = CipherCodec::new(&fixture_keys()).unwrap();
        let other = CipherCodec::new(&CipherKeys::mobile_client()).unwrap();
        let ct = codec.encrypt("{\"page\":1}");
        // Either padding check fails or the bytes come back as garbage.
        assert_ne!(other.decrypt(&ct).ok().as_deref(), Some("{\"page\":1}"));
        assert!(matches!(codec.decrypt("not base64!"), Err(CipherError::Encoding(_))));
    }

    #[test]
    fn expiry_is_twelve_hours_ahead() {
        let now = chrono::Utc::now().timestamp();
        let exp = CipherCodec::expiry_timestamp();
        assert!((exp - now - 43_200).abs() <= 2);
    }

    #[test]
    fn debug_output_hides_key_material() {
        let dbg = format!("{:?}", fixture_keys());
        assert!(!dbg.contains("abcdefghijklmnopqrstuvwx"));
        assert!(!dbg.contains("12345678"));
    }
}
