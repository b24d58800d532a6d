use crate::core::errors::ExchangeError;
use base64::engine::general_purpose;
use base64::Engine;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signed login material for a private stream session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSignature {
    pub api_key: String,
    pub timestamp: u64,
    pub signature: String,
}

/// Signer trait for stream authentication
pub trait Signer: Send + Sync {
    /// Sign a login request issued at `timestamp` (milliseconds since the epoch)
    fn sign_login(&self, timestamp: u64) -> Result<LoginSignature, ExchangeError>;
}

/// HMAC-SHA256 over `{api_key}{timestamp}`, base64-encoded
pub struct HmacSigner {
    api_key: String,
    secret_key: Secret<String>,
}

impl HmacSigner {
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key,
            secret_key: Secret::new(secret_key),
        }
    }

    fn sign_payload(&self, payload: &str) -> Result<String, ExchangeError> {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.expose_secret().as_bytes())
            .map_err(|e| ExchangeError::auth(None, format!("Invalid secret key: {}", e)))?;

        mac.update(payload.as_bytes());
        Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }
}

impl Signer for HmacSigner {
    fn sign_login(&self, timestamp: u64) -> Result<LoginSignature, ExchangeError> {
        let signature = self.sign_payload(&format!("{}{}", self.api_key, timestamp))?;

        Ok(LoginSignature {
            api_key: self.api_key.clone(),
            timestamp,
            signature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_deterministic_base64() {
        let signer = HmacSigner::new("mx0vgl-key".to_string(), "secret".to_string());
        let first = signer.sign_login(1_587_442_049_632).unwrap();
        let second = signer.sign_login(1_587_442_049_632).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.api_key, "mx0vgl-key");
        let raw = general_purpose::STANDARD.decode(&first.signature).unwrap();
        assert_eq!(raw.len(), 32);
    }

    #[test]
    fn test_signature_matches_manual_hmac() {
        let signer = HmacSigner::new("key".to_string(), "secret".to_string());
        let signed = signer.sign_login(1000).unwrap();

        let mut mac = HmacSha256::new_from_slice(b"secret").unwrap();
        mac.update(b"key1000");
        let expected = general_purpose::STANDARD.encode(mac.finalize().into_bytes());
        assert_eq!(signed.signature, expected);
    }

    #[test]
    fn test_signature_changes_with_timestamp() {
        let signer = HmacSigner::new("key".to_string(), "secret".to_string());
        assert_ne!(
            signer.sign_login(1).unwrap().signature,
            signer.sign_login(2).unwrap().signature
        );
    }
}
