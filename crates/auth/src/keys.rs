//! Asymmetric key material for session tokens.
//!
//! Keys are parsed once from PEM at startup and shared read-only afterwards.
//! A process that only verifies tokens carries no private key at all.

use jsonwebtoken::{DecodingKey, EncodingKey};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("failed to parse {kind} key: {reason}")]
    Parse { kind: &'static str, reason: String },

    #[error("no private key configured; this process cannot issue tokens")]
    MissingPrivateKey,
}

/// RSA private key used by the issuer.
#[derive(Clone)]
pub struct SigningKey(EncodingKey);

impl SigningKey {
    pub fn from_pem(pem: &[u8]) -> Result<Self, KeyError> {
        EncodingKey::from_rsa_pem(pem)
            .map(Self)
            .map_err(|e| KeyError::Parse {
                kind: "private",
                reason: e.to_string(),
            })
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.0
    }
}

impl core::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SigningKey(RS256, <redacted>)")
    }
}

/// RSA public key used by the verifier.
#[derive(Clone)]
pub struct VerifyingKey(DecodingKey);

impl VerifyingKey {
    pub fn from_pem(pem: &[u8]) -> Result<Self, KeyError> {
        DecodingKey::from_rsa_pem(pem)
            .map(Self)
            .map_err(|e| KeyError::Parse {
                kind: "public",
                reason: e.to_string(),
            })
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.0
    }
}

impl core::fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("VerifyingKey(RS256)")
    }
}

/// Process-wide key pair.
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    signing: Option<SigningKey>,
    verifying: VerifyingKey,
}

impl KeyMaterial {
    pub fn new(signing: Option<SigningKey>, verifying: VerifyingKey) -> Self {
        Self { signing, verifying }
    }

    pub fn from_pem(private_pem: Option<&[u8]>, public_pem: &[u8]) -> Result<Self, KeyError> {
        let signing = private_pem.map(SigningKey::from_pem).transpose()?;
        let verifying = VerifyingKey::from_pem(public_pem)?;
        Ok(Self { signing, verifying })
    }

    pub fn signing(&self) -> Result<&SigningKey, KeyError> {
        self.signing.as_ref().ok_or(KeyError::MissingPrivateKey)
    }

    pub fn verifying(&self) -> &VerifyingKey {
        &self.verifying
    }

    pub fn can_issue(&self) -> bool {
        self.signing.is_some()
    }
}


#[cfg(test)]
mod tests {
    use super::testkeys::*;
    use super::*;

    #[test]
    fn parses_pem_pair() {
        let keys = KeyMaterial::from_pem(Some(PRIVATE_PEM.as_bytes()), PUBLIC_PEM.as_bytes())
            .expect("key material");
        assert!(keys.can_issue());
        assert!(keys.signing().is_ok());
    }

    #[test]
    fn verifier_only_material_cannot_sign() {
        let keys = KeyMaterial::from_pem(None, PUBLIC_PEM.as_bytes()).expect("public key");
        assert!(!keys.can_issue());
        assert_eq!(keys.signing().unwrap_err(), KeyError::MissingPrivateKey);
    }

    #[test]
    fn malformed_pem_is_a_parse_error() {
        let err = SigningKey::from_pem(b"not-a-key").unwrap_err();
        assert!(matches!(err, KeyError::Parse { kind: "private", .. }));

        let err = VerifyingKey::from_pem(b"not-a-key").unwrap_err();
        assert!(matches!(err, KeyError::Parse { kind: "public", .. }));
    }

    #[test]
    fn debug_output_never_contains_key_bytes() {
        let key = SigningKey::from_pem(PRIVATE_PEM.as_bytes()).unwrap();
        assert_eq!(format!("{key:?}"), "SigningKey(RS256, <redacted>)");
    }
}
