// crates/autonomy-kernel-core/src/runtime/signer.rs
// ============================================================================
// Module: Ed25519 Signing
// Description: Ed25519 signer and verifier for kernel records.
// Purpose: Sign decisions, intents, receipts, and envelopes with hex signatures.
// Dependencies: crate::{core, interfaces}, ed25519-dalek, rand
// ============================================================================

//! ## Overview
//! [`Ed25519Signer`] holds a secret key and a key identifier; every signature
//! is emitted as lowercase hex over canonical payload bytes. The matching
//! [`Ed25519Verifier`] uses strict verification, so malleable or
//! small-order signatures are rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use ed25519_dalek::Signature;
use ed25519_dalek::SigningKey;
use ed25519_dalek::VerifyingKey;
use rand::rngs::OsRng;

use crate::core::envelope::SigningAlgorithm;
use crate::core::hashing::hex_decode;
use crate::core::hashing::hex_encode;
use crate::interfaces::SignatureError;
use crate::interfaces::Signer;
use crate::interfaces::Verifier;

// ============================================================================
// SECTION: Signer
// ============================================================================

/// Ed25519 signer with a stable key identifier.
pub struct Ed25519Signer {
    /// Key identifier stamped into signature types.
    key_id: String,
    /// Secret key.
    key: SigningKey,
}

impl Ed25519Signer {
    /// Generates a fresh key from the OS random source.
    #[must_use]
    pub fn generate(key_id: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Builds a signer from a 32-byte secret.
    #[must_use]
    pub fn from_secret_bytes(key_id: impl Into<String>, secret: &[u8; 32]) -> Self {
        Self {
            key_id: key_id.into(),
            key: SigningKey::from_bytes(secret),
        }
    }

    /// Returns the public key bytes.
    #[must_use]
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    /// Returns the public key as lowercase hex.
    #[must_use]
    pub fn public_key_hex(&self) -> String {
        hex_encode(&self.public_key_bytes())
    }

    /// Returns a verifier for this signer's public key.
    #[must_use]
    pub fn verifier(&self) -> Ed25519Verifier {
        Ed25519Verifier {
            key: self.key.verifying_key(),
        }
    }
}

impl Signer for Ed25519Signer {
    fn key_id(&self) -> &str {
        &self.key_id
    }

    fn algorithm(&self) -> SigningAlgorithm {
        SigningAlgorithm::Ed25519
    }

    fn sign(&self, payload: &[u8]) -> Result<String, SignatureError> {
        let signature = ed25519_dalek::Signer::try_sign(&self.key, payload)
            .map_err(|err| SignatureError::Signing(err.to_string()))?;
        Ok(hex_encode(&signature.to_bytes()))
    }
}

// ============================================================================
// SECTION: Verifier
// ============================================================================

/// Ed25519 verifier bound to one public key.
#[derive(Debug, Clone)]
pub struct Ed25519Verifier {
    /// Public key.
    key: VerifyingKey,
}

impl Ed25519Verifier {
    /// Builds a verifier from public key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Encoding`] when the bytes are not a valid point.
    pub fn from_public_key_bytes(bytes: &[u8; 32]) -> Result<Self, SignatureError> {
        let key = VerifyingKey::from_bytes(bytes)
            .map_err(|err| SignatureError::Encoding(format!("invalid ed25519 public key: {err}")))?;
        Ok(Self {
            key,
        })
    }

    /// Builds a verifier from a 64-character hex public key.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Encoding`] when the hex or key is invalid.
    pub fn from_public_key_hex(value: &str) -> Result<Self, SignatureError> {
        let bytes = hex_decode(value.trim())
            .map_err(|err| SignatureError::Encoding(format!("invalid public key hex: {err}")))?;
        let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            SignatureError::Encoding(format!("public key must be 32 bytes, got {}", bytes.len()))
        })?;
        Self::from_public_key_bytes(&key)
    }
}

impl Verifier for Ed25519Verifier {
    fn verify(&self, payload: &[u8], signature: &str) -> Result<bool, SignatureError> {
        let bytes = hex_decode(signature)
            .map_err(|err| SignatureError::Encoding(format!("invalid signature hex: {err}")))?;
        let signature = Signature::from_slice(&bytes)
            .map_err(|err| SignatureError::Encoding(format!("invalid signature bytes: {err}")))?;
        Ok(self.key.verify_strict(payload, &signature).is_ok())
    }
}
