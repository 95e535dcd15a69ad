//! Detached S/MIME signature envelopes.
//!
//! The on-wire form is an S/MIME `multipart/signed` message. Its cleartext
//! part is the 64-character lowercase hex digest of the signed object's
//! canonical content. Its signature part is a base64 PKCS#7 detached
//! signed-data structure that embeds the signer certificate. Any conformant
//! S/MIME implementation can read it, e.g. `openssl smime -verify`.

use std::fmt;

use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::pkey::Id;
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::{X509, X509Ref};
use seal_types::Digest;

use crate::error::{CryptoError, CryptoResult, DecodeError, SignStage};
use crate::identity::{key_id_name, subject_line, SigningIdentity};

/// Signature scheme used by an envelope's signer.
///
/// The message digest inside PKCS#7 is always SHA-256; the variant records
/// the signer's key type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    RsaSha256,
    EcdsaSha256,
}

impl SignatureAlgorithm {
    pub(crate) fn for_key_id(id: Id) -> Option<Self> {
        match id {
            Id::RSA => Some(Self::RsaSha256),
            Id::EC => Some(Self::EcdsaSha256),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::RsaSha256 => "rsa-sha256",
            Self::EcdsaSha256 => "ecdsa-sha256",
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Flags for both signing and S/MIME output: detached multipart/signed,
/// payload passed through without MIME canonicalization.
fn envelope_flags() -> Pkcs7Flags {
    Pkcs7Flags::DETACHED | Pkcs7Flags::BINARY
}

/// A decoded (or freshly created) detached signature.
///
/// Holding a `SignatureContainer` says nothing about validity: call
/// [`verify_signature`](Self::verify_signature) and check the signer against a
/// [`TrustStore`](crate::TrustStore) before trusting [`digest`](Self::digest).
pub struct SignatureContainer {
    digest: Digest,
    payload: Vec<u8>,
    signer_certificate: X509,
    algorithm: SignatureAlgorithm,
    envelope: Pkcs7,
}

impl SignatureContainer {
    /// Sign `digest` with `identity`.
    ///
    /// The signed payload is the digest's lowercase hex text.
    pub fn sign(digest: Digest, identity: &SigningIdentity) -> CryptoResult<Self> {
        let payload = digest.to_hex().into_bytes();
        let extra_certs: Stack<X509> = Stack::new()?;
        let envelope = Pkcs7::sign(
            identity.certificate(),
            identity.key(),
            &extra_certs,
            &payload,
            envelope_flags(),
        )
        .map_err(|e| CryptoError::SignatureCreation {
            stage: SignStage::Envelope,
            reason: e.to_string(),
        })?;

        Ok(Self {
            digest,
            payload,
            signer_certificate: identity.certificate().to_owned(),
            algorithm: identity.algorithm(),
            envelope,
        })
    }

    /// Serialize to S/MIME text.
    pub fn encode(&self) -> CryptoResult<Vec<u8>> {
        self.envelope
            .to_smime(&self.payload, envelope_flags())
            .map_err(|e| CryptoError::SignatureCreation {
                stage: SignStage::Encode,
                reason: e.to_string(),
            })
    }

    /// Parse S/MIME text.
    ///
    /// This only checks structure: a readable envelope, a canonical digest
    /// payload, exactly one signer with a supported key. It does not verify
    /// the signature.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let (envelope, content) =
            Pkcs7::from_smime(bytes).map_err(|e| DecodeError::Envelope(e.to_string()))?;
        let payload = content.ok_or(DecodeError::MissingPayload)?;

        let text = std::str::from_utf8(&payload).map_err(|_| DecodeError::PayloadEncoding)?;
        let digest = Digest::from_hex(text.trim_matches(|c: char| c.is_ascii_whitespace()))?;

        let no_extra: Stack<X509> =
            Stack::new().map_err(|e| DecodeError::Envelope(e.to_string()))?;
        let mut signers = envelope
            .signers(&no_extra, Pkcs7Flags::empty())
            .map_err(|_| DecodeError::MissingSigner)?;
        let signer_certificate = match signers.len() {
            0 => return Err(DecodeError::MissingSigner),
            1 => signers.pop().ok_or(DecodeError::MissingSigner)?,
            n => return Err(DecodeError::MultipleSigners(n)),
        };

        let key_id = signer_certificate
            .public_key()
            .map_err(|e| DecodeError::UnsupportedKey(e.to_string()))?
            .id();
        let algorithm = SignatureAlgorithm::for_key_id(key_id)
            .ok_or_else(|| DecodeError::UnsupportedKey(key_id_name(key_id)))?;

        Ok(Self {
            digest,
            payload,
            signer_certificate,
            algorithm,
            envelope,
        })
    }

    /// Check the PKCS#7 signature over the payload against the embedded
    /// signer certificate.
    ///
    /// Chain-of-trust is *not* checked here; that is
    /// [`TrustStore::verify_chain`](crate::TrustStore::verify_chain).
    pub fn verify_signature(&self) -> CryptoResult<()> {
        let no_extra: Stack<X509> = Stack::new()?;
        let no_anchors = X509StoreBuilder::new()?.build();
        self.envelope
            .verify(
                &no_extra,
                &no_anchors,
                Some(&self.payload),
                None,
                Pkcs7Flags::NOVERIFY | Pkcs7Flags::BINARY,
            )
            .map_err(|e| CryptoError::BadSignature(e.to_string()))
    }

    /// The digest carried in the payload. Untrusted until verified.
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn signer_certificate(&self) -> &X509Ref {
        &self.signer_certificate
    }

    pub fn signer_subject(&self) -> String {
        subject_line(&self.signer_certificate)
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// DER encoding of the PKCS#7 signed-data (signature bytes plus signer
    /// certificate).
    pub fn signature_bytes(&self) -> CryptoResult<Vec<u8>> {
        Ok(self.envelope.to_der()?)
    }
}

impl fmt::Debug for SignatureContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureContainer")
            .field("digest", &self.digest)
            .field("signer", &self.signer_subject())
            .field("algorithm", &self.algorithm)
            .finish()
    }
}
