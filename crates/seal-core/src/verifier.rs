//! Signature verification.
//!
//! [`Verifier::verify`] runs the full protocol for one object:
//!
//! 1. look up the note in the signature namespace (`NoSignature` if absent,
//!    before any cryptographic work);
//! 2. read and decode the envelope blob (`MalformedSignature`);
//! 3. check the PKCS#7 signature against the embedded signer certificate
//!    (`SignatureInvalid`), then the certificate chain against the caller's
//!    trust store (`UntrustedSigner`);
//! 4. recompute the digest of the object's current canonical content and
//!    compare it with the signed one (`DigestMismatch`).
//!
//! A store that rejects damaged bytes on read does not turn tampering into
//! an error: a target that fails its integrity check is `DigestMismatch`,
//! an envelope blob that fails it is `MalformedSignature`.
//!
//! Only [`ChainPolicy::SkipSignerVerification`] can turn off step 3's chain
//! check. Step 4 cannot be turned off.

use std::fmt;
use std::str::FromStr;

use seal_crypto::{CryptoError, SignatureContainer, TrustStore};
use seal_store::{ObjectKind, ObjectStore};
use seal_types::{Digest, ObjectId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bridge::AnnotationBridge;
use crate::canonical::object_digest;
use crate::error::{SealError, SealResult};

/// Terminal outcome of verifying one object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    Valid,
    NoSignature,
    MalformedSignature,
    UntrustedSigner,
    DigestMismatch,
    SignatureInvalid,
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Valid => "valid",
            Verdict::NoSignature => "no-signature",
            Verdict::MalformedSignature => "malformed-signature",
            Verdict::UntrustedSigner => "untrusted-signer",
            Verdict::DigestMismatch => "digest-mismatch",
            Verdict::SignatureInvalid => "signature-invalid",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the signer certificate must chain to the trust store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainPolicy {
    #[default]
    Verify,
    /// Accept any signer whose signature verifies. Digest comparison still
    /// applies.
    SkipSignerVerification,
}

impl ChainPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainPolicy::Verify => "verify",
            ChainPolicy::SkipSignerVerification => "skip-signer-verification",
        }
    }
}

impl fmt::Display for ChainPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainPolicy {
    type Err = SealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verify" => Ok(ChainPolicy::Verify),
            "skip-signer-verification" => Ok(ChainPolicy::SkipSignerVerification),
            other => Err(SealError::Config(format!(
                "unknown chain policy {other:?} (expected \"verify\" or \"skip-signer-verification\")"
            ))),
        }
    }
}

/// A verdict plus what was learned on the way to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verification {
    pub target: ObjectId,
    pub verdict: Verdict,
    /// Subject of the signer certificate, once the envelope decoded.
    pub signer: Option<String>,
    /// Digest carried in the envelope, once it decoded.
    pub digest: Option<Digest>,
}

impl Verification {
    fn bare(target: ObjectId, verdict: Verdict) -> Self {
        Self {
            target,
            verdict,
            signer: None,
            digest: None,
        }
    }

    fn from_container(target: ObjectId, verdict: Verdict, container: &SignatureContainer) -> Self {
        Self {
            target,
            verdict,
            signer: Some(container.signer_subject()),
            digest: Some(*container.digest()),
        }
    }
}

/// Checks signatures attached through an [`AnnotationBridge`].
///
/// Holds no cryptographic state between calls; the trust store is supplied
/// per call and nothing is cached.
pub struct Verifier<'a> {
    objects: &'a dyn ObjectStore,
    notes: AnnotationBridge<'a>,
    policy: ChainPolicy,
}

impl<'a> Verifier<'a> {
    pub fn new(objects: &'a dyn ObjectStore, notes: AnnotationBridge<'a>) -> Self {
        Self {
            objects,
            notes,
            policy: ChainPolicy::Verify,
        }
    }

    pub fn with_policy(mut self, policy: ChainPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ChainPolicy {
        self.policy
    }

    /// Whether `target` has a note in the signature namespace. Says nothing
    /// about validity.
    pub fn has_signature(&self, target: &ObjectId) -> SealResult<bool> {
        Ok(self.notes.lookup(target)?.is_some())
    }

    pub fn verify(&self, target: &ObjectId, trust: &TrustStore) -> SealResult<Verdict> {
        Ok(self.verify_detailed(target, trust)?.verdict)
    }

    pub fn verify_detailed(
        &self,
        target: &ObjectId,
        trust: &TrustStore,
    ) -> SealResult<Verification> {
        let verification = self.run(target, trust)?;
        info!(
            target = %target.short_hex(),
            verdict = %verification.verdict,
            signer = verification.signer.as_deref().unwrap_or("-"),
            "verification complete"
        );
        Ok(verification)
    }

    fn run(&self, target: &ObjectId, trust: &TrustStore) -> SealResult<Verification> {
        if !self.objects.exists(target)? {
            return Err(SealError::UnknownObject(target.to_hex()));
        }

        let Some(blob_id) = self.notes.lookup(target)? else {
            debug!(target = %target.short_hex(), namespace = %self.notes.namespace(), "no signature note");
            return Ok(Verification::bare(*target, Verdict::NoSignature));
        };

        let Some(container) = self.load_envelope(target, &blob_id)? else {
            return Ok(Verification::bare(*target, Verdict::MalformedSignature));
        };

        match container.verify_signature() {
            Ok(()) => {}
            Err(CryptoError::BadSignature(reason)) => {
                debug!(target = %target.short_hex(), %reason, "signature check failed");
                return Ok(Verification::from_container(
                    *target,
                    Verdict::SignatureInvalid,
                    &container,
                ));
            }
            Err(e) => return Err(e.into()),
        }

        match self.policy {
            ChainPolicy::Verify => match trust.verify_chain(container.signer_certificate()) {
                Ok(()) => {}
                Err(CryptoError::Untrusted(reason)) => {
                    debug!(
                        target = %target.short_hex(),
                        signer = %container.signer_subject(),
                        %reason,
                        "signer not trusted"
                    );
                    return Ok(Verification::from_container(
                        *target,
                        Verdict::UntrustedSigner,
                        &container,
                    ));
                }
                Err(e) => return Err(e.into()),
            },
            ChainPolicy::SkipSignerVerification => {
                warn!(
                    target = %target.short_hex(),
                    signer = %container.signer_subject(),
                    "signer certificate chain not verified"
                );
            }
        }

        let verdict = match object_digest(self.objects, target) {
            Ok(current) if current == *container.digest() => Verdict::Valid,
            Ok(current) => {
                debug!(
                    target = %target.short_hex(),
                    signed = %container.digest(),
                    current = %current,
                    "digest mismatch"
                );
                Verdict::DigestMismatch
            }
            Err(SealError::StoreUnavailable(e)) if e.is_integrity_failure() => {
                warn!(target = %target.short_hex(), error = %e, "signed object failed its integrity check");
                Verdict::DigestMismatch
            }
            Err(e) => return Err(e),
        };
        Ok(Verification::from_container(*target, verdict, &container))
    }

    /// Read and decode the envelope a note points at. `None` means the note
    /// is unusable: missing or damaged blob, wrong object kind, or
    /// undecodable.
    fn load_envelope(
        &self,
        target: &ObjectId,
        blob_id: &ObjectId,
    ) -> SealResult<Option<SignatureContainer>> {
        let object = match self.objects.read(blob_id) {
            Ok(object) => object,
            Err(e) if e.is_integrity_failure() => {
                warn!(target = %target.short_hex(), blob = %blob_id.short_hex(), error = %e, "signature blob failed its integrity check");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let Some(object) = object else {
            warn!(target = %target.short_hex(), blob = %blob_id.short_hex(), "signature note points at a missing blob");
            return Ok(None);
        };
        if object.kind != ObjectKind::Blob {
            warn!(target = %target.short_hex(), blob = %blob_id.short_hex(), kind = %object.kind, "signature note points at a non-blob");
            return Ok(None);
        }
        match SignatureContainer::decode(&object.data) {
            Ok(container) => Ok(Some(container)),
            Err(e) => {
                warn!(target = %target.short_hex(), blob = %blob_id.short_hex(), error = %e, "malformed signature envelope");
                Ok(None)
            }
        }
    }
}
