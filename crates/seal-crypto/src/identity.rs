use std::fmt;
use std::path::Path;

use openssl::pkey::{Id, PKey, PKeyRef, Private};
use openssl::stack::Stack;
use openssl::x509::store::{X509Store, X509StoreBuilder};
use openssl::x509::{X509, X509Ref, X509StoreContext};

use crate::envelope::SignatureAlgorithm;
use crate::error::{CryptoError, CryptoResult, SignStage};

/// A private key paired with the certificate that vouches for it.
pub struct SigningIdentity {
    key: PKey<Private>,
    certificate: X509,
    algorithm: SignatureAlgorithm,
}

impl SigningIdentity {
    /// Pair a key with a certificate.
    ///
    /// Fails with [`SignStage::KeyMismatch`] if the certificate's public key is
    /// not the public half of `key`, and with [`SignStage::KeyType`] for key
    /// types that cannot produce S/MIME signatures.
    pub fn new(key: PKey<Private>, certificate: X509) -> CryptoResult<Self> {
        let algorithm =
            SignatureAlgorithm::for_key_id(key.id()).ok_or_else(|| CryptoError::SignatureCreation {
                stage: SignStage::KeyType,
                reason: format!("{} keys are not supported", key_id_name(key.id())),
            })?;
        let cert_key = certificate.public_key()?;
        if !cert_key.public_eq(&key) {
            return Err(CryptoError::SignatureCreation {
                stage: SignStage::KeyMismatch,
                reason: "certificate public key does not match private key".into(),
            });
        }
        Ok(Self {
            key,
            certificate,
            algorithm,
        })
    }

    /// Load from PEM-encoded key and certificate.
    pub fn from_pem(key_pem: &[u8], cert_pem: &[u8]) -> CryptoResult<Self> {
        let key = PKey::private_key_from_pem(key_pem).map_err(|e| CryptoError::Load {
            what: "private key",
            reason: e.to_string(),
        })?;
        let certificate = X509::from_pem(cert_pem).map_err(|e| CryptoError::Load {
            what: "certificate",
            reason: e.to_string(),
        })?;
        Self::new(key, certificate)
    }

    pub fn from_pem_files(key_path: &Path, cert_path: &Path) -> CryptoResult<Self> {
        let key_pem = std::fs::read(key_path)?;
        let cert_pem = std::fs::read(cert_path)?;
        Self::from_pem(&key_pem, &cert_pem)
    }

    pub fn certificate(&self) -> &X509Ref {
        &self.certificate
    }

    pub(crate) fn key(&self) -> &PKeyRef<Private> {
        &self.key
    }

    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    pub fn subject(&self) -> String {
        subject_line(&self.certificate)
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("subject", &self.subject())
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Certificates a verifier accepts as roots of trust.
///
/// Supplied per verification call and never persisted. Intermediates are
/// offered to chain building but are not trusted on their own.
#[derive(Clone, Default)]
pub struct TrustStore {
    anchors: Vec<X509>,
    intermediates: Vec<X509>,
}

impl TrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_anchor(mut self, anchor: X509) -> Self {
        self.anchors.push(anchor);
        self
    }

    pub fn add_anchor(&mut self, anchor: X509) {
        self.anchors.push(anchor);
    }

    pub fn add_intermediate(&mut self, cert: X509) {
        self.intermediates.push(cert);
    }

    /// Add every certificate in a PEM bundle as an anchor.
    pub fn add_pem_anchors(&mut self, pem: &[u8]) -> CryptoResult<usize> {
        let certs = X509::stack_from_pem(pem).map_err(|e| CryptoError::Load {
            what: "trust anchors",
            reason: e.to_string(),
        })?;
        let count = certs.len();
        self.anchors.extend(certs);
        Ok(count)
    }

    pub fn from_pem_files<P: AsRef<Path>>(paths: &[P]) -> CryptoResult<Self> {
        let mut store = Self::new();
        for path in paths {
            let pem = std::fs::read(path.as_ref())?;
            store.add_pem_anchors(&pem)?;
        }
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Check that `cert` chains to one of the anchors.
    ///
    /// Returns [`CryptoError::Untrusted`] with OpenSSL's verification reason
    /// when it does not. The OpenSSL store and context live only for the
    /// duration of this call.
    pub fn verify_chain(&self, cert: &X509Ref) -> CryptoResult<()> {
        if self.anchors.is_empty() {
            return Err(CryptoError::Untrusted("trust store has no anchors".into()));
        }
        let store = self.build_store()?;
        let mut chain: Stack<X509> = Stack::new()?;
        for intermediate in &self.intermediates {
            chain.push(intermediate.clone())?;
        }

        let mut ctx = X509StoreContext::new()?;
        let outcome = ctx.init(&store, cert, &chain, |c| {
            let ok = c.verify_cert()?;
            Ok((ok, c.error().error_string()))
        })?;
        match outcome {
            (true, _) => Ok(()),
            (false, reason) => Err(CryptoError::Untrusted(reason.to_string())),
        }
    }

    fn build_store(&self) -> CryptoResult<X509Store> {
        let mut builder = X509StoreBuilder::new()?;
        for anchor in &self.anchors {
            builder.add_cert(anchor.clone())?;
        }
        Ok(builder.build())
    }
}

impl fmt::Debug for TrustStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subjects: Vec<String> = self.anchors.iter().map(|c| subject_line(c)).collect();
        f.debug_struct("TrustStore")
            .field("anchors", &subjects)
            .field("intermediates", &self.intermediates.len())
            .finish()
    }
}

/// One-line rendering of a certificate subject, e.g. `CN=alice, O=Example`.
pub fn subject_line(cert: &X509Ref) -> String {
    cert.subject_name()
        .entries()
        .map(|entry| {
            let field = entry.object().nid().short_name().unwrap_or("?");
            let value = entry
                .data()
                .as_utf8()
                .map(|v| v.to_string())
                .unwrap_or_default();
            format!("{field}={value}")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn key_id_name(id: Id) -> String {
    format!("{id:?}")
}
