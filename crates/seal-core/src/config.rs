//! Signing and verification settings, stored as TOML.
//!
//! ```toml
//! [signing]
//! key = "/path/to/key.pem"
//! certificate = "/path/to/cert.pem"
//!
//! [verify]
//! trust_anchors = ["/path/to/ca.pem"]
//! chain_policy = "verify"
//!
//! [notes]
//! namespace = "crypto"
//! ```
//!
//! Only the keys listed in [`SealConfig::KEYS`] exist. Nothing here reads
//! environment variables; callers pass the loaded value where it is needed.

use std::fs;
use std::path::{Path, PathBuf};

use seal_crypto::{SigningIdentity, TrustStore};
use seal_notes::NotesNamespace;
use serde::{Deserialize, Serialize};

use crate::error::{SealError, SealResult};
use crate::verifier::ChainPolicy;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// PEM private key.
    pub key: Option<PathBuf>,
    /// PEM certificate matching `key`.
    pub certificate: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// PEM files, each holding one or more anchor certificates.
    pub trust_anchors: Vec<PathBuf>,
    pub chain_policy: ChainPolicy,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesConfig {
    pub namespace: NotesNamespace,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SealConfig {
    pub signing: SigningConfig,
    pub verify: VerifyConfig,
    pub notes: NotesConfig,
}

impl SealConfig {
    pub const KEYS: [&'static str; 5] = [
        "signing.key",
        "signing.certificate",
        "verify.trust_anchors",
        "verify.chain_policy",
        "notes.namespace",
    ];

    /// Parse a config file.
    pub fn load(path: &Path) -> SealResult<Self> {
        let text = fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| SealError::Config(format!("{}: {e}", path.display())))
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> SealResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> SealResult<()> {
        let text = toml::to_string_pretty(self).map_err(|e| SealError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, text)?;
        Ok(())
    }

    /// Current value of a dotted key, `None` when unset. List values are
    /// comma-separated.
    pub fn get(&self, key: &str) -> SealResult<Option<String>> {
        let path_text = |p: &Option<PathBuf>| p.as_ref().map(|p| p.display().to_string());
        Ok(match key {
            "signing.key" => path_text(&self.signing.key),
            "signing.certificate" => path_text(&self.signing.certificate),
            "verify.trust_anchors" => {
                if self.verify.trust_anchors.is_empty() {
                    None
                } else {
                    Some(
                        self.verify
                            .trust_anchors
                            .iter()
                            .map(|p| p.display().to_string())
                            .collect::<Vec<_>>()
                            .join(","),
                    )
                }
            }
            "verify.chain_policy" => Some(self.verify.chain_policy.to_string()),
            "notes.namespace" => Some(self.notes.namespace.to_string()),
            other => return Err(unknown_key(other)),
        })
    }

    /// Set a dotted key. `verify.trust_anchors` takes a comma-separated list.
    pub fn set(&mut self, key: &str, value: &str) -> SealResult<()> {
        match key {
            "signing.key" => self.signing.key = Some(PathBuf::from(value)),
            "signing.certificate" => self.signing.certificate = Some(PathBuf::from(value)),
            "verify.trust_anchors" => {
                self.verify.trust_anchors = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(PathBuf::from)
                    .collect();
            }
            "verify.chain_policy" => self.verify.chain_policy = value.parse()?,
            "notes.namespace" => {
                self.notes.namespace = NotesNamespace::new(value)
                    .map_err(|e| SealError::Config(e.to_string()))?;
            }
            other => return Err(unknown_key(other)),
        }
        Ok(())
    }

    /// Reset a dotted key to its default.
    pub fn unset(&mut self, key: &str) -> SealResult<()> {
        let defaults = Self::default();
        match key {
            "signing.key" => self.signing.key = None,
            "signing.certificate" => self.signing.certificate = None,
            "verify.trust_anchors" => self.verify.trust_anchors.clear(),
            "verify.chain_policy" => self.verify.chain_policy = defaults.verify.chain_policy,
            "notes.namespace" => self.notes.namespace = defaults.notes.namespace,
            other => return Err(unknown_key(other)),
        }
        Ok(())
    }

    /// Every key with a value, in [`KEYS`](Self::KEYS) order.
    pub fn entries(&self) -> SealResult<Vec<(&'static str, String)>> {
        let mut out = Vec::new();
        for key in Self::KEYS {
            if let Some(value) = self.get(key)? {
                out.push((key, value));
            }
        }
        Ok(out)
    }

    /// Load the configured signing key and certificate.
    pub fn signing_identity(&self) -> SealResult<SigningIdentity> {
        let (Some(key), Some(cert)) = (&self.signing.key, &self.signing.certificate) else {
            return Err(SealError::Config(
                "signing.key and signing.certificate must both be set".into(),
            ));
        };
        Ok(SigningIdentity::from_pem_files(key, cert)?)
    }

    /// Build a trust store from the configured anchor files. An empty list
    /// gives an empty store, which trusts no signer.
    pub fn trust_store(&self) -> SealResult<TrustStore> {
        Ok(TrustStore::from_pem_files(&self.verify.trust_anchors)?)
    }
}

fn unknown_key(key: &str) -> SealError {
    SealError::Config(format!(
        "unknown key {key:?} (known keys: {})",
        SealConfig::KEYS.join(", ")
    ))
}
