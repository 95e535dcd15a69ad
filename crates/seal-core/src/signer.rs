use seal_crypto::{SignatureContainer, SigningIdentity};
use seal_notes::NoteStore;
use seal_refs::{RefError, RefStore};
use seal_store::{Blob, ObjectStore};
use seal_types::ObjectId;
use tracing::{debug, info};

use crate::bridge::AnnotationBridge;
use crate::canonical::object_digest;
use crate::error::{SealError, SealResult};

/// Outcome of a successful signing.
#[derive(Debug)]
pub struct SignResult {
    /// The signed object.
    pub target: ObjectId,
    /// The blob holding the encoded envelope.
    pub blob: ObjectId,
    pub container: SignatureContainer,
    /// Signature blob this one superseded, if the object was already signed.
    pub replaced: Option<ObjectId>,
}

/// Produces detached signatures and attaches them as notes.
pub struct Signer<'a> {
    objects: &'a dyn ObjectStore,
    refs: &'a dyn RefStore,
    notes: AnnotationBridge<'a>,
}

impl<'a> Signer<'a> {
    pub fn new(
        objects: &'a dyn ObjectStore,
        refs: &'a dyn RefStore,
        notes: AnnotationBridge<'a>,
    ) -> Self {
        Self {
            objects,
            refs,
            notes,
        }
    }

    /// Resolve `reference` and sign the object it names.
    pub fn sign(&self, reference: &str, identity: &SigningIdentity) -> SealResult<SignResult> {
        let target = match seal_refs::resolve(self.refs, self.objects, reference) {
            Ok(id) => id,
            Err(RefError::Unresolvable(rev)) => return Err(SealError::UnknownObject(rev)),
            Err(e) => return Err(e.into()),
        };
        self.sign_object(&target, identity)
    }

    /// Sign an object by id.
    ///
    /// The envelope blob is written before the note that points at it, so a
    /// note never refers to a blob that does not exist.
    pub fn sign_object(
        &self,
        target: &ObjectId,
        identity: &SigningIdentity,
    ) -> SealResult<SignResult> {
        let digest = object_digest(self.objects, target)?;
        debug!(target = %target.short_hex(), digest = %digest, "canonical digest computed");

        let container = SignatureContainer::sign(digest, identity)?;
        let encoded = container.encode()?;
        let blob = self
            .objects
            .write(&Blob::new(encoded).to_stored_object())?;
        let replaced = self.notes.attach(target, &blob)?;

        info!(
            target = %target.short_hex(),
            blob = %blob.short_hex(),
            signer = %identity.subject(),
            algorithm = %identity.algorithm(),
            namespace = %self.notes.namespace(),
            "object signed"
        );
        Ok(SignResult {
            target: *target,
            blob,
            container,
            replaced,
        })
    }
}
