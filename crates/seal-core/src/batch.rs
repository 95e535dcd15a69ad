use std::collections::BTreeMap;

use seal_crypto::TrustStore;
use seal_types::ObjectId;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::SealError;
use crate::verifier::{Verdict, Verification, Verifier};

/// Result of verifying many objects.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Objects that reached a verdict, in input order.
    pub verified: Vec<Verification>,
    /// Objects for which no verdict could be reached.
    pub failed: Vec<(ObjectId, SealError)>,
    /// Set when the batch stopped before the end of its input.
    pub cancelled: bool,
    /// Number of objects the batch was asked to verify.
    pub requested: usize,
}

impl BatchReport {
    /// Every requested object verified `Valid`.
    pub fn all_valid(&self) -> bool {
        !self.cancelled
            && self.failed.is_empty()
            && self.verified.len() == self.requested
            && self.verified.iter().all(|v| v.verdict.is_valid())
    }

    pub fn count(&self, verdict: Verdict) -> usize {
        self.verified.iter().filter(|v| v.verdict == verdict).count()
    }

    /// Verdict histogram.
    pub fn summary(&self) -> BTreeMap<Verdict, usize> {
        let mut counts = BTreeMap::new();
        for v in &self.verified {
            *counts.entry(v.verdict).or_insert(0) += 1;
        }
        counts
    }
}

/// Verify `targets` in order, checking `cancel` before each one.
///
/// A per-object error is recorded and the batch moves on. Cancellation
/// stops the batch and leaves the objects after it unverified.
pub fn verify_all(
    verifier: &Verifier<'_>,
    targets: Vec<ObjectId>,
    trust: &TrustStore,
    cancel: &CancellationToken,
) -> BatchReport {
    let mut report = BatchReport {
        requested: targets.len(),
        ..BatchReport::default()
    };

    for target in targets {
        if cancel.is_cancelled() {
            warn!(
                done = report.verified.len() + report.failed.len(),
                requested = report.requested,
                "batch verification cancelled"
            );
            report.cancelled = true;
            break;
        }
        match verifier.verify_detailed(&target, trust) {
            Ok(verification) => report.verified.push(verification),
            Err(e) => {
                warn!(target = %target.short_hex(), error = %e, "verification failed");
                report.failed.push((target, e));
            }
        }
    }

    info!(
        requested = report.requested,
        valid = report.count(Verdict::Valid),
        failed = report.failed.len(),
        cancelled = report.cancelled,
        "batch verification finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;
    use seal_crypto::test_support::TestAuthority;
    use seal_store::{ObjectStore, StoreResult, StoredObject};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn mixed_batch_reports_each_verdict() {
        let fx = Fixture::new();
        let ca = TestAuthority::new("Test CA");
        let signed = fx.blob(b"signed");
        let unsigned = fx.blob(b"unsigned");
        let missing = ObjectId::from_bytes(b"missing");
        fx.signer().sign_object(&signed, &ca.issue("alice")).unwrap();

        let report = verify_all(
            &fx.verifier(),
            vec![signed, unsigned, missing],
            &ca.trust_store(),
            &CancellationToken::new(),
        );
        assert_eq!(report.requested, 3);
        assert_eq!(report.count(Verdict::Valid), 1);
        assert_eq!(report.count(Verdict::NoSignature), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, missing);
        assert!(!report.cancelled);
        assert!(!report.all_valid());
    }

    #[test]
    fn all_signed_is_all_valid() {
        let fx = Fixture::new();
        let ca = TestAuthority::new("Test CA");
        let identity = ca.issue("alice");
        let ids: Vec<ObjectId> = (0..3u8).map(|i| fx.blob(&[i])).collect();
        for id in &ids {
            fx.signer().sign_object(id, &identity).unwrap();
        }
        let report = verify_all(
            &fx.verifier(),
            ids,
            &ca.trust_store(),
            &CancellationToken::new(),
        );
        assert!(report.all_valid());
        assert_eq!(report.summary().get(&Verdict::Valid), Some(&3));
    }

    #[test]
    fn cancelled_token_stops_before_work() {
        let fx = Fixture::new();
        let ids: Vec<ObjectId> = (0..5u8).map(|i| fx.blob(&[i])).collect();
        let token = CancellationToken::new();
        token.cancel();

        let report = verify_all(&fx.verifier(), ids, &TrustStore::new(), &token);
        assert!(report.cancelled);
        assert!(report.verified.is_empty());
        assert_eq!(report.requested, 5);
        assert!(!report.all_valid());
    }

    /// Cancels `token` while the `at`-th object is being verified.
    struct CancelDuring<'a> {
        inner: &'a dyn ObjectStore,
        token: CancellationToken,
        calls: AtomicUsize,
        at: usize,
    }

    impl ObjectStore for CancelDuring<'_> {
        fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
            self.inner.read(id)
        }

        fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
            self.inner.write(object)
        }

        fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
            if self.calls.fetch_add(1, Ordering::SeqCst) + 1 == self.at {
                self.token.cancel();
            }
            self.inner.exists(id)
        }

        fn delete(&self, id: &ObjectId) -> StoreResult<bool> {
            self.inner.delete(id)
        }
    }

    #[test]
    fn cancellation_mid_batch_keeps_finished_results() {
        let fx = Fixture::new();
        let ids: Vec<ObjectId> = (0..5u8).map(|i| fx.blob(&[i])).collect();
        let token = CancellationToken::new();
        let store = CancelDuring {
            inner: &fx.objects,
            token: token.clone(),
            calls: AtomicUsize::new(0),
            at: 2,
        };
        let verifier = Verifier::new(&store, fx.bridge());

        let report = verify_all(&verifier, ids, &TrustStore::new(), &token);
        assert!(report.cancelled);
        assert_eq!(report.verified.len(), 2);
        assert_eq!(report.count(Verdict::NoSignature), 2);
    }

    #[test]
    fn empty_batch_is_vacuously_valid() {
        let fx = Fixture::new();
        let report = verify_all(
            &fx.verifier(),
            Vec::new(),
            &TrustStore::new(),
            &CancellationToken::new(),
        );
        assert!(report.all_valid());
    }
}
