use std::fs;
use std::path::{Path, PathBuf};

use seal_core::{
    verify_all, AnnotationBridge, BatchReport, CancellationToken, ChainPolicy, SealConfig,
    SealError, SignResult, Signer, Verdict, Verification, Verifier,
};
use seal_crypto::{SigningIdentity, TrustStore};
use seal_notes::{FileNoteStore, InMemoryNoteStore, NoteEntry, NoteStore, NotesNamespace};
use seal_refs::{FileRefStore, InMemoryRefStore, Ref, RefError, RefStore};
use seal_store::{
    Blob, Commit, EntryMode, FsObjectStore, HistoryWalk, InMemoryObjectStore, ObjectStore,
    Person, Tree, TreeEntry,
};
use seal_types::ObjectId;
use tracing::{debug, info, warn};

use crate::commit::{CommitProposal, CommitResult, CommitSummary};
use crate::error::{SdkError, SdkResult};

/// Name of the repository metadata directory.
pub const SEAL_DIR: &str = ".seal";
const CONFIG_FILE: &str = "config.toml";
const DEFAULT_BRANCH: &str = "main";

/// A Seal repository: objects, refs, notes and settings.
pub struct Seal {
    seal_dir: Option<PathBuf>,
    objects: Box<dyn ObjectStore>,
    refs: Box<dyn RefStore>,
    notes: Box<dyn NoteStore>,
    config: SealConfig,
}

impl Seal {
    /// Create a repository under `<path>/.seal`.
    pub fn init(path: &Path) -> SdkResult<Self> {
        let seal_dir = path.join(SEAL_DIR);
        if seal_dir.exists() {
            return Err(SdkError::AlreadyInitialized(path.display().to_string()));
        }
        fs::create_dir_all(&seal_dir)?;
        let config = SealConfig::default();
        config.save(&seal_dir.join(CONFIG_FILE))?;

        let repo = Self::open_dir(seal_dir, config)?;
        repo.refs.set_head(DEFAULT_BRANCH)?;
        info!(path = %path.display(), "initialized repository");
        Ok(repo)
    }

    /// Open the repository containing `path`, searching parent directories.
    pub fn open(path: &Path) -> SdkResult<Self> {
        let seal_dir = path
            .ancestors()
            .map(|dir| dir.join(SEAL_DIR))
            .find(|candidate| candidate.is_dir())
            .ok_or_else(|| SdkError::NotInitialized(path.display().to_string()))?;
        let config = SealConfig::load_or_default(&seal_dir.join(CONFIG_FILE))?;
        debug!(seal_dir = %seal_dir.display(), "opened repository");
        Self::open_dir(seal_dir, config)
    }

    fn open_dir(seal_dir: PathBuf, config: SealConfig) -> SdkResult<Self> {
        Ok(Self {
            objects: Box::new(FsObjectStore::open(seal_dir.join("objects"))?),
            refs: Box::new(FileRefStore::open(seal_dir.join("refs.json"))?),
            notes: Box::new(FileNoteStore::open(seal_dir.join("notes"))?),
            seal_dir: Some(seal_dir),
            config,
        })
    }

    /// A repository that lives only in memory.
    pub fn in_memory() -> SdkResult<Self> {
        let repo = Self {
            seal_dir: None,
            objects: Box::new(InMemoryObjectStore::new()),
            refs: Box::new(InMemoryRefStore::new()),
            notes: Box::new(InMemoryNoteStore::new()),
            config: SealConfig::default(),
        };
        repo.refs.set_head(DEFAULT_BRANCH)?;
        Ok(repo)
    }

    // ---- Settings ----

    pub fn config(&self) -> &SealConfig {
        &self.config
    }

    /// Replace the settings, persisting them for on-disk repositories.
    pub fn set_config(&mut self, config: SealConfig) -> SdkResult<()> {
        if let Some(dir) = &self.seal_dir {
            config.save(&dir.join(CONFIG_FILE))?;
        }
        self.config = config;
        Ok(())
    }

    /// Override the chain policy for this handle only.
    pub fn set_chain_policy(&mut self, policy: ChainPolicy) {
        self.config.verify.chain_policy = policy;
    }

    pub fn namespace(&self) -> &NotesNamespace {
        &self.config.notes.namespace
    }

    pub fn seal_dir(&self) -> Option<&Path> {
        self.seal_dir.as_deref()
    }

    // ---- Content ----

    pub fn write_blob(&self, data: &[u8]) -> SdkResult<ObjectId> {
        Ok(self.objects.write(&Blob::new(data.to_vec()).to_stored_object())?)
    }

    pub fn read_commit(&self, id: &ObjectId) -> SdkResult<Commit> {
        let object = self
            .objects
            .read(id)?
            .ok_or_else(|| SealError::UnknownObject(id.to_hex()))?;
        Ok(Commit::from_stored_object(&object)?)
    }

    /// Resolve a revision string (`HEAD`, branch, tag, full hex id).
    pub fn resolve(&self, rev: &str) -> SdkResult<ObjectId> {
        match seal_refs::resolve(self.refs.as_ref(), self.objects.as_ref(), rev) {
            Ok(id) => Ok(id),
            Err(RefError::Unresolvable(rev)) => Err(SealError::UnknownObject(rev).into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Record a commit on top of HEAD and advance the current branch.
    pub fn commit(&self, proposal: CommitProposal) -> SdkResult<CommitResult> {
        let tree = match proposal.tree {
            Some(tree) => tree,
            None => {
                let mut entries = Vec::with_capacity(proposal.files.len());
                for (name, content) in &proposal.files {
                    entries.push(TreeEntry::new(EntryMode::Regular, name, self.write_blob(content)?));
                }
                self.objects.write(&Tree::new(entries).to_stored_object()?)?
            }
        };

        let head = self.refs.head()?;
        let (updated_ref, parent) = match &head {
            Some(Ref::Symbolic(branch)) => (branch.clone(), seal_refs::peel(self.refs.as_ref(), branch)?),
            Some(Ref::Direct(id)) => (seal_refs::HEAD.to_string(), Some(*id)),
            None => (seal_refs::branch_ref(DEFAULT_BRANCH), None),
        };
        let parents: Vec<ObjectId> = parent.into_iter().collect();

        let (time, tz) = proposal.effective_time();
        let who = Person::new(&proposal.author_name, &proposal.author_email, time, tz)?;
        let commit = Commit::new(tree, parents.clone(), who.clone(), who, &proposal.message);
        let id = self.objects.write(&commit.to_stored_object()?)?;

        self.refs.write_ref(&updated_ref, &Ref::Direct(id))?;
        if head.is_none() {
            self.refs.set_head(DEFAULT_BRANCH)?;
        }
        info!(commit = %id.short_hex(), ref_name = %updated_ref, "committed");
        Ok(CommitResult {
            id,
            tree,
            parents,
            updated_ref,
        })
    }

    /// Up to `limit` commits reachable from HEAD, newest first.
    pub fn log(&self, limit: usize) -> SdkResult<Vec<CommitSummary>> {
        let Some(tip) = seal_refs::peel(self.refs.as_ref(), seal_refs::HEAD)? else {
            return Ok(Vec::new());
        };
        let bridge = self.bridge();
        let mut out = Vec::new();
        for id in HistoryWalk::from_tips(self.objects.as_ref(), &[tip])?
            .into_iter()
            .take(limit)
        {
            let commit = self.read_commit(&id)?;
            out.push(CommitSummary {
                id: id.to_hex(),
                summary: commit.summary().to_string(),
                author: format!("{} <{}>", commit.author.name, commit.author.email),
                time: commit.author.time,
                tz_offset_minutes: commit.author.tz_offset_minutes,
                signed: bridge.lookup(&id)?.is_some(),
            });
        }
        Ok(out)
    }

    fn tips(&self) -> SdkResult<Vec<ObjectId>> {
        let mut tips = Vec::new();
        if let Some(head) = seal_refs::peel(self.refs.as_ref(), seal_refs::HEAD)? {
            tips.push(head);
        }
        for (name, _) in self.refs.list_refs("refs/")? {
            if let Some(id) = seal_refs::peel(self.refs.as_ref(), &name)? {
                tips.push(id);
            }
        }
        Ok(tips)
    }

    /// Every commit reachable from HEAD, branches and tags.
    pub fn all_commits(&self) -> SdkResult<Vec<ObjectId>> {
        Ok(HistoryWalk::from_tips(self.objects.as_ref(), &self.tips()?)?)
    }

    // ---- Signatures ----

    fn bridge(&self) -> AnnotationBridge<'_> {
        AnnotationBridge::new(self.notes.as_ref(), self.namespace().clone())
    }

    fn verifier(&self) -> Verifier<'_> {
        Verifier::new(self.objects.as_ref(), self.bridge())
            .with_policy(self.config.verify.chain_policy)
    }

    /// Sign the object `reference` names.
    pub fn sign(&self, reference: &str, identity: &SigningIdentity) -> SdkResult<SignResult> {
        let signer = Signer::new(self.objects.as_ref(), self.refs.as_ref(), self.bridge());
        Ok(signer.sign(reference, identity)?)
    }

    /// Sign with the identity named in the settings.
    pub fn sign_with_config(&self, reference: &str) -> SdkResult<SignResult> {
        let identity = self.config.signing_identity()?;
        self.sign(reference, &identity)
    }

    pub fn verify(&self, reference: &str, trust: &TrustStore) -> SdkResult<Verdict> {
        Ok(self.verify_detailed(reference, trust)?.verdict)
    }

    pub fn verify_detailed(&self, reference: &str, trust: &TrustStore) -> SdkResult<Verification> {
        let target = self.resolve(reference)?;
        Ok(self.verifier().verify_detailed(&target, trust)?)
    }

    pub fn has_signature(&self, reference: &str) -> SdkResult<bool> {
        let target = self.resolve(reference)?;
        Ok(self.verifier().has_signature(&target)?)
    }

    /// Notes in the signature namespace, ordered by target.
    pub fn list_signed(&self) -> SdkResult<Vec<NoteEntry>> {
        Ok(self.bridge().list()?)
    }

    /// Verify every commit in the repository. A damaged commit is judged on
    /// its own and never aborts the batch.
    pub fn verify_all(&self, trust: &TrustStore, cancel: &CancellationToken) -> SdkResult<BatchReport> {
        // Damaged commits stay in the batch: a signed one verifies as
        // `DigestMismatch`, a missing one is reported as failed.
        let walk = HistoryWalk::collect(self.objects.as_ref(), &self.tips()?)?;
        if !walk.unreadable.is_empty() {
            warn!(
                unreadable = walk.unreadable.len(),
                "history is damaged; ancestors behind unreadable commits may be skipped"
            );
        }
        Ok(verify_all(&self.verifier(), walk.visited, trust, cancel))
    }

    /// The trust store named in the settings.
    pub fn trust_store(&self) -> SdkResult<TrustStore> {
        Ok(self.config.trust_store()?)
    }

    pub fn objects(&self) -> &dyn ObjectStore {
        self.objects.as_ref()
    }

    pub fn refs(&self) -> &dyn RefStore {
        self.refs.as_ref()
    }
}
