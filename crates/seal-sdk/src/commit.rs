use chrono::{DateTime, FixedOffset, Local, TimeZone};
use seal_types::ObjectId;
use serde::{Deserialize, Serialize};

/// What to record in a new commit.
#[derive(Clone, Debug)]
pub struct CommitProposal {
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    /// Files placed in the commit's tree, by name.
    pub files: Vec<(String, Vec<u8>)>,
    /// Use this tree instead of building one from `files`.
    pub tree: Option<ObjectId>,
    /// Commit time; defaults to now in the local timezone.
    pub time: Option<DateTime<FixedOffset>>,
}

impl CommitProposal {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            author_name: "Seal User".into(),
            author_email: "seal@localhost".into(),
            files: Vec::new(),
            tree: None,
            time: None,
        }
    }

    pub fn with_author(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.author_name = name.into();
        self.author_email = email.into();
        self
    }

    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.files.push((name.into(), content.into()));
        self
    }

    pub fn with_tree(mut self, tree: ObjectId) -> Self {
        self.tree = Some(tree);
        self
    }

    pub fn with_time(mut self, time: DateTime<FixedOffset>) -> Self {
        self.time = Some(time);
        self
    }

    /// `(unix seconds, UTC offset in minutes)` for the commit.
    pub fn effective_time(&self) -> (i64, i32) {
        let time = self.time.unwrap_or_else(|| Local::now().fixed_offset());
        (time.timestamp(), time.offset().local_minus_utc() / 60)
    }
}

/// Result of a commit operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitResult {
    pub id: ObjectId,
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    /// Ref that now points at the commit (`HEAD` when detached).
    pub updated_ref: String,
}

/// One line of history for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub id: String,
    pub summary: String,
    pub author: String,
    pub time: i64,
    pub tz_offset_minutes: i32,
    /// Has a note in the signature namespace (validity not checked).
    pub signed: bool,
}

impl CommitSummary {
    /// Commit time in the author's recorded offset.
    pub fn datetime(&self) -> Option<DateTime<FixedOffset>> {
        FixedOffset::east_opt(self.tz_offset_minutes * 60)?
            .timestamp_opt(self.time, 0)
            .single()
    }
}
