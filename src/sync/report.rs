use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Category,
    Tag,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Category => write!(f, "category"),
            EntityKind::Tag => write!(f, "tag"),
        }
    }
}

/// Why an undeclared row was kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    CategoryInUse { tags: i64 },
    TagReferenced { active: i64, unlocks: i64 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::CategoryInUse { tags } => write!(f, "{} tag(s) still use it", tags),
            SkipReason::TagReferenced { active, unlocks } => write!(
                f,
                "{} player(s) have it active, {} unlock(s) reference it",
                active, unlocks
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntity {
    pub name: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub name: String,
    pub message: String,
}

/// Per-table outcome of one reconciliation run.
#[derive(Debug, Clone)]
pub struct PhaseReport {
    pub kind: EntityKind,
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
    pub skipped: Vec<SkippedEntity>,
    pub failed: Vec<SyncFailure>,
}

impl PhaseReport {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            created: Vec::new(),
            updated: Vec::new(),
            deleted: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn synced(&self) -> usize {
        self.created.len() + self.updated.len()
    }

    pub(crate) fn fail(&mut self, name: impl Into<String>, message: impl ToString) {
        self.failed.push(SyncFailure {
            name: name.into(),
            message: message.to_string(),
        });
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} synced ({} new), {} deleted, {} kept, {} failed",
            self.kind,
            self.synced(),
            self.created.len(),
            self.deleted.len(),
            self.skipped.len(),
            self.failed.len()
        )
    }
}

#[derive(Debug, Clone)]
pub struct SyncReport {
    pub categories: PhaseReport,
    pub tags: PhaseReport,
    pub elapsed: Duration,
}

impl SyncReport {
    pub fn has_failures(&self) -> bool {
        !self.categories.failed.is_empty() || !self.tags.failed.is_empty()
    }

    /// Undeclared entities kept because players still depend on them.
    pub fn orphans(&self) -> impl Iterator<Item = (EntityKind, &SkippedEntity)> {
        self.categories
            .skipped
            .iter()
            .map(|entry| (EntityKind::Category, entry))
            .chain(self.tags.skipped.iter().map(|entry| (EntityKind::Tag, entry)))
    }

    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            self.categories.summary(),
            self.tags.summary(),
            format!("completed in {} ms", self.elapsed.as_millis()),
        ]
    }
}
