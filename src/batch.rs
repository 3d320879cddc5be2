//! Per-item accounting for batch mutations.
//!
//! Batch operations never abort on a bad item; instead every attempted
//! (sticker, tag) pair lands in a [`BatchReport`] with the exact outcome,
//! so callers can tell which items were skipped and why.

use crate::error::ValidationError;

/// What happened to one attempted (sticker, tag) insertion.
#[derive(Debug, PartialEq)]
pub enum TagOutcome {
    /// The row was written
    Added,

    /// The item violated a validation rule and was left out
    Skipped(ValidationError),

    /// The storage layer refused the row; the batch continued anyway
    Failed(String),
}

#[derive(Debug, PartialEq)]
pub struct TagItem {
    pub sticker: String,
    pub tag: String,
    pub outcome: TagOutcome,
}

/// Accumulated result of one batch mutation call.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Rows deleted by the removal phase, if the operation had one.
    pub removed: u64,

    /// One record per attempted insertion, in attempt order.
    pub items: Vec<TagItem>,
}

impl BatchReport {
    pub fn push(
        &mut self,
        sticker: impl Into<String>,
        tag: impl Into<String>,
        outcome: TagOutcome,
    ) {
        self.items.push(TagItem {
            sticker: sticker.into(),
            tag: tag.into(),
            outcome,
        });
    }

    pub fn added(&self) -> usize {
        self.count(|o| matches!(o, TagOutcome::Added))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, TagOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, TagOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&TagOutcome) -> bool) -> usize {
        self.items.iter().filter(|item| pred(&item.outcome)).count()
    }
}
