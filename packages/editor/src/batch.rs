//! # Change Batch Manager
//!
//! Owns the append-only history of [`PendingChange`]s for one project and
//! drives their review state machine:
//!
//! ```text
//! pending --accept--> accepted
//! pending --reject--> rejected
//! ```
//!
//! Both outcomes are terminal. Only pending members of the current batch
//! are actionable; registering a new batch supersedes the previous one
//! without deleting it.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut manager = ChangeBatchManager::new();
//! manager.register_batch("b1", changes, &mut template)?;
//!
//! manager.accept_one("c1", &mut template)?;
//! manager.reject_batch("b1", &mut template)?;
//! ```

use crate::change::{ChangeStatus, ChangeType, PendingChange};
use crate::errors::{EditorError, EditorResult};
use crate::merge::merge_change;
use mailcraft_document::Template;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// Outcome of resolving a single change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The change moved out of `pending`
    Applied,
    /// The change was already in the requested state
    Unchanged,
}

#[derive(Debug, Clone, Default)]
pub struct ChangeBatchManager {
    changes: Vec<PendingChange>,
    current_batch: Option<String>,
}

impl ChangeBatchManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from persisted records. The batch of the last record is
    /// taken as current.
    pub fn from_changes(changes: Vec<PendingChange>) -> Self {
        let current_batch = changes.last().map(|c| c.batch_id.clone());
        Self { changes, current_batch }
    }

    pub fn current_batch(&self) -> Option<&str> {
        self.current_batch.as_deref()
    }

    /// Every change ever registered, oldest first
    pub fn history(&self) -> &[PendingChange] {
        &self.changes
    }

    pub fn into_changes(self) -> Vec<PendingChange> {
        self.changes
    }

    pub fn change(&self, id: &str) -> Option<&PendingChange> {
        self.changes.iter().find(|c| c.id == id)
    }

    pub fn batch(&self, batch_id: &str) -> impl Iterator<Item = &PendingChange> + '_ {
        let batch_id = batch_id.to_string();
        self.changes.iter().filter(move |c| c.batch_id == batch_id)
    }

    /// Pending changes of the current batch, the only ones offered for review
    pub fn actionable(&self) -> Vec<&PendingChange> {
        match &self.current_batch {
            Some(current) => self
                .changes
                .iter()
                .filter(|c| c.is_pending() && &c.batch_id == current)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn pending_count(&self, batch_id: &str) -> usize {
        self.batch(batch_id).filter(|c| c.is_pending()).count()
    }

    /// Append a new batch and make it current.
    ///
    /// Sections targeted by a `section_delete` are flagged as pending
    /// deletion; flags left by the superseded batch are cleared.
    pub fn register_batch(
        &mut self,
        batch_id: &str,
        changes: Vec<PendingChange>,
        template: &mut Template,
    ) -> EditorResult<usize> {
        let mut seen: HashSet<&str> = self.changes.iter().map(|c| c.id.as_str()).collect();
        for change in &changes {
            if change.batch_id != batch_id {
                return Err(EditorError::BatchMismatch {
                    change: change.id.clone(),
                    expected: batch_id.to_string(),
                    found: change.batch_id.clone(),
                });
            }
            if !seen.insert(change.id.as_str()) {
                return Err(EditorError::DuplicateChange(change.id.clone()));
            }
        }

        if let Some(previous) = self.current_batch.take() {
            if previous != batch_id {
                let stale: Vec<String> = self
                    .batch(&previous)
                    .filter(|c| c.is_pending() && c.change_type == ChangeType::SectionDelete)
                    .map(|c| c.target_id.clone())
                    .collect();
                for target in stale {
                    set_pending_deletion(template, &target, false);
                }
            }
        }

        for change in &changes {
            if change.is_pending() && change.change_type == ChangeType::SectionDelete {
                set_pending_deletion(template, &change.target_id, true);
            }
        }

        let count = changes.len();
        info!(batch = %batch_id, count, "registered change batch");
        self.changes.extend(changes);
        self.current_batch = Some(batch_id.to_string());
        Ok(count)
    }

    /// Accept one change and merge its content into `template`.
    ///
    /// Accepting an accepted change is a no-op.
    pub fn accept_one(
        &mut self,
        change_id: &str,
        template: &mut Template,
    ) -> EditorResult<Transition> {
        let index = self.index_of(change_id)?;
        let change = &self.changes[index];

        match change.status {
            ChangeStatus::Accepted => return Ok(Transition::Unchanged),
            ChangeStatus::Rejected => {
                return Err(EditorError::AlreadyResolved {
                    id: change.id.clone(),
                    status: change.status,
                })
            }
            ChangeStatus::Pending => {}
        }
        if !self.is_current(&change.batch_id) {
            return Err(EditorError::Superseded(change.id.clone()));
        }

        let members = self.members(&change.batch_id);
        merge_change(template, change, &members)?;
        self.changes[index].status = ChangeStatus::Accepted;
        debug!(change = %change_id, "accepted change");
        Ok(Transition::Applied)
    }

    /// Reject one change. The template only changes when a pending
    /// deletion flag has to be lifted.
    pub fn reject_one(
        &mut self,
        change_id: &str,
        template: &mut Template,
    ) -> EditorResult<Transition> {
        let index = self.index_of(change_id)?;
        let change = &self.changes[index];

        match change.status {
            ChangeStatus::Rejected => return Ok(Transition::Unchanged),
            ChangeStatus::Accepted => {
                return Err(EditorError::AlreadyResolved {
                    id: change.id.clone(),
                    status: change.status,
                })
            }
            ChangeStatus::Pending => {}
        }

        if change.change_type == ChangeType::SectionDelete {
            set_pending_deletion(template, &change.target_id, false);
        }
        self.changes[index].status = ChangeStatus::Rejected;
        debug!(change = %change_id, "rejected change");
        Ok(Transition::Applied)
    }

    /// Accept every pending member of a batch as one unit.
    ///
    /// Merges run against a copy of the template; statuses and template are
    /// committed only when all of them succeed. Retrying after success
    /// accepts nothing and returns 0.
    #[instrument(skip(self, template))]
    pub fn accept_batch(&mut self, batch_id: &str, template: &mut Template) -> EditorResult<usize> {
        let pending = self.pending_indices(batch_id)?;
        if pending.is_empty() {
            return Ok(0);
        }
        if !self.is_current(batch_id) {
            return Err(EditorError::Superseded(self.changes[pending[0]].id.clone()));
        }

        let members = self.members(batch_id);
        let mut working = template.clone();
        for &index in &pending {
            merge_change(&mut working, &self.changes[index], &members)?;
        }

        *template = working;
        for &index in &pending {
            self.changes[index].status = ChangeStatus::Accepted;
        }
        info!(batch = %batch_id, accepted = pending.len(), "accepted batch");
        Ok(pending.len())
    }

    /// Reject every pending member of a batch. Superseded batches may be
    /// rejected too, to clear them out of storage queries.
    #[instrument(skip(self, template))]
    pub fn reject_batch(&mut self, batch_id: &str, template: &mut Template) -> EditorResult<usize> {
        let pending = self.pending_indices(batch_id)?;
        for &index in &pending {
            let change = &mut self.changes[index];
            if change.change_type == ChangeType::SectionDelete {
                set_pending_deletion(template, &change.target_id, false);
            }
            change.status = ChangeStatus::Rejected;
        }
        info!(batch = %batch_id, rejected = pending.len(), "rejected batch");
        Ok(pending.len())
    }

    fn index_of(&self, change_id: &str) -> EditorResult<usize> {
        self.changes
            .iter()
            .position(|c| c.id == change_id)
            .ok_or_else(|| EditorError::ChangeNotFound(change_id.to_string()))
    }

    fn is_current(&self, batch_id: &str) -> bool {
        self.current_batch.as_deref() == Some(batch_id)
    }

    fn members(&self, batch_id: &str) -> Vec<PendingChange> {
        self.batch(batch_id).cloned().collect()
    }

    fn pending_indices(&self, batch_id: &str) -> EditorResult<Vec<usize>> {
        if !self.changes.iter().any(|c| c.batch_id == batch_id) {
            return Err(EditorError::BatchNotFound(batch_id.to_string()));
        }
        Ok(self
            .changes
            .iter()
            .enumerate()
            .filter(|(_, c)| c.batch_id == batch_id && c.is_pending())
            .map(|(i, _)| i)
            .collect())
    }
}

fn set_pending_deletion(template: &mut Template, section_id: &str, flag: bool) {
    if let Some(section) = template.section_mut(section_id) {
        section.pending_deletion = flag;
    }
}
