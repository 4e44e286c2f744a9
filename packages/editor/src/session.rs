//! # Edit Session
//!
//! One project's editing state: the live template plus its change history.
//!
//! The session is owned by the caller and passed down explicitly; nothing
//! in this crate keeps a template alive between calls. Two kinds of edits
//! reach the template:
//!
//! - direct [`Mutation`]s, applied immediately
//! - proposals (a candidate template from generation), turned into a
//!   reviewable batch of [`PendingChange`](crate::PendingChange)s that only
//!   touch the template when accepted

use crate::batch::{ChangeBatchManager, Transition};
use crate::change::{changes_from_diff, ChangeContext};
use crate::errors::EditorResult;
use crate::mutations::Mutation;
use crate::store::ProjectStore;
use mailcraft_compiler_html::{compile_to_html, CompileOptions};
use mailcraft_diff::{diff_templates, TemplateDiffResult};
use mailcraft_document::{IDGenerator, Template};
use tracing::{debug, info, instrument};

pub struct EditSession {
    pub project_id: String,
    template: Template,
    changes: ChangeBatchManager,
    ids: IDGenerator,
}

/// A proposal turned into a batch
#[derive(Debug, Clone)]
pub struct Proposal {
    /// Absent when the proposal matched the live template
    pub batch_id: Option<String>,
    pub diff: TemplateDiffResult,
    pub changes: usize,
}

impl EditSession {
    pub fn new(project_id: impl Into<String>, template: Template) -> Self {
        Self {
            project_id: project_id.into(),
            template,
            changes: ChangeBatchManager::new(),
            ids: IDGenerator::new(),
        }
    }

    /// Use a specific id source for batches and change records
    pub fn with_id_generator(mut self, ids: IDGenerator) -> Self {
        self.ids = ids;
        self
    }

    /// Load a project's template and change history
    pub fn open<S: ProjectStore>(store: &S, project_id: &str) -> EditorResult<Self> {
        let template = store.load_template(project_id)?;
        let changes = store.load_changes(project_id)?;
        debug!(project = %project_id, changes = changes.len(), "opened session");

        Ok(Self {
            project_id: project_id.to_string(),
            template,
            changes: ChangeBatchManager::from_changes(changes),
            ids: IDGenerator::new(),
        })
    }

    pub fn save<S: ProjectStore>(&self, store: &mut S) -> EditorResult<()> {
        store.save_template(&self.project_id, &self.template)?;
        store.save_changes(&self.project_id, self.changes.history())
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn changes(&self) -> &ChangeBatchManager {
        &self.changes
    }

    /// Apply a direct edit
    pub fn apply(&mut self, mutation: &Mutation) -> EditorResult<()> {
        mutation.apply(&mut self.template)?;
        Ok(())
    }

    /// Diff `candidate` against the live template and register the result
    /// as a new batch, superseding the current one
    #[instrument(skip_all, fields(project = %self.project_id))]
    pub fn propose(
        &mut self,
        candidate: &Template,
        rationale: Option<&str>,
    ) -> EditorResult<Proposal> {
        let diff = diff_templates(&self.template, candidate);
        if !diff.has_changes {
            debug!("proposal matches the live template");
            return Ok(Proposal { batch_id: None, diff, changes: 0 });
        }

        let batch_id = self.ids.new_id();
        let mut context = ChangeContext::new(&self.project_id, &batch_id);
        if let Some(rationale) = rationale {
            context = context.with_rationale(rationale);
        }

        let changes = changes_from_diff(&self.template, candidate, &diff, &context, &mut self.ids);
        let count = self.changes.register_batch(&batch_id, changes, &mut self.template)?;
        info!(batch = %batch_id, changes = count, "proposal registered");

        Ok(Proposal {
            batch_id: Some(batch_id),
            diff,
            changes: count,
        })
    }

    pub fn accept_one(&mut self, change_id: &str) -> EditorResult<Transition> {
        self.changes.accept_one(change_id, &mut self.template)
    }

    pub fn reject_one(&mut self, change_id: &str) -> EditorResult<Transition> {
        self.changes.reject_one(change_id, &mut self.template)
    }

    pub fn accept_batch(&mut self, batch_id: &str) -> EditorResult<usize> {
        self.changes.accept_batch(batch_id, &mut self.template)
    }

    pub fn reject_batch(&mut self, batch_id: &str) -> EditorResult<usize> {
        self.changes.reject_batch(batch_id, &mut self.template)
    }

    /// Render the live template, pending changes excluded
    pub fn render(&self, options: &CompileOptions) -> EditorResult<String> {
        Ok(compile_to_html(&self.template, options)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::EditorError;
    use mailcraft_document::{starter_template, Fillable};

    fn session() -> EditSession {
        let mut ids = IDGenerator::sequential("doc");
        let template = starter_template("Welcome", &mut ids);
        EditSession::new("p1", template).with_id_generator(IDGenerator::sequential("chg"))
    }

    #[test]
    fn test_identical_proposal_registers_nothing() {
        let mut session = session();
        let candidate = session.template().clone();

        let proposal = session.propose(&candidate, None).unwrap();
        assert_eq!(proposal.batch_id, None);
        assert_eq!(proposal.changes, 0);
        assert!(session.changes().history().is_empty());
    }

    #[test]
    fn test_propose_then_accept() {
        let mut session = session();
        let mut candidate = session.template().clone();
        candidate.name = "Welcome back".to_string();
        let first = candidate.elements().find(|e| e.content().is_some()).unwrap().id().to_string();
        *candidate.element_mut(&first).unwrap().content_mut().unwrap() = Fillable::value("Changed");

        let proposal = session.propose(&candidate, Some("friendlier tone")).unwrap();
        let batch_id = proposal.batch_id.unwrap();
        assert_eq!(proposal.changes, 2);
        assert!(session
            .changes()
            .actionable()
            .iter()
            .all(|c| c.ai_rationale.as_deref() == Some("friendlier tone")));

        // Not merged until accepted
        assert_eq!(session.template().name, "Welcome");

        session.accept_batch(&batch_id).unwrap();
        assert_eq!(session.template(), &candidate);
    }

    #[test]
    fn test_direct_edit_error_is_reported() {
        let mut session = session();
        let err = session
            .apply(&Mutation::RenameTemplate { name: String::new() })
            .unwrap_err();
        assert!(matches!(err, EditorError::Mutation(_)));
    }

    #[test]
    fn test_save_and_open() {
        let mut store = MemoryStore::new();
        let mut session = session();
        let mut candidate = session.template().clone();
        candidate.name = "Renamed".to_string();
        session.propose(&candidate, None).unwrap();
        session.save(&mut store).unwrap();

        let reopened = EditSession::open(&store, "p1").unwrap();
        assert_eq!(reopened.template(), session.template());
        assert_eq!(reopened.changes().actionable().len(), 1);
        assert_eq!(reopened.changes().current_batch(), session.changes().current_batch());
    }

    #[test]
    fn test_render_live_template() {
        let session = session();
        let html = session.render(&CompileOptions::default()).unwrap();
        assert!(html.contains("email-container"));
    }
}
