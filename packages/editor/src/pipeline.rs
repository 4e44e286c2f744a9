//! # Generation Pipeline
//!
//! Coordinates the path from generated content to a reviewable batch:
//! Parse or Validate → Diff → Changes → Register
//!
//! Generated content arrives either as email markup or as a JSON payload.
//! Content that yields no usable template is rejected as a whole; the live
//! template is never touched until changes are accepted.

use crate::errors::{EditorError, EditorResult};
use crate::session::{EditSession, Proposal};
use mailcraft_diff::TemplateDiffResult;
use mailcraft_document::Template;
use mailcraft_parser::{parse_with_options, ParseOptions, Skipped};
use serde_json::Value;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    parse_options: ParseOptions,
}

/// Result of pipeline execution
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Batch registered for review, absent when nothing changed
    pub batch_id: Option<String>,
    pub diff: TemplateDiffResult,
    /// Number of change records in the batch
    pub changes: usize,
    /// Markup fragments that could not be imported
    pub skipped: Vec<Skipped>,
}

impl Pipeline {
    pub fn new(parse_options: ParseOptions) -> Self {
        Self { parse_options }
    }

    /// Parse generated markup and propose it against the session template
    #[instrument(skip_all, fields(project = %session.project_id, len = markup.len()))]
    pub fn ingest_markup(
        &self,
        session: &mut EditSession,
        markup: &str,
        rationale: Option<&str>,
    ) -> EditorResult<PipelineResult> {
        let report = parse_with_options(markup, &self.parse_options)?;
        if !report.skipped.is_empty() {
            warn!(skipped = report.skipped.len(), "some generated fragments were dropped");
        }

        let proposal = self.propose(session, report.template, rationale)?;
        Ok(PipelineResult::from_proposal(proposal, report.skipped))
    }

    /// Validate a generated document payload and propose it
    #[instrument(skip_all, fields(project = %session.project_id))]
    pub fn ingest_payload(
        &self,
        session: &mut EditSession,
        payload: &Value,
        rationale: Option<&str>,
    ) -> EditorResult<PipelineResult> {
        let template = mailcraft_schema::validate_template(payload)?;
        let proposal = self.propose(session, template, rationale)?;
        Ok(PipelineResult::from_proposal(proposal, Vec::new()))
    }

    fn propose(
        &self,
        session: &mut EditSession,
        mut candidate: Template,
        rationale: Option<&str>,
    ) -> EditorResult<Proposal> {
        if candidate.sections.is_empty() {
            return Err(EditorError::NoUsableContent);
        }

        // Generated content describes the same email, whatever id it carries
        candidate.id = session.template().id.clone();

        let proposal = session.propose(&candidate, rationale)?;
        info!(changes = proposal.changes, "generated content ingested");
        Ok(proposal)
    }
}

impl PipelineResult {
    fn from_proposal(proposal: Proposal, skipped: Vec<Skipped>) -> Self {
        Self {
            batch_id: proposal.batch_id,
            diff: proposal.diff,
            changes: proposal.changes,
            skipped,
        }
    }
}
