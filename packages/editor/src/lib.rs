//! # Mailcraft Editor
//!
//! Review and editing engine for email templates.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ generated markup / payload                  │
//! │   parser / schema → candidate Template      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ diff: live Template vs candidate            │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: review state + live Template        │
//! │  - Turn a diff into a batch of changes      │
//! │  - Accept / reject one change or a batch    │
//! │  - Merge accepted content                   │
//! │  - Apply direct edits                       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ compiler-html: Template → email markup      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Template is source of truth**: markup is a derived view
//! 2. **Proposals never write**: generated content only reaches the
//!    template through accepted changes
//! 3. **Commutative batches**: members of one batch can be accepted in any
//!    order with the same result
//! 4. **Append-only history**: superseded batches stay in storage
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mailcraft_editor::{EditSession, MemoryStore, Pipeline};
//!
//! let mut session = EditSession::open(&store, "project-1")?;
//!
//! let result = Pipeline::default().ingest_markup(&mut session, &markup, None)?;
//! for change in session.changes().actionable() {
//!     println!("{} {}", change.change_type, change.target_id);
//! }
//!
//! if let Some(batch) = &result.batch_id {
//!     session.accept_batch(batch)?;
//! }
//! session.save(&mut store)?;
//! ```

mod batch;
mod change;
mod errors;
mod merge;
mod mutations;
mod pipeline;
mod session;
mod store;

pub use batch::{ChangeBatchManager, Transition};
pub use change::{changes_from_diff, ChangeContext, ChangeStatus, ChangeType, PendingChange};
pub use errors::{EditorError, EditorResult};
pub use merge::{merge_change, MergeError, MergeResult};
pub use mutations::{Mutation, MutationError, MutationResult};
pub use pipeline::{Pipeline, PipelineResult};
pub use session::{EditSession, Proposal};
pub use store::{DirectoryStore, MemoryStore, ProjectStore};

// Re-export common types for convenience
pub use mailcraft_diff::TemplateDiffResult;
pub use mailcraft_document::Template;
