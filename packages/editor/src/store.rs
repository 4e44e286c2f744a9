//! # Project Storage
//!
//! The persistence collaborator behind an [`EditSession`](crate::EditSession):
//! one template and one change history per project id.
//!
//! - **Memory**: for tests and short-lived sessions
//! - **Directory**: JSON files on disk, used by the CLI

use crate::change::PendingChange;
use crate::errors::{EditorError, EditorResult};
use mailcraft_document::Template;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub trait ProjectStore {
    fn load_template(&self, project_id: &str) -> EditorResult<Template>;

    fn save_template(&mut self, project_id: &str, template: &Template) -> EditorResult<()>;

    /// Change records in the order they were registered. Projects without
    /// a history yield an empty list.
    fn load_changes(&self, project_id: &str) -> EditorResult<Vec<PendingChange>>;

    /// Replace the stored history with `changes`
    fn save_changes(&mut self, project_id: &str, changes: &[PendingChange]) -> EditorResult<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    templates: HashMap<String, Template>,
    changes: HashMap<String, Vec<PendingChange>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectStore for MemoryStore {
    fn load_template(&self, project_id: &str) -> EditorResult<Template> {
        self.templates
            .get(project_id)
            .cloned()
            .ok_or_else(|| EditorError::ProjectNotFound(project_id.to_string()))
    }

    fn save_template(&mut self, project_id: &str, template: &Template) -> EditorResult<()> {
        self.templates.insert(project_id.to_string(), template.clone());
        Ok(())
    }

    fn load_changes(&self, project_id: &str) -> EditorResult<Vec<PendingChange>> {
        Ok(self.changes.get(project_id).cloned().unwrap_or_default())
    }

    fn save_changes(&mut self, project_id: &str, changes: &[PendingChange]) -> EditorResult<()> {
        self.changes.insert(project_id.to_string(), changes.to_vec());
        Ok(())
    }
}

/// Stores `<project>.template.json` and `<project>.changes.json` in a directory
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn template_path(&self, project_id: &str) -> PathBuf {
        self.root.join(format!("{}.template.json", project_id))
    }

    fn changes_path(&self, project_id: &str) -> PathBuf {
        self.root.join(format!("{}.changes.json", project_id))
    }

    fn write(&self, path: &Path, contents: String) -> EditorResult<()> {
        fs::create_dir_all(&self.root)?;
        fs::write(path, contents)?;
        debug!(path = %path.display(), "wrote project file");
        Ok(())
    }
}

impl ProjectStore for DirectoryStore {
    fn load_template(&self, project_id: &str) -> EditorResult<Template> {
        let path = self.template_path(project_id);
        if !path.exists() {
            return Err(EditorError::ProjectNotFound(project_id.to_string()));
        }
        let text = fs::read_to_string(&path)?;
        Ok(mailcraft_schema::validate_json(&text)?)
    }

    fn save_template(&mut self, project_id: &str, template: &Template) -> EditorResult<()> {
        let path = self.template_path(project_id);
        self.write(&path, serde_json::to_string_pretty(template)?)
    }

    fn load_changes(&self, project_id: &str) -> EditorResult<Vec<PendingChange>> {
        let path = self.changes_path(project_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn save_changes(&mut self, project_id: &str, changes: &[PendingChange]) -> EditorResult<()> {
        let path = self.changes_path(project_id);
        self.write(&path, serde_json::to_string_pretty(changes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeType;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(matches!(store.load_template("p1"), Err(EditorError::ProjectNotFound(_))));
        assert!(store.load_changes("p1").unwrap().is_empty());

        let template = Template::new("t1", "News");
        store.save_template("p1", &template).unwrap();
        assert_eq!(store.load_template("p1").unwrap(), template);

        let change = PendingChange::new("c1", "p1", "b1", "t1", ChangeType::TemplateEdit);
        store.save_changes("p1", &[change.clone()]).unwrap();
        assert_eq!(store.load_changes("p1").unwrap(), vec![change]);
    }

    #[test]
    fn test_directory_store_round_trip() {
        let root = std::env::temp_dir().join(format!("mailcraft-store-{}", std::process::id()));
        let mut store = DirectoryStore::new(&root);

        let template = Template::new("t1", "News");
        store.save_template("p1", &template).unwrap();
        assert_eq!(store.load_template("p1").unwrap(), template);

        let change = PendingChange::new("c1", "p1", "b1", "t1", ChangeType::TemplateEdit);
        store.save_changes("p1", &[change.clone()]).unwrap();
        assert_eq!(store.load_changes("p1").unwrap(), vec![change]);

        assert!(matches!(store.load_template("p2"), Err(EditorError::ProjectNotFound(_))));
        fs::remove_dir_all(&root).unwrap();
    }
}
