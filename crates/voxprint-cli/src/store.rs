//! On-disk workflow context.
//!
//! The context is stored as a small JSON envelope:
//!
//! ```json
//! { "savedAt": "2026-01-01T12:00:00Z", "context": { ... } }
//! ```
//!
//! An unreadable file is never fatal: the session starts fresh and the
//! problem is logged.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use voxprint_intent::{WorkflowContext, deserialize_context};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredContext<'a> {
    saved_at: DateTime<Utc>,
    context: &'a WorkflowContext,
}

/// Read side of [`StoredContext`].  The context stays raw JSON so the
/// library decoder can repair or replace it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEnvelope {
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    context: serde_json::Value,
}

/// Loads and saves the single session context.
#[derive(Debug, Clone)]
pub struct ContextStore {
    path: PathBuf,
}

impl ContextStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The saved context sized to `total_documents`, or a fresh one.
    pub fn load(&self, total_documents: usize) -> Result<WorkflowContext> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no saved context");
            return Ok(WorkflowContext::new().with_total_documents(total_documents));
        }

        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;

        let context = match serde_json::from_str::<StoredEnvelope>(&raw) {
            Ok(envelope) => {
                debug!(saved_at = ?envelope.saved_at, "context loaded");
                deserialize_context(&envelope.context.to_string())
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "context file is not an envelope, starting fresh");
                WorkflowContext::new()
            }
        };
        Ok(context.with_total_documents(total_documents))
    }

    /// Write `context`, creating parent directories as needed.
    pub fn save(&self, context: &WorkflowContext) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let stored = StoredContext {
            saved_at: Utc::now(),
            context,
        };
        let json = serde_json::to_string_pretty(&stored).context("failed to encode context")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }

    /// Replace the saved context with a fresh one and return it.
    pub fn reset(&self, total_documents: usize) -> Result<WorkflowContext> {
        let fresh = WorkflowContext::new().with_total_documents(total_documents);
        self.save(&fresh)?;
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use voxprint_intent::{AppState, PrintStep};

    use super::*;

    fn printing() -> WorkflowContext {
        let mut ctx = WorkflowContext::new().with_total_documents(4);
        ctx.app_state = AppState::PrintWorkflow;
        ctx.print_step = Some(PrintStep::Configuration);
        ctx.repaired().with_selection([1, 3])
    }

    #[test]
    fn missing_file_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContextStore::new(dir.path().join("ctx.json"));
        let ctx = store.load(3).unwrap();
        assert_eq!(ctx, WorkflowContext::new().with_total_documents(3));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContextStore::new(dir.path().join("nested/ctx.json"));
        store.save(&printing()).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(json.get("savedAt").is_some());
        assert!(json.get("context").is_some());

        assert_eq!(store.load(4).unwrap(), printing());
    }

    #[test]
    fn shrinking_document_list_drops_selection() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContextStore::new(dir.path().join("ctx.json"));
        store.save(&printing()).unwrap();
        assert_eq!(store.load(2).unwrap().selected(), vec![1]);
    }

    #[test]
    fn corrupt_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ctx.json");
        std::fs::write(&path, "{ definitely not json").unwrap();
        let ctx = ContextStore::new(&path).load(2).unwrap();
        assert_eq!(ctx, WorkflowContext::new().with_total_documents(2));
    }

    #[test]
    fn corrupt_context_inside_envelope_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ctx.json");
        std::fs::write(
            &path,
            r#"{ "savedAt": "2026-01-01T12:00:00Z", "context": "not a context" }"#,
        )
        .unwrap();
        let ctx = ContextStore::new(&path).load(3).unwrap();
        assert_eq!(ctx, WorkflowContext::new().with_total_documents(3));
    }

    #[test]
    fn reset_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContextStore::new(dir.path().join("ctx.json"));
        store.save(&printing()).unwrap();
        store.reset(4).unwrap();
        assert_eq!(store.load(4).unwrap().app_state, AppState::Dashboard);
    }
}
