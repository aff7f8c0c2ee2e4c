//! The format registry: every game the scheduler can start.
//!
//! Built once at startup from the static content tables and shared
//! immutably with every room actor. Automated formats carry a content
//! factory; hosted formats have no content module at all — the host is
//! the content.

use std::collections::HashMap;
use std::sync::Arc;

use warden_activity::GameContent;
use warden_core::{FormatId, FormatKind, GameFormat};

/// Produces a fresh content module instance per activity. Content is
/// stateful (round counters, used-answer sets), so instances are never
/// shared between activities.
pub type ContentFactory = Arc<dyn Fn() -> Box<dyn GameContent> + Send + Sync>;

struct FormatEntry {
    format: Arc<GameFormat>,
    content: Option<ContentFactory>,
}

/// Immutable lookup from [`FormatId`] to format descriptor and content
/// factory.
#[derive(Default)]
pub struct FormatRegistry {
    entries: HashMap<FormatId, FormatEntry>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an automated format with its content factory.
    pub fn register<F>(&mut self, format: GameFormat, content: F)
    where
        F: Fn() -> Box<dyn GameContent> + Send + Sync + 'static,
    {
        self.entries.insert(
            format.id.clone(),
            FormatEntry {
                format: Arc::new(format),
                content: Some(Arc::new(content)),
            },
        );
    }

    /// Registers a hosted format (no content module).
    pub fn register_hosted(&mut self, format: GameFormat) {
        self.entries.insert(
            format.id.clone(),
            FormatEntry {
                format: Arc::new(format),
                content: None,
            },
        );
    }

    pub fn format(&self, id: &FormatId) -> Option<Arc<GameFormat>> {
        self.entries.get(id).map(|e| e.format.clone())
    }

    /// A fresh content module for an automated format.
    pub fn new_content(&self, id: &FormatId) -> Option<Box<dyn GameContent>> {
        self.entries
            .get(id)?
            .content
            .as_ref()
            .map(|factory| factory())
    }

    /// Whether the format is run by a human host.
    pub fn is_hosted(&self, id: &FormatId) -> Option<bool> {
        self.entries
            .get(id)
            .map(|e| e.format.kind == FormatKind::Hosted)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
