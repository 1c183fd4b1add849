//! Confirmation Coordinator
//!
//! Destructive operations wait here until the user answers with an
//! affirmative token. A confirm runs every queued deletion independently,
//! reports one line per entry and then empties the queue whatever the
//! individual outcomes were.

use tracing::{info, warn};

use crate::services::BoardService;

/// A deletion waiting for the user's "sim"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    pub target_id: String,
    pub display_name: String,
}

/// Reply when a confirm arrives with nothing queued
pub const NOTHING_PENDING: &str = "❌ Nenhuma operação pendente de confirmação.";

/// Insertion-ordered queue keyed by target id
#[derive(Debug, Clone, Default)]
pub struct ConfirmationQueue {
    entries: Vec<PendingConfirmation>,
}

impl ConfirmationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a deletion; re-queuing an id refreshes its display name
    pub fn enqueue(&mut self, target_id: impl Into<String>, display_name: impl Into<String>) {
        let target_id = target_id.into();
        let display_name = display_name.into();

        match self.entries.iter_mut().find(|e| e.target_id == target_id) {
            Some(existing) => existing.display_name = display_name,
            None => self.entries.push(PendingConfirmation {
                target_id,
                display_name,
            }),
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PendingConfirmation] {
        &self.entries
    }

    /// Execute every queued deletion and return to the empty state
    pub async fn confirm(&mut self, service: &dyn BoardService) -> String {
        if self.entries.is_empty() {
            return NOTHING_PENDING.to_string();
        }

        let entries = std::mem::take(&mut self.entries);
        let mut lines = Vec::with_capacity(entries.len());

        for entry in &entries {
            match service.delete_board(&entry.target_id).await {
                Ok(()) => {
                    info!("Deleted board {} ({})", entry.target_id, entry.display_name);
                    lines.push(format!(
                        "✅ Quadro '{}' (ID: {}) apagado com sucesso!",
                        entry.display_name, entry.target_id
                    ));
                }
                Err(e) => {
                    warn!("Failed to delete board {}: {}", entry.target_id, e);
                    lines.push(format!(
                        "❌ Erro ao apagar quadro '{}' (ID: {}): {}",
                        entry.display_name, entry.target_id, e
                    ));
                }
            }
        }

        lines.join("\n")
    }
}
