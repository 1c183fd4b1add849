//! Embedded Command Processor
//!
//! Scans assistant replies for bracketed task markers and replaces each one
//! with the outcome of the call it asks for:
//!
//! ```text
//! [[ACTION_CREATE_TASK: <name> | <description> | <deadline> | <status>]]
//! [[ACTION_UPDATE_TASK: <id> | <status>]]
//! [[ACTION_DELETE_TASK: <id>]]
//! [[ACTION_LIST_TASKS]]
//! ```
//!
//! Grammars run in that order. Each one re-scans from just after the last
//! substitution until no marker is left. Markers whose required fields are
//! blank stay in the text untouched.
//!
//! Fresh model output always runs its markers. A reply that was stored in
//! the history is only ever *replayed*: the rendering remembered for its
//! history entry is returned, or the stored text unchanged, and no call is
//! made either way.

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::extract::normalize_date;
use crate::model::{NewTask, TaskFields, DEFAULT_TASK_STATUS};
use crate::services::TaskService;

/// Prefix shared by every marker; texts without it are returned as-is
pub const MARKER_PREFIX: &str = "[[ACTION_";

const LIST_TASKS: &str = "[[ACTION_LIST_TASKS]]";

static CREATE_TASK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[ACTION_CREATE_TASK:([^|\]]*)\|([^|\]]*)\|([^|\]]*)\|([^\]]*)\]\]")
        .expect("create-task marker must compile")
});

static UPDATE_TASK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[ACTION_UPDATE_TASK:([^|\]]*)\|([^\]]*)\]\]").expect("update-task marker must compile")
});

static DELETE_TASK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[ACTION_DELETE_TASK:([^|\]]*)\]\]").expect("delete-task marker must compile")
});

/// Marker grammars in processing order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    CreateTask,
    UpdateTask,
    DeleteTask,
    ListTasks,
}

impl MarkerKind {
    pub const ALL: [MarkerKind; 4] = [
        MarkerKind::CreateTask,
        MarkerKind::UpdateTask,
        MarkerKind::DeleteTask,
        MarkerKind::ListTasks,
    ];

    /// Next occurrence at or after `from`
    pub fn find(&self, text: &str, from: usize) -> Option<EmbeddedMarker> {
        let regex = match self {
            MarkerKind::CreateTask => &*CREATE_TASK,
            MarkerKind::UpdateTask => &*UPDATE_TASK,
            MarkerKind::DeleteTask => &*DELETE_TASK,
            MarkerKind::ListTasks => {
                let start = from + text.get(from..)?.find(LIST_TASKS)?;
                return Some(EmbeddedMarker {
                    kind: *self,
                    fields: Vec::new(),
                    span: start..start + LIST_TASKS.len(),
                });
            }
        };

        let caps = regex.captures_at(text, from)?;
        let whole = caps.get(0)?;
        Some(EmbeddedMarker {
            kind: *self,
            fields: caps
                .iter()
                .skip(1)
                .map(|m| m.map(|m| m.as_str().trim().to_string()).unwrap_or_default())
                .collect(),
            span: whole.range(),
        })
    }
}

/// A located marker occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedMarker {
    pub kind: MarkerKind,
    /// Trimmed pipe-separated fields
    pub fields: Vec<String>,
    pub span: Range<usize>,
}

impl EmbeddedMarker {
    fn field(&self, index: usize) -> Option<&str> {
        self.fields
            .get(index)
            .map(String::as_str)
            .filter(|f| !f.is_empty())
    }
}

/// Renderings kept for replay, oldest entries evicted first
pub const REPLAY_CAPACITY: usize = 50;

/// Rewritten reply text and how many of its markers failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub failures: usize,
}

/// A rendering remembered for one stored history entry
struct Remembered {
    digest: String,
    text: String,
}

/// Rewrites marker-bearing assistant text
pub struct EmbeddedCommandProcessor {
    tasks: Arc<dyn TaskService>,
    replays: BTreeMap<i64, Remembered>,
}

fn digest(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

impl EmbeddedCommandProcessor {
    pub fn new(tasks: Arc<dyn TaskService>) -> Self {
        Self {
            tasks,
            replays: BTreeMap::new(),
        }
    }

    /// Whether `text` carries anything for this processor
    pub fn has_markers(text: &str) -> bool {
        text.contains(MARKER_PREFIX)
    }

    /// Replace every marker in `text` with its outcome
    pub async fn process(&self, text: &str) -> String {
        self.render(text).await.text
    }

    /// As [`process`](Self::process), resolving year-less deadlines against `today`
    pub async fn process_on(&self, text: &str, today: NaiveDate) -> String {
        self.render_on(text, today).await.text
    }

    pub async fn render(&self, text: &str) -> Rendered {
        self.render_on(text, Local::now().date_naive()).await
    }

    /// Execute every marker in `text`, counting failed outcomes
    pub async fn render_on(&self, text: &str, today: NaiveDate) -> Rendered {
        let mut rendered = Rendered {
            text: text.to_string(),
            failures: 0,
        };
        if !Self::has_markers(text) {
            return rendered;
        }

        for kind in MarkerKind::ALL {
            self.substitute(&mut rendered, kind, today).await;
        }
        rendered
    }

    /// Keep the rendering of a reply stored as history entry `entry_id`.
    /// Renderings with failed markers are not kept.
    pub fn remember(&mut self, entry_id: i64, original: &str, rendered: &Rendered) {
        if rendered.failures > 0 || rendered.text == original {
            return;
        }

        self.replays.insert(
            entry_id,
            Remembered {
                digest: digest(original),
                text: rendered.text.clone(),
            },
        );
        while self.replays.len() > REPLAY_CAPACITY {
            self.replays.pop_first();
        }
    }

    /// What a stored history entry shows, without calling any service
    pub fn replay(&self, entry_id: i64, stored: &str) -> String {
        match self.replays.get(&entry_id) {
            Some(remembered) if remembered.digest == digest(stored) => {
                debug!("Replaying history entry {}", entry_id);
                remembered.text.clone()
            }
            _ => stored.to_string(),
        }
    }

    /// Drop every remembered rendering
    pub fn forget(&mut self) {
        self.replays.clear();
    }

    async fn substitute(&self, rendered: &mut Rendered, kind: MarkerKind, today: NaiveDate) {
        let mut cursor = 0;
        while let Some(marker) = kind.find(&rendered.text, cursor) {
            let outcome = match self.execute(&marker, today).await {
                Some(Ok(line)) => line,
                Some(Err(line)) => {
                    rendered.failures += 1;
                    line
                }
                None => {
                    debug!("Leaving malformed {:?} marker in place", marker.kind);
                    cursor = marker.span.end;
                    continue;
                }
            };
            rendered.text.replace_range(marker.span.clone(), &outcome);
            cursor = marker.span.start + outcome.len();
        }
    }

    /// Outcome line for one marker (`Err` for a failed call), or `None`
    /// when it is malformed
    async fn execute(&self, marker: &EmbeddedMarker, today: NaiveDate) -> Option<Result<String, String>> {
        match marker.kind {
            MarkerKind::CreateTask => {
                let name = marker.field(0)?;
                let deadline = marker
                    .field(2)
                    .map(|d| normalize_date(d, today).unwrap_or_else(|| d.to_string()));
                let task = NewTask {
                    name: name.to_string(),
                    description: marker.field(1).map(str::to_string),
                    deadline,
                    status: marker.field(3).unwrap_or(DEFAULT_TASK_STATUS).to_string(),
                };
                Some(self.create_task(&task, marker.field(3).is_some()).await)
            }
            MarkerKind::UpdateTask => {
                let id = marker.field(0)?;
                let status = marker.field(1)?;
                Some(self.update_task(id, status).await)
            }
            MarkerKind::DeleteTask => {
                let id = marker.field(0)?;
                Some(self.delete_task(id).await)
            }
            MarkerKind::ListTasks => Some(self.list_tasks().await),
        }
    }

    async fn create_task(&self, task: &NewTask, explicit_status: bool) -> Result<String, String> {
        match self.tasks.create_record(task).await {
            Ok(record) => {
                info!("Created task {} ({})", record.id, task.name);
                let mut line = format!("✅ Tarefa '{}' criada com sucesso!", task.name);
                if let Some(description) = task.description.as_deref() {
                    let _ = write!(line, "\n   Descrição: {}", description);
                }
                if let Some(deadline) = task.deadline.as_deref() {
                    let _ = write!(line, "\n   Data limite: {}", deadline);
                }
                if explicit_status {
                    let _ = write!(line, "\n   Status: {}", task.status);
                }
                Ok(line)
            }
            Err(e) => {
                warn!("Task creation failed: {}", e);
                Err(format!("❌ Erro ao criar tarefa '{}': {}", task.name, e))
            }
        }
    }

    async fn update_task(&self, id: &str, status: &str) -> Result<String, String> {
        let update = TaskFields {
            status: Some(status.to_string()),
            ..Default::default()
        };
        match self.tasks.update_record(id, &update).await {
            Ok(record) => Ok(format!("✅ Tarefa '{}' atualizada para '{}'.", record.name(), status)),
            Err(e) => {
                warn!("Task update failed: {}", e);
                Err(format!("❌ Erro ao atualizar tarefa {}: {}", id, e))
            }
        }
    }

    async fn delete_task(&self, id: &str) -> Result<String, String> {
        match self.tasks.delete_record(id).await {
            Ok(()) => Ok(format!("✅ Tarefa {} removida com sucesso!", id)),
            Err(e) => {
                warn!("Task deletion failed: {}", e);
                Err(format!("❌ Erro ao remover tarefa {}: {}", id, e))
            }
        }
    }

    async fn list_tasks(&self) -> Result<String, String> {
        let records = match self.tasks.list_records().await {
            Ok(records) => records,
            Err(e) => {
                warn!("Task listing failed: {}", e);
                return Err(format!("❌ Erro ao listar tarefas: {}", e));
            }
        };

        if records.is_empty() {
            return Ok("📋 Nenhuma tarefa encontrada.".to_string());
        }

        let mut out = String::from("📋 Tarefas encontradas:\n\n");
        for (i, record) in records.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, record.name());
            if let Some(status) = record.fields.status.as_deref() {
                let _ = writeln!(out, "   Status: {}", status);
            }
            if let Some(notes) = record.fields.notes.as_deref() {
                let _ = writeln!(out, "   Descrição: {}", notes);
            }
            if let Some(deadline) = record.fields.deadline.as_deref() {
                let _ = writeln!(out, "   Data limite: {}", deadline);
            }
        }
        Ok(out.trim_end().to_string())
    }
}
