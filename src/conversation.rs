//! Conversation Store
//!
//! Raw message history per session, backed by SQLite. Assistant turns are
//! stored exactly as the model produced them, markers included.

use anyhow::Result;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::llm::ChatMessage;

/// Maximum messages to keep per session (rolling window)
const MAX_MESSAGES_PER_SESSION: usize = 50;

/// A single message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Row id; stable for the life of the entry
    pub id: i64,
    pub role: String, // "user" or "assistant"
    pub content: String,
    pub timestamp: i64, // Unix millis
}

impl ConversationMessage {
    pub fn to_chat(&self) -> ChatMessage {
        ChatMessage::new(self.role.clone(), self.content.clone())
    }
}

/// Summary of a conversation
#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub session_id: String,
    pub message_count: usize,
    pub oldest_timestamp: Option<i64>,
    pub newest_timestamp: Option<i64>,
}

/// Conversation store with SQLite backend
pub struct ConversationStore {
    conn: Connection,
    max_messages: usize,
}

impl ConversationStore {
    /// Open or create conversation database
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let store = Self::with_connection(Connection::open(path)?, MAX_MESSAGES_PER_SESSION)?;
        info!("Conversation store opened: {}", path.display());
        Ok(store)
    }

    /// Volatile store, gone when dropped
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, MAX_MESSAGES_PER_SESSION)
    }

    fn with_connection(conn: Connection, max_messages: usize) -> Result<Self> {
        let store = Self { conn, max_messages };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                role TEXT NOT NULL CHECK(role IN ('user', 'assistant')),
                content TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_conversations_session
                ON conversations(session_id, id DESC);
            "#,
        )?;

        Ok(())
    }

    fn insert(&self, session_id: &str, role: &str, content: &str, timestamp: i64) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO conversations (session_id, role, content, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![session_id, role, content, timestamp],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Add a user message and the assistant reply atomically.
    /// Returns the id of the assistant entry.
    pub fn add_exchange(&self, session_id: &str, user_msg: &str, assistant_msg: &str) -> Result<i64> {
        let timestamp = chrono::Utc::now().timestamp_millis();

        self.conn.execute("BEGIN", [])?;

        let result = self
            .insert(session_id, "user", user_msg, timestamp)
            .and_then(|_| self.insert(session_id, "assistant", assistant_msg, timestamp));

        match result {
            Ok(entry_id) => {
                self.conn.execute("COMMIT", [])?;
                self.trim_conversation(session_id)?;
                debug!("Added exchange {} to session {}", entry_id, session_id);
                Ok(entry_id)
            }
            Err(e) => {
                let _ = self.conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }

    /// Most recent `limit` messages, oldest first
    pub fn get_history(&self, session_id: &str, limit: usize) -> Result<Vec<ConversationMessage>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, role, content, timestamp FROM conversations
             WHERE session_id = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )?;

        let mut messages: Vec<ConversationMessage> = stmt
            .query_map(params![session_id, limit as i64], |row| {
                Ok(ConversationMessage {
                    id: row.get(0)?,
                    role: row.get(1)?,
                    content: row.get(2)?,
                    timestamp: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;

        messages.reverse();
        Ok(messages)
    }

    /// Clear conversation history for a session
    pub fn clear(&self, session_id: &str) -> Result<usize> {
        let rows = self.conn.execute(
            "DELETE FROM conversations WHERE session_id = ?1",
            params![session_id],
        )?;
        info!("Cleared {} messages from session {}", rows, session_id);
        Ok(rows)
    }

    pub fn get_summary(&self, session_id: &str) -> Result<ConversationSummary> {
        let summary = self.conn.query_row(
            "SELECT COUNT(*), MIN(timestamp), MAX(timestamp)
             FROM conversations WHERE session_id = ?1",
            params![session_id],
            |row| {
                Ok(ConversationSummary {
                    session_id: session_id.to_string(),
                    message_count: row.get::<_, i64>(0)? as usize,
                    oldest_timestamp: row.get(1)?,
                    newest_timestamp: row.get(2)?,
                })
            },
        )?;

        Ok(summary)
    }

    /// Keep only the newest `max_messages` of a session
    fn trim_conversation(&self, session_id: &str) -> Result<usize> {
        let rows = self.conn.execute(
            "DELETE FROM conversations
             WHERE session_id = ?1 AND id NOT IN (
                 SELECT id FROM conversations
                 WHERE session_id = ?1
                 ORDER BY id DESC
                 LIMIT ?2
             )",
            params![session_id, self.max_messages as i64],
        )?;
        Ok(rows)
    }
}
