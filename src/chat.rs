//! Chat loop
//!
//! One turn: commands are answered by the session; everything else goes to
//! the chat model with the stored history, and the model's markers are
//! executed before the reply is shown. History keeps the model's original
//! text so replaying it never re-runs a marker.

use anyhow::Result;
use tracing::{debug, warn};

use crate::conversation::ConversationStore;
use crate::llm::{ChatMessage, ChatModel};
use crate::session::{Dispatch, Session};

/// First message of every conversation
pub const SYSTEM_PROMPT: &str = "Você é um assistente que ajuda a organizar quadros do Trello e \
tarefas do Airtable. Responda em português.\n\n\
Comandos especiais para tarefas (use exatamente este formato, com todos os separadores '|', \
mesmo quando um campo estiver vazio):\n\
- [[ACTION_CREATE_TASK: Nome da Tarefa | Descrição | Data Limite | Status]] - cria uma tarefa\n\
- [[ACTION_LIST_TASKS]] - lista as tarefas existentes\n\
- [[ACTION_UPDATE_TASK: ID_DA_TAREFA | Status]] - altera o status de uma tarefa\n\
- [[ACTION_DELETE_TASK: ID_DA_TAREFA]] - exclui uma tarefa\n\n\
Os comandos são executados automaticamente e substituídos pelo resultado.";

/// Drives one conversation
pub struct ChatLoop {
    session: Session,
    model: Box<dyn ChatModel>,
    store: ConversationStore,
    history_limit: usize,
}

impl ChatLoop {
    pub fn new(session: Session, model: Box<dyn ChatModel>, store: ConversationStore, history_limit: usize) -> Self {
        Self {
            session,
            model,
            store,
            history_limit,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Model input: system prompt, recent history, optional note, utterance
    pub fn messages(&self, utterance: &str, note: Option<&str>) -> Result<Vec<ChatMessage>> {
        let history = self.store.get_history(self.session.id(), self.history_limit)?;

        let mut messages = Vec::with_capacity(history.len() + 3);
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        messages.extend(history.iter().map(|m| m.to_chat()));
        if let Some(note) = note {
            messages.push(ChatMessage::system(note));
        }
        messages.push(ChatMessage::user(utterance));
        Ok(messages)
    }

    /// Process one utterance and return what to show the user
    pub async fn turn(&mut self, utterance: &str) -> Result<String> {
        let note = match self.session.dispatch(utterance).await {
            Dispatch::Reply(reply) => {
                self.store.add_exchange(self.session.id(), utterance, &reply)?;
                return Ok(reply);
            }
            Dispatch::Forward { note } => note,
        };

        let messages = self.messages(utterance, note.as_deref())?;
        debug!("Forwarding to chat model with {} messages", messages.len());

        let original = match self.model.complete(&messages).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Chat model failed: {}", e);
                return Ok(format!("❌ Erro ao consultar o modelo: {}", e));
            }
        };

        let rendered = self.session.render_reply(&original).await;
        let entry_id = self.store.add_exchange(self.session.id(), utterance, &original)?;
        self.session.remember_reply(entry_id, &original, &rendered);
        Ok(rendered.text)
    }

    /// Recent history as shown to the user. Stored replies are replayed,
    /// so no marker in them runs again.
    pub fn transcript(&self, limit: usize) -> Result<Vec<ChatMessage>> {
        let history = self.store.get_history(self.session.id(), limit)?;
        Ok(history
            .iter()
            .map(|m| match m.role.as_str() {
                "assistant" => ChatMessage::new("assistant", self.session.replay_reply(m.id, &m.content)),
                _ => m.to_chat(),
            })
            .collect())
    }

    /// Forget the stored history of this session
    pub fn clear(&mut self) -> Result<usize> {
        self.session.forget_replies();
        self.store.clear(self.session.id())
    }
}
