//! Per-session command context
//!
//! A [`Session`] owns everything one conversation mutates: the entity
//! cache, the pending confirmations and the renderings of stored replies.
//! Nothing here is shared between sessions.

use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::cache::EntityCache;
use crate::config::Config;
use crate::confirm::ConfirmationQueue;
use crate::embedded::{EmbeddedCommandProcessor, Rendered};
use crate::executor::ActionExecutor;
use crate::resolver::EntityResolver;
use crate::router::{CommandKind, CommandRouter};
use crate::services::{BoardService, TaskService};

/// System note sent along with utterances that mention the board domain
/// but match no command
pub const CLARIFY_NOTE: &str = "O usuário mencionou quadros, listas, cards ou tarefas, mas o pedido \
não corresponde a nenhum comando conhecido. Peça esclarecimentos ou explique os comandos \
disponíveis: mostrar quadros, mostrar listas, mostrar cards, criar lista, criar card, \
arquivar card, mostrar atividades, criar quadro, apagar quadro, buscar card.";

/// What the caller should do with an utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Handled locally; show this
    Reply(String),
    /// Send the utterance to the chat model, optionally with a system note
    Forward { note: Option<String> },
}

impl Dispatch {
    pub fn into_reply(self) -> Option<String> {
        match self {
            Dispatch::Reply(reply) => Some(reply),
            Dispatch::Forward { .. } => None,
        }
    }
}

/// Command state of one conversation
pub struct Session {
    id: String,
    router: CommandRouter,
    executor: ActionExecutor,
    pending: ConfirmationQueue,
    embedded: EmbeddedCommandProcessor,
}

impl Session {
    /// New session with a random id
    pub fn new(boards: Arc<dyn BoardService>, tasks: Arc<dyn TaskService>, config: &Config) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), boards, tasks, config)
    }

    pub fn with_id(
        id: impl Into<String>,
        boards: Arc<dyn BoardService>,
        tasks: Arc<dyn TaskService>,
        config: &Config,
    ) -> Self {
        let resolver = EntityResolver::new(
            boards,
            EntityCache::new(config.cache_ttl()),
            config.default_board_id.clone(),
        );
        Self::from_parts(id, CommandRouter::new(), ActionExecutor::new(resolver), tasks)
    }

    pub fn from_parts(
        id: impl Into<String>,
        router: CommandRouter,
        executor: ActionExecutor,
        tasks: Arc<dyn TaskService>,
    ) -> Self {
        Self {
            id: id.into(),
            router,
            executor,
            pending: ConfirmationQueue::new(),
            embedded: EmbeddedCommandProcessor::new(tasks),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pending(&self) -> &ConfirmationQueue {
        &self.pending
    }

    pub fn executor(&self) -> &ActionExecutor {
        &self.executor
    }

    /// Route and, when it is a command, execute an utterance
    pub async fn dispatch(&mut self, utterance: &str) -> Dispatch {
        let matched = self.router.route(utterance, self.pending.is_pending());
        debug!("Session {}: {}", self.id, matched.kind.as_str());

        match matched.kind {
            CommandKind::NotACommand => Dispatch::Forward { note: None },
            CommandKind::UnknownDomain => Dispatch::Forward {
                note: Some(CLARIFY_NOTE.to_string()),
            },
            _ => match self.executor.execute(&matched, &mut self.pending).await {
                Some(reply) => Dispatch::Reply(reply),
                None => Dispatch::Forward { note: None },
            },
        }
    }

    /// Reply for an utterance, or `None` when it is not a command
    pub async fn handle(&mut self, utterance: &str) -> Option<String> {
        self.dispatch(utterance).await.into_reply()
    }

    /// Execute the markers of a fresh assistant reply
    pub async fn render_reply(&self, text: &str) -> Rendered {
        self.embedded.render(text).await
    }

    /// Tie a rendering to the history entry its original text was stored as
    pub fn remember_reply(&mut self, entry_id: i64, original: &str, rendered: &Rendered) {
        self.embedded.remember(entry_id, original, rendered);
    }

    /// Display text of a stored assistant entry; never executes markers
    pub fn replay_reply(&self, entry_id: i64, stored: &str) -> String {
        self.embedded.replay(entry_id, stored)
    }

    pub fn forget_replies(&mut self) {
        self.embedded.forget();
    }
}
