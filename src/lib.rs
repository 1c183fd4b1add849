//! Chatboard
//!
//! Conversational command layer for a project-board service (boards, lists,
//! cards) and a tabular task service.
//!
//! # Features
//!
//! - **Command routing**: ordered regex rule table, first match wins
//! - **Slot extraction**: names, containers, ids from URLs, normalised dates
//! - **Entity resolution**: name to id over boards, lists and cards with a TTL cache
//! - **Confirmations**: board deletion waits for an explicit "sim"
//! - **Embedded markers**: `[[ACTION_...]]` in model replies run against the task service
//!
//! # Architecture
//!
//! ```text
//! utterance ──► Router ──► Extractor ──► Resolver (cache) ──► Executor ──► reply
//!                  │
//!                  └── not a command ──► ChatModel ──► Embedded processor ──► reply
//!                                                  (history keeps the original text)
//! ```

pub mod cache;
pub mod chat;
pub mod config;
pub mod confirm;
pub mod conversation;
pub mod embedded;
pub mod error;
pub mod executor;
pub mod extract;
pub mod llm;
pub mod model;
pub mod resolver;
pub mod router;
pub mod services;
pub mod session;

pub use cache::{CacheStats, EntityCache};
pub use chat::{ChatLoop, SYSTEM_PROMPT};
pub use config::Config;
pub use confirm::{ConfirmationQueue, PendingConfirmation};
pub use conversation::{ConversationMessage, ConversationStore, ConversationSummary};
pub use embedded::{EmbeddedCommandProcessor, EmbeddedMarker, MarkerKind, Rendered};
pub use error::{CommandError, CommandResult, EntityKind};
pub use executor::ActionExecutor;
pub use extract::{extract, normalize_date, Params};
pub use llm::{ArceeClient, ChatMessage, ChatModel};
pub use resolver::{CardHit, EntityResolver, Match};
pub use router::{CommandKind, CommandMatch, CommandRouter, Rule};
pub use services::{AirtableClient, BoardService, TaskService, TrelloClient};
pub use session::{Dispatch, Session};
