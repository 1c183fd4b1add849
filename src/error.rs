//! Command error taxonomy
//!
//! Every failure a handler can hit ends up here. The executor turns these
//! into user-facing lines at the handler boundary, so nothing escapes a turn.

use std::fmt;

/// Which level of the board hierarchy a lookup was aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Board,
    List,
    Card,
    Task,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Board => "Quadro",
            EntityKind::List => "Lista",
            EntityKind::Card => "Card",
            EntityKind::Task => "Tarefa",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors raised while interpreting or executing a command
#[derive(Debug, Clone, thiserror::Error)]
pub enum CommandError {
    /// Credentials or ids the call needs are not configured
    #[error("Configuração ausente: {0}")]
    ConfigurationMissing(String),

    /// Full hierarchy scan finished without a match
    #[error("{kind} '{name}' não encontrado(a). Verifique o nome e tente novamente.")]
    EntityNotFound { kind: EntityKind, name: String },

    /// Upstream answered with a non-2xx status
    #[error("Serviço respondeu {status}: {body}")]
    ServiceUnreachable { status: u16, body: String },

    /// Request never produced a response (timeout, DNS, TLS, decode)
    #[error("Falha na comunicação com o serviço: {0}")]
    Transport(String),

    /// A slot the handler requires was not supplied
    #[error("{0}")]
    MissingParameter(String),

    #[error("Entrada inválida: {0}")]
    InvalidInput(String),
}

impl CommandError {
    pub fn not_found(kind: EntityKind, name: impl Into<String>) -> Self {
        CommandError::EntityNotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn missing(message: impl Into<String>) -> Self {
        CommandError::MissingParameter(message.into())
    }

    /// User-facing line with the error glyph used across replies
    pub fn render(&self) -> String {
        format!("❌ {}", self)
    }
}

impl From<reqwest::Error> for CommandError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            CommandError::ServiceUnreachable {
                status: status.as_u16(),
                body: e.to_string(),
            }
        } else {
            CommandError::Transport(e.to_string())
        }
    }
}

pub type CommandResult<T> = std::result::Result<T, CommandError>;
