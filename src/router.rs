//! Command Router
//!
//! Classifies an utterance into a command kind with an ordered rule table.
//! The first rule whose pattern matches wins, so declaration order is part
//! of the contract.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Command kinds the executor knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    ListBoards,
    ListLists,
    ListCards,
    CreateList,
    CreateCard,
    ArchiveCard,
    RecentActivity,
    CreateBoard,
    DeleteBoard,
    SearchCard,
    /// Affirmative reply while confirmations are pending
    Confirm,
    /// Domain vocabulary present but no rule matched
    UnknownDomain,
    /// Plain chat; forward to the model untouched
    NotACommand,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::ListBoards => "list-boards",
            CommandKind::ListLists => "list-lists",
            CommandKind::ListCards => "list-cards",
            CommandKind::CreateList => "create-list",
            CommandKind::CreateCard => "create-card",
            CommandKind::ArchiveCard => "archive-card",
            CommandKind::RecentActivity => "recent-activity",
            CommandKind::CreateBoard => "create-board",
            CommandKind::DeleteBoard => "delete-board",
            CommandKind::SearchCard => "search-card",
            CommandKind::Confirm => "confirm",
            CommandKind::UnknownDomain => "unknown-domain-command",
            CommandKind::NotACommand => "not-a-command",
        }
    }

    /// Whether the executor has a handler for this kind
    pub fn is_actionable(&self) -> bool {
        !matches!(self, CommandKind::UnknownDomain | CommandKind::NotACommand)
    }
}

/// Router output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMatch {
    pub kind: CommandKind,
    /// Utterance as typed, case preserved for the extractor
    pub raw_text: String,
}

/// One entry of the rule table
#[derive(Debug, Clone)]
pub struct Rule {
    pub pattern: Regex,
    pub kind: CommandKind,
}

impl Rule {
    pub fn new(pattern: &str, kind: CommandKind) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            kind,
        })
    }
}

/// Exact tokens accepted as "yes"
static AFFIRMATIVE_TOKENS: &[&str] = &[
    "sim", "s", "yes", "y", "confirmar", "confirmo", "pode", "concordo",
];

/// Without one of these the utterance is plain chat
static DOMAIN_KEYWORDS: &[&str] = &[
    "trello", "quadro", "board", "lista", "card", "cartão", "tarefa",
];

const SHOW: &str = r"\b(?:mostrar?|exibir?|listar?|ver)\b";

static DEFAULT_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    let table = [
        (
            format!(r"{}\s+(?:os\s+)?(?:meus\s+)?(?:quadros|boards?)\b", SHOW),
            CommandKind::ListBoards,
        ),
        (
            format!(r"{}\s+(?:as\s+)?listas\b", SHOW),
            CommandKind::ListLists,
        ),
        (
            format!(r"{}\s+(?:os\s+|as\s+)?(?:cards?|cartões|tarefas)\b", SHOW),
            CommandKind::ListCards,
        ),
        (
            r"\b(?:criar?|adicionar?|nova)\s+(?:uma\s+)?lista\b".to_string(),
            CommandKind::CreateList,
        ),
        (
            r"\b(?:criar?|adicionar?|novo|nova)\s+(?:um\s+|uma\s+)?(?:card|cartão|tarefa)\b".to_string(),
            CommandKind::CreateCard,
        ),
        (
            r"\b(?:arquivar?|remover?|excluir?)\s+(?:o\s+|um\s+|a\s+)?(?:card|cartão|tarefa)\b".to_string(),
            CommandKind::ArchiveCard,
        ),
        (
            format!(r"{}\s+(?:as\s+)?(?:(?:últimas|ultimas)\s+(?:\d+\s+)?)?atividades?\b", SHOW),
            CommandKind::RecentActivity,
        ),
        (
            r"\b(?:criar?|adicionar?|novo)\s+(?:um\s+)?quadro\b".to_string(),
            CommandKind::CreateBoard,
        ),
        (
            r"\b(?:apagar?|deletar?|excluir?|remover?)\s+(?:o\s+|um\s+)?quadro\b".to_string(),
            CommandKind::DeleteBoard,
        ),
        (
            r"\b(?:buscar?|localizar?|encontrar?|achar?|procurar?)\s+(?:o\s+|um\s+)?(?:card|cartão|tarefa)\b".to_string(),
            CommandKind::SearchCard,
        ),
    ];

    table
        .into_iter()
        .map(|(pattern, kind)| Rule::new(&pattern, kind).expect("built-in rule must compile"))
        .collect()
});

/// Ordered, immutable rule table evaluated top-down
#[derive(Debug, Clone)]
pub struct CommandRouter {
    rules: Vec<Rule>,
}

impl CommandRouter {
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_RULES.clone(),
        }
    }

    /// Router over a custom table, kept in the given order
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classify an utterance
    ///
    /// `confirmations_pending` enables the `confirm` kind for affirmative
    /// tokens; otherwise "sim" is plain chat.
    pub fn route(&self, utterance: &str, confirmations_pending: bool) -> CommandMatch {
        let text = utterance.trim().to_lowercase();
        let matched = |kind| CommandMatch {
            kind,
            raw_text: utterance.trim().to_string(),
        };

        if confirmations_pending && Self::is_affirmative(&text) {
            debug!("Routed '{}' -> confirm", text);
            return matched(CommandKind::Confirm);
        }

        if !DOMAIN_KEYWORDS.iter().any(|kw| text.contains(kw)) {
            return matched(CommandKind::NotACommand);
        }

        let kind = self
            .rules
            .iter()
            .find(|rule| rule.pattern.is_match(&text))
            .map(|rule| rule.kind)
            .unwrap_or(CommandKind::UnknownDomain);

        debug!("Routed '{}' -> {}", text, kind.as_str());
        matched(kind)
    }

    pub fn is_affirmative(text: &str) -> bool {
        let token = text.trim().to_lowercase();
        AFFIRMATIVE_TOKENS.contains(&token.as_str())
    }
}

impl Default for CommandRouter {
    fn default() -> Self {
        Self::new()
    }
}
