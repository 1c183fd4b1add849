//! Action Executor
//!
//! One handler per command kind. Handlers validate their slots, resolve
//! names through the [`EntityResolver`], call the board service and render a
//! readable summary. Every error is turned into a `❌` line before it
//! leaves [`ActionExecutor::execute`].

use std::fmt::Write as _;
use tracing::{debug, info, warn};

use crate::confirm::ConfirmationQueue;
use crate::error::{CommandError, CommandResult, EntityKind};
use crate::extract::{extract, Params};
use crate::model::{Card, NewCard};
use crate::resolver::EntityResolver;
use crate::router::{CommandKind, CommandMatch};

/// Lists created on every new board
pub const DEFAULT_BOARD_LISTS: [&str; 3] = ["A Fazer", "Em Andamento", "Concluído"];

/// Activity entries shown when the utterance gives no count
pub const DEFAULT_ACTIVITY_LIMIT: usize = 10;

const DESCRIPTION_PREVIEW: usize = 50;

fn no_board() -> CommandError {
    CommandError::ConfigurationMissing(
        "ID do quadro não encontrado. Especifique o quadro no comando ou defina TRELLO_BOARD_ID."
            .to_string(),
    )
}

fn preview(description: &str) -> String {
    if description.chars().count() > DESCRIPTION_PREVIEW {
        let cut: String = description.chars().take(DESCRIPTION_PREVIEW).collect();
        format!("{}...", cut)
    } else {
        description.to_string()
    }
}

fn render_card(out: &mut String, card: &Card, indent: &str) {
    let _ = writeln!(out, "{}• {} (ID: {})", indent, card.name, card.id);
    if !card.description.is_empty() {
        let _ = writeln!(out, "{}  Descrição: {}", indent, preview(&card.description));
    }
}

/// Board a command targets, with a label for replies
struct TargetBoard {
    id: String,
    label: String,
}

/// Runs routed commands against the board service
#[derive(Clone)]
pub struct ActionExecutor {
    resolver: EntityResolver,
}

impl ActionExecutor {
    pub fn new(resolver: EntityResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &EntityResolver {
        &self.resolver
    }

    /// Run a routed command
    ///
    /// Returns `None` for kinds without a handler so the caller can forward
    /// the utterance to the chat model.
    pub async fn execute(&self, matched: &CommandMatch, pending: &mut ConfirmationQueue) -> Option<String> {
        if !matched.kind.is_actionable() {
            return None;
        }

        let params = extract(matched.kind, &matched.raw_text);
        debug!("Executing {} with {:?}", matched.kind.as_str(), params);

        let reply = match self.run(matched.kind, &params, pending).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("{} failed: {}", matched.kind.as_str(), e);
                e.render()
            }
        };
        Some(reply)
    }

    /// Dispatch to the handler for `kind`
    pub async fn run(
        &self,
        kind: CommandKind,
        params: &Params,
        pending: &mut ConfirmationQueue,
    ) -> CommandResult<String> {
        match kind {
            CommandKind::ListBoards => self.list_boards().await,
            CommandKind::ListLists => self.list_lists(params).await,
            CommandKind::ListCards => self.list_cards(params).await,
            CommandKind::CreateList => self.create_list(params).await,
            CommandKind::CreateCard => self.create_card(params).await,
            CommandKind::ArchiveCard => self.archive_card(params).await,
            CommandKind::RecentActivity => self.recent_activity(params).await,
            CommandKind::CreateBoard => self.create_board(params).await,
            CommandKind::DeleteBoard => self.delete_board(params, pending).await,
            CommandKind::SearchCard => self.search_card(params).await,
            CommandKind::Confirm => self.confirm(pending).await,
            CommandKind::UnknownDomain | CommandKind::NotACommand => Err(CommandError::InvalidInput(
                format!("nenhum handler para {}", kind.as_str()),
            )),
        }
    }

    /// Board named by id or name in the utterance, if any
    async fn named_board(&self, params: &Params) -> CommandResult<Option<TargetBoard>> {
        if let Some(id) = params.board_id.as_deref() {
            return Ok(Some(TargetBoard {
                id: id.to_string(),
                label: format!("quadro com ID {}", id),
            }));
        }
        if params.board_url.is_some() {
            return Err(CommandError::InvalidInput(
                "URL inválida. Formato esperado: https://trello.com/b/BOARD_ID/...".to_string(),
            ));
        }
        if let Some(name) = params.board_name.as_deref() {
            let board = self.resolver.board_by_name(name).await?.item;
            return Ok(Some(TargetBoard {
                label: format!("quadro '{}'", board.name),
                id: board.id,
            }));
        }
        Ok(None)
    }

    /// Named board, or the configured default
    async fn target_board(&self, params: &Params) -> CommandResult<TargetBoard> {
        if let Some(board) = self.named_board(params).await? {
            return Ok(board);
        }
        let id = self.resolver.default_board().ok_or_else(no_board)?;
        Ok(TargetBoard {
            id: id.to_string(),
            label: format!("quadro com ID {}", id),
        })
    }

    async fn list_boards(&self) -> CommandResult<String> {
        let boards = self.resolver.boards().await?;
        if boards.is_empty() {
            return Ok("ℹ️ Nenhum quadro encontrado.".to_string());
        }

        let mut out = String::from("📋 Quadros do Trello:\n\n");
        for board in boards.iter() {
            let _ = writeln!(out, "• {}", board.name);
            let _ = writeln!(out, "  ID: {}", board.id);
            let _ = writeln!(out, "  URL: {}", board.link());
            if !board.desc.is_empty() {
                let _ = writeln!(out, "  Descrição: {}", board.desc);
            }
            out.push('\n');
        }
        Ok(out.trim_end().to_string())
    }

    async fn list_lists(&self, params: &Params) -> CommandResult<String> {
        let board = self.target_board(params).await?;
        let lists = self.resolver.lists(&board.id).await?;
        if lists.is_empty() {
            return Ok(format!("ℹ️ Nenhuma lista encontrada no {}.", board.label));
        }

        let mut out = format!("📋 Listas do {}:\n\n", board.label);
        for list in lists.iter() {
            let count = self.resolver.cards(&list.id).await?.len();
            let _ = writeln!(out, "• {} (ID: {}) - {} cards", list.name, list.id, count);
        }
        Ok(out.trim_end().to_string())
    }

    async fn list_cards(&self, params: &Params) -> CommandResult<String> {
        if let Some(list_name) = params.list_name.as_deref() {
            let scope = self.named_board(params).await?.map(|b| b.id);
            let list = self.resolver.list_by_name(list_name, scope.as_deref()).await?.item;
            let cards = self.resolver.cards(&list.id).await?;
            if cards.is_empty() {
                return Ok(format!("ℹ️ Nenhum card encontrado na lista '{}'.", list.name));
            }

            let mut out = format!("🗂️ Cards da Lista '{}':\n\n", list.name);
            for card in cards.iter() {
                render_card(&mut out, card, "");
            }
            return Ok(out.trim_end().to_string());
        }

        let board = self.target_board(params).await?;
        let lists = self.resolver.lists(&board.id).await?;
        if lists.is_empty() {
            return Ok(format!("ℹ️ Nenhuma lista encontrada no {}.", board.label));
        }

        let mut out = format!("🗂️ Cards do {}:\n\n", board.label);
        for list in lists.iter() {
            let _ = writeln!(out, "📋 Lista: {}", list.name);
            match self.resolver.cards(&list.id).await {
                Ok(cards) if cards.is_empty() => out.push_str("  (sem cards)\n"),
                Ok(cards) => {
                    for card in cards.iter() {
                        render_card(&mut out, card, "  ");
                    }
                }
                Err(e) => {
                    let _ = writeln!(out, "  ❌ Erro ao obter cards: {}", e);
                }
            }
            out.push('\n');
        }
        Ok(out.trim_end().to_string())
    }

    async fn create_list(&self, params: &Params) -> CommandResult<String> {
        let name = params.name.as_deref().ok_or_else(|| {
            CommandError::missing(
                "Nome da lista não especificado. Por favor, informe o nome da lista que deseja criar.",
            )
        })?;
        let board = self.target_board(params).await?;

        let list = self.resolver.service().create_list(&board.id, name).await?;
        self.resolver.cache().invalidate_lists(&board.id).await;
        info!("Created list {} in board {}", list.id, board.id);

        Ok(format!("✅ Lista '{}' criada com sucesso! (ID: {})", list.name, list.id))
    }

    async fn create_card(&self, params: &Params) -> CommandResult<String> {
        let name = params.name.as_deref().ok_or_else(|| {
            CommandError::missing(
                "Nome do card não especificado. Por favor, informe o nome do card que deseja criar.",
            )
        })?;
        let list_name = params.list_name.as_deref().ok_or_else(|| {
            CommandError::missing(
                "ID ou nome da lista não especificado. Por favor, informe em qual lista o card deve ser criado.",
            )
        })?;

        let scope = self.named_board(params).await?.map(|b| b.id);
        let list = self.resolver.list_by_name(list_name, scope.as_deref()).await?.item;

        let card = self
            .resolver
            .service()
            .create_card(&NewCard {
                list_id: list.id.clone(),
                name: name.to_string(),
                description: params.description.clone(),
                due_date: params.due_date.clone(),
            })
            .await?;
        self.resolver.cache().invalidate_cards(&list.id).await;
        info!("Created card {} in list {}", card.id, list.id);

        let mut out = format!("✅ Card '{}' criado com sucesso!\n", card.name);
        let _ = writeln!(out, "ID do card: {}", card.id);
        let _ = writeln!(out, "URL do card: {}", card.link());
        let _ = write!(out, "Na lista: {}", list.name);
        if let Some(due) = params.due_date.as_deref() {
            let _ = write!(out, "\nPrazo: {}", due);
        }
        Ok(out)
    }

    async fn archive_card(&self, params: &Params) -> CommandResult<String> {
        let name = params.name.as_deref().ok_or_else(|| {
            CommandError::missing("Card não especificado. Por favor, informe qual card deseja arquivar.")
        })?;

        let hit = self
            .resolver
            .card_by_name(name, params.list_name.as_deref(), None)
            .await?
            .item;
        self.resolver.service().archive_card(&hit.card.id).await?;
        self.resolver.cache().invalidate_cards(&hit.list.id).await;
        info!("Archived card {}", hit.card.id);

        Ok(format!(
            "✅ Card '{}' da lista '{}' arquivado com sucesso!",
            hit.card.name, hit.list.name
        ))
    }

    async fn recent_activity(&self, params: &Params) -> CommandResult<String> {
        let board = self.target_board(params).await?;
        let limit = params.limit.filter(|n| *n > 0).unwrap_or(DEFAULT_ACTIVITY_LIMIT);

        let activities = self.resolver.service().recent_activity(&board.id, limit).await?;
        if activities.is_empty() {
            return Ok(format!("ℹ️ Nenhuma atividade recente no {}.", board.label));
        }

        let mut out = format!("📊 {} Atividades Recentes do Trello:\n\n", limit);
        for activity in &activities {
            let member = if activity.member.full_name.is_empty() {
                "N/A"
            } else {
                activity.member.full_name.as_str()
            };
            let _ = writeln!(
                out,
                "• {} - {}: {}",
                activity.display_date(),
                member,
                activity.summary()
            );
        }
        Ok(out.trim_end().to_string())
    }

    async fn create_board(&self, params: &Params) -> CommandResult<String> {
        let name = params.name.as_deref().ok_or_else(|| {
            CommandError::missing(
                "Nome do quadro não especificado. Por favor, informe o nome do quadro que deseja criar.",
            )
        })?;

        let service = self.resolver.service();
        let board = service.create_board(name, params.description.as_deref()).await?;
        self.resolver.cache().invalidate_boards().await;
        info!("Created board {} ({})", board.id, board.name);

        let mut created = Vec::new();
        for list_name in DEFAULT_BOARD_LISTS {
            match service.create_list(&board.id, list_name).await {
                Ok(_) => created.push(list_name),
                Err(e) => warn!("Skipping default list '{}': {}", list_name, e),
            }
        }

        let mut out = format!("✅ Quadro '{}' criado com sucesso!\n", board.name);
        let _ = writeln!(out, "ID: {}", board.id);
        let _ = write!(out, "URL: {}", board.link());
        if !created.is_empty() {
            let _ = write!(out, "\n\nListas criadas: {}", created.join(", "));
        }
        Ok(out)
    }

    /// First phase only: verify the board and queue it for confirmation
    async fn delete_board(&self, params: &Params, pending: &mut ConfirmationQueue) -> CommandResult<String> {
        let id = self
            .named_board(params)
            .await?
            .map(|board| board.id)
            .ok_or_else(|| {
                CommandError::missing(
                    "ID ou URL do quadro não encontrado na mensagem. Tente novamente especificando o ID ou URL completa do quadro.",
                )
            })?;

        let board = self.resolver.service().get_board(&id).await?;
        pending.enqueue(board.id.clone(), board.name.clone());
        info!("Board {} queued for deletion", board.id);

        Ok(format!(
            "⚠️ ATENÇÃO: Você solicitou a exclusão do quadro '{}' (ID: {}).\n\
             Esta operação é irreversível. Para confirmar, digite 'sim' na próxima mensagem.",
            board.name, board.id
        ))
    }

    async fn search_card(&self, params: &Params) -> CommandResult<String> {
        let term = params.name.as_deref().ok_or_else(|| {
            CommandError::missing("Por favor, especifique o nome ou parte do nome do card a ser buscado.")
        })?;

        let hits: Vec<(Card, String, String)> = match self.named_board(params).await? {
            Some(board) => {
                let service = self.resolver.service();
                let board_name = service.get_board(&board.id).await?.name;
                let lists = self.resolver.lists(&board.id).await?;
                let term_lower = term.to_lowercase();
                service
                    .list_board_cards(&board.id)
                    .await?
                    .into_iter()
                    .filter(|card| card.name.to_lowercase().contains(&term_lower))
                    .map(|card| {
                        let list_name = lists
                            .iter()
                            .find(|l| l.id == card.list_id)
                            .map(|l| l.name.clone())
                            .unwrap_or_else(|| card.list_id.clone());
                        (card, board_name.clone(), list_name)
                    })
                    .collect()
            }
            None => match self.resolver.card_by_name(term, None, None).await {
                Ok(found) => {
                    let hit = found.item;
                    let boards = self.resolver.boards().await?;
                    let board_name = boards
                        .iter()
                        .find(|b| b.id == hit.list.board_id)
                        .map(|b| b.name.clone())
                        .unwrap_or_else(|| hit.list.board_id.clone());
                    vec![(hit.card, board_name, hit.list.name)]
                }
                Err(CommandError::EntityNotFound { kind: EntityKind::Card, .. }) => Vec::new(),
                Err(e) => return Err(e),
            },
        };

        match hits.as_slice() {
            [] => Ok(format!("ℹ️ Nenhum card encontrado com o termo '{}'.", term)),
            [(card, board, list)] => Ok(format!(
                "🔍 Card encontrado: {}\nQuadro: {}\nLista: {}\nURL: {}",
                card.name,
                board,
                list,
                card.link()
            )),
            many => {
                let mut out = format!("🔍 Encontrados {} cards correspondentes:\n\n", many.len());
                for (i, (card, board, list)) in many.iter().enumerate() {
                    let _ = writeln!(out, "{}. Card: {}", i + 1, card.name);
                    let _ = writeln!(out, "   Quadro: {}", board);
                    let _ = writeln!(out, "   Lista: {}", list);
                    let _ = writeln!(out, "   URL: {}\n", card.link());
                }
                Ok(out.trim_end().to_string())
            }
        }
    }

    async fn confirm(&self, pending: &mut ConfirmationQueue) -> CommandResult<String> {
        let had_pending = pending.is_pending();
        let reply = pending.confirm(self.resolver.service()).await;
        if had_pending {
            self.resolver.cache().invalidate_boards().await;
        }
        Ok(reply)
    }
}
