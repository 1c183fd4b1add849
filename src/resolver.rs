//! Entity Resolver
//!
//! Turns human names into service ids by walking boards -> lists -> cards.
//! Every collection is read through the [`EntityCache`]; a miss fetches from
//! the board service and stores the result before matching.
//!
//! Matching is a case-insensitive substring test and the first hit wins.
//! [`Match::candidates`] reports how many entries of the winning collection
//! qualified so callers can log ambiguity.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::cache::EntityCache;
use crate::error::{CommandError, CommandResult, EntityKind};
use crate::model::{Board, BoardList, Card};
use crate::services::BoardService;

/// Resolution result: the chosen entity plus how many qualified
#[derive(Debug, Clone, PartialEq)]
pub struct Match<T> {
    pub item: T,
    pub candidates: usize,
}

impl<T> Match<T> {
    pub fn is_ambiguous(&self) -> bool {
        self.candidates > 1
    }
}

/// A card together with the list that holds it
#[derive(Debug, Clone, PartialEq)]
pub struct CardHit {
    pub card: Card,
    pub list: BoardList,
}

fn matches(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// First entry whose name contains `needle`, with the qualifying count
fn pick<T: Clone>(items: &[T], needle: &str, name: impl Fn(&T) -> &str) -> Option<Match<T>> {
    let mut hits = items.iter().filter(|item| matches(name(*item), needle));
    let first = hits.next()?.clone();
    Some(Match {
        item: first,
        candidates: 1 + hits.count(),
    })
}

fn log_ambiguity<T>(kind: EntityKind, needle: &str, found: &Match<T>) {
    if found.is_ambiguous() {
        warn!(
            "{} '{}' matched {} candidates; using the first",
            kind, needle, found.candidates
        );
    }
}

/// Name-to-id resolution over the cached hierarchy
#[derive(Clone)]
pub struct EntityResolver {
    service: Arc<dyn BoardService>,
    cache: EntityCache,
    default_board: Option<String>,
}

impl EntityResolver {
    pub fn new(service: Arc<dyn BoardService>, cache: EntityCache, default_board: Option<String>) -> Self {
        Self {
            service,
            cache,
            default_board,
        }
    }

    pub fn service(&self) -> &dyn BoardService {
        self.service.as_ref()
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    pub fn default_board(&self) -> Option<&str> {
        self.default_board.as_deref()
    }

    pub async fn boards(&self) -> CommandResult<Arc<Vec<Board>>> {
        if let Some(boards) = self.cache.boards().await {
            return Ok(boards);
        }
        let boards = self.service.list_boards().await?;
        Ok(self.cache.set_boards(boards).await)
    }

    pub async fn lists(&self, board_id: &str) -> CommandResult<Arc<Vec<BoardList>>> {
        if let Some(lists) = self.cache.lists(board_id).await {
            return Ok(lists);
        }
        let lists = self.service.list_lists(board_id).await?;
        Ok(self.cache.set_lists(board_id, lists).await)
    }

    pub async fn cards(&self, list_id: &str) -> CommandResult<Arc<Vec<Card>>> {
        if let Some(cards) = self.cache.cards(list_id).await {
            return Ok(cards);
        }
        let cards = self.service.list_cards(list_id).await?;
        Ok(self.cache.set_cards(list_id, cards).await)
    }

    pub async fn board_by_name(&self, name: &str) -> CommandResult<Match<Board>> {
        let boards = self.boards().await?;
        let found = pick(&boards, name, |b| &b.name)
            .ok_or_else(|| CommandError::not_found(EntityKind::Board, name))?;
        log_ambiguity(EntityKind::Board, name, &found);
        Ok(found)
    }

    /// Every visible board except the default one, in service order
    async fn other_boards(&self) -> CommandResult<Vec<String>> {
        let boards = self.boards().await?;
        Ok(boards
            .iter()
            .filter(|b| Some(b.id.as_str()) != self.default_board.as_deref())
            .map(|b| b.id.clone())
            .collect())
    }

    async fn list_in_board(&self, name: &str, board_id: &str) -> CommandResult<Option<Match<BoardList>>> {
        let lists = self.lists(board_id).await?;
        Ok(pick(&lists, name, |l| &l.name))
    }

    /// Find a list by name
    ///
    /// With `board_id` only that board is searched. Without it the default
    /// board is tried before falling back to a breadth-first scan of all
    /// boards.
    pub async fn list_by_name(&self, name: &str, board_id: Option<&str>) -> CommandResult<Match<BoardList>> {
        let mut found = match board_id.or(self.default_board.as_deref()) {
            Some(board_id) => self.list_in_board(name, board_id).await?,
            None => None,
        };

        if found.is_none() && board_id.is_none() {
            for board_id in self.other_boards().await? {
                if let Some(hit) = self.list_in_board(name, &board_id).await? {
                    debug!("List '{}' found in board {}", name, board_id);
                    found = Some(hit);
                    break;
                }
            }
        }

        let found = found.ok_or_else(|| CommandError::not_found(EntityKind::List, name))?;
        log_ambiguity(EntityKind::List, name, &found);
        Ok(found)
    }

    async fn card_in_list(&self, name: &str, list: &BoardList) -> CommandResult<Option<Match<CardHit>>> {
        let cards = self.cards(&list.id).await?;
        Ok(pick(&cards, name, |c| &c.name).map(|found| Match {
            item: CardHit {
                card: found.item,
                list: list.clone(),
            },
            candidates: found.candidates,
        }))
    }

    async fn card_in_board(&self, name: &str, board_id: &str) -> CommandResult<Option<Match<CardHit>>> {
        for list in self.lists(board_id).await?.iter() {
            if let Some(hit) = self.card_in_list(name, list).await? {
                return Ok(Some(hit));
            }
        }
        Ok(None)
    }

    /// Find a card by name
    ///
    /// A named list narrows the search to that list. Otherwise every list of
    /// `board_id` is scanned, or without a board the default board and then
    /// every other board.
    pub async fn card_by_name(
        &self,
        name: &str,
        list_name: Option<&str>,
        board_id: Option<&str>,
    ) -> CommandResult<Match<CardHit>> {
        let mut found = if let Some(list_name) = list_name {
            let list = self.list_by_name(list_name, board_id).await?.item;
            self.card_in_list(name, &list).await?
        } else {
            match board_id.or(self.default_board.as_deref()) {
                Some(board_id) => self.card_in_board(name, board_id).await?,
                None => None,
            }
        };

        if found.is_none() && list_name.is_none() && board_id.is_none() {
            for board_id in self.other_boards().await? {
                if let Some(hit) = self.card_in_board(name, &board_id).await? {
                    found = Some(hit);
                    break;
                }
            }
        }

        let found = found.ok_or_else(|| CommandError::not_found(EntityKind::Card, name))?;
        log_ambiguity(EntityKind::Card, name, &found);
        Ok(found)
    }
}
