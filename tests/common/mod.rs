//! Shared fakes for integration tests
//!
//! In-memory board and task services that record every call.

#![allow(dead_code)]

use async_trait::async_trait;
use chatboard::model::{
    Activity, ActivityData, ActivityMember, Board, BoardList, Card, CardUpdate, NamedRef, NewCard,
    NewTask, TaskFields, TaskRecord,
};
use chatboard::{BoardService, CommandError, CommandResult, Config, Session, TaskService};
use std::sync::{Arc, Mutex};

pub const DEFAULT_BOARD: &str = "AAA111";
pub const OTHER_BOARD: &str = "XYZ999";

fn board(id: &str, name: &str) -> Board {
    Board {
        id: id.to_string(),
        name: name.to_string(),
        url: format!("https://trello.com/b/{}/{}", id, name.to_lowercase()),
        short_url: None,
        desc: String::new(),
    }
}

fn list(id: &str, board_id: &str, name: &str, position: f64) -> BoardList {
    BoardList {
        id: id.to_string(),
        name: name.to_string(),
        board_id: board_id.to_string(),
        position,
    }
}

fn card(id: &str, list_id: &str, name: &str, description: &str) -> Card {
    Card {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        list_id: list_id.to_string(),
        due_date: None,
        url: format!("https://trello.com/c/{}", id),
        short_url: None,
    }
}

#[derive(Default)]
struct BoardState {
    boards: Vec<Board>,
    lists: Vec<BoardList>,
    cards: Vec<Card>,
    next_id: usize,
}

impl BoardState {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }
}

/// Board service over a fixed two-board fixture
#[derive(Default)]
pub struct FakeBoardService {
    state: Mutex<BoardState>,
    calls: Mutex<Vec<String>>,
    /// Board ids whose deletion fails with a 404
    pub failing_deletes: Mutex<Vec<String>>,
    /// Every call fails with this status when set
    pub outage: Mutex<Option<u16>>,
}

impl FakeBoardService {
    /// Boards `Produto` (AAA111, default) and `Marketing` (XYZ999)
    pub fn with_fixture() -> Arc<Self> {
        let service = Self::default();
        {
            let mut state = service.state.lock().unwrap();
            state.boards = vec![board(DEFAULT_BOARD, "Produto"), board(OTHER_BOARD, "Marketing")];
            state.lists = vec![
                list("l1", DEFAULT_BOARD, "Backlog", 1.0),
                list("l2", DEFAULT_BOARD, "Em Andamento", 2.0),
                list("l3", OTHER_BOARD, "Campanhas", 1.0),
            ];
            state.cards = vec![
                card("c1", "l1", "Deploy API", ""),
                card("c2", "l2", "Relatório mensal", &"consolidar números do trimestre ".repeat(3)),
                card("c3", "l3", "Post blog", "rascunho"),
                card("c4", "l3", "Post newsletter", ""),
            ];
        }
        Arc::new(service)
    }

    /// Number of calls to `op`
    pub fn calls(&self, op: &str) -> usize {
        let prefix = format!("{} ", op);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }

    /// Number of calls to `op` with first argument `arg`
    pub fn calls_with(&self, op: &str, arg: &str) -> usize {
        let entry = format!("{} {}", op, arg);
        self.calls.lock().unwrap().iter().filter(|c| **c == entry).count()
    }

    pub fn fail_delete(&self, board_id: &str) {
        self.failing_deletes.lock().unwrap().push(board_id.to_string());
    }

    pub fn set_outage(&self, status: u16) {
        *self.outage.lock().unwrap() = Some(status);
    }

    pub fn board_names(&self) -> Vec<String> {
        self.state.lock().unwrap().boards.iter().map(|b| b.name.clone()).collect()
    }

    fn record(&self, op: &str, arg: &str) -> CommandResult<()> {
        self.calls.lock().unwrap().push(format!("{} {}", op, arg));
        match *self.outage.lock().unwrap() {
            Some(status) => Err(CommandError::ServiceUnreachable {
                status,
                body: "invalid token".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BoardService for FakeBoardService {
    async fn list_boards(&self) -> CommandResult<Vec<Board>> {
        self.record("list_boards", "")?;
        Ok(self.state.lock().unwrap().boards.clone())
    }

    async fn get_board(&self, board_id: &str) -> CommandResult<Board> {
        self.record("get_board", board_id)?;
        self.state
            .lock()
            .unwrap()
            .boards
            .iter()
            .find(|b| b.id == board_id)
            .cloned()
            .ok_or_else(|| CommandError::ServiceUnreachable {
                status: 404,
                body: "The requested resource was not found.".to_string(),
            })
    }

    async fn create_board(&self, name: &str, description: Option<&str>) -> CommandResult<Board> {
        self.record("create_board", name)?;
        let mut state = self.state.lock().unwrap();
        let id = state.id("B");
        let mut created = board(&id, name);
        created.desc = description.unwrap_or_default().to_string();
        state.boards.push(created.clone());
        Ok(created)
    }

    async fn delete_board(&self, board_id: &str) -> CommandResult<()> {
        self.record("delete_board", board_id)?;
        if self.failing_deletes.lock().unwrap().iter().any(|id| id == board_id) {
            return Err(CommandError::ServiceUnreachable {
                status: 404,
                body: "board not found".to_string(),
            });
        }
        self.state.lock().unwrap().boards.retain(|b| b.id != board_id);
        Ok(())
    }

    async fn list_lists(&self, board_id: &str) -> CommandResult<Vec<BoardList>> {
        self.record("list_lists", board_id)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .lists
            .iter()
            .filter(|l| l.board_id == board_id)
            .cloned()
            .collect())
    }

    async fn create_list(&self, board_id: &str, name: &str) -> CommandResult<BoardList> {
        self.record("create_list", board_id)?;
        let mut state = self.state.lock().unwrap();
        let id = state.id("L");
        let created = list(&id, board_id, name, state.lists.len() as f64);
        state.lists.push(created.clone());
        Ok(created)
    }

    async fn list_cards(&self, list_id: &str) -> CommandResult<Vec<Card>> {
        self.record("list_cards", list_id)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .cards
            .iter()
            .filter(|c| c.list_id == list_id)
            .cloned()
            .collect())
    }

    async fn list_board_cards(&self, board_id: &str) -> CommandResult<Vec<Card>> {
        self.record("list_board_cards", board_id)?;
        let state = self.state.lock().unwrap();
        let list_ids: Vec<&str> = state
            .lists
            .iter()
            .filter(|l| l.board_id == board_id)
            .map(|l| l.id.as_str())
            .collect();
        Ok(state
            .cards
            .iter()
            .filter(|c| list_ids.contains(&c.list_id.as_str()))
            .cloned()
            .collect())
    }

    async fn create_card(&self, new_card: &NewCard) -> CommandResult<Card> {
        self.record("create_card", &new_card.list_id)?;
        let mut state = self.state.lock().unwrap();
        let id = state.id("C");
        let mut created = card(
            &id,
            &new_card.list_id,
            &new_card.name,
            new_card.description.as_deref().unwrap_or_default(),
        );
        created.due_date = new_card.due_date.clone();
        state.cards.push(created.clone());
        Ok(created)
    }

    async fn update_card(&self, card_id: &str, update: &CardUpdate) -> CommandResult<Card> {
        self.record("update_card", card_id)?;
        let mut state = self.state.lock().unwrap();
        let position = state
            .cards
            .iter()
            .position(|c| c.id == card_id)
            .ok_or_else(|| CommandError::ServiceUnreachable {
                status: 404,
                body: "card not found".to_string(),
            })?;
        if update.closed == Some(true) {
            return Ok(state.cards.remove(position));
        }
        let target = &mut state.cards[position];
        if let Some(name) = &update.name {
            target.name = name.clone();
        }
        Ok(target.clone())
    }

    async fn recent_activity(&self, board_id: &str, limit: usize) -> CommandResult<Vec<Activity>> {
        self.record("recent_activity", &format!("{}:{}", board_id, limit))?;
        Ok(vec![Activity {
            id: "a1".to_string(),
            date: "2024-03-01T10:22:05.123Z".to_string(),
            kind: "createCard".to_string(),
            member: ActivityMember {
                full_name: "Ana".to_string(),
            },
            data: ActivityData {
                card: Some(NamedRef {
                    name: "Deploy API".to_string(),
                }),
                list: None,
                text: None,
            },
        }])
    }
}

/// Task service backed by a vector of records
#[derive(Default)]
pub struct FakeTaskService {
    pub records: Mutex<Vec<TaskRecord>>,
    pub created: Mutex<Vec<NewTask>>,
    calls: Mutex<Vec<&'static str>>,
    /// `create_record` fails when set
    pub failing: Mutex<bool>,
}

impl FakeTaskService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TaskService for FakeTaskService {
    async fn list_records(&self) -> CommandResult<Vec<TaskRecord>> {
        self.calls.lock().unwrap().push("list_records");
        Ok(self.records.lock().unwrap().clone())
    }

    async fn create_record(&self, task: &NewTask) -> CommandResult<TaskRecord> {
        self.calls.lock().unwrap().push("create_record");
        if *self.failing.lock().unwrap() {
            return Err(CommandError::ConfigurationMissing(
                "credenciais do Airtable não configuradas (AIRTABLE_API_KEY)".to_string(),
            ));
        }
        let mut records = self.records.lock().unwrap();
        let record = TaskRecord {
            id: format!("rec{}", records.len() + 1),
            fields: task.fields(),
        };
        records.push(record.clone());
        self.created.lock().unwrap().push(task.clone());
        Ok(record)
    }

    async fn update_record(&self, record_id: &str, update: &TaskFields) -> CommandResult<TaskRecord> {
        self.calls.lock().unwrap().push("update_record");
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| CommandError::ServiceUnreachable {
                status: 404,
                body: "record not found".to_string(),
            })?;
        if let Some(status) = &update.status {
            record.fields.status = Some(status.clone());
        }
        Ok(record.clone())
    }

    async fn delete_record(&self, record_id: &str) -> CommandResult<()> {
        self.calls.lock().unwrap().push("delete_record");
        self.records.lock().unwrap().retain(|r| r.id != record_id);
        Ok(())
    }
}

/// Config with no credentials and an optional default board
pub fn config(default_board: Option<&str>) -> Config {
    let mut config = Config::from_vars(|_| None).unwrap();
    config.default_board_id = default_board.map(|s| s.to_string());
    config
}

pub fn session(boards: &Arc<FakeBoardService>, tasks: &Arc<FakeTaskService>) -> Session {
    session_with(boards, tasks, Some(DEFAULT_BOARD))
}

pub fn session_with(
    boards: &Arc<FakeBoardService>,
    tasks: &Arc<FakeTaskService>,
    default_board: Option<&str>,
) -> Session {
    let boards: Arc<dyn BoardService> = boards.clone();
    let tasks: Arc<dyn TaskService> = tasks.clone();
    Session::with_id("test-session", boards, tasks, &config(default_board))
}
