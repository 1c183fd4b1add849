//! Service Trait Definitions
//!
//! Seams for the two downstream collaborators. The REST clients implement
//! them for production; tests plug in in-memory fakes.

use async_trait::async_trait;

use crate::error::CommandResult;
use crate::model::{
    Activity, Board, BoardList, Card, CardUpdate, NewCard, NewTask, TaskFields, TaskRecord,
};

/// Project-board service (boards, lists, cards)
#[async_trait]
pub trait BoardService: Send + Sync {
    /// Open boards the credentials can see
    async fn list_boards(&self) -> CommandResult<Vec<Board>>;

    async fn get_board(&self, board_id: &str) -> CommandResult<Board>;

    async fn create_board(&self, name: &str, description: Option<&str>) -> CommandResult<Board>;

    async fn delete_board(&self, board_id: &str) -> CommandResult<()>;

    /// Lists of a board in position order
    async fn list_lists(&self, board_id: &str) -> CommandResult<Vec<BoardList>>;

    async fn create_list(&self, board_id: &str, name: &str) -> CommandResult<BoardList>;

    async fn list_cards(&self, list_id: &str) -> CommandResult<Vec<Card>>;

    async fn list_board_cards(&self, board_id: &str) -> CommandResult<Vec<Card>>;

    async fn create_card(&self, card: &NewCard) -> CommandResult<Card>;

    async fn update_card(&self, card_id: &str, update: &CardUpdate) -> CommandResult<Card>;

    /// Archiving is a `closed` update
    async fn archive_card(&self, card_id: &str) -> CommandResult<Card> {
        self.update_card(card_id, &CardUpdate::archive()).await
    }

    async fn recent_activity(&self, board_id: &str, limit: usize) -> CommandResult<Vec<Activity>>;
}

/// Tabular task service (records of a single table)
#[async_trait]
pub trait TaskService: Send + Sync {
    async fn list_records(&self) -> CommandResult<Vec<TaskRecord>>;

    async fn create_record(&self, task: &NewTask) -> CommandResult<TaskRecord>;

    /// Only the `Some` fields of `update` are written
    async fn update_record(&self, record_id: &str, update: &TaskFields) -> CommandResult<TaskRecord>;

    async fn delete_record(&self, record_id: &str) -> CommandResult<()>;
}
