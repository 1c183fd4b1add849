//! Downstream Services
//!
//! - `BoardService`: boards, lists, cards, activity
//! - `TaskService`: records of the task table

pub mod airtable;
pub mod traits;
pub mod trello;

pub use airtable::AirtableClient;
pub use traits::{BoardService, TaskService};
pub use trello::TrelloClient;
