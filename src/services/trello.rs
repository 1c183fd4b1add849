//! Board Service REST Client
//!
//! Trello REST v1 over HTTPS. Credentials travel as `key`/`token` query
//! parameters; every call uses the client-wide timeout and is never retried.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::traits::BoardService;
use crate::config::Config;
use crate::error::{CommandError, CommandResult};
use crate::model::{Activity, Board, BoardList, Card, CardUpdate, NewCard};

/// Board service client
#[derive(Clone)]
pub struct TrelloClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    token: Option<String>,
}

impl TrelloClient {
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        token: Option<&str>,
        timeout: std::time::Duration,
    ) -> CommandResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CommandError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(|s| s.to_string()),
            token: token.map(|s| s.to_string()),
        })
    }

    /// Create from config
    pub fn from_config(config: &Config) -> CommandResult<Self> {
        Self::new(
            &config.trello_api_url,
            config.trello_api_key.as_deref(),
            config.trello_token.as_deref(),
            config.http_timeout(),
        )
    }

    /// Check if credentials are configured
    pub fn is_available(&self) -> bool {
        self.api_key.is_some() && self.token.is_some()
    }

    fn credentials(&self) -> CommandResult<(&str, &str)> {
        match (self.api_key.as_deref(), self.token.as_deref()) {
            (Some(key), Some(token)) => Ok((key, token)),
            _ => Err(CommandError::ConfigurationMissing(
                "credenciais do Trello não encontradas. Verifique se TRELLO_API_KEY e TRELLO_TOKEN estão definidos."
                    .to_string(),
            )),
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> CommandResult<T> {
        let (key, token) = self.credentials()?;
        let url = format!("{}{}", self.base_url, path);

        debug!("Board service {} {}", method, path);

        let response = self
            .client
            .request(method.clone(), &url)
            .query(&[("key", key), ("token", token)])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Board service {} {} failed: {}", method, path, status);
            return Err(CommandError::ServiceUnreachable {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CommandError::Transport(format!("resposta inesperada de {}: {}", path, e)))
    }
}

#[async_trait]
impl BoardService for TrelloClient {
    async fn list_boards(&self) -> CommandResult<Vec<Board>> {
        self.send(Method::GET, "/members/me/boards", &[("filter", "open".to_string())])
            .await
    }

    async fn get_board(&self, board_id: &str) -> CommandResult<Board> {
        self.send(Method::GET, &format!("/boards/{}", board_id), &[]).await
    }

    async fn create_board(&self, name: &str, description: Option<&str>) -> CommandResult<Board> {
        let mut query = vec![
            ("name", name.to_string()),
            ("defaultLists", "false".to_string()),
        ];
        if let Some(desc) = description.filter(|d| !d.is_empty()) {
            query.push(("desc", desc.to_string()));
        }
        self.send(Method::POST, "/boards/", &query).await
    }

    async fn delete_board(&self, board_id: &str) -> CommandResult<()> {
        let _: serde_json::Value = self
            .send(Method::DELETE, &format!("/boards/{}", board_id), &[])
            .await?;
        Ok(())
    }

    async fn list_lists(&self, board_id: &str) -> CommandResult<Vec<BoardList>> {
        self.send(Method::GET, &format!("/boards/{}/lists", board_id), &[])
            .await
    }

    async fn create_list(&self, board_id: &str, name: &str) -> CommandResult<BoardList> {
        self.send(
            Method::POST,
            "/lists",
            &[("name", name.to_string()), ("idBoard", board_id.to_string())],
        )
        .await
    }

    async fn list_cards(&self, list_id: &str) -> CommandResult<Vec<Card>> {
        self.send(Method::GET, &format!("/lists/{}/cards", list_id), &[])
            .await
    }

    async fn list_board_cards(&self, board_id: &str) -> CommandResult<Vec<Card>> {
        self.send(Method::GET, &format!("/boards/{}/cards", board_id), &[])
            .await
    }

    async fn create_card(&self, card: &NewCard) -> CommandResult<Card> {
        let mut query = vec![
            ("idList", card.list_id.clone()),
            ("name", card.name.clone()),
            ("desc", card.description.clone().unwrap_or_default()),
        ];
        if let Some(due) = &card.due_date {
            query.push(("due", due.clone()));
        }
        self.send(Method::POST, "/cards", &query).await
    }

    async fn update_card(&self, card_id: &str, update: &CardUpdate) -> CommandResult<Card> {
        let mut query = Vec::new();
        if let Some(name) = &update.name {
            query.push(("name", name.clone()));
        }
        if let Some(desc) = &update.description {
            query.push(("desc", desc.clone()));
        }
        if let Some(due) = &update.due_date {
            query.push(("due", due.clone()));
        }
        if let Some(list_id) = &update.list_id {
            query.push(("idList", list_id.clone()));
        }
        if let Some(closed) = update.closed {
            query.push(("closed", closed.to_string()));
        }
        self.send(Method::PUT, &format!("/cards/{}", card_id), &query)
            .await
    }

    async fn recent_activity(&self, board_id: &str, limit: usize) -> CommandResult<Vec<Activity>> {
        self.send(
            Method::GET,
            &format!("/boards/{}/actions", board_id),
            &[("limit", limit.to_string())],
        )
        .await
    }
}
