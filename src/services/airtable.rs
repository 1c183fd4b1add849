//! Task Service REST Client
//!
//! Airtable v0: one base, one table, bearer-token auth.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use super::traits::TaskService;
use crate::config::Config;
use crate::error::{CommandError, CommandResult};
use crate::model::{NewTask, TaskFields, TaskRecord};

#[derive(Debug, Deserialize)]
struct RecordList {
    #[serde(default)]
    records: Vec<TaskRecord>,
}

/// Tabular task service client
#[derive(Clone)]
pub struct AirtableClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    base_id: Option<String>,
    table_id: Option<String>,
}

impl AirtableClient {
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        base_id: Option<&str>,
        table_id: Option<&str>,
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
            base_id: base_id.map(|s| s.to_string()),
            table_id: table_id.map(|s| s.to_string()),
        })
    }

    pub fn from_config(config: &Config) -> CommandResult<Self> {
        Self::new(
            &config.airtable_api_url,
            config.airtable_api_key.as_deref(),
            config.airtable_base_id.as_deref(),
            config.airtable_table_id.as_deref(),
            config.http_timeout(),
        )
    }

    pub fn is_available(&self) -> bool {
        self.api_key.is_some() && self.base_id.is_some() && self.table_id.is_some()
    }

    /// Table URL plus the bearer key, or the names of what is missing
    fn table_url(&self) -> CommandResult<(String, &str)> {
        let mut missing = Vec::new();
        if self.api_key.is_none() {
            missing.push("AIRTABLE_API_KEY");
        }
        if self.base_id.is_none() {
            missing.push("AIRTABLE_BASE_ID");
        }
        if self.table_id.is_none() {
            missing.push("AIRTABLE_TABLE_ID");
        }

        match (&self.api_key, &self.base_id, &self.table_id) {
            (Some(key), Some(base), Some(table)) => {
                Ok((format!("{}/{}/{}", self.base_url, base, table), key.as_str()))
            }
            _ => Err(CommandError::ConfigurationMissing(format!(
                "credenciais do Airtable não configuradas ({})",
                missing.join(", ")
            ))),
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        record_id: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> CommandResult<T> {
        let (table_url, key) = self.table_url()?;
        let url = match record_id {
            Some(id) => format!("{}/{}", table_url, id),
            None => table_url,
        };

        debug!("Task service {} {}", method, url);

        let mut request = self.client.request(method.clone(), &url).bearer_auth(key);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Task service {} failed: {}", method, status);
            return Err(CommandError::ServiceUnreachable {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CommandError::Transport(format!("resposta inesperada do Airtable: {}", e)))
    }
}

#[async_trait]
impl TaskService for AirtableClient {
    async fn list_records(&self) -> CommandResult<Vec<TaskRecord>> {
        let list: RecordList = self.send(Method::GET, None, None).await?;
        Ok(list.records)
    }

    async fn create_record(&self, task: &NewTask) -> CommandResult<TaskRecord> {
        let body = json!({
            "records": [{ "fields": task.fields() }],
            "typecast": true
        });
        let list: RecordList = self.send(Method::POST, None, Some(body)).await?;
        list.records
            .into_iter()
            .next()
            .ok_or_else(|| CommandError::Transport("Airtable não retornou o registro criado".to_string()))
    }

    async fn update_record(&self, record_id: &str, update: &TaskFields) -> CommandResult<TaskRecord> {
        let body = json!({ "fields": update, "typecast": true });
        self.send(Method::PATCH, Some(record_id), Some(body)).await
    }

    async fn delete_record(&self, record_id: &str) -> CommandResult<()> {
        let _: serde_json::Value = self.send(Method::DELETE, Some(record_id), None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_missing_settings_are_named() {
        let client = AirtableClient::new(
            "https://api.airtable.com/v0",
            Some("key"),
            None,
            None,
            Duration::from_secs(1),
        )
        .unwrap();

        let err = client.table_url().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("AIRTABLE_BASE_ID"));
        assert!(message.contains("AIRTABLE_TABLE_ID"));
        assert!(!message.contains("AIRTABLE_API_KEY"));
    }

    #[test]
    fn test_table_url() {
        let client = AirtableClient::new(
            "https://api.airtable.com/v0/",
            Some("key"),
            Some("app1"),
            Some("tbl1"),
            Duration::from_secs(1),
        )
        .unwrap();

        let (url, key) = client.table_url().unwrap();
        assert_eq!(url, "https://api.airtable.com/v0/app1/tbl1");
        assert_eq!(key, "key");
        assert!(client.is_available());
    }
}
