use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Duration;
use log::debug;
#[cfg(test)]
use mockall::automock;
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    Client, StatusCode,
};
use serde::Serialize;

use crate::config::JiraConfig;

/// 自動で記録したwork logに付与するコメント。
pub const DEFAULT_COMMENT: &str = "Added automatically by toggl-sync";

/// Jiraのチケットへwork logを記録するためのtrait。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait JiraRepository {
    /// 既定のコメントでwork logを記録する。
    async fn log_work(&self, ticket: &str, time_spent: Duration) -> Result<()>;

    /// `comment`の後に既定のコメントを続けてwork logを記録する。
    async fn log_work_with_comment(
        &self,
        ticket: &str,
        time_spent: Duration,
        comment: &str,
    ) -> Result<()>;
}

/// work log登録APIのリクエストボディ。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkLogEntry {
    comment: String,
    time_spent_seconds: i64,
}

/// Jira REST APIと通信するためのクライアント。
pub struct JiraClient {
    client: Client,
    api_url: String,
    username: String,
    password: String,
}

impl JiraClient {
    /// 新しい`JiraClient`を返す。
    pub fn new(config: &JiraConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: format!(
                "{}/rest/api/latest",
                config.server_url.trim_end_matches('/')
            ),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    async fn post_work_log(&self, ticket: &str, entry: &WorkLogEntry) -> Result<()> {
        debug!("posting work log to [{}]: {:?}", ticket, entry);
        let response = self
            .client
            .post(format!("{}/issue/{}/worklog", self.api_url, ticket))
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(entry)
            .send()
            .await
            .with_context(|| format!("Failed to send request to Jira API at {}", self.api_url))?;

        if response.status() != StatusCode::CREATED {
            bail!("Request failed with status: {}", response.status());
        }

        Ok(())
    }
}

#[async_trait]
impl JiraRepository for JiraClient {
    async fn log_work(&self, ticket: &str, time_spent: Duration) -> Result<()> {
        let entry = WorkLogEntry {
            comment: DEFAULT_COMMENT.to_string(),
            time_spent_seconds: time_spent.num_seconds(),
        };
        self.post_work_log(ticket, &entry).await
    }

    async fn log_work_with_comment(
        &self,
        ticket: &str,
        time_spent: Duration,
        comment: &str,
    ) -> Result<()> {
        let entry = WorkLogEntry {
            comment: format!("{}\n{}", comment, DEFAULT_COMMENT),
            time_spent_seconds: time_spent.num_seconds(),
        };
        self.post_work_log(ticket, &entry).await
    }
}
