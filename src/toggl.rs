use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
#[cfg(test)]
use mockall::automock;
use reqwest::{header::ACCEPT, Client, RequestBuilder};
use serde::Deserialize;

use crate::config::TogglConfig;
use crate::time_entry::{Me, Project, TimeEntry};

/// Toggl APIから情報を取得するためのtrait。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TogglRepository {
    /// 認証済みユーザーの情報を取得する。
    async fn read_me(&self) -> Result<Me>;

    /// 指定された範囲のタイムエントリーを取得する。
    ///
    /// # Arguments
    ///
    /// * `start_at` - 取得するタイムエントリーの開始日時(含む)
    /// * `end_at` - 取得するタイムエントリーの終了日時(含まない)
    async fn read_time_entries(
        &self,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>>;

    /// 指定されたIDのプロジェクトを取得する。
    async fn read_project(&self, project_id: i64) -> Result<Project>;
}

/// `/me`のレスポンスをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct TogglMe {
    data: TogglPersonalInfo,
}

#[derive(Debug, Deserialize)]
struct TogglPersonalInfo {
    email: String,
    fullname: String,
}

/// Toggl APIのレスポンスをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct TogglTimeEntry {
    id: i64,
    #[serde(default)]
    pid: Option<i64>,
    #[serde(default)]
    description: Option<String>,
    duration: i64,
}

/// `/projects/{id}`のレスポンスをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct TogglProject {
    data: TogglProjectData,
}

#[derive(Debug, Deserialize)]
struct TogglProjectData {
    id: i64,
    name: String,
}

impl From<TogglTimeEntry> for TimeEntry {
    fn from(entry: TogglTimeEntry) -> Self {
        TimeEntry {
            id: entry.id,
            // pidが0の場合もプロジェクト未割り当てとして扱う
            project_id: entry.pid.filter(|pid| *pid != 0),
            description: entry.description.unwrap_or_default(),
            duration: entry.duration,
        }
    }
}

/// Toggl APIと通信するためのクライアント。
///
/// # Examples
///
/// ```
/// let client = TogglClient::new(&config.toggl);
/// let time_entries = client.read_time_entries(&start_at, &end_at).await.unwrap();
/// ```
pub struct TogglClient {
    client: Client,
    api_url: String,
    username: String,
    password: String,
}

impl TogglClient {
    /// 新しい`TogglClient`を返す。
    pub fn new(config: &TogglConfig) -> Self {
        Self {
            client: Client::new(),
            api_url: config.server_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{}", self.api_url, path))
            .basic_auth(&self.username, Some(&self.password))
            .header(ACCEPT, "application/json")
    }
}

#[async_trait]
impl TogglRepository for TogglClient {
    async fn read_me(&self) -> Result<Me> {
        let me = self
            .get("/me")
            .send()
            .await
            .with_context(|| format!("Failed to send request to Toggl API at {}", self.api_url))?
            .error_for_status()
            .context("Request returned an error status")?
            .json::<TogglMe>()
            .await
            .context("Failed to deserialize response")?;

        Ok(Me {
            full_name: me.data.fullname,
            email: me.data.email,
        })
    }

    async fn read_time_entries(
        &self,
        start_at: &DateTime<Utc>,
        end_at: &DateTime<Utc>,
    ) -> Result<Vec<TimeEntry>> {
        let toggl_time_entries = self
            .get("/time_entries")
            .query(&[
                ("start_date", start_at.to_rfc3339()),
                ("end_date", end_at.to_rfc3339()),
            ])
            .send()
            .await
            .with_context(|| format!("Failed to send request to Toggl API at {}", self.api_url))?
            .error_for_status()
            .context("Request returned an error status")?
            .json::<Vec<TogglTimeEntry>>()
            .await
            .context("Failed to deserialize response")?;
        info!("length of time entries: {}", toggl_time_entries.len());

        Ok(toggl_time_entries.into_iter().map(TimeEntry::from).collect())
    }

    async fn read_project(&self, project_id: i64) -> Result<Project> {
        let project = self
            .get(&format!("/projects/{}", project_id))
            .send()
            .await
            .with_context(|| format!("Failed to send request to Toggl API at {}", self.api_url))?
            .error_for_status()
            .context("Request returned an error status")?
            .json::<TogglProject>()
            .await
            .context("Failed to deserialize response")?;
        debug!("project {} is [{}]", project.data.id, project.data.name);

        Ok(Project {
            id: project.data.id,
            name: project.data.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use chrono::{TimeZone, Utc};
    use mockito::{Matcher, Server};
    use rstest::rstest;
    use serde_json::json;

    use super::{TogglClient, TogglRepository};
    use crate::config::TogglConfig;
    use crate::time_entry::{Me, Project, TimeEntry};

    fn client_for(server: &Server) -> TogglClient {
        TogglClient::new(&TogglConfig {
            username: "tester".to_string(),
            password: "secret".to_string(),
            server_url: server.url(),
        })
    }

    fn basic_auth() -> String {
        format!("Basic {}", STANDARD.encode("tester:secret"))
    }

    #[tokio::test]
    async fn test_read_me() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/me")
            .match_header("authorization", basic_auth().as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "data": {
                        "email": "tester@toggl-sync.com",
                        "fullname": "TogglSync Tester",
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let me = client_for(&server).read_me().await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            me,
            Me {
                full_name: "TogglSync Tester".to_string(),
                email: "tester@toggl-sync.com".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_read_time_entries() {
        let start_at = Utc.with_ymd_and_hms(2020, 5, 8, 0, 0, 0).unwrap();
        let end_at = Utc.with_ymd_and_hms(2020, 5, 9, 0, 0, 0).unwrap();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/time_entries")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("start_date".into(), start_at.to_rfc3339()),
                Matcher::UrlEncoded("end_date".into(), end_at.to_rfc3339()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {"id": 1, "pid": 10, "duration": 120, "description": "Writing toggl-sync tests"},
                    {"id": 2, "pid": 0, "duration": 240, "description": "ENG-1002"},
                    {"id": 3, "duration": -1590000000},
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let entries = client_for(&server)
            .read_time_entries(&start_at, &end_at)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            entries,
            vec![
                TimeEntry {
                    id: 1,
                    project_id: Some(10),
                    description: "Writing toggl-sync tests".to_string(),
                    duration: 120,
                },
                TimeEntry {
                    id: 2,
                    project_id: None,
                    description: "ENG-1002".to_string(),
                    duration: 240,
                },
                TimeEntry {
                    id: 3,
                    project_id: None,
                    description: "".to_string(),
                    duration: -1590000000,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_read_project() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/projects/10")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"data": {"id": 10, "name": "Top Secret"}}).to_string())
            .create_async()
            .await;

        let project = client_for(&server).read_project(10).await.unwrap();

        mock.assert_async().await;
        assert_eq!(
            project,
            Project {
                id: 10,
                name: "Top Secret".to_string(),
            }
        );
    }

    /// エラーステータスと想定外のレスポンスはエラーとして返す。
    #[tokio::test]
    #[rstest]
    #[case::bad_gateway(502, "")]
    #[case::unauthorized(403, "")]
    #[case::unexpected_format(200, "\"Bogus!\"")]
    async fn test_read_errors(#[case] status: usize, #[case] body: &str) {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Any)
            .with_status(status)
            .with_body(body)
            .expect_at_least(1)
            .create_async()
            .await;
        let client = client_for(&server);
        let start_at = Utc.with_ymd_and_hms(2020, 5, 8, 0, 0, 0).unwrap();
        let end_at = Utc.with_ymd_and_hms(2020, 5, 9, 0, 0, 0).unwrap();

        assert!(client.read_me().await.is_err());
        assert!(client.read_time_entries(&start_at, &end_at).await.is_err());
        assert!(client.read_project(10).await.is_err());
    }
}
