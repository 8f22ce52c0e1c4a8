use std::io::Write;

use anyhow::{bail, Context, Result};
use chrono::Duration;
use log::{debug, error, info, warn};

use crate::config::{Config, ConfigManager};
use crate::console::{ConsolePresenter, ConsoleSummary};
use crate::datetime;
use crate::error::SyncError;
use crate::input::InputController;
use crate::jira::JiraRepository;
use crate::summary::summarize;
use crate::time_entry::{Project, TimeEntry};
use crate::toggl::TogglRepository;
use crate::validation::{is_jira_ticket, validate_entries};

/// 同期を行う日付を指定する引数。
#[derive(Debug, Default, clap::Args)]
pub struct SyncArgs {
    #[clap(help = "Date to synchronize in the format YYYY-MM-DD")]
    pub date: Option<String>,

    #[clap(
        short = 'c',
        long = "current-date",
        conflicts_with = "date",
        help = "Synchronize the current date"
    )]
    pub current_date: bool,

    #[clap(
        long = "dry-run",
        help = "Validate time entries without logging work on Jira (avoid side effects)"
    )]
    pub dry_run: bool,
}

impl SyncArgs {
    /// 同期対象の日付を`YYYY-MM-DD`形式で返す。
    ///
    /// `--current-date`が指定された場合はLocalタイムゾーンの今日の日付を返す。
    pub fn target_date(&self) -> Result<String> {
        if self.current_date {
            return Ok(datetime::today());
        }
        match &self.date {
            Some(date) => Ok(date.clone()),
            None => bail!("A date (YYYY-MM-DD) or --current-date is required"),
        }
    }
}

/// Jiraへ記録したwork log。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggedWork {
    pub ticket: String,
    pub description: String,
    pub duration: i64,
}

/// 記録できなかったtime entry。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedEntry {
    pub description: String,
    pub project: Option<String>,
    pub reason: String,
}

/// 1回の同期の結果。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub dry_run: bool,
    pub logged: Vec<LoggedWork>,
    pub failed: Vec<FailedEntry>,
}

/// Togglのtime entryをJiraのwork logへ同期する。
pub struct SyncCommand<'a, T: TogglRepository, J: JiraRepository, I: InputController> {
    toggl_client: &'a T,
    jira_client: &'a J,
    input: &'a I,
}

impl<'a, T: TogglRepository, J: JiraRepository, I: InputController> SyncCommand<'a, T, J, I> {
    /// 新しい`SyncCommand`を返す。
    ///
    /// # Arguments
    /// * `toggl_client` - time entryの取得元
    /// * `jira_client` - work logの記録先
    /// * `input` - overhead keyを問い合わせる入力
    pub fn new(toggl_client: &'a T, jira_client: &'a J, input: &'a I) -> Self {
        Self {
            toggl_client,
            jira_client,
            input,
        }
    }

    /// 同期を行い、成功した場合は設定を保存する。
    ///
    /// dry-runの場合は設定を保存しない。
    pub async fn run_and_persist<M: ConfigManager, W: Write>(
        &self,
        args: &SyncArgs,
        manager: &M,
        config: &mut Config,
        writer: &mut W,
    ) -> Result<SyncReport> {
        let date = args.target_date()?;
        let report = self.run(config, &date, args.dry_run, writer).await?;

        if !args.dry_run {
            manager
                .persist(config)
                .context("Error saving configuration to file")?;
        }
        info!(
            "Sync finished: {} logged, {} failed",
            report.logged.len(),
            report.failed.len()
        );

        Ok(report)
    }

    /// 指定日のtime entryを同期する。
    ///
    /// ユーザー情報の取得、日付のパース、time entryの取得、検証のいずれかに失敗した場合は何も記録せずにエラーを返す。
    /// time entry単位の記録の失敗は`SyncReport::failed`に記録し、残りのtime entryの記録を続ける。
    ///
    /// # Arguments
    ///
    /// * `config` - チケットキーのprefixとoverhead keyの対応。新しく入力されたoverhead keyはここへ追加する。
    /// * `date` - `YYYY-MM-DD`形式の日付
    /// * `dry_run` - `true`の場合は検証までを行い、Jiraへは記録しない
    /// * `writer` - ユーザー情報とtime entryの一覧の出力先
    pub async fn run<W: Write>(
        &self,
        config: &mut Config,
        date: &str,
        dry_run: bool,
        writer: &mut W,
    ) -> Result<SyncReport, SyncError> {
        let mut presenter = ConsoleSummary::new(writer);

        info!("Fetching user details...");
        let me = self
            .toggl_client
            .read_me()
            .await
            .map_err(SyncError::FetchUser)?;
        if let Err(err) = presenter.show_user(&me) {
            warn!("{:#}", err);
        }

        let date = datetime::parse_date(date).map_err(SyncError::ParseDate)?;
        let (start_at, end_at) = datetime::day_window(date).map_err(SyncError::DayWindow)?;
        info!("Start at: {}, End at: {}", start_at, end_at);
        let time_entries = self
            .toggl_client
            .read_time_entries(&start_at, &end_at)
            .await
            .map_err(SyncError::FetchEntries)?;

        let time_entries = summarize(&time_entries);
        info!("== Time Entries Summary ==");
        if let Err(err) = presenter.show_time_entries(&time_entries) {
            warn!("{:#}", err);
        }

        let issues = validate_entries(&time_entries, config.ticket_key_prefix());
        if !issues.is_empty() {
            error!("Found issues during validation:");
            for issue in &issues {
                error!("{}", issue);
            }
            error!("Please, correct the time entries above and try again.");
            return Err(SyncError::Validation(issues));
        }

        let mut report = SyncReport {
            dry_run,
            ..Default::default()
        };
        if dry_run {
            info!("Logging work on Jira... SKIPPED! (dry-run)");
            return Ok(report);
        }

        info!("Logging work on Jira...");
        for entry in &time_entries {
            match self.log_entry(config, entry).await {
                Ok(logged) => report.logged.push(logged),
                Err(failed) => {
                    error!(
                        "No time logged for [{}]{}; {}",
                        failed.description,
                        failed
                            .project
                            .as_ref()
                            .map(|project| format!(" (project [{}])", project))
                            .unwrap_or_default(),
                        failed.reason
                    );
                    report.failed.push(failed);
                }
            }
        }

        Ok(report)
    }

    /// 1件のtime entryをJiraへ記録する。
    async fn log_entry(
        &self,
        config: &mut Config,
        entry: &TimeEntry,
    ) -> Result<LoggedWork, FailedEntry> {
        debug!("Logging time entry {} [{}]", entry.id, entry.description);
        if is_jira_ticket(entry, config.ticket_key_prefix()) {
            self.log_project_work(entry).await
        } else {
            self.log_overhead_work(config, entry).await
        }
    }

    /// descriptionをチケットキーとしてそのまま記録する。
    async fn log_project_work(&self, entry: &TimeEntry) -> Result<LoggedWork, FailedEntry> {
        self.jira_client
            .log_work(&entry.description, Duration::seconds(entry.duration))
            .await
            .map_err(|err| FailedEntry {
                description: entry.description.clone(),
                project: None,
                reason: format!("operation failed with an error: {:#}", err),
            })?;
        info!(
            "Successfully logged [{}]s for entry [{}]",
            entry.duration, entry.description
        );

        Ok(LoggedWork {
            ticket: entry.description.clone(),
            description: entry.description.clone(),
            duration: entry.duration,
        })
    }

    /// プロジェクトのoverhead keyへdescriptionをコメントとして記録する。
    async fn log_overhead_work(
        &self,
        config: &mut Config,
        entry: &TimeEntry,
    ) -> Result<LoggedWork, FailedEntry> {
        let failed = |project: Option<&str>, reason: String| FailedEntry {
            description: entry.description.clone(),
            project: project.map(str::to_string),
            reason,
        };

        let Some(project_id) = entry.project_id else {
            return Err(failed(None, "no Toggl project assigned".to_string()));
        };
        let project = self
            .toggl_client
            .read_project(project_id)
            .await
            .map_err(|err| {
                failed(
                    None,
                    format!(
                        "retrieving project information failed with an error: {:#}",
                        err
                    ),
                )
            })?;

        debug!(
            "Entry [{}] belongs to project {} [{}]",
            entry.description, project.id, project.name
        );
        let existing = config.overhead_key(&project.name).map(str::to_string);
        let ticket = match existing {
            Some(ticket) => ticket,
            None => self
                .request_overhead_key(config, entry, &project)
                .map_err(|err| {
                    failed(
                        Some(&project.name),
                        format!(
                            "requesting project overhead key failed with an error: {:#}",
                            err
                        ),
                    )
                })?,
        };

        self.jira_client
            .log_work_with_comment(
                &ticket,
                Duration::seconds(entry.duration),
                &entry.description,
            )
            .await
            .map_err(|err| {
                failed(
                    Some(&project.name),
                    format!("operation failed with an error: {:#}", err),
                )
            })?;
        info!(
            "Successfully logged [{}]s for entry [{}] (project [{}])",
            entry.duration, entry.description, project.name
        );

        Ok(LoggedWork {
            ticket,
            description: entry.description.clone(),
            duration: entry.duration,
        })
    }

    /// overhead keyをオペレーターに問い合わせ、設定へ追加する。
    fn request_overhead_key(
        &self,
        config: &mut Config,
        entry: &TimeEntry,
        project: &Project,
    ) -> Result<String> {
        let input = self.input.request_text_input(&format!(
            "No configuration found for entry [{}] (project [{}]). Which Jira ticket should be used for this type of work? -> ",
            entry.description, project.name
        ))?;
        let ticket = input.trim();
        if ticket.is_empty() {
            bail!("no Jira ticket given");
        }

        info!(
            "Saving configuration: entries for project [{}] will be tracked as [{}] from now on",
            project.name, ticket
        );
        config.set_overhead_key(&project.name, ticket);

        Ok(ticket.to_string())
    }
}
