use anyhow::{Context, Result};
use log::info;

use crate::config::{Config, ConfigManager, DEFAULT_TOGGL_SERVER_URL};
use crate::input::InputController;

/// `configure`サブコマンド。
///
/// 設定を対話的に作成、更新して保存する。
pub struct ConfigureCommand<'a, M: ConfigManager, I: InputController> {
    manager: &'a M,
    input: &'a I,
}

impl<'a, M: ConfigManager, I: InputController> ConfigureCommand<'a, M, I> {
    /// 新しい`ConfigureCommand`を返す。
    pub fn new(manager: &'a M, input: &'a I) -> Self {
        Self { manager, input }
    }

    /// 既存の設定を読み込み、各項目の入力を受け付けて保存する。
    ///
    /// 空の入力は既存の値を維持する。
    pub fn run(&self) -> Result<Config> {
        let mut config = self
            .manager
            .load()
            .context("Error reading configuration file")?
            .unwrap_or_default();

        self.update_configuration(&mut config)
            .context("Error updating configuration")?;

        self.manager
            .persist(&config)
            .context("Error saving configuration to file")?;
        info!("Configuration saved");

        Ok(config)
    }

    fn update_configuration(&self, config: &mut Config) -> Result<()> {
        if config.toggl.server_url.is_empty() {
            config.toggl.server_url = DEFAULT_TOGGL_SERVER_URL.to_string();
        }
        self.update_text("Toggl username", &mut config.toggl.username)?;
        self.update_password("Toggl password", &mut config.toggl.password)?;
        self.update_text("Jira server url", &mut config.jira.server_url)?;
        self.update_text("Jira username", &mut config.jira.username)?;
        self.update_password("Jira password", &mut config.jira.password)?;
        self.update_text("Jira project key", &mut config.jira.project_key)?;

        for project in config.overhead_projects() {
            if let Some(key) = config.jira.overhead.get_mut(&project) {
                self.update_text(&format!("Overhead key for project [{}]", project), key)?;
            }
        }

        Ok(())
    }

    fn update_text(&self, name: &str, value: &mut String) -> Result<()> {
        let prompt = if value.is_empty() {
            format!("{}: ", name)
        } else {
            format!("{} ({}): ", name, value)
        };
        let input = self
            .input
            .request_text_input(&prompt)
            .context("Error reading input")?;
        replace_unless_empty(value, &input);

        Ok(())
    }

    fn update_password(&self, name: &str, value: &mut String) -> Result<()> {
        let prompt = if value.is_empty() {
            format!("{}: ", name)
        } else {
            format!("{} (*****): ", name)
        };
        let input = self
            .input
            .request_password(&prompt)
            .context("Error reading input")?;
        replace_unless_empty(value, &input);

        Ok(())
    }
}

fn replace_unless_empty(value: &mut String, input: &str) {
    let input = input.trim();
    if !input.is_empty() {
        *value = input.to_string();
    }
}
