use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::info;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

/// 設定ファイル名。
const CONFIG_FILE_NAME: &str = "toggl-sync.yaml";

/// Toggl APIの既定のURL。
pub const DEFAULT_TOGGL_SERVER_URL: &str = "https://www.toggl.com/api/v8";

/// Togglへの接続設定。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TogglConfig {
    pub username: String,
    pub password: String,
    pub server_url: String,
}

impl Default for TogglConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            server_url: DEFAULT_TOGGL_SERVER_URL.to_string(),
        }
    }
}

/// Jiraへの接続設定とoverhead keyの対応表。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JiraConfig {
    pub server_url: String,
    pub username: String,
    pub password: String,
    /// チケットキーのprefix。descriptionがこの文字列で始まるtime entryはチケットへ直接記録する。
    pub project_key: String,
    /// プロジェクト名からoverhead用チケットキーへの対応。
    pub overhead: BTreeMap<String, String>,
}

/// toggl-syncの設定。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub toggl: TogglConfig,
    pub jira: JiraConfig,
}

impl Config {
    /// 同期に必要な項目がすべて設定されているかを検証する。
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("toggl.username", &self.toggl.username),
            ("toggl.password", &self.toggl.password),
            ("toggl.server_url", &self.toggl.server_url),
            ("jira.server_url", &self.jira.server_url),
            ("jira.username", &self.jira.username),
            ("jira.password", &self.jira.password),
            ("jira.project_key", &self.jira.project_key),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            bail!(
                "Configuration file is invalid (missing: {})! Please, run 'configure' to create a new configuration file",
                missing.join(", ")
            );
        }

        Ok(())
    }

    /// チケットキーのprefixを返す。
    pub fn ticket_key_prefix(&self) -> &str {
        &self.jira.project_key
    }

    /// プロジェクトに対応するoverhead keyを返す。空文字は未設定として扱う。
    ///
    /// プロジェクト名は大文字小文字を区別して比較する。
    pub fn overhead_key(&self, project: &str) -> Option<&str> {
        self.jira
            .overhead
            .get(project)
            .map(String::as_str)
            .filter(|key| !key.is_empty())
    }

    /// プロジェクトに対応するoverhead keyを設定する。
    pub fn set_overhead_key(&mut self, project: &str, key: &str) {
        self.jira
            .overhead
            .insert(project.to_string(), key.to_string());
    }

    /// overhead keyが登録されているプロジェクト名の一覧を返す。
    pub fn overhead_projects(&self) -> Vec<String> {
        self.jira.overhead.keys().cloned().collect()
    }
}

/// 設定の読み込みと保存を行うためのtrait。
#[cfg_attr(test, automock)]
pub trait ConfigManager {
    /// 設定を読み込む。
    ///
    /// 設定ファイルが存在しない場合は`Ok(None)`を返す。
    /// 設定ファイルが存在するが読み込めない場合はエラーを返す。
    fn load(&self) -> Result<Option<Config>>;

    /// 設定を保存する。
    fn persist(&self, config: &Config) -> Result<()>;
}

/// YAMLファイルで設定を管理する。
pub struct FileConfigManager {
    path: PathBuf,
}

impl FileConfigManager {
    /// 指定されたパスの設定ファイルを扱う`FileConfigManager`を返す。
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// ユーザーの設定ディレクトリ配下の既定パスを利用する`FileConfigManager`を返す。
    pub fn with_default_path() -> Result<Self> {
        let dir = dirs::config_dir().context("Failed to find the user configuration directory")?;
        Ok(Self::new(dir.join("toggl-sync").join(CONFIG_FILE_NAME)))
    }

    /// 設定ファイルのパス。
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigManager for FileConfigManager {
    fn load(&self) -> Result<Option<Config>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("Unable to read configuration: {}", self.path.display()))
            }
        };
        let config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Unable to parse configuration: {}", self.path.display()))?;
        info!("Configuration read from: {}", self.path.display());

        Ok(Some(config))
    }

    fn persist(&self, config: &Config) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        let contents = serde_yaml::to_string(config).context("Failed to serialize configuration")?;

        let tmp_path = self.path.with_extension("yaml.tmp");
        match fs::remove_file(&tmp_path) {
            Err(err) if err.kind() != ErrorKind::NotFound => {
                return Err(err)
                    .with_context(|| format!("Failed to remove {}", tmp_path.display()))
            }
            _ => {}
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&tmp_path)
            .with_context(|| format!("Failed to open {}", tmp_path.display()))?;
        file.write_all(contents.as_bytes())
            .and_then(|_| file.sync_all())
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        // 設定ファイルは書き込みが完了した内容でのみ置き換える。
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        info!("Configuration saved to: {}", self.path.display());

        Ok(())
    }
}

/// 設定を読み込み、同期に必要な項目が揃っていることを確認する。
pub fn load_valid_config<M: ConfigManager>(manager: &M) -> Result<Config> {
    let config = manager.load().context("Unable to read configuration")?;
    let Some(config) = config else {
        bail!("No configuration file exists! Please, run 'configure' to create a new configuration file");
    };
    config.validate()?;

    Ok(config)
}

/// テスト用に必須項目がすべて設定された設定を作成する。
#[cfg(test)]
pub(crate) fn valid_config() -> Config {
    Config {
        toggl: TogglConfig {
            username: "tester".to_string(),
            password: "secret".to_string(),
            server_url: DEFAULT_TOGGL_SERVER_URL.to_string(),
        },
        jira: JiraConfig {
            server_url: "https://jira.example.com".to_string(),
            username: "jira-user".to_string(),
            password: "jira-secret".to_string(),
            project_key: "ENG".to_string(),
            ..Default::default()
        },
    }
}
