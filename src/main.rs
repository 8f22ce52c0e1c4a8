use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::debug;

mod config;
mod configure_command;
mod console;
mod datetime;
mod error;
mod input;
mod jira;
mod logging;
mod summary;
mod sync_command;
mod time_entry;
mod toggl;
mod validation;
mod version_command;

use config::{load_valid_config, FileConfigManager};
use configure_command::ConfigureCommand;
use input::StdInController;
use jira::JiraClient;
use sync_command::{SyncArgs, SyncCommand};
use toggl::TogglClient;
use version_command::version_command;

/// Togglのtime entryをJiraのwork logへ同期するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- 2020-05-22
/// $ cargo run -- --current-date --dry-run
/// $ cargo run -- configure
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(subcommand)]
    subcommand: Option<SubCommands>,

    #[clap(flatten)]
    sync: SyncArgs,

    #[clap(
        long = "config",
        global = true,
        parse(from_os_str),
        help = "Path to the configuration file"
    )]
    config: Option<PathBuf>,

    #[clap(short = 'v', long = "verbose", global = true, help = "Show debug logs")]
    verbose: bool,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    /// Create (or update) toggl-sync configuration
    Configure,
    /// Print current project version
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::setup_logger(args.verbose)?;

    let manager = match args.config {
        Some(path) => FileConfigManager::new(path),
        None => FileConfigManager::with_default_path()?,
    };
    debug!("Using configuration file: {}", manager.path().display());
    let input = StdInController;

    match args.subcommand {
        Some(SubCommands::Configure) => {
            ConfigureCommand::new(&manager, &input).run()?;
        }
        Some(SubCommands::Version) => version_command(&mut io::stdout())?,
        None => {
            let mut config = load_valid_config(&manager)?;
            let toggl = TogglClient::new(&config.toggl);
            let jira = JiraClient::new(&config.jira);
            SyncCommand::new(&toggl, &jira, &input)
                .run_and_persist(&args.sync, &manager, &mut config, &mut io::stdout())
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rstest::rstest;

    use super::{Args, SubCommands};

    #[test]
    fn test_parse_date() {
        let args = Args::try_parse_from(["toggl-sync", "2020-05-22"]).unwrap();

        assert!(args.subcommand.is_none());
        assert_eq!(args.sync.date.as_deref(), Some("2020-05-22"));
        assert!(!args.sync.current_date);
        assert!(!args.sync.dry_run);
    }

    #[rstest]
    #[case(&["toggl-sync", "--current-date", "--dry-run"])]
    #[case(&["toggl-sync", "-c", "--dry-run"])]
    fn test_parse_current_date(#[case] argv: &[&str]) {
        let args = Args::try_parse_from(argv).unwrap();

        assert!(args.sync.date.is_none());
        assert!(args.sync.current_date);
        assert!(args.sync.dry_run);
    }

    #[test]
    fn test_parse_date_and_current_date_conflict() {
        let result = Args::try_parse_from(["toggl-sync", "2020-05-22", "--current-date"]);

        assert!(result.is_err());
    }

    #[test]
    fn test_parse_subcommands() {
        let configure = Args::try_parse_from(["toggl-sync", "configure", "--config", "/tmp/c.yaml"])
            .unwrap();
        let version = Args::try_parse_from(["toggl-sync", "version"]).unwrap();

        assert!(matches!(configure.subcommand, Some(SubCommands::Configure)));
        assert_eq!(
            configure.config.as_deref(),
            Some(std::path::Path::new("/tmp/c.yaml"))
        );
        assert!(matches!(version.subcommand, Some(SubCommands::Version)));
    }
}
