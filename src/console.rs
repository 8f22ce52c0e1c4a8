use std::io::Write;

use anyhow::{Context, Result};

use crate::time_entry::{Me, TimeEntry};

/// Consoleに同期の経過を表示するためのtrait。
pub trait ConsolePresenter {
    /// ユーザー情報を表示する。
    fn show_user(&mut self, me: &Me) -> Result<()>;

    /// タイムエントリーの一覧を表示する。
    ///
    /// # Arguments
    ///
    /// * `time_entries` - 表示するタイムエントリー
    fn show_time_entries(&mut self, time_entries: &[TimeEntry]) -> Result<()>;
}

/// 1行ずつプレーンテキストで表示する。
pub struct ConsoleSummary<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleSummary<'a, W> {
    /// 新しい`ConsoleSummary`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleSummary<'a, W> {
    fn show_user(&mut self, me: &Me) -> Result<()> {
        writeln!(self.writer, "Name = {}, Email = {}", me.full_name, me.email)
            .context("Failed to write user details")
    }

    // 入力の順番のまま表示する。
    fn show_time_entries(&mut self, time_entries: &[TimeEntry]) -> Result<()> {
        for entry in time_entries {
            writeln!(
                self.writer,
                "Entry: {} || Duration (s): {}",
                entry.description, entry.duration
            )
            .with_context(|| format!("Failed to write time entry: {:?}", entry))?;
        }

        Ok(())
    }
}
