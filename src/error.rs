use thiserror::Error;

use crate::validation::ValidationIssue;

/// 同期処理を中断するエラー。
///
/// time entry単位の記録の失敗はこのエラーにはならない。
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Error fetching user details: {0:#}")]
    FetchUser(anyhow::Error),

    #[error("Error parsing input date: {0:#}")]
    ParseDate(anyhow::Error),

    #[error("Error calculating the time range: {0:#}")]
    DayWindow(anyhow::Error),

    #[error("Error retrieving time entries: {0:#}")]
    FetchEntries(anyhow::Error),

    #[error("Validation failed: {} issue(s) found in time entries", .0.len())]
    Validation(Vec<ValidationIssue>),
}
