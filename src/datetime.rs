use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

/// 日付の入力形式。
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[cfg(not(test))]
/// 現在のUTC時間を取得する。
pub fn now() -> DateTime<Utc> {
    Utc::now()
}


#[cfg(test)]
pub use mock_datetime::now;

/// Localタイムゾーンでの今日の日付を`YYYY-MM-DD`形式で返す。
pub fn today() -> String {
    now().with_timezone(&Local).format(DATE_FORMAT).to_string()
}

/// `YYYY-MM-DD`形式の日付をパースする。
///
/// 桁数の足りない日付や符号、前後の空白は受け付けない。
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    if !is_date_shaped(s) {
        bail!("[{}] is not in the format YYYY-MM-DD", s);
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).with_context(|| format!("[{}] is not a valid date", s))
}

fn is_date_shaped(s: &str) -> bool {
    s.len() == 10
        && s.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// 指定日のLocalタイムゾーンで00:00:00から始まる1日の範囲を返す。
///
/// 終了日時は範囲に含まない。
pub fn day_window(date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start_at = local_midnight(date)?;
    let next_day = date
        .succ_opt()
        .with_context(|| format!("No day after {}", date))?;
    let end_at = local_midnight(next_day)?;

    Ok((start_at, end_at))
}

fn local_midnight(date: NaiveDate) -> Result<DateTime<Utc>> {
    let naive_datetime = date
        .and_hms_opt(0, 0, 0)
        .context("Failed to set hour, minute, and second")?;
    let datetime = Local
        .from_local_datetime(&naive_datetime)
        .earliest()
        .with_context(|| format!("Local midnight does not exist for {}", date))?
        .to_utc();

    Ok(datetime)
}
