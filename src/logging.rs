use anyhow::{Context, Result};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

/// 標準エラー出力へログを出力するloggerを設定する。
///
/// # Arguments
///
/// * `verbose` - `true`の場合はDebugレベルまで出力する
pub fn setup_logger(verbose: bool) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}",
                Local::now().format("%H:%M:%S"),
                colors.color(record.level()),
                message
            ))
        })
        .level(level_filter(verbose))
        .level_for("reqwest", LevelFilter::Warn)
        .level_for("hyper", LevelFilter::Warn)
        .chain(std::io::stderr())
        .apply()
        .context("Failed to set up logger")
}

fn level_filter(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

#[cfg(test)]
mod tests {
    use log::LevelFilter;
    use rstest::rstest;

    use super::level_filter;

    #[rstest]
    #[case(false, LevelFilter::Info)]
    #[case(true, LevelFilter::Debug)]
    fn test_level_filter(#[case] verbose: bool, #[case] expected: LevelFilter) {
        assert_eq!(level_filter(verbose), expected);
    }
}
