use std::io::Write;

use anyhow::{Context, Result};

/// `version`サブコマンドの処理を行う。
pub fn version_command<W: Write>(writer: &mut W) -> Result<()> {
    writeln!(writer, "toggl-sync v{}", env!("CARGO_PKG_VERSION")).context("Failed to write version")
}

#[cfg(test)]
mod tests {
    use super::version_command;

    #[test]
    fn test_version_command() {
        let mut writer = Vec::new();

        version_command(&mut writer).unwrap();

        assert_eq!(
            String::from_utf8(writer).unwrap(),
            format!("toggl-sync v{}\n", env!("CARGO_PKG_VERSION"))
        );
    }
}
