use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
#[cfg(test)]
use mockall::automock;

/// オペレーターからの入力を受け付けるためのtrait。
#[cfg_attr(test, automock)]
pub trait InputController {
    /// `prompt`を表示し、1行のテキスト入力を受け付ける。
    fn request_text_input(&self, prompt: &str) -> Result<String>;

    /// `prompt`を表示し、入力内容を表示せずにパスワードを受け付ける。
    fn request_password(&self, prompt: &str) -> Result<String>;
}

/// 標準入力から入力を受け付ける。
pub struct StdInController;

impl InputController for StdInController {
    fn request_text_input(&self, prompt: &str) -> Result<String> {
        print_prompt(prompt)?;
        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Error reading input")?;
        if read == 0 {
            bail!("Error reading input: reached end of input");
        }

        Ok(line)
    }

    fn request_password(&self, prompt: &str) -> Result<String> {
        print_prompt(prompt)?;
        terminal::enable_raw_mode().context("Failed to enable raw mode")?;
        let password = read_masked_line();
        terminal::disable_raw_mode().context("Failed to disable raw mode")?;
        println!();

        password
    }
}

fn print_prompt(prompt: &str) -> Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", prompt).context("Failed to write prompt")?;
    stdout.flush().context("Failed to flush prompt")
}

/// raw mode中にEnterが押されるまでのキー入力を読み取る。
fn read_masked_line() -> Result<String> {
    let mut password = String::new();
    loop {
        let Event::Key(key) = event::read().context("Error reading input")? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if !apply_key(&mut password, key)? {
            return Ok(password);
        }
    }
}

/// キー入力をパスワードに反映する。入力が完了した場合は`false`を返す。
fn apply_key(password: &mut String, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Enter => return Ok(false),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            bail!("Error reading input: interrupted")
        }
        KeyCode::Char(c) => password.push(c),
        KeyCode::Backspace => {
            password.pop();
        }
        _ => {}
    }

    Ok(true)
}
