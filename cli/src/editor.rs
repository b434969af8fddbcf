use std::env;
use std::fs;
use std::io::Write;
use std::process::Command;

use anyhow::{bail, Context, Result};

/// Open the user's editor on `initial` and return the saved text.
///
/// The buffer lives in a temporary `.md` file that is removed on return.
pub fn edit(initial: &str) -> Result<String> {
    let mut file = tempfile::Builder::new()
        .prefix("trnotes-")
        .suffix(".md")
        .tempfile()
        .context("failed to create temp file")?;
    file.write_all(initial.as_bytes())
        .and_then(|_| file.flush())
        .context("failed to write temp file")?;

    let editor = editor_command();
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or(default_editor());
    let status = Command::new(program)
        .args(parts)
        .arg(file.path())
        .status()
        .with_context(|| format!("error opening {editor}"))?;
    if !status.success() {
        bail!("{editor} failed to execute ({status})");
    }

    fs::read_to_string(file.path()).context("failed to read edited file")
}

/// `$VISUAL`, then `$EDITOR`, then a platform default.
fn editor_command() -> String {
    ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|key| env::var(key).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default_editor().to_string())
}

fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "nano"
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    // Both tests touch the process environment, so they run as one.
    #[test]
    fn editor_output_is_read_back() {
        env::remove_var("VISUAL");

        // `true` leaves the buffer untouched.
        env::set_var("EDITOR", "true");
        assert_eq!(edit("keep me\n").unwrap(), "keep me\n");

        // `false` exits non-zero.
        env::set_var("EDITOR", "false");
        let err = edit("x").unwrap_err();
        assert!(err.to_string().contains("failed to execute"));

        env::set_var("EDITOR", "   ");
        assert_eq!(editor_command(), default_editor());
        env::remove_var("EDITOR");
    }
}
