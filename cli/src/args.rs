use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "trnotes", version)]
#[command(about = "Write day notes to a Trilium server from the terminal")]
pub struct Args {
    /// Edit an existing note of the day instead of creating one
    #[arg(long, conflicts_with = "list")]
    pub edit: bool,

    /// List the titles of the day's notes
    #[arg(long)]
    pub list: bool,

    /// Print the day note and its children for troubleshooting
    #[arg(long)]
    pub debug: bool,

    /// Config file to use instead of the default location
    #[arg(long, env = "TRNOTES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Note title, optionally prefixed with a date: `2024-01-31/meeting`
    pub name: Vec<String>,
}

/// Which day a command works on and which note title it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub date: NaiveDate,
    pub title: String,
}

impl Args {
    /// Resolve the note name against `today`, honoring a date prefix.
    pub fn target(&self, today: NaiveDate) -> Result<Target> {
        let target = parse_target(&self.name.join(" "), today);
        if self.edit && target.title.is_empty() {
            bail!("--edit should be used with named notes only");
        }
        Ok(target)
    }
}

/// Split `YYYY-MM-DD/title` into its date and title. Names without a valid
/// date before the first `/` target `today` and are kept whole.
pub fn parse_target(name: &str, today: NaiveDate) -> Target {
    if let Some((prefix, rest)) = name.split_once('/') {
        if let Ok(date) = NaiveDate::parse_from_str(prefix.trim(), "%Y-%m-%d") {
            return Target {
                date,
                title: rest.to_string(),
            };
        }
    }
    Target {
        date: today,
        title: name.to_string(),
    }
}
