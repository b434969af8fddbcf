//! What each invocation does, on top of `NoteClient`.
//!
//! Terminal I/O is passed in (readers, writers, the edit function) so the
//! commands can be exercised against the mock server in tests.

use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use tracing::info;
use trnotes_core::{format_date, Note, NoteClient};

use crate::args::Target;
use crate::config::Config;

/// First run: ask for the server URL and password, log in and return the
/// config to persist.
pub fn setup(input: &mut impl BufRead, out: &mut impl Write) -> Result<Config> {
    writeln!(out, "Let's do an initial config")?;
    let url = prompt(input, out, "Please, insert the URL for your Trilium server: ")?;
    let mut client = NoteClient::new(&url)?;
    let password = prompt(
        input,
        out,
        "Now enter your password to generate the access token: ",
    )?;
    let token = client.authorize(&password)?;
    Ok(Config::new(client.base_url(), token))
}

/// Print the title of every note under `date`.
pub fn list(client: &NoteClient, date: NaiveDate, out: &mut impl Write) -> Result<()> {
    let notes = client.get_all_date_notes(date)?;
    if notes.is_empty() {
        writeln!(out, "no notes for {}", format_date(date))?;
    }
    for note in notes {
        writeln!(out, "{}", note.title)?;
    }
    Ok(())
}

/// Dump the day note and its children. Children titled "Note" also get
/// their content, MIME type and type printed.
pub fn debug(client: &NoteClient, date: NaiveDate, out: &mut impl Write) -> Result<()> {
    let day = client.get_selected_day_note(date)?;
    writeln!(out, "{}", day.title)?;
    for note in client.fetch_children_notes(day.child_note_ids.as_slice())? {
        writeln!(out, "{}", note.title)?;
        if note.title == "Note" {
            writeln!(out, "{}", client.fetch_note_content(&note.id)?)?;
            writeln!(out, "{}", note.mime)?;
            writeln!(out, "{}", note.kind)?;
        }
    }
    Ok(())
}

/// Write a new note in the editor and save it under the target day.
/// Returns `None` when the buffer was left empty.
pub fn create<E>(client: &NoteClient, target: &Target, open_editor: E) -> Result<Option<Note>>
where
    E: FnOnce(&str) -> Result<String>,
{
    let content = open_editor("")?;
    if content.trim().is_empty() {
        info!("empty note, nothing saved");
        return Ok(None);
    }
    let note = client.save_note_in_date(target.date, &content, &target.title)?;
    Ok(Some(note))
}

/// Find the target note, let the user pick when several share the title,
/// then round-trip its content through the editor.
pub fn edit<C, E>(client: &NoteClient, target: &Target, choose: C, open_editor: E) -> Result<Note>
where
    C: FnOnce(&[Note]) -> Result<usize>,
    E: FnOnce(&str) -> Result<String>,
{
    let mut notes = client.search_in_date(target.date, &target.title)?;
    let index = if notes.len() > 1 { choose(&notes)? } else { 0 };
    if index >= notes.len() {
        bail!("selected number is not in the list");
    }
    let note = notes.swap_remove(index);

    let content = client.fetch_note_content(&note.id)?;
    let edited = open_editor(&content)?;
    client.update_note(&note.id, &edited)?;
    Ok(note)
}

/// Show a numbered list and read a 1-based choice. Returns the 0-based index.
pub fn prompt_choice(notes: &[Note], input: &mut impl BufRead, out: &mut impl Write) -> Result<usize> {
    writeln!(out, "More than one note found!")?;
    for (i, note) in notes.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, note.title)?;
    }
    let answer = prompt(input, out, "Please, select one from the list: ")?;
    let choice: usize = answer
        .parse()
        .with_context(|| format!("'{answer}' is not a number"))?;
    if choice == 0 || choice > notes.len() {
        bail!("selected number is not in the list");
    }
    Ok(choice - 1)
}

fn prompt(input: &mut impl BufRead, out: &mut impl Write, question: &str) -> Result<String> {
    write!(out, "{question}")?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line).context("failed to read answer")?;
    Ok(line.trim().to_string())
}
