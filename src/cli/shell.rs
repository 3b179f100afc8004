//! Line-oriented editing session.
//!
//! Edits go through the [`Controller`], so title/body changes are autosaved once
//! input pauses for the autosave period, and flushed before switching notes or
//! exiting.

use std::io::{self, Write};
use std::time::Instant;

use tokio::io::{AsyncBufReadExt, BufReader};

use super::handlers::resolve_note;
use crate::controller::Controller;
use crate::entity::short_id;
use crate::error::Result;
use crate::search::SortBy;
use crate::storage::{BlobStore, NoteUpdate};

const HELP: &str = "\
Commands:
  ls                 list notes (current search and sort)
  new                create a note and open it
  open <id>          open a note by id prefix
  title <text>       set the title of the open note
  body <text>        replace the body (\\n for newlines)
  append <text>      append a line to the body
  show               print the open note
  preview            print the body rendered as HTML
  search [text]      filter the list (empty clears)
  sort <key>         updated, created or title
  rm [id]            delete the open note (or <id>)
  save               save pending edits now
  help               this text
  quit               save and exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Run the session until stdin closes or `quit`.
pub async fn run<B: BlobStore>(mut controller: Controller<B>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Ocean Notes shell. Type 'help' for commands.");
    if controller.using_backend() {
        println!("A backend is configured, but notes are kept in local storage.");
    }

    loop {
        let deadline = controller.next_deadline();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let flow = execute(&mut controller, &line, Instant::now(), &mut io::stdout().lock())?;
                if flow == Flow::Quit {
                    break;
                }
            }
            _ = wait_until(deadline) => {
                if controller.tick(Instant::now()) {
                    println!("(saved)");
                }
            }
        }

        if let Some(notice) = controller.take_notice() {
            eprintln!("! {}", notice);
        }
    }

    controller.close()
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

/// Apply one shell command to the controller, writing any output to `out`.
pub fn execute<B: BlobStore, W: Write>(
    controller: &mut Controller<B>,
    line: &str,
    now: Instant,
    out: &mut W,
) -> io::Result<Flow> {
    let line = line.trim();
    let (command, arg) = match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    };

    match command {
        "" => {}
        "help" | "?" => writeln!(out, "{}", HELP)?,
        "quit" | "exit" | "q" => return Ok(Flow::Quit),
        "ls" | "list" => {
            let visible = controller.visible_notes();
            if visible.is_empty() {
                writeln!(out, "No notes found.")?;
            }
            for note in &visible {
                let marker = if controller.selected_id() == Some(note.id.as_str()) {
                    '*'
                } else {
                    ' '
                };
                writeln!(
                    out,
                    "{} ({}) {}",
                    marker,
                    short_id(&note.id),
                    note.display_title()
                )?;
            }
        }
        "new" => {
            if let Some(note) = controller.new_note() {
                writeln!(out, "Created note ({})", short_id(&note.id))?;
            }
        }
        "open" => match resolve_note(controller.notes(), arg) {
            Ok(note) => {
                controller.select(&note.id);
                writeln!(out, "Opened ({}) {}", short_id(&note.id), note.display_title())?;
            }
            Err(e) => writeln!(out, "{}", e)?,
        },
        "title" => edit_selected(controller, NoteUpdate::title(arg), now, out)?,
        "body" => edit_selected(controller, NoteUpdate::body(arg.replace("\\n", "\n")), now, out)?,
        "append" => {
            let body = match controller.draft() {
                Some(note) if !note.body.is_empty() => format!("{}\n{}", note.body, arg),
                _ => arg.to_string(),
            };
            edit_selected(controller, NoteUpdate::body(body), now, out)?;
        }
        "show" => match controller.draft() {
            Some(note) => {
                writeln!(out, "# {}  [{}]", note.display_title(), controller.save_status())?;
                writeln!(out, "{}", note.body)?;
            }
            None => writeln!(out, "No note open.")?,
        },
        "preview" => writeln!(out, "{}", controller.preview())?,
        "search" => {
            controller.set_query(arg);
            writeln!(out, "{} matching notes", controller.visible_notes().len())?;
        }
        "sort" => match arg.parse::<SortBy>() {
            Ok(sort_by) => controller.set_sort(sort_by),
            Err(e) => writeln!(out, "{}", e)?,
        },
        "rm" | "delete" => {
            let target = if arg.is_empty() {
                controller.selected_id().map(str::to_string)
            } else {
                match resolve_note(controller.notes(), arg) {
                    Ok(note) => Some(note.id),
                    Err(e) => {
                        writeln!(out, "{}", e)?;
                        None
                    }
                }
            };
            match target {
                Some(id) if controller.delete(&id) => {
                    writeln!(out, "Deleted ({})", short_id(&id))?
                }
                Some(_) => {}
                None if arg.is_empty() => writeln!(out, "No note open.")?,
                None => {}
            }
        }
        "save" => {
            if controller.flush() {
                writeln!(out, "(saved)")?;
            }
        }
        other => writeln!(out, "Unknown command '{}'. Type 'help'.", other)?,
    }

    Ok(Flow::Continue)
}

fn edit_selected<B: BlobStore, W: Write>(
    controller: &mut Controller<B>,
    update: NoteUpdate,
    now: Instant,
    out: &mut W,
) -> io::Result<()> {
    if controller.selected_id().is_none() {
        writeln!(out, "No note open. Use 'new' or 'open <id>'.")?;
        return Ok(());
    }
    controller.edit(update, now);
    Ok(())
}
