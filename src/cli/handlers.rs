use std::env;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use super::commands::GlobalArgs;
use super::shell;
use crate::config::{find_data_dir, BackendConfig, StorageKind, StoreConfig};
use crate::controller::Controller;
use crate::entity::{short_id, Note};
use crate::error::{NotesError, Result};
use crate::export::export_markdown;
use crate::markdown::render_markdown;
use crate::search::{search_notes, sort_notes, SortBy};
use crate::storage::{BlobStore, NoteDraft, NoteStore, NoteUpdate};
use crate::warnings::{check_thresholds, format_warning};

type CliStore = NoteStore<Box<dyn BlobStore>>;

fn store_config(global: &GlobalArgs) -> Result<StoreConfig> {
    let storage = global
        .storage
        .parse::<StorageKind>()
        .map_err(NotesError::InvalidArgument)?;

    let data_dir = match global.data_dir {
        Some(ref dir) => dir.clone(),
        None => {
            let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            find_data_dir(&cwd)
        }
    };

    Ok(StoreConfig { data_dir, storage })
}

fn backend_config(global: &GlobalArgs) -> BackendConfig {
    BackendConfig::new(
        global.api_base.clone(),
        global.backend_url.clone(),
        global.ws_url.clone(),
    )
}

/// Open the configured store, keeping the resolved configuration for display.
fn open_configured_store(global: &GlobalArgs) -> Result<(StoreConfig, CliStore)> {
    let config = store_config(global)?;
    let store = NoteStore::new(config.open()?);
    Ok((config, store))
}

fn open_store(global: &GlobalArgs) -> Result<CliStore> {
    open_configured_store(global).map(|(_, store)| store)
}

fn read_stdin() -> Result<String> {
    let mut content = String::new();
    io::stdin().read_to_string(&mut content)?;
    Ok(content)
}

/// Resolve a user-supplied id: exact match first, then a unique prefix of the
/// full id or of its short form.
pub fn resolve_note(notes: &[Note], input: &str) -> Result<Note> {
    if input.is_empty() {
        return Err(NotesError::NoteNotFound(input.to_string()));
    }
    if let Some(note) = notes.iter().find(|n| n.id == input) {
        return Ok(note.clone());
    }

    let matches: Vec<&Note> = notes
        .iter()
        .filter(|n| n.id.starts_with(input) || short_id(&n.id).starts_with(input))
        .collect();

    match matches.as_slice() {
        [] => Err(NotesError::NoteNotFound(input.to_string())),
        [note] => Ok((*note).clone()),
        many => Err(NotesError::AmbiguousId {
            id: input.to_string(),
            matches: many.len(),
        }),
    }
}

fn format_time(ts: &str, parsed: Option<chrono::DateTime<chrono::Utc>>) -> String {
    parsed
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

fn print_note_line(note: &Note) {
    println!(
        "  ({}) {}  [{}]",
        short_id(&note.id),
        note.display_title(),
        format_time(&note.updated_at, note.updated())
    );
}

fn print_warnings(store: &CliStore) -> Result<()> {
    for warning in check_thresholds(&store.stats()?) {
        eprintln!("{}", format_warning(&warning));
    }
    Ok(())
}

pub fn handle_new(
    global: &GlobalArgs,
    title: Option<String>,
    body: Option<String>,
    stdin: bool,
    json: bool,
) -> Result<()> {
    let mut store = open_store(global)?;

    let body = if stdin { Some(read_stdin()?) } else { body };
    let note = store.create(NoteDraft { title, body })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!("Created note ({}) - {}", short_id(&note.id), note.title);
    }

    print_warnings(&store)
}

pub fn handle_list(
    global: &GlobalArgs,
    sort: String,
    query: Option<String>,
    json: bool,
) -> Result<()> {
    let store = open_store(global)?;
    let sort_by = sort.parse::<SortBy>().map_err(NotesError::InvalidArgument)?;

    let mut notes = search_notes(query.as_deref().unwrap_or(""), store.list()?);
    sort_notes(&mut notes, sort_by);

    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
    } else if notes.is_empty() {
        println!("No notes found.");
    } else {
        println!("Notes:\n");
        for note in &notes {
            print_note_line(note);
        }
    }

    Ok(())
}

pub fn handle_get(global: &GlobalArgs, id: String, json: bool) -> Result<()> {
    let store = open_store(global)?;
    let note = resolve_note(&store.list()?, &id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!("Note ({}) {}", short_id(&note.id), note.id);
        println!("Title: {}", note.display_title());
        println!("Created: {}", format_time(&note.created_at, note.created()));
        println!("Updated: {}", format_time(&note.updated_at, note.updated()));
        if !note.body.is_empty() {
            println!("\n{}", note.body);
        }
    }

    Ok(())
}

pub fn handle_update(
    global: &GlobalArgs,
    id: String,
    title: Option<String>,
    body: Option<String>,
    stdin: bool,
    json: bool,
) -> Result<()> {
    let mut store = open_store(global)?;
    let note = resolve_note(&store.list()?, &id)?;

    let body = if stdin { Some(read_stdin()?) } else { body };
    let update = NoteUpdate { title, body };
    if update.is_empty() {
        return Err(NotesError::InvalidArgument(
            "nothing to update, pass --title, --body or --stdin".to_string(),
        ));
    }

    let updated = store
        .update(&note.id, update)?
        .ok_or_else(|| NotesError::NoteNotFound(id.clone()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        println!("Updated note ({}) - {}", short_id(&updated.id), updated.display_title());
    }

    print_warnings(&store)
}

pub fn handle_delete(global: &GlobalArgs, id: String, force: bool) -> Result<()> {
    let mut store = open_store(global)?;
    let note = resolve_note(&store.list()?, &id)?;

    // Confirm deletion unless --force is used
    if !force {
        eprintln!(
            "Delete note ({}) - {}? [y/N] ",
            short_id(&note.id),
            note.display_title()
        );

        if atty::is(atty::Stream::Stdin) {
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Cancelled.");
                return Ok(());
            }
        } else {
            return Err(NotesError::InvalidArgument(
                "use --force to delete in non-interactive mode".to_string(),
            ));
        }
    }

    if !store.delete(&note.id)? {
        return Err(NotesError::NoteNotFound(id));
    }

    println!("Deleted note ({}) - {}", short_id(&note.id), note.display_title());
    Ok(())
}

pub fn handle_search(global: &GlobalArgs, query: String, json: bool) -> Result<()> {
    let store = open_store(global)?;
    let results = search_notes(&query, store.list()?);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("No results found for '{}'.", query);
    } else {
        println!("Search results for '{}':\n", query);
        for note in &results {
            print_note_line(note);
        }
    }

    Ok(())
}

pub fn handle_render(global: &GlobalArgs, id: Option<String>, stdin: bool) -> Result<()> {
    let markdown = if stdin {
        read_stdin()?
    } else {
        let id = id.ok_or_else(|| NotesError::InvalidArgument("missing note id".to_string()))?;
        let store = open_store(global)?;
        resolve_note(&store.list()?, &id)?.body
    };

    println!("{}", render_markdown(&markdown));
    Ok(())
}

pub fn handle_export(global: &GlobalArgs, dir: &Path) -> Result<()> {
    let store = open_store(global)?;
    let notes = store.list()?;
    let written = export_markdown(&notes, dir)?;

    println!("Exported {} notes to {}", written.len(), dir.display());
    Ok(())
}

pub fn handle_stats(global: &GlobalArgs, json: bool) -> Result<()> {
    let (config, store) = open_configured_store(global)?;
    let stats = store.stats()?;
    let meta = store.meta()?;

    if json {
        let value = serde_json::json!({
            "dataDir": config.data_dir,
            "storage": config.storage.to_string(),
            "notes": stats.note_count,
            "bytes": stats.blob_bytes,
            "updatedAt": meta.as_ref().map(|m| m.updated_at.clone()),
            "version": meta.as_ref().map(|m| m.version),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("Data dir: {}", config.data_dir.display());
        println!("Storage: {}", config.storage);
        println!("Notes: {}", stats.note_count);
        println!("Size: {} bytes", stats.blob_bytes);
        if let Some(meta) = meta {
            println!("Last write: {} (schema v{})", meta.updated_at, meta.version);
        }
    }

    print_warnings(&store)
}

pub fn handle_shell(global: &GlobalArgs) -> Result<()> {
    let store = open_store(global)?;
    let controller = Controller::new(store, backend_config(global));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(shell::run(controller))
}
