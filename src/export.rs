//! Export notes as standalone markdown files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::entity::{short_id, Note};
use crate::Result;

/// File stem for an exported note: the title's ASCII words, lowercased and
/// joined by `-`. Titles with no such words export as `untitled`.
pub fn slugify(title: &str) -> String {
    let slug = title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

/// Write each note to `<dir>/<slug>.md`, creating `dir` if needed.
///
/// Notes whose slugs collide get their short id appended. Returns the written paths
/// in the order of `notes`.
pub fn export_markdown(notes: &[Note], dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut used = HashSet::new();
    let mut written = Vec::with_capacity(notes.len());
    for note in notes {
        let mut name = slugify(note.display_title());
        if !used.insert(name.clone()) {
            name = format!("{}-{}", name, short_id(&note.id));
            used.insert(name.clone());
        }

        let path = dir.join(format!("{}.md", name));
        fs::write(&path, note.to_markdown())?;
        written.push(path);
    }
    Ok(written)
}
