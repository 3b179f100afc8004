// src/entity/note.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{generate_id, parse_timestamp};

/// Title given to notes created without one.
pub const UNTITLED: &str = "Untitled";

/// A persisted note. Serializes to `{id, title, body, createdAt, updatedAt}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Note {
    /// Build a new note stamped at `now`. A blank title becomes "Untitled".
    pub fn new(title: String, body: String, now: String) -> Self {
        let title = if title.trim().is_empty() {
            UNTITLED.to_string()
        } else {
            title
        };
        Self {
            id: generate_id(),
            title,
            body,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }

    /// The note as a standalone markdown document.
    pub fn to_markdown(&self) -> String {
        format!("# {}\n\n{}", self.title, self.body)
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.created_at)
    }

    pub fn updated(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.updated_at)
    }
}
