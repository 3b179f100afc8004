pub mod cli;
pub mod config;
pub mod controller;
pub mod entity;
pub mod error;
pub mod export;
pub mod markdown;
pub mod search;
pub mod storage;
pub mod warnings;

pub use controller::Controller;
pub use entity::Note;
pub use error::{NotesError, Result};
pub use markdown::render_markdown;
pub use storage::{BlobStore, NoteStore};
