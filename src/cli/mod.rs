mod commands;
mod handlers;
mod shell;

pub use commands::{Cli, Commands, GlobalArgs};
pub use handlers::{
    handle_delete, handle_export, handle_get, handle_list, handle_new, handle_render,
    handle_search, handle_shell, handle_stats, handle_update, resolve_note,
};
pub use shell::{execute, Flow};
