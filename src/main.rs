use clap::Parser;
use ocean_notes::cli::{
    handle_delete, handle_export, handle_get, handle_list, handle_new, handle_render,
    handle_search, handle_shell, handle_stats, handle_update, Cli, Commands,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("OCEAN_NOTES_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    // Logs go to stderr so stdout stays clean for --json output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let global = &cli.global;

    let result = match cli.command {
        Commands::New {
            title,
            body,
            stdin,
            json,
        } => handle_new(global, title, body, stdin, json),
        Commands::List { sort, query, json } => handle_list(global, sort, query, json),
        Commands::Get { id, json } => handle_get(global, id, json),
        Commands::Update {
            id,
            title,
            body,
            stdin,
            json,
        } => handle_update(global, id, title, body, stdin, json),
        Commands::Delete { id, force } => handle_delete(global, id, force),
        Commands::Search { query, json } => handle_search(global, query, json),
        Commands::Render { id, stdin } => handle_render(global, id, stdin),
        Commands::Export { dir } => handle_export(global, &dir),
        Commands::Stats { json } => handle_stats(global, json),
        Commands::Shell => handle_shell(global),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
