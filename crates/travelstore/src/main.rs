//! `travelog` - CLI for travelstore
//!
//! This binary provides the command-line interface for adding, browsing and
//! editing travel journal entries kept in a local data directory.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;

use travelstore::cli::{Cli, Command, ConfigCommand, ListCommand, OutputFormat, SearchCommand};
use travelstore::{init_logging, Config, EntryStore, FileStore, TravelEntry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone())?;

    // Config commands never touch the data directory
    let command = match cli.command {
        Command::Config(config_cmd) => return handle_config(&config, config_cmd),
        other => other,
    };

    let store = open_store(&config).await?;

    match command {
        Command::Add(add_cmd) => insert(&store, &add_cmd.to_entry()).await,
        Command::Import { file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let value: serde_json::Value = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;
            let Some(entry) = TravelEntry::from_value(value) else {
                bail!("{} does not contain a valid travel entry", file.display());
            };
            insert(&store, &entry).await
        }
        Command::List(list_cmd) => handle_list(&store, &list_cmd).await,
        Command::Show { id, format } => match store.get_by_id(&id).await {
            Some(entry) => print_entries(&[entry], format),
            None => bail!("no entry with id {id}"),
        },
        Command::Update(update_cmd) => {
            let Some(existing) = store.get_by_id(&update_cmd.id).await else {
                bail!("no entry with id {}", update_cmd.id);
            };
            if !store.update(&update_cmd.apply_to(&existing)).await {
                bail!("failed to update entry {}", update_cmd.id);
            }
            println!("Updated {}", update_cmd.id);
            Ok(())
        }
        Command::Delete { id } => {
            if !store.delete(&id).await {
                bail!("failed to delete entry {id}");
            }
            println!("Deleted {id}");
            Ok(())
        }
        Command::Clear { yes } => {
            if !yes {
                println!("This will delete every entry. Use --yes to confirm.");
                return Ok(());
            }
            if !store.clear().await {
                bail!("failed to clear entries");
            }
            println!("Cleared all entries");
            Ok(())
        }
        Command::Count => {
            println!("{}", store.count().await);
            Ok(())
        }
        Command::Search(search_cmd) => handle_search(&store, &search_cmd).await,
        Command::Stats { json } => handle_stats(&store, &config, json).await,
        Command::Config(_) => Ok(()),
    }
}

async fn open_store(config: &Config) -> anyhow::Result<EntryStore> {
    let data_dir = config.data_dir();
    let backend = FileStore::open(&data_dir)
        .await
        .with_context(|| format!("failed to open data directory {}", data_dir.display()))?;
    Ok(EntryStore::with_options(
        Arc::new(backend),
        config.storage.entries_key.clone(),
        config.storage.consistency,
    ))
}

async fn insert(store: &EntryStore, entry: &TravelEntry) -> anyhow::Result<()> {
    let Some(stored) = store.insert(entry).await else {
        bail!("failed to store entry {}", entry.id);
    };
    if stored.id == entry.id {
        println!("Added {}", stored.id);
    } else {
        println!("Id {} was taken, stored as {}", entry.id, stored.id);
    }
    Ok(())
}

async fn handle_list(store: &EntryStore, cmd: &ListCommand) -> anyhow::Result<()> {
    let mut entries = match &cmd.tag {
        Some(tag) => store.with_tag(tag).await,
        None => store.read_all().await,
    };
    if let Some(limit) = cmd.limit {
        entries.truncate(limit);
    }
    print_entries(&entries, cmd.format)
}

async fn handle_search(store: &EntryStore, cmd: &SearchCommand) -> anyhow::Result<()> {
    let mut entries = store.search(&cmd.query).await;
    entries.truncate(cmd.limit);
    print_entries(&entries, cmd.format)
}

async fn handle_stats(store: &EntryStore, config: &Config, json: bool) -> anyhow::Result<()> {
    let diag = store.diagnostics().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&diag)?);
        return Ok(());
    }

    println!("travelog stats");
    println!("--------------");
    println!("Data dir:      {}", config.data_dir().display());
    println!("Key:           {}", diag.key);
    println!("Consistency:   {}", store.mode());
    println!("Present:       {}", diag.key_present);
    println!("Valid:         {}", diag.valid);
    println!("Entries:       {}", diag.entry_count);
    println!("Size (bytes):  {}", diag.serialized_bytes);
    if let Some(digest) = &diag.digest {
        println!("Digest:        {digest}");
    }
    if let Some(error) = &diag.error {
        println!("Error:         {error}");
    }
    Ok(())
}

fn print_entries(entries: &[TravelEntry], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
        OutputFormat::Plain => {
            if entries.is_empty() {
                println!("No entries.");
            }
            for entry in entries {
                let when = entry
                    .created_at_datetime()
                    .map_or_else(|| entry.created_at.to_string(), |dt| dt.to_rfc3339());
                println!("{}  {}", entry.id, when);
                if let Some(title) = &entry.title {
                    println!("  {title}");
                }
                println!(
                    "  {} ({:.5}, {:.5})",
                    entry.address, entry.latitude, entry.longitude
                );
                if let Some(tags) = entry.tags.as_deref().filter(|t| !t.is_empty()) {
                    println!("  tags: {}", tags.join(", "));
                }
                if let Some(notes) = &entry.notes {
                    println!("  {notes}");
                }
            }
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Data dir:       {}", config.data_dir().display());
                println!("  Entries key:    {}", config.storage.entries_key);
                println!("  Consistency:    {}", config.storage.consistency);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
