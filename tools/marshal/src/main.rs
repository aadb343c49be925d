//! Marshal - device descriptor management tool for AmpFlow
//!
//! Edits the persisted device descriptors the site service merges in at
//! bootstrap. Works directly against the SQLite store, so the service does
//! not need to be running; a restart picks the changes up.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use sitesrv::device::{name_for_id, Attributes, DeviceClass, DeviceStore};

#[derive(Parser)]
#[command(name = "marshal", about = "Manage persisted AmpFlow device descriptors")]
struct Cli {
    /// SQLite database path
    #[arg(long, default_value = "data/ampflow.db", env = "AMPFLOW_DATABASE")]
    database: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List persisted descriptors of one class
    List {
        /// Device class: meter, charger or vehicle
        class: DeviceClass,
    },
    /// Show one descriptor with its attributes
    Show {
        /// Descriptor id
        id: i64,
    },
    /// Add a descriptor from key=value attributes
    Add {
        class: DeviceClass,
        /// Driver type tag, e.g. demo
        device_type: String,
        /// Attributes as key=value pairs
        #[arg(value_parser = parse_key_val)]
        attributes: Vec<(String, String)>,
    },
    /// Replace the full attribute set of a descriptor
    Update {
        class: DeviceClass,
        id: i64,
        /// Attributes as key=value pairs
        #[arg(value_parser = parse_key_val)]
        attributes: Vec<(String, String)>,
    },
    /// Delete a descriptor
    Delete {
        class: DeviceClass,
        id: i64,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("invalid key=value attribute: {s}")),
    }
}

fn collect_attributes(pairs: Vec<(String, String)>) -> Attributes {
    pairs.into_iter().collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    ampflow_common::logging::init("warn")?;

    let client = ampflow_common::SqliteClient::new(&cli.database).await?;
    let store = DeviceStore::new(client.pool().clone());
    store.init_schema().await?;

    match cli.command {
        Command::List { class } => {
            let rows = store.list_by_class(class).await?;
            if rows.is_empty() {
                println!("{} no {} configurations", "INFO".bright_cyan(), class);
                return Ok(());
            }
            println!("{}", format!("Persisted {class} configurations").bright_cyan());
            for row in rows {
                println!(
                    "  {} type={} attributes={}",
                    name_for_id(row.id).bright_yellow(),
                    row.device_type,
                    row.attributes.len()
                );
            }
        },
        Command::Show { id } => {
            let row = store.get(id).await?;
            println!(
                "{} class={} type={}",
                name_for_id(row.id).bright_yellow(),
                row.class,
                row.device_type
            );
            let mut keys: Vec<_> = row.attributes.keys().collect();
            keys.sort();
            for key in keys {
                println!("  {} = {}", key, row.attributes[key]);
            }
        },
        Command::Add {
            class,
            device_type,
            attributes,
        } => {
            let attributes = collect_attributes(attributes);
            if attributes.is_empty() {
                eprintln!(
                    "{} a descriptor needs at least one attribute",
                    "ERROR".red()
                );
                std::process::exit(1);
            }
            let id = store.add(class, &device_type, &attributes).await?;
            println!(
                "{} added {} as {}",
                "OK".green(),
                class,
                name_for_id(id).bright_yellow()
            );
        },
        Command::Update {
            class,
            id,
            attributes,
        } => {
            let attributes = collect_attributes(attributes);
            if attributes.is_empty() {
                eprintln!(
                    "{} refusing to orphan {}: supply the full attribute set",
                    "ERROR".red(),
                    name_for_id(id)
                );
                std::process::exit(1);
            }
            store.update(class, id, &attributes).await?;
            println!("{} updated {}", "OK".green(), name_for_id(id).bright_yellow());
        },
        Command::Delete { class, id } => {
            store.delete(class, id).await?;
            println!("{} deleted {}", "OK".green(), name_for_id(id).bright_yellow());
        },
    }

    Ok(())
}
