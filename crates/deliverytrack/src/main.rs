//! `dtrack` - CLI for deliverytrack
//!
//! Creates deliveries at intake and lets each station view a delivery and
//! replace its own section.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use deliverytrack::cli::{
    Cli, Command, ConfigCommand, CreateCommand, ListCommand, ShowCommand, StationsCommand,
    UpdateCommand,
};
use deliverytrack::record::LAST_UPDATED_KEY;
use deliverytrack::{
    init_logging, scan, Config, DeliveryRecord, DeliveryStore, SectionKind, SectionUpdate,
    Station,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity());

    let config_path = cli.config;
    match cli.command {
        Command::Create(cmd) => {
            let (config, store) = open_store(config_path)?;
            handle_create(&config, &store, &cmd)
        }
        Command::Show(cmd) => handle_show(&open_store(config_path)?.1, &cmd),
        Command::Update(cmd) => handle_update(&open_store(config_path)?.1, &cmd),
        Command::Stations(cmd) => {
            let (config, store) = open_store(config_path)?;
            handle_stations(&config, &store, &cmd)
        }
        Command::List(cmd) => handle_list(&open_store(config_path)?.1, &cmd),
        Command::Status(cmd) => handle_status(&open_store(config_path)?.1, cmd.json),
        Command::Config(cmd) => handle_config(config_path, cmd),
    }
}

fn open_store(config_path: Option<PathBuf>) -> Result<(Config, DeliveryStore)> {
    let config = Config::load_from(config_path)?;
    let store = DeliveryStore::open_with_config(&config)?;
    Ok((config, store))
}

/// Read a form body from a file, or from stdin when no file is given.
fn read_body(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("failed to read form from stdin")?;
            Ok(body)
        }
    }
}

fn handle_create(config: &Config, store: &DeliveryStore, cmd: &CreateCommand) -> Result<()> {
    let body = read_body(cmd.file.as_deref())?;
    let SectionUpdate::Intake(intake) = SectionUpdate::from_json_str(SectionKind::Intake, &body)?
    else {
        bail!("intake form did not produce an intake section");
    };

    let id = store.create(intake)?;
    let qr_payload = scan::qr_payload(&id);
    let link = scan::station_link(&config.links.base_url, &id, None);

    if cmd.json {
        let out = serde_json::json!({
            "id": id,
            "qrPayload": qr_payload,
            "link": link,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Created delivery {id}");
        println!("  QR payload: {qr_payload}");
        println!("  Stations:   {link}");
    }
    Ok(())
}

fn handle_show(store: &DeliveryStore, cmd: &ShowCommand) -> Result<()> {
    let target = scan::resolve(&cmd.scan)?;
    let record = store.get(&target.id)?;
    let section = match (cmd.section, target.section) {
        (None, None) => None,
        (requested, _) => Some(target.station_section(requested.map(SectionKind::from))?),
    };

    match (section, cmd.json) {
        (Some(kind), true) => {
            let value = record.section_json(kind)?.unwrap_or(serde_json::Value::Null);
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        (None, true) => println!("{}", serde_json::to_string_pretty(&record)?),
        (Some(kind), false) => {
            println!("Delivery {}", record.id);
            if kind != SectionKind::Intake {
                println!("Delivered: {}", record.intake_summary());
            }
            print_section(&record, kind)?;
        }
        (None, false) => print_record(&record)?,
    }
    Ok(())
}

fn handle_update(store: &DeliveryStore, cmd: &UpdateCommand) -> Result<()> {
    let target = scan::resolve(&cmd.scan)?;
    let kind = target.station_section(cmd.section.map(SectionKind::from))?;

    let body = read_body(cmd.file.as_deref())?;
    let update = SectionUpdate::from_json_str(kind, &body)?;
    let record = Station::new(store, kind).submit(&target.id, update)?;

    if cmd.json {
        let value = record.section_json(kind)?.unwrap_or(serde_json::Value::Null);
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{} details updated for {}", kind.title(), record.id);
    }
    Ok(())
}

fn handle_stations(config: &Config, store: &DeliveryStore, cmd: &StationsCommand) -> Result<()> {
    let target = scan::resolve(&cmd.scan)?;
    let record = store.get(&target.id)?;

    println!(
        "Delivery {}: {}",
        record.id,
        scan::station_link(&config.links.base_url, &record.id, None)
    );
    for (kind, link) in scan::station_links(&config.links.base_url, &record.id) {
        let marker = if record.has_section(kind) { "*" } else { " " };
        println!("  {marker} {:<14} {link}", kind.title());
    }
    Ok(())
}

fn handle_list(store: &DeliveryStore, cmd: &ListCommand) -> Result<()> {
    let records = store.recent(cmd.limit)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No deliveries recorded.");
        return Ok(());
    }

    for record in &records {
        let sections: Vec<&str> = record
            .populated_sections()
            .into_iter()
            .map(SectionKind::as_str)
            .collect();
        println!(
            "{}  {}  {:>10} {:<8} [{}]",
            record.id,
            record.created_at.format("%Y-%m-%d %H:%M"),
            record.intake.details.quantity,
            record.intake.details.material_type,
            sections.join(", ")
        );
    }
    Ok(())
}

fn handle_status(store: &DeliveryStore, json: bool) -> Result<()> {
    let stats = store.stats()?;

    if json {
        let status = serde_json::json!({
            "database_path": store.path(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("dtrack status");
        println!("-------------");
        println!("Database:      {}", store.path().display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!("Deliveries:    {}", stats.total_deliveries);
        for (kind, count) in &stats.sections_populated {
            println!("  {:<14} {count}", kind.title());
        }
        if let (Some(oldest), Some(newest)) = (stats.oldest_delivery, stats.newest_delivery) {
            println!("Oldest:        {}", oldest.format("%Y-%m-%d %H:%M:%S"));
            println!("Newest:        {}", newest.format("%Y-%m-%d %H:%M:%S"));
        }
    }
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:   {}", config.database_path().display());
                println!("  Busy timeout:    {} ms", config.storage.busy_timeout_ms);
                println!();
                println!("[Identifier]");
                println!("  Prefix:          {}", config.identifier.prefix);
                println!("  Random bound:    {}", config.identifier.random_bound);
                println!("  Max attempts:    {}", config.identifier.max_attempts);
                println!();
                println!("[Links]");
                println!("  Base URL:        {}", config.links.base_url);
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path)).context("configuration is invalid")?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}

fn print_record(record: &DeliveryRecord) -> Result<()> {
    println!("Delivery {}", record.id);
    println!("Created:  {}", record.created_at.format("%Y-%m-%d %H:%M:%S"));
    for kind in SectionKind::ALL {
        print_section(record, kind)?;
    }
    Ok(())
}

fn print_section(record: &DeliveryRecord, kind: SectionKind) -> Result<()> {
    println!();
    let Some(serde_json::Value::Object(fields)) = record.section_json(kind)? else {
        println!("[{}] not yet recorded", kind.title());
        return Ok(());
    };

    println!("[{}]", kind.title());
    for (name, value) in &fields {
        if name == LAST_UPDATED_KEY {
            continue;
        }
        match value {
            serde_json::Value::String(text) => println!("  {name:<22} {text}"),
            other => println!("  {name:<22} {other}"),
        }
    }
    if let Some(stamp) = record.last_updated(kind) {
        println!("  {:<22} {}", LAST_UPDATED_KEY, stamp.format("%Y-%m-%d %H:%M:%S"));
    }
    Ok(())
}
