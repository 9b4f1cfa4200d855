//! Add event command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;

use portail_core::{Document, Event, Store};
use portail_file::FileStore;

use crate::output;

#[derive(Args, Debug)]
pub struct AddEventArgs {
    /// Event title
    pub title: String,

    /// Start time (RFC 3339, e.g. 2017-11-04T18:00:00Z)
    #[arg(long)]
    pub start: DateTime<Utc>,

    /// End time (RFC 3339, defaults to the start time)
    #[arg(long)]
    pub end: Option<DateTime<Utc>>,

    /// Description
    #[arg(long)]
    pub body: Option<String>,
}

pub async fn run(args: AddEventArgs, root: PathBuf) -> Result<()> {
    let end = args.end.unwrap_or(args.start);
    if end < args.start {
        output::warning("The event ends before it starts.");
    }

    let event = Event::new(args.title, args.body, args.start, end).context("Invalid event")?;

    let store = FileStore::new(root);
    let doc = store
        .create(&Event::KIND.collection(), &event.encode())
        .await
        .context("Failed to store event")?;

    println!("{}", doc);
    output::success(&format!("Created event: {}", doc));

    Ok(())
}
