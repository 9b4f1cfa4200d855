//! List command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use tracing::warn;

use portail_core::{Collection, EventFilter, Event, News, QueryDescriptor, Store};
use portail_file::FileStore;

use crate::cli::FeedKind;
use crate::output::{self, Render};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Feed to list
    pub kind: FeedKind,

    /// Event filter: upcoming (default) or past
    #[arg(long)]
    pub filter: Option<EventFilter>,

    /// Print one JSON object per line
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: ListArgs, root: PathBuf) -> Result<()> {
    let store = FileStore::new(root);

    match args.kind {
        FeedKind::Events => {
            let query = args.filter.unwrap_or_default().descriptor(Utc::now());
            print::<Event>(&store, &query, args.json, "events").await
        }
        FeedKind::News => {
            if args.filter.is_some() {
                output::warning("--filter only applies to events, ignoring it.");
            }
            let query = QueryDescriptor::all(Collection::news());
            print::<News>(&store, &query, args.json, "news").await
        }
    }
}

async fn print<D: Render>(
    store: &FileStore,
    query: &QueryDescriptor,
    json: bool,
    label: &str,
) -> Result<()> {
    let documents = store
        .list(query.collection())
        .await
        .context("Failed to list documents")?;

    let mut records = Vec::new();
    for entry in query.evaluate(documents) {
        match D::decode(Some(entry.origin.id().clone()), &entry.raw) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(origin = %entry.origin, error = %e, "Skipping undecodable entry");
                output::warning(&format!("Skipping {}: {}", entry.origin, e));
            }
        }
    }

    if records.is_empty() {
        output::placeholder(label);
        return Ok(());
    }

    for (index, record) in records.iter().enumerate() {
        if json {
            output::json(record)?;
        } else {
            record.render(index);
        }
    }

    Ok(())
}
