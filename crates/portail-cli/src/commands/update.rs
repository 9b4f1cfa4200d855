//! Update command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::Args;

use portail_core::{Document, DocumentRef, Event, News, Record, Store};
use portail_file::FileStore;

use crate::output;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Document reference, e.g. events/4f1c2a9e
    pub reference: String,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New description
    #[arg(long)]
    pub body: Option<String>,

    /// New start time (events only, RFC 3339)
    #[arg(long)]
    pub start: Option<DateTime<Utc>>,

    /// New end time (events only, RFC 3339)
    #[arg(long)]
    pub end: Option<DateTime<Utc>>,
}

pub async fn run(args: UpdateArgs, root: PathBuf) -> Result<()> {
    let doc = DocumentRef::new(&args.reference).context("Invalid document reference")?;
    let store = FileStore::new(root);

    let current = super::show::load(&store, &doc).await?;
    let updated = edit(current, args)?;

    store
        .update(&doc, &updated.encode())
        .await
        .context("Failed to update document")?;

    println!("{}", doc);
    output::success(&format!("Updated: {}", doc));

    Ok(())
}

/// Apply the given fields over `current`, validating like a new record.
fn edit(current: Record, args: UpdateArgs) -> Result<Record> {
    let updated = match current {
        Record::Event(event) => {
            let start = args.start.unwrap_or(event.start_date());
            let end = args.end.unwrap_or(event.end_date());
            if end < start {
                output::warning("The event ends before it starts.");
            }

            Event::new(
                args.title.unwrap_or_else(|| event.title().to_string()),
                Some(args.body.unwrap_or_else(|| event.body().to_string())),
                start,
                end,
            )
            .context("Invalid event")?
            .into()
        }
        Record::News(news) => {
            if args.start.is_some() || args.end.is_some() {
                bail!("--start and --end only apply to events");
            }

            News::new(
                args.title.unwrap_or_else(|| news.title().to_string()),
                Some(args.body.unwrap_or_else(|| news.body().to_string())),
            )
            .context("Invalid news post")?
            .into()
        }
    };

    Ok(updated)
}
