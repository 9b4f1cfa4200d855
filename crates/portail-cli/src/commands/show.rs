//! Show command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use portail_core::{DocumentRef, Record, Store};
use portail_file::FileStore;

use crate::output;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Document reference, e.g. events/4f1c2a9e
    pub reference: String,

    /// Print the record as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: ShowArgs, root: PathBuf) -> Result<()> {
    let doc = DocumentRef::new(&args.reference).context("Invalid document reference")?;
    let record = load(&FileStore::new(root), &doc).await?;

    if args.json {
        output::json(&record)?;
    } else {
        output::record(&record);
    }

    Ok(())
}

/// Fetch and decode the record behind `doc`.
pub(super) async fn load(store: &FileStore, doc: &DocumentRef) -> Result<Record> {
    let kind = super::kind_of(doc)?;

    let raw = store
        .get(doc)
        .await
        .with_context(|| format!("Failed to read {}", doc))?;

    Record::decode(kind, Some(doc.id().clone()), &raw)
        .with_context(|| format!("{} is not a valid {}", doc, kind))
}
