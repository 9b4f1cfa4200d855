//! Delete command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use portail_core::{DocumentRef, Store};
use portail_file::FileStore;

use crate::output;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Document reference, e.g. events/4f1c2a9e
    pub reference: String,
}

pub async fn run(args: DeleteArgs, root: PathBuf) -> Result<()> {
    let doc = DocumentRef::new(&args.reference).context("Invalid document reference")?;

    FileStore::new(root)
        .delete(&doc)
        .await
        .context("Failed to delete document")?;

    output::success(&format!("Deleted: {}", doc));

    Ok(())
}
