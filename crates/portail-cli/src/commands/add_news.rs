//! Add news command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use portail_core::{Document, News, Store};
use portail_file::FileStore;

use crate::output;

#[derive(Args, Debug)]
pub struct AddNewsArgs {
    /// Headline
    pub title: String,

    /// Post body
    #[arg(long)]
    pub body: Option<String>,
}

pub async fn run(args: AddNewsArgs, root: PathBuf) -> Result<()> {
    let news = News::new(args.title, args.body).context("Invalid news post")?;

    let store = FileStore::new(root);
    let doc = store
        .create(&News::KIND.collection(), &news.encode())
        .await
        .context("Failed to store news post")?;

    println!("{}", doc);
    output::success(&format!("Created news post: {}", doc));

    Ok(())
}
