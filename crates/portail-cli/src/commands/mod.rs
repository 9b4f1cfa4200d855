//! Subcommand implementations.

mod add_event;
mod add_news;
mod delete;
mod list;
mod show;
mod update;
mod watch;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;

use portail_core::{DocumentRef, RecordKind};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Publish a new event
    AddEvent(add_event::AddEventArgs),

    /// Publish a news post
    AddNews(add_news::AddNewsArgs),

    /// Print the current contents of a feed
    List(list::ListArgs),

    /// Follow a feed live until interrupted
    Watch(watch::WatchArgs),

    /// Show one document by reference (collection/id)
    Show(show::ShowArgs),

    /// Change fields of a stored event or news post
    Update(update::UpdateArgs),

    /// Delete a document by reference (collection/id)
    Delete(delete::DeleteArgs),
}

pub async fn handle(cmd: Command, root: PathBuf) -> Result<()> {
    match cmd {
        Command::AddEvent(args) => add_event::run(args, root).await,
        Command::AddNews(args) => add_news::run(args, root).await,
        Command::List(args) => list::run(args, root).await,
        Command::Watch(args) => watch::run(args, root).await,
        Command::Show(args) => show::run(args, root).await,
        Command::Update(args) => update::run(args, root).await,
        Command::Delete(args) => delete::run(args, root).await,
    }
}

/// The record kind stored under `doc`'s collection.
fn kind_of(doc: &DocumentRef) -> Result<RecordKind> {
    RecordKind::from_collection(doc.collection())
        .with_context(|| format!("{} is not an events or news collection", doc.collection()))
}
