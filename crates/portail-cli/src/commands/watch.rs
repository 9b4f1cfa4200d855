//! Watch command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::Args;
use colored::Colorize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use portail_core::{Collection, Event, EventFilter, News, QueryDescriptor};
use portail_file::FileStore;
use portail_live::{DecodePolicy, Diagnostic, Feed, FeedConfig, FeedEvent, RenderState};

use crate::cli::FeedKind;
use crate::output::{self, Render};

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Feed to follow
    pub kind: FeedKind,

    /// Event filter: upcoming (default) or past
    #[arg(long)]
    pub filter: Option<EventFilter>,

    /// Drop entries that fail to decode and show the rest (default)
    #[arg(long, conflicts_with = "strict")]
    pub skip_invalid: bool,

    /// Ignore any snapshot containing an entry that fails to decode
    #[arg(long)]
    pub strict: bool,
}

impl WatchArgs {
    /// Skip unless `--strict` was asked for. The two flags conflict, so at
    /// most one is set.
    fn decode_policy(&self) -> DecodePolicy {
        match (self.skip_invalid, self.strict) {
            (false, true) => DecodePolicy::Reject,
            (true, _) | (false, false) => DecodePolicy::Skip,
        }
    }
}

pub async fn run(args: WatchArgs, root: PathBuf) -> Result<()> {
    let config = FeedConfig {
        decode_policy: args.decode_policy(),
        ..FeedConfig::default()
    };
    let store = Arc::new(FileStore::new(root));

    match args.kind {
        FeedKind::Events => {
            let query = args.filter.unwrap_or_default().descriptor(Utc::now());
            follow::<Event>(store, config, query, "events").await
        }
        FeedKind::News => {
            if args.filter.is_some() {
                output::warning("--filter only applies to events, ignoring it.");
            }
            let query = QueryDescriptor::all(Collection::news());
            follow::<News>(store, config, query, "news").await
        }
    }
}

async fn follow<D: Render>(
    store: Arc<FileStore>,
    config: FeedConfig,
    query: QueryDescriptor,
    label: &str,
) -> Result<()> {
    let feed: Feed<FileStore, D> = Feed::new(store, config);
    let mut events = feed.subscribe();

    info!(%query, "Watching");
    feed.request_bind(query)
        .context("Failed to start listening")?;

    eprintln!("{}", "Press Ctrl+C to stop.".dimmed());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        tokio::select! {
            _ = &mut ctrl_c => break Ok(()),
            event = events.recv() => match event {
                Ok(FeedEvent::Rendered(state)) => render(&feed, state, label),
                Ok(FeedEvent::Removed { .. }) => {}
                Ok(FeedEvent::Diagnostic(diagnostic)) => report(&diagnostic),
                Ok(FeedEvent::Unbound) => {
                    break Err(anyhow!("Listener stopped, no further updates"));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Fell behind the feed");
                }
                Err(RecvError::Closed) => break Ok(()),
            },
        }
    };

    feed.request_stop();
    result
}

fn render<D: Render>(feed: &Feed<FileStore, D>, state: RenderState, label: &str) {
    println!(
        "{}",
        format!("revision {} ({} {})", state.revision, state.len, label).cyan()
    );

    if state.is_empty {
        output::placeholder(label);
        return;
    }

    for (index, entry) in feed.current_projection().iter().enumerate() {
        entry.record.render(index);
    }
}

fn report(diagnostic: &Diagnostic) {
    match diagnostic {
        Diagnostic::Decode { origin, error } => {
            output::warning(&format!("Undecodable {}: {}", origin, error));
        }
        Diagnostic::Subscription(err) => output::error(&err.to_string()),
        Diagnostic::Store { origin, message } => {
            output::error(&format!("{}: {}", origin, message));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::Cli;
    use crate::commands::Command;

    fn parse(args: &[&str]) -> Result<WatchArgs, clap::Error> {
        let argv = ["portail", "watch"].into_iter().chain(args.iter().copied());
        let cli = Cli::try_parse_from(argv)?;
        match cli.command {
            Command::Watch(args) => Ok(args),
            other => panic!("expected watch, got {:?}", other),
        }
    }

    #[test]
    fn decode_policy_follows_flags() {
        assert_eq!(parse(&["news"]).unwrap().decode_policy(), DecodePolicy::Skip);
        assert_eq!(
            parse(&["news", "--skip-invalid"]).unwrap().decode_policy(),
            DecodePolicy::Skip
        );
        assert_eq!(
            parse(&["events", "--strict"]).unwrap().decode_policy(),
            DecodePolicy::Reject
        );
    }

    #[test]
    fn skip_and_strict_conflict() {
        assert!(parse(&["news", "--skip-invalid", "--strict"]).is_err());
    }
}
