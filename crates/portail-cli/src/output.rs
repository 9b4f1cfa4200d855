//! Output formatting helpers.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use portail_core::{Document, Event, News, Record};

/// Print a success message.
pub fn success(msg: &str) {
    eprintln!("{} {}", "✓".green(), msg);
}

/// Print a warning.
pub fn warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a value as compact JSON.
pub fn json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    println!("{}", json);
    Ok(())
}

/// Human-readable printing for a record kind.
pub trait Render: Document + Serialize {
    /// The lines printed under the heading.
    fn details(&self);

    /// Print as row `index` of a list.
    fn render(&self, index: usize) {
        heading(Some(index), self);
        self.details();
    }
}

fn heading(index: Option<usize>, record: &impl Document) {
    let id = record
        .id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());

    match index {
        Some(index) => println!(
            "{} {} {}",
            format!("[{}]", index).dimmed(),
            record.title().bold(),
            id.dimmed()
        ),
        None => println!("{} {}", record.title().bold(), id.dimmed()),
    }
}

impl Render for Event {
    fn details(&self) {
        println!(
            "    {} -> {}",
            self.start_date().format("%Y-%m-%d %H:%M"),
            self.end_date().format("%Y-%m-%d %H:%M")
        );
        println!("    {}", self.body());
    }
}

impl Render for News {
    fn details(&self) {
        println!("    {}", self.body());
    }
}

/// Print a single record of either kind.
pub fn record(record: &Record) {
    match record {
        Record::Event(event) => {
            heading(None, event);
            event.details();
        }
        Record::News(news) => {
            heading(None, news);
            news.details();
        }
    }
}

/// The placeholder shown for an empty list.
pub fn placeholder(kind: &str) {
    eprintln!("{}", format!("No {} to show.", kind).dimmed());
}
