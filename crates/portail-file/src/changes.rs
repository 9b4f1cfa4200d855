//! The change log shared by writers and listeners.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::trace;

use portail_core::DocumentRef;

/// One line of `changes.jsonl`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ChangeLogEvent {
    /// The affected document, as `collection/id`.
    pub doc: DocumentRef,
    /// RFC 3339 timestamp.
    pub time: String,
    pub op: ChangeOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ChangeOp {
    Create,
    Update,
    Delete,
}

/// Read the complete lines appended since `position` and advance it.
///
/// A trailing line without its newline is left for the next read. If the
/// log shrank (it was replaced), reading restarts from the top.
pub(crate) fn read_since(path: &Path, position: &mut u64) -> std::io::Result<Vec<ChangeLogEvent>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    if file.metadata()?.len() < *position {
        *position = 0;
    }
    file.seek(SeekFrom::Start(*position))?;

    let mut reader = BufReader::new(file);
    let mut events = Vec::new();
    let mut line = String::new();

    loop {
        line.clear();
        let read = reader.read_line(&mut line)?;
        if read == 0 || !line.ends_with('\n') {
            break;
        }
        *position += read as u64;

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<ChangeLogEvent>(trimmed) {
            Ok(event) => events.push(event),
            Err(e) => trace!(error = %e, "Skipping malformed change log line"),
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn line(doc: &str, op: &str) -> String {
        format!(
            "{{\"doc\":\"{}\",\"time\":\"2017-10-14T12:00:00Z\",\"op\":\"{}\"}}\n",
            doc, op
        )
    }

    #[test]
    fn reads_only_new_complete_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", line("news/a", "create")).unwrap();

        let mut position = 0;
        let events = read_since(&path, &mut position).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].op, ChangeOp::Create);

        // Partial line: not consumed yet.
        write!(file, "{{\"doc\":\"news/a\"").unwrap();
        assert!(read_since(&path, &mut position).unwrap().is_empty());

        write!(file, ",\"time\":\"2017-10-14T12:00:00Z\",\"op\":\"delete\"}}\n").unwrap();
        let events = read_since(&path, &mut position).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].op, ChangeOp::Delete);
    }

    #[test]
    fn missing_log_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut position = 0;
        assert!(read_since(&dir.path().join("nope.jsonl"), &mut position)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("changes.jsonl");
        std::fs::write(&path, format!("not json\n{}", line("events/x", "update"))).unwrap();

        let mut position = 0;
        let events = read_since(&path, &mut position).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].doc.to_string(), "events/x");
    }
}
