//! Filesystem storage for bulletin documents.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use fs2::FileExt;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use portail_core::error::{Error, StoreError};
use portail_core::{
    Collection, DocumentId, DocumentRef, QueryDescriptor, RawEntry, Result, Snapshot, Store,
};

use crate::changes::{ChangeLogEvent, ChangeOp};
use crate::listener::FileListener;

fn map_io(err: std::io::Error) -> Error {
    Error::Store(StoreError::Io {
        message: format!("IO error: {}", err),
    })
}

fn map_json(err: serde_json::Error) -> Error {
    Error::Store(StoreError::Serialization {
        message: err.to_string(),
    })
}

/// A document store kept in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at the given directory. Nothing is written
    /// until the first operation.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, collection: &Collection) -> PathBuf {
        self.root.join("collections").join(collection.as_str())
    }

    fn document_path(&self, doc: &DocumentRef) -> PathBuf {
        self.collection_dir(doc.collection())
            .join(format!("{}.json", doc.id()))
    }

    pub(crate) fn changes_path(&self) -> PathBuf {
        self.root.join("changes.jsonl")
    }

    fn changes_lock_path(&self) -> PathBuf {
        self.root.join("changes.lock")
    }

    fn generate_id(&self) -> Result<DocumentId> {
        DocumentId::new(Uuid::new_v4().simple().to_string())
    }

    /// Run `f` while holding the exclusive writer lock.
    ///
    /// Every mutation checks, writes and logs inside the lock, so the
    /// logged op always matches what was on disk when it ran.
    fn locked<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        fs::create_dir_all(&self.root).map_err(map_io)?;

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.changes_lock_path())
            .map_err(map_io)?;

        lock_file.lock_exclusive().map_err(map_io)?;
        let result = f();
        lock_file.unlock().map_err(map_io)?;

        result
    }

    /// Append an event to the change log. Callers hold the writer lock.
    fn append_change(&self, doc: &DocumentRef, op: ChangeOp) -> Result<()> {
        let event = ChangeLogEvent {
            doc: doc.clone(),
            time: Utc::now().to_rfc3339(),
            op,
        };
        let line = serde_json::to_string(&event).map_err(map_json)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.changes_path())
            .map_err(map_io)?;

        writeln!(file, "{}", line).map_err(map_io)?;
        file.sync_data().map_err(map_io)?;

        Ok(())
    }

    /// Write a document through a temporary file so readers never see a
    /// partial payload.
    fn write_document(&self, doc: &DocumentRef, entry: &RawEntry) -> Result<()> {
        let path = self.document_path(doc);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(map_io)?;
        }

        let content = serde_json::to_string_pretty(entry).map_err(map_json)?;
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content).map_err(map_io)?;
        fs::rename(&temp_path, &path).map_err(map_io)?;

        Ok(())
    }

    fn read_document(&self, doc: &DocumentRef) -> Result<RawEntry> {
        let path = self.document_path(doc);

        if !path.exists() {
            return Err(StoreError::NotFound {
                path: doc.to_string(),
            }
            .into());
        }

        let content = fs::read_to_string(&path).map_err(map_io)?;
        serde_json::from_str(&content).map_err(map_json)
    }

    pub(crate) fn list_documents(
        &self,
        collection: &Collection,
    ) -> Result<Vec<(DocumentRef, RawEntry)>> {
        let dir = self.collection_dir(collection);

        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries: Vec<_> = fs::read_dir(&dir)
            .map_err(map_io)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .collect();

        entries.sort_by_key(|e| e.file_name());

        let mut documents = Vec::with_capacity(entries.len());
        for entry in entries {
            let path = entry.path();
            let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| DocumentId::new(s).ok())
            else {
                continue;
            };

            let doc = DocumentRef::from_parts(collection.clone(), id);
            match self.read_document(&doc) {
                Ok(raw) => documents.push((doc, raw)),
                // Removed between listing and reading.
                Err(Error::Store(StoreError::NotFound { .. })) => {}
                Err(e) => warn!(%doc, error = %e, "Skipping unreadable document"),
            }
        }

        Ok(documents)
    }

    /// The current result set of `query`.
    pub(crate) fn snapshot(&self, query: &QueryDescriptor) -> Result<Snapshot> {
        let documents = self.list_documents(query.collection())?;
        Ok(Snapshot::new(query.evaluate(documents)))
    }

    /// Create or replace a document under a caller-chosen id.
    #[instrument(skip(self, entry), fields(%doc))]
    pub fn put(&self, doc: &DocumentRef, entry: &RawEntry) -> Result<()> {
        let op = self.locked(|| {
            let op = if self.document_path(doc).exists() {
                ChangeOp::Update
            } else {
                ChangeOp::Create
            };

            self.write_document(doc, entry)?;
            self.append_change(doc, op)?;
            Ok(op)
        })?;

        debug!(?op, "Stored document");
        Ok(())
    }
}

#[async_trait]
impl Store for FileStore {
    type Listener = FileListener;

    fn run_query(&self, query: &QueryDescriptor) -> Result<Self::Listener> {
        FileListener::start(self.clone(), query.clone())
    }

    #[instrument(skip(self, entry))]
    async fn create(&self, collection: &Collection, entry: &RawEntry) -> Result<DocumentRef> {
        let doc = DocumentRef::from_parts(collection.clone(), self.generate_id()?);

        self.locked(|| {
            self.write_document(&doc, entry)?;
            self.append_change(&doc, ChangeOp::Create)
        })?;

        debug!(%doc, "Created document");
        Ok(doc)
    }

    #[instrument(skip(self), fields(%doc))]
    async fn get(&self, doc: &DocumentRef) -> Result<RawEntry> {
        self.read_document(doc)
    }

    #[instrument(skip(self))]
    async fn list(&self, collection: &Collection) -> Result<Vec<(DocumentRef, RawEntry)>> {
        self.list_documents(collection)
    }

    #[instrument(skip(self, entry), fields(%doc))]
    async fn update(&self, doc: &DocumentRef, entry: &RawEntry) -> Result<()> {
        self.locked(|| {
            if !self.document_path(doc).exists() {
                return Err(StoreError::NotFound {
                    path: doc.to_string(),
                }
                .into());
            }

            self.write_document(doc, entry)?;
            self.append_change(doc, ChangeOp::Update)
        })?;

        debug!("Updated document");
        Ok(())
    }

    #[instrument(skip(self), fields(%doc))]
    async fn delete(&self, doc: &DocumentRef) -> Result<()> {
        let path = self.document_path(doc);
        if !path.exists() {
            return Ok(());
        }

        let removed = self.locked(|| match fs::remove_file(&path) {
            Ok(()) => {
                self.append_change(doc, ChangeOp::Delete)?;
                Ok(true)
            }
            // Lost a race with another deleter.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(map_io(e)),
        })?;

        if removed {
            debug!("Deleted document");
        }
        Ok(())
    }
}
