//! jpage Test Utilities
//!
//! This crate provides shared fixtures for the jpage workspace: document
//! builders, an in-memory page store and scripted failing streams.

use jpage_format::PageStream;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Generate documents in the envelope shapes the iterator is pointed at
pub struct Documents;

impl Documents {
    /// `[{"id": start}, ..., {"id": start + count - 1}]` elements
    pub fn id_records(start: usize, count: usize) -> Vec<Value> {
        (start..start + count).map(|id| json!({ "id": id })).collect()
    }

    /// The array is the whole document
    pub fn root_array(items: Vec<Value>) -> Value {
        Value::Array(items)
    }

    /// `{"error": null, "items": [...]}`
    pub fn api_response(items: Vec<Value>) -> Value {
        json!({ "error": null, "items": items })
    }

    /// `{"error": null, "result": {"date": ..., "items": [...]}}`
    pub fn nested_response(items: Vec<Value>) -> Value {
        json!({
            "error": null,
            "result": {
                "date": "2021-11-28",
                "items": items
            }
        })
    }

    /// Nest `items` under the member names in `path`
    ///
    /// `wrap(&["a", "b"], items)` yields `{"a": {"b": [...]}}`.
    pub fn wrap(path: &[&str], items: Vec<Value>) -> Value {
        path.iter().rev().fold(Value::Array(items), |inner, key| {
            let mut map = Map::new();
            map.insert((*key).to_string(), inner);
            Value::Object(map)
        })
    }
}

/// In-memory pages keyed by page id, counting every open
#[derive(Clone, Default)]
pub struct PageStore {
    pages: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    opened: Arc<Mutex<Vec<String>>>,
    calls: Arc<AtomicUsize>,
}

impl PageStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page whose body is the serialized `document`
    pub fn with_json(self, page: &str, document: &Value) -> Self {
        self.with_bytes(page, document.to_string().into_bytes())
    }

    /// Add a page with a raw body
    pub fn with_bytes(self, page: &str, body: impl Into<Vec<u8>>) -> Self {
        self.pages
            .lock()
            .expect("page store lock")
            .insert(page.to_string(), body.into());
        self
    }

    /// Open a page; unknown ids yield `None`
    pub fn open(&self, page: &str) -> Option<Box<dyn PageStream>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.opened
            .lock()
            .expect("page store lock")
            .push(page.to_string());
        self.pages
            .lock()
            .expect("page store lock")
            .get(page)
            .map(|body| Box::new(Cursor::new(body.clone())) as Box<dyn PageStream>)
    }

    /// Number of `open` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Page ids in the order they were opened
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("page store lock").clone()
    }
}

/// Stream whose reads and release fail on demand
#[derive(Debug, Default)]
pub struct MockStream {
    body: Cursor<Vec<u8>>,
    read_error: Option<io::ErrorKind>,
    release_error: Option<io::ErrorKind>,
    released: Arc<AtomicBool>,
}

impl MockStream {
    /// Stream yielding `body` and releasing cleanly
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: Cursor::new(body.into()),
            ..Self::default()
        }
    }

    /// Every read fails with `kind`
    pub fn failing_read(kind: io::ErrorKind) -> Self {
        Self {
            read_error: Some(kind),
            ..Self::default()
        }
    }

    /// Release fails with `kind`
    pub fn failing_release(mut self, kind: io::ErrorKind) -> Self {
        self.release_error = Some(kind);
        self
    }

    /// Flag set once `release` has been called
    pub fn released_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.read_error {
            Some(kind) => Err(io::Error::from(kind)),
            None => self.body.read(buf),
        }
    }
}

impl PageStream for MockStream {
    fn release(&mut self) -> io::Result<()> {
        self.released.store(true, Ordering::SeqCst);
        match self.release_error {
            Some(kind) => Err(io::Error::from(kind)),
            None => Ok(()),
        }
    }
}

/// Write each `(file name, document)` pair into `dir`
pub fn write_pages(dir: &Path, pages: &[(&str, Value)]) -> io::Result<Vec<PathBuf>> {
    pages
        .iter()
        .map(|(name, document)| {
            let path = dir.join(name);
            fs::write(&path, document.to_string())?;
            Ok(path)
        })
        .collect()
}
