//! Document loading.
//!
//! All documents reachable through `$ref` are fetched up front into a
//! [`DocumentSet`], so resolution never performs I/O.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;

use serde_json::Value;

use crate::error::{DocumentLoadError, ParseError};
use crate::pointer::{self, parse_reference, SourcePointer};

/// Fetches the raw text of a document by URI.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, uri: &str) -> Result<String, DocumentLoadError>;
}

/// Loads documents from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl DocumentLoader for FsLoader {
    fn load(&self, uri: &str) -> Result<String, DocumentLoadError> {
        let path = uri.strip_prefix("file://").unwrap_or(uri);
        std::fs::read_to_string(Path::new(path))
            .map_err(|e| DocumentLoadError::new(uri, e.to_string()))
    }
}

/// Loads documents over HTTP(S) with a blocking client.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: reqwest::blocking::Client,
}

impl HttpLoader {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for HttpLoader {
    fn load(&self, uri: &str) -> Result<String, DocumentLoadError> {
        let response = self
            .client
            .get(uri)
            .send()
            .map_err(|e| DocumentLoadError::new(uri, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocumentLoadError::new(uri, format!("HTTP {}", status)));
        }

        response
            .text()
            .map_err(|e| DocumentLoadError::new(uri, e.to_string()))
    }
}

/// In-memory documents keyed by URI.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    documents: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, uri: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(uri, content);
        self
    }

    pub fn insert(&mut self, uri: impl Into<String>, content: impl Into<String>) {
        self.documents.insert(uri.into(), content.into());
    }
}

impl DocumentLoader for MemoryLoader {
    fn load(&self, uri: &str) -> Result<String, DocumentLoadError> {
        self.documents
            .get(uri)
            .cloned()
            .ok_or_else(|| DocumentLoadError::new(uri, "no such document"))
    }
}

/// Dispatches `http(s)://` URIs to [`HttpLoader`] and everything else to [`FsLoader`].
#[derive(Debug, Default, Clone)]
pub struct DefaultLoader {
    http: HttpLoader,
}

impl DocumentLoader for DefaultLoader {
    fn load(&self, uri: &str) -> Result<String, DocumentLoadError> {
        if pointer::is_remote(uri) {
            self.http.load(uri)
        } else {
            FsLoader.load(uri)
        }
    }
}

/// A decoded document.
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    pub uri: String,
    pub root: Value,
}

impl SchemaDocument {
    /// Decode YAML or JSON text.
    pub fn decode(uri: impl Into<String>, text: &str) -> Result<Self, ParseError> {
        let uri = uri.into();
        let root: Value = serde_yaml::from_str(text)
            .map_err(|e| ParseError::ParseError(format!("{}: {}", uri, e)))?;
        Ok(Self { uri, root })
    }
}

/// The root document plus every document it references, transitively.
#[derive(Debug, Clone)]
pub struct DocumentSet {
    root: String,
    documents: BTreeMap<String, SchemaDocument>,
}

impl DocumentSet {
    /// Load `root_uri` and, breadth-first, every external document it references.
    pub fn load(root_uri: &str, loader: &dyn DocumentLoader) -> Result<Self, ParseError> {
        let text = loader.load(root_uri)?;
        let root = SchemaDocument::decode(root_uri, &text)?;
        Self::load_with_root(root, loader)
    }

    /// Build a set from an already-decoded root, fetching its external references.
    pub fn load_with_root(
        root: SchemaDocument,
        loader: &dyn DocumentLoader,
    ) -> Result<Self, ParseError> {
        let root_uri = root.uri.clone();
        let mut documents = BTreeMap::new();
        let mut queue = VecDeque::new();
        queue.extend(external_documents(&root));
        documents.insert(root_uri.clone(), root);

        while let Some(uri) = queue.pop_front() {
            if documents.contains_key(&uri) {
                continue;
            }
            tracing::debug!(uri = %uri, "loading referenced document");
            let text = loader.load(&uri)?;
            let document = SchemaDocument::decode(uri.clone(), &text)?;
            queue.extend(external_documents(&document));
            documents.insert(uri, document);
        }

        Ok(Self {
            root: root_uri,
            documents,
        })
    }

    /// A single self-contained document (external references fail at resolution).
    pub fn from_str(uri: &str, text: &str) -> Result<Self, ParseError> {
        let document = SchemaDocument::decode(uri, text)?;
        Ok(Self::single(document))
    }

    pub fn single(document: SchemaDocument) -> Self {
        let root = document.uri.clone();
        let mut documents = BTreeMap::new();
        documents.insert(root.clone(), document);
        Self { root, documents }
    }

    pub fn root_uri(&self) -> &str {
        &self.root
    }

    pub fn root(&self) -> &SchemaDocument {
        // The root is inserted at construction and never removed.
        &self.documents[&self.root]
    }

    pub fn get(&self, uri: &str) -> Option<&SchemaDocument> {
        self.documents.get(uri)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Fetch the fragment a pointer addresses.
    pub fn lookup(&self, target: &SourcePointer) -> Option<&Value> {
        pointer::lookup(&self.get(&target.document)?.root, &target.pointer)
    }
}

/// URIs of documents referenced from `document`, other than itself.
fn external_documents(document: &SchemaDocument) -> Vec<String> {
    let mut refs = Vec::new();
    collect_refs(&document.root, &mut refs);
    let mut uris: Vec<String> = refs
        .into_iter()
        .filter_map(|r| parse_reference(r, &document.uri))
        .map(|target| target.document)
        .filter(|uri| *uri != document.uri)
        .collect();
    uris.dedup();
    uris
}

fn collect_refs<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match (key.as_str(), child) {
                    ("$ref", Value::String(reference)) => out.push(reference),
                    _ => collect_refs(child, out),
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_refs(item, out)),
        _ => {}
    }
}
