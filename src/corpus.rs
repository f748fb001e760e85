//! Static poetry corpus
//!
//! Loaded once at startup and shared read-only (`Arc<Corpus>`) by every
//! component. Poems are held as `Arc<Poem>` so search results can point at
//! the record instead of copying it.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{PoetryError, Result};
use crate::types::Poem;

/// On-disk shape of a corpus document: `{"poetry": [...]}`
#[derive(Debug, Deserialize)]
struct CorpusDocument {
    poetry: Vec<Poem>,
}

/// Ordered, immutable collection of poems
#[derive(Debug, Default)]
pub struct Corpus {
    poems: Vec<Arc<Poem>>,
    by_id: HashMap<String, usize>,
}

impl Corpus {
    /// Build a corpus, rejecting duplicate poem ids
    pub fn new(poems: Vec<Poem>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(poems.len());
        for (idx, poem) in poems.iter().enumerate() {
            if by_id.insert(poem.id.clone(), idx).is_some() {
                return Err(PoetryError::InvalidInput(format!(
                    "Duplicate poem id in corpus: {}",
                    poem.id
                )));
            }
        }

        Ok(Self {
            poems: poems.into_iter().map(Arc::new).collect(),
            by_id,
        })
    }

    /// Parse a `{"poetry": [...]}` JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let document: CorpusDocument = serde_json::from_str(json)?;
        Self::new(document.poetry)
    }

    /// Read and parse a corpus file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let corpus = Self::from_json(&json)?;
        tracing::info!("Loaded {} poems from {}", corpus.len(), path.display());
        Ok(corpus)
    }

    pub fn len(&self) -> usize {
        self.poems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poems.is_empty()
    }

    /// Iterate poems in corpus order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Poem>> {
        self.poems.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Poem>> {
        self.by_id.get(id).map(|&idx| &self.poems[idx])
    }
}
