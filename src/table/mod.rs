//! Random tables: references, markdown extraction and row selection.

pub mod extract;
mod reference;
mod resolver;

pub use extract::{ExtractedTable, LookupRange};
pub use reference::TableReference;
pub use resolver::TableResolver;

use crate::error::RollError;
use crate::roll::RResult;
use async_trait::async_trait;
use std::collections::HashMap;

/// Raw content of a referenced block.
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    /// One row per entry.
    List(Vec<String>),
    /// Markdown table text.
    Table(String),
}

/// Fetches the block a [`TableReference`] points at.
#[async_trait]
pub trait RowPoolProvider: Send + Sync {
    async fn fetch(&self, path: &str, block: &str) -> RResult<TableSource>;
}

/// Tables held in memory, keyed by path and lowercased block id.
#[derive(Debug, Clone, Default)]
pub struct MemoryTables {
    blocks: HashMap<(String, String), TableSource>,
}

impl MemoryTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, block: &str, source: TableSource) {
        self.blocks
            .insert((path.to_string(), block.to_lowercase()), source);
    }

    pub fn insert_list<S: Into<String>>(
        &mut self,
        path: &str,
        block: &str,
        rows: impl IntoIterator<Item = S>,
    ) {
        let rows = rows.into_iter().map(Into::into).collect();
        self.insert(path, block, TableSource::List(rows));
    }

    pub fn insert_table(&mut self, path: &str, block: &str, markdown: &str) {
        self.insert(path, block, TableSource::Table(markdown.to_string()));
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[async_trait]
impl RowPoolProvider for MemoryTables {
    async fn fetch(&self, path: &str, block: &str) -> RResult<TableSource> {
        self.blocks
            .get(&(path.to_string(), block.to_lowercase()))
            .cloned()
            .ok_or_else(|| RollError::missing(path, block, None))
    }
}
