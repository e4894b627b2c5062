//! Gadget catalog loaded from the CSV table built next to the index

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::search::error::LoadError;

/// Columns every catalog table must have
pub const REQUIRED_COLUMNS: [&str; 2] = ["gadget_name", "function"];

/// One catalog row. `id` is the row's ordinal position, matching the index.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: usize,
    pub name: String,
    pub function: String,
}

#[derive(Debug, Deserialize)]
struct CatalogRecord {
    gadget_name: String,
    function: String,
}

/// Read-only table of gadgets addressed by row position
#[derive(Debug, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    /// Load the catalog table at `path`.
    ///
    /// Extra columns are ignored. Row order is preserved, since row `i`
    /// pairs with row `i` of the vector index.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        if !path.is_file() {
            return Err(LoadError::MissingCatalog {
                path: path.to_path_buf(),
            });
        }

        let csv_err = |source: csv::Error| LoadError::Catalog {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_path(path)
            .map_err(csv_err)?;

        let headers = reader.headers().map_err(csv_err)?;
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| !headers.iter().any(|h| h == *column))
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MalformedCatalog {
                path: path.to_path_buf(),
                reason: format!("missing column(s): {}", missing.join(", ")),
            });
        }

        let mut items = Vec::new();
        for (id, record) in reader.deserialize::<CatalogRecord>().enumerate() {
            let record = record.map_err(|e| LoadError::MalformedCatalog {
                path: path.to_path_buf(),
                reason: format!("row {}: {}", id, e),
            })?;
            items.push(CatalogItem {
                id,
                name: record.gadget_name,
                function: record.function,
            });
        }

        Ok(Self { items })
    }

    /// Build a catalog from `(name, function)` pairs in row order
    pub fn from_rows<N, F>(rows: impl IntoIterator<Item = (N, F)>) -> Self
    where
        N: Into<String>,
        F: Into<String>,
    {
        let items = rows
            .into_iter()
            .enumerate()
            .map(|(id, (name, function))| CatalogItem {
                id,
                name: name.into(),
                function: function.into(),
            })
            .collect();
        Self { items }
    }

    pub fn row(&self, id: usize) -> Option<&CatalogItem> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct gadget names
    pub fn unique_names(&self) -> usize {
        self.items
            .iter()
            .map(|item| item.name.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}
