//! Vector index backed by a SQLite file
//!
//! The file stores one embedding BLOB per row. On open every vector is
//! copied into a contiguous in-memory matrix and the connection is closed,
//! so searches are exact inner-product scans over plain memory.

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::cmp::Ordering;
use std::path::Path;

use super::error::{LoadError, Result, SearchError};

/// Row id returned for pool slots the index could not fill
pub const NO_ROW: i64 = -1;

/// One nearest-neighbor candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub score: f32,
    pub row: i64,
}

impl Hit {
    fn empty() -> Self {
        Self {
            score: f32::NEG_INFINITY,
            row: NO_ROW,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.row == NO_ROW
    }
}

/// Exact inner-product index over precomputed embeddings
#[derive(Debug)]
pub struct VectorIndex {
    model: Option<String>,
    dimension: usize,
    rows: usize,
    data: Vec<f32>,
}

impl VectorIndex {
    /// Load an index file written by [`VectorIndex::create`] or the builder.
    pub fn open(path: &Path) -> std::result::Result<Self, LoadError> {
        if !path.is_file() {
            return Err(LoadError::MissingIndex {
                path: path.to_path_buf(),
            });
        }

        let sql_err = |source: rusqlite::Error| LoadError::Index {
            path: path.to_path_buf(),
            source,
        };
        let malformed = |reason: String| LoadError::MalformedIndex {
            path: path.to_path_buf(),
            reason,
        };

        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(sql_err)?;

        let model = get_meta(&conn, "model").map_err(sql_err)?;
        let declared_dim = match get_meta(&conn, "dimension").map_err(sql_err)? {
            Some(value) => Some(
                value
                    .parse::<usize>()
                    .map_err(|_| malformed(format!("invalid dimension '{}'", value)))?,
            ),
            None => None,
        };

        let mut stmt = conn
            .prepare("SELECT row_id, embedding FROM vectors ORDER BY row_id")
            .map_err(sql_err)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Vec<u8>>(1)?)))
            .map_err(sql_err)?;

        let mut dimension = declared_dim;
        let mut data = Vec::new();
        let mut count = 0usize;

        for row in rows {
            let (row_id, blob) = row.map_err(sql_err)?;
            if row_id != count as i64 {
                return Err(malformed(format!(
                    "row ids must be contiguous from 0, expected {} but found {}",
                    count, row_id
                )));
            }

            let vector = blob_to_embedding(&blob)
                .ok_or_else(|| malformed(format!("row {} has a truncated embedding", row_id)))?;
            let dim = *dimension.get_or_insert(vector.len());
            if vector.len() != dim || dim == 0 {
                return Err(malformed(format!(
                    "row {} has {} values, expected {}",
                    row_id,
                    vector.len(),
                    dim
                )));
            }

            if vector.iter().any(|x| !x.is_finite()) {
                return Err(malformed(format!("row {} has a non-finite value", row_id)));
            }

            data.extend_from_slice(&vector);
            count += 1;
        }

        Ok(Self {
            model,
            dimension: dimension.unwrap_or(0),
            rows: count,
            data,
        })
    }

    /// Write `vectors` to a new index file at `path`, replacing any existing one.
    ///
    /// Row `i` of the file is `vectors[i]`; vectors are stored as given.
    pub fn create(path: &Path, model: &str, vectors: &[Vec<f32>]) -> anyhow::Result<()> {
        let dimension = vectors.first().map_or(0, Vec::len);
        if let Some(bad) = vectors.iter().position(|v| v.len() != dimension) {
            anyhow::bail!("vector {} has {} values, expected {}", bad, vectors[bad].len(), dimension);
        }

        if path.exists() {
            std::fs::remove_file(path)?;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE vectors (
                row_id INTEGER PRIMARY KEY,
                embedding BLOB NOT NULL
            );

            CREATE TABLE index_meta (
                key TEXT PRIMARY KEY,
                value TEXT
            );
            "#,
        )?;

        let tx = conn.transaction()?;
        {
            let mut insert =
                tx.prepare("INSERT INTO vectors (row_id, embedding) VALUES (?1, ?2)")?;
            for (row_id, vector) in vectors.iter().enumerate() {
                insert.execute(params![row_id as i64, embedding_to_blob(vector)])?;
            }

            let mut meta = tx.prepare("INSERT INTO index_meta (key, value) VALUES (?1, ?2)")?;
            meta.execute(params!["model", model])?;
            meta.execute(params!["dimension", dimension.to_string()])?;
        }
        tx.commit()?;

        Ok(())
    }

    /// In-memory index, mainly for tests.
    ///
    /// Every vector must have the same length and only finite values.
    pub fn from_vectors(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let dimension = vectors.first().map_or(0, Vec::len);
        if let Some(bad) = vectors.iter().position(|v| v.len() != dimension) {
            return Err(SearchError::invalid_argument(format!(
                "vector {} has {} values, expected {}",
                bad,
                vectors[bad].len(),
                dimension
            )));
        }
        if vectors.iter().flatten().any(|x| !x.is_finite()) {
            return Err(SearchError::invalid_argument("vectors must be finite"));
        }

        Ok(Self {
            model: None,
            dimension,
            rows: vectors.len(),
            data: vectors.into_iter().flatten().collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Model recorded when the index was written, if any
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Top `pool_size` rows by inner product with `query`.
    ///
    /// Always returns exactly `pool_size` hits sorted by descending score;
    /// slots beyond the number of rows are filled with [`NO_ROW`]. Ties keep
    /// the lower row id first.
    pub fn search(&self, query: &[f32], pool_size: usize) -> Result<Vec<Hit>> {
        if self.rows > 0 && query.len() != self.dimension {
            return Err(SearchError::invalid_argument(format!(
                "query has {} values, index expects {}",
                query.len(),
                self.dimension
            )));
        }

        let mut hits: Vec<Hit> = self
            .data
            .chunks_exact(self.dimension.max(1))
            .take(self.rows)
            .enumerate()
            .map(|(row, vector)| Hit {
                score: dot(query, vector),
                row: row as i64,
            })
            .collect();

        hits.sort_by(|a, b| match b.score.total_cmp(&a.score) {
            Ordering::Equal => a.row.cmp(&b.row),
            ord => ord,
        });
        hits.truncate(pool_size);
        hits.resize(pool_size, Hit::empty());

        Ok(hits)
    }
}

fn get_meta(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    let has_meta: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'index_meta')",
        [],
        |row| row.get(0),
    )?;
    if !has_meta {
        return Ok(None);
    }

    conn.query_row(
        "SELECT value FROM index_meta WHERE key = ?1",
        params![key],
        |row| row.get::<_, Option<String>>(0),
    )
    .optional()
    .map(Option::flatten)
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Convert f32 embedding to BLOB
fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for &val in embedding {
        blob.extend_from_slice(&val.to_le_bytes());
    }
    blob
}

/// Convert BLOB to f32 embedding, `None` if the length is not a multiple of 4
fn blob_to_embedding(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return None;
    }
    Some(
        blob.chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_blob_conversion() {
        let embedding = vec![1.0, 2.0, 3.0, -0.5];
        let blob = embedding_to_blob(&embedding);
        assert_eq!(blob_to_embedding(&blob), Some(embedding));
        assert_eq!(blob_to_embedding(&blob[..5]), None);
    }

    #[test]
    fn test_search_orders_by_score() -> Result<()> {
        let index = VectorIndex::from_vectors(vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![0.6, 0.8],
        ])?;

        let hits = index.search(&[1.0, 0.0], 3)?;
        let rows: Vec<i64> = hits.iter().map(|h| h.row).collect();
        assert_eq!(rows, vec![1, 2, 0]);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_search_pads_with_sentinel() -> Result<()> {
        let index = VectorIndex::from_vectors(vec![vec![1.0, 0.0], vec![0.0, 1.0]])?;

        let hits = index.search(&[1.0, 0.0], 5)?;
        assert_eq!(hits.len(), 5);
        assert!(hits[..2].iter().all(|h| !h.is_empty()));
        assert!(hits[2..].iter().all(|h| h.row == NO_ROW));
        Ok(())
    }

    #[test]
    fn test_search_ties_keep_row_order() -> Result<()> {
        let index = VectorIndex::from_vectors(vec![vec![1.0, 0.0]; 3])?;
        let rows: Vec<i64> = index.search(&[1.0, 0.0], 3)?.iter().map(|h| h.row).collect();
        assert_eq!(rows, vec![0, 1, 2]);
        Ok(())
    }

    #[test]
    fn test_search_rejects_wrong_dimension() {
        let index = VectorIndex::from_vectors(vec![vec![1.0, 0.0]]).unwrap();
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 1),
            Err(SearchError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_create_and_open() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("gadgets.index");
        VectorIndex::create(&path, "htp-384", &[vec![1.0, 0.0, 0.0], vec![0.0, 0.0, 1.0]])?;

        let index = VectorIndex::open(&path)?;
        assert_eq!(index.len(), 2);
        assert_eq!(index.dimension(), 3);
        assert_eq!(index.model(), Some("htp-384"));

        let hits = index.search(&[0.0, 0.0, 1.0], 1)?;
        assert_eq!(hits[0].row, 1);
        Ok(())
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gadgets.index");
        assert!(matches!(
            VectorIndex::open(&path),
            Err(LoadError::MissingIndex { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_open_rejects_non_sqlite_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gadgets.index");
        std::fs::write(&path, b"this is not a database, just some bytes padding it out").unwrap();
        assert!(matches!(VectorIndex::open(&path), Err(LoadError::Index { .. })));
    }

    #[test]
    fn test_open_rejects_gaps_in_row_ids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gadgets.index");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE vectors (row_id INTEGER PRIMARY KEY, embedding BLOB NOT NULL);",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO vectors (row_id, embedding) VALUES (?1, ?2)",
            params![1i64, embedding_to_blob(&[1.0, 0.0])],
        )
        .unwrap();
        drop(conn);

        assert!(matches!(
            VectorIndex::open(&path),
            Err(LoadError::MalformedIndex { .. })
        ));
    }

    #[test]
    fn test_open_rejects_non_finite_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gadgets.index");
        VectorIndex::create(&path, "htp-384", &[vec![1.0, 0.0], vec![f32::NAN, 0.0]]).unwrap();

        match VectorIndex::open(&path) {
            Err(LoadError::MalformedIndex { reason, .. }) => assert!(reason.contains("row 1")),
            other => panic!("expected malformed index, got {:?}", other),
        }
    }

    #[test]
    fn test_from_vectors_rejects_ragged_input() {
        assert!(matches!(
            VectorIndex::from_vectors(vec![vec![1.0, 0.0], vec![1.0]]),
            Err(SearchError::InvalidArgument(_))
        ));
        assert!(matches!(
            VectorIndex::from_vectors(vec![vec![f32::INFINITY, 0.0]]),
            Err(SearchError::InvalidArgument(_))
        ));
    }
}
