use std::path::{Path, PathBuf};

/// File name of the vector index under the storage prefix
pub const INDEX_FILE: &str = "gadgets.index";

/// File name of the catalog table under the storage prefix
pub const CATALOG_FILE: &str = "gadget_data.csv";

/// Default storage prefix, relative to the working directory
pub const DEFAULT_PREFIX: &str = "models";

/// Locations of the prebuilt search artifacts
#[derive(Debug, Clone, PartialEq)]
pub struct StoragePaths {
    pub prefix: PathBuf,
    pub index: PathBuf,
    pub catalog: PathBuf,
}

impl StoragePaths {
    pub fn from_prefix(prefix: impl AsRef<Path>) -> Self {
        let prefix = prefix.as_ref().to_path_buf();
        Self {
            index: prefix.join(INDEX_FILE),
            catalog: prefix.join(CATALOG_FILE),
            prefix,
        }
    }
}
