use std::fmt;
use std::path::PathBuf;

use crate::error::StoreError;

const SQLITE_SCHEME: &str = "sqlite://";
const MEMORY: &str = ":memory:";

/// Where the document store lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageLocation {
    Memory,
    File(PathBuf),
}

impl StorageLocation {
    /// Resolve a storage URI and database name.
    ///
    /// `:memory:` selects an in-memory store. Otherwise the URI, optionally
    /// prefixed with `sqlite://`, is a directory and the database name picks
    /// the `<database>.db` file inside it.
    pub fn parse(uri: &str, database: &str) -> Result<Self, StoreError> {
        let uri = uri.trim();
        let path = uri.strip_prefix(SQLITE_SCHEME).unwrap_or(uri);

        if path == MEMORY {
            return Ok(Self::Memory);
        }
        if path.is_empty() {
            return Err(StoreError::InvalidUri("empty storage uri".into()));
        }
        if path.contains("://") {
            return Err(StoreError::InvalidUri(format!(
                "unsupported scheme in `{uri}`, expected a directory or sqlite://<dir>"
            )));
        }

        let database = database.trim();
        if database.is_empty() || database.contains(['/', '\\']) || database.starts_with('.') {
            return Err(StoreError::InvalidUri(format!(
                "invalid database name `{database}`"
            )));
        }

        Ok(Self::File(PathBuf::from(path).join(format!("{database}.db"))))
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str(MEMORY),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory() {
        assert_eq!(StorageLocation::parse(":memory:", "x").unwrap(), StorageLocation::Memory);
        assert_eq!(
            StorageLocation::parse("sqlite://:memory:", "x").unwrap(),
            StorageLocation::Memory
        );
    }

    #[test]
    fn directory_and_database_name() {
        assert_eq!(
            StorageLocation::parse("/var/lib/spoticheck", "stats").unwrap(),
            StorageLocation::File(PathBuf::from("/var/lib/spoticheck/stats.db"))
        );
        assert_eq!(
            StorageLocation::parse("sqlite://data", "spoticheck").unwrap(),
            StorageLocation::File(PathBuf::from("data/spoticheck.db"))
        );
    }

    #[test]
    fn rejects_foreign_schemes() {
        let err = StorageLocation::parse("mongodb://localhost:27017", "db").unwrap_err();
        assert!(matches!(err, StoreError::InvalidUri(_)));
    }

    #[test]
    fn rejects_bad_database_names() {
        assert!(StorageLocation::parse("/data", "").is_err());
        assert!(StorageLocation::parse("/data", "../escape").is_err());
        assert!(StorageLocation::parse("  ", "db").is_err());
    }
}
