//! MongoDB session source.
//!
//! Reads chat session documents with the synchronous driver. Every read is a
//! full collection scan; there is no filter and no pagination.

use mongodb::bson::Document;
use mongodb::sync::{Client, Collection};

use crate::domain::{
    AppError, DatabaseConfig, RawSession, Result, SessionSource, SourceLocation,
};

/// A collection name with its document count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub name: String,
    pub documents: u64,
}

/// Session source backed by a MongoDB collection.
pub struct MongoSessionSource {
    client: Client,
    database: String,
    collection: String,
}

impl MongoSessionSource {
    /// Create a client for the configured database and collection.
    ///
    /// The driver connects lazily, so an unreachable server surfaces on the
    /// first read.
    ///
    /// # Errors
    /// Returns `Config` if no URI is configured, `Connectivity` if the URI is
    /// rejected by the driver.
    pub fn connect(config: &DatabaseConfig) -> Result<Self> {
        let uri = config.require_uri()?;
        let client = Client::with_uri_str(uri).map_err(AppError::connectivity)?;

        tracing::info!(
            database = %config.database,
            collection = %config.collection,
            "Connected to MongoDB"
        );

        Ok(Self {
            client,
            database: config.database.clone(),
            collection: config.collection.clone(),
        })
    }

    fn sessions(&self) -> Collection<Document> {
        self.client
            .database(&self.database)
            .collection::<Document>(&self.collection)
    }

    /// Number of documents in the session collection.
    ///
    /// # Errors
    /// Returns `Connectivity` if the server cannot be reached.
    pub fn count_sessions(&self) -> Result<u64> {
        self.sessions()
            .count_documents(None, None)
            .map_err(AppError::connectivity)
    }

    /// Names of all databases visible to the connection.
    ///
    /// # Errors
    /// Returns `Connectivity` if the server cannot be reached.
    pub fn list_databases(&self) -> Result<Vec<String>> {
        self.client
            .list_database_names(None, None)
            .map_err(AppError::connectivity)
    }

    /// Collections of the configured database with document counts.
    ///
    /// # Errors
    /// Returns `Connectivity` if the server cannot be reached.
    pub fn list_collections(&self) -> Result<Vec<CollectionInfo>> {
        let db = self.client.database(&self.database);
        let mut names = db
            .list_collection_names(None)
            .map_err(AppError::connectivity)?;
        names.sort();

        names
            .into_iter()
            .map(|name| {
                let documents = db
                    .collection::<Document>(&name)
                    .count_documents(None, None)
                    .map_err(AppError::connectivity)?;
                Ok(CollectionInfo { name, documents })
            })
            .collect()
    }
}

impl SessionSource for MongoSessionSource {
    fn fetch_all(&self) -> Result<Vec<RawSession>> {
        let cursor = self
            .sessions()
            .find(None, None)
            .map_err(AppError::connectivity)?;

        let sessions = cursor
            .map(|doc| doc.map(RawSession).map_err(AppError::connectivity))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!("Fetched {} chat sessions", sessions.len());

        Ok(sessions)
    }

    fn location(&self) -> SourceLocation {
        SourceLocation {
            database: self.database.clone(),
            collection: self.collection.clone(),
        }
    }
}

/// Database name embedded in a connection string path, if any.
///
/// `mongodb+srv://user:pw@cluster.example.net/app?retryWrites=true` → `app`.
#[must_use]
pub fn database_from_uri(uri: &str) -> Option<String> {
    let rest = uri.split_once("://").map_or(uri, |(_, r)| r);
    let hosts = rest.rsplit_once('@').map_or(rest, |(_, h)| h);
    let (_, path) = hosts.split_once('/')?;
    let name = path.split(['?', '#']).next().unwrap_or_default();

    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_from_uri() {
        assert_eq!(
            database_from_uri("mongodb+srv://bob:pw@cluster0.example.net/app?retryWrites=true")
                .as_deref(),
            Some("app")
        );
        assert_eq!(
            database_from_uri("mongodb://localhost:27017/chat_db").as_deref(),
            Some("chat_db")
        );
    }

    #[test]
    fn test_database_from_uri_without_path() {
        assert_eq!(database_from_uri("mongodb://localhost:27017"), None);
        assert_eq!(database_from_uri("mongodb://localhost:27017/"), None);
        assert_eq!(database_from_uri("mongodb://localhost/?ssl=true"), None);
    }

    #[test]
    fn test_connect_requires_uri() {
        let config = DatabaseConfig::default();
        assert!(matches!(
            MongoSessionSource::connect(&config),
            Err(AppError::Config { .. })
        ));
    }
}
