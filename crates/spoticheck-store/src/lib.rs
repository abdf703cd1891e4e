pub mod database;
pub mod documents;
pub mod error;
pub mod listening;
pub mod location;
pub mod schema;

pub use database::Database;
pub use documents::DocumentStore;
pub use error::StoreError;
pub use listening::ListeningRepo;
pub use location::StorageLocation;
