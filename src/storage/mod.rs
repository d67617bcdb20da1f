pub mod sqlite;

pub use sqlite::ProfileStore;
