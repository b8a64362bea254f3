//! Clients for external collaborators

pub mod object_storage;

pub use object_storage::{ObjectStorageClient, StoredObject};
