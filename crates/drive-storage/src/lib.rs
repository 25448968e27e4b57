//! Remote document storage
//!
//! A thin client for a cloud document drive: fetch templates from it and
//! publish generated documents to it. Connection settings are injected as a
//! [`StorageConfig`].

pub mod client;
pub mod config;
pub mod error;

pub use client::{DriveClient, DriveItem, UploadedItem};
pub use config::{StorageConfig, DEFAULT_AUTHORITY_URL, DEFAULT_GRAPH_URL};
pub use error::StorageError;
