//! Remote contact store abstraction.
//!
//! This module provides:
//! - `ContactStore` trait for abstracting the backing REST service
//! - `Connectivity` trait for the pre-flight reachability probe
//! - `StoreError` for transport and protocol failures

pub mod rest;

use async_trait::async_trait;

use crate::model::{Contact, Page};

/// Failure talking to the remote store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The server answered outside the 2xx range.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// The request never completed: connection, TLS, or body decode trouble.
    #[error("transport error: {0}")]
    Transport(String),
    /// A photo upload was attempted for a contact that has no id yet.
    #[error("contact has no id; save it before uploading a photo")]
    MissingId,
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

/// Trait for remote contact store implementations.
///
/// One method per REST operation; no retries or caching live behind this
/// seam. Tests substitute scripted implementations.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Fetch one page of the contact listing.
    async fn fetch_page(&self, page: usize, size: usize) -> Result<Page<Contact>, StoreError>;

    /// Fetch a single contact by id.
    async fn fetch_contact(&self, id: &str) -> Result<Contact, StoreError>;

    /// Submit a contact. Creation and update both land here: the store
    /// routes on the presence of `contact.id` in the payload.
    async fn save_contact(&self, contact: &Contact) -> Result<Contact, StoreError>;

    /// Upload photo bytes for an existing contact.
    /// Returns the raw response body (typically the new photo URL).
    async fn upload_photo(
        &self,
        id: &str,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<String, StoreError>;

    /// Delete a contact on the remote.
    async fn delete_contact(&self, id: &str) -> Result<(), StoreError>;
}

/// Pre-flight reachability check run before a list load.
#[async_trait]
pub trait Connectivity: Send + Sync {
    async fn is_reachable(&self) -> bool;
}
