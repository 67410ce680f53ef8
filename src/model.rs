//! Wire-format data model for the remote contact store.

use serde::{Deserialize, Serialize};

/// Page length used for every list fetch. The cursor itself lives in the
/// repository and is reset on each fresh load.
pub const PAGE_SIZE: usize = 20;

/// A contact record as exchanged with the remote store.
///
/// `id` is assigned by the store on first save; a contact created locally
/// carries `None` until then. All optional fields are nullable on the wire.
/// Two records refer to the same contact when their ids match (`diff` keys
/// on this); full field equality tells changed content apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Option<String>,
    pub name: String,
    pub title: Option<String>,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "photoUrl")]
    pub photo_url: Option<String>,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(rename = "totalElements")]
    pub total_elements: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
    /// Zero-based page index.
    pub number: u32,
    /// Requested page length; `content` never exceeds it on a well-behaved
    /// server.
    pub size: u32,
}

impl<T> Page<T> {
    /// Whether the server violated the `content.len() <= size` invariant.
    pub fn is_overfull(&self) -> bool {
        self.content.len() > self.size as usize
    }
}
