//! Contact repository: orchestrates store calls and owns the observable
//! state the display layer watches.
//!
//! Each operation runs as its own spawned task so a caller is never
//! blocked; completions publish into last-value watch channels. State
//! holders overwrite on every update, no queuing, no history.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::model::{Contact, PAGE_SIZE};
use crate::remote::{Connectivity, ContactStore, StoreError};
use crate::urls::PhotoUrlResolver;

pub struct Repository {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn ContactStore>,
    connectivity: Arc<dyn Connectivity>,
    resolver: PhotoUrlResolver,

    contacts: watch::Sender<Vec<Contact>>,
    network_error: watch::Sender<bool>,
    operation_result: watch::Sender<Option<Result<Contact, String>>>,
    selected_contact: watch::Sender<Option<Contact>>,
    error: watch::Sender<Option<String>>,

    current_page: AtomicUsize,
    // Monotonic ticket per list load; only the newest completion may
    // publish, so a slow response cannot overwrite a fresher list.
    load_generation: AtomicU64,
    published_generation: AtomicU64,
}

impl Inner {
    /// Claim the right to publish for `generation`. Fails when a newer load
    /// already published.
    fn claim_publication(&self, generation: u64) -> bool {
        let mut current = self.published_generation.load(Ordering::SeqCst);
        loop {
            if generation <= current {
                return false;
            }
            match self.published_generation.compare_exchange(
                current,
                generation,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }
}

impl Repository {
    pub fn new(
        store: Arc<dyn ContactStore>,
        connectivity: Arc<dyn Connectivity>,
        resolver: PhotoUrlResolver,
    ) -> Self {
        let (contacts, _) = watch::channel(Vec::new());
        let (network_error, _) = watch::channel(false);
        let (operation_result, _) = watch::channel(None);
        let (selected_contact, _) = watch::channel(None);
        let (error, _) = watch::channel(None);

        Self {
            inner: Arc::new(Inner {
                store,
                connectivity,
                resolver,
                contacts,
                network_error,
                operation_result,
                selected_contact,
                error,
                current_page: AtomicUsize::new(0),
                load_generation: AtomicU64::new(0),
                published_generation: AtomicU64::new(0),
            }),
        }
    }

    // ---- observable state -------------------------------------------------

    /// Latest fetched contact list, replaced wholesale on each load.
    pub fn contacts(&self) -> watch::Receiver<Vec<Contact>> {
        self.inner.contacts.subscribe()
    }

    /// Raised when a list load found no connectivity. Never lowered.
    pub fn network_error(&self) -> watch::Receiver<bool> {
        self.inner.network_error.subscribe()
    }

    /// Outcome of the last create/update submission.
    pub fn operation_result(&self) -> watch::Receiver<Option<Result<Contact, String>>> {
        self.inner.operation_result.subscribe()
    }

    /// Contact most recently fetched by id.
    pub fn selected_contact(&self) -> watch::Receiver<Option<Contact>> {
        self.inner.selected_contact.subscribe()
    }

    /// Human-readable message for get-by-id failures.
    pub fn error(&self) -> watch::Receiver<Option<String>> {
        self.inner.error.subscribe()
    }

    // ---- operations -------------------------------------------------------

    /// Refresh the contact list from the first page.
    ///
    /// Requires connectivity; when unreachable the network-error flag is
    /// raised and the store is never called. On fetch failure the previous
    /// list stays and the failure is only logged, a quirk callers must
    /// tolerate.
    pub fn load_contacts(&self) -> JoinHandle<()> {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            if !inner.connectivity.is_reachable().await {
                inner.network_error.send_replace(true);
                tracing::error!("no network connection available");
                return;
            }

            // Fresh load: cursor back to the first page.
            inner.current_page.store(0, Ordering::SeqCst);
            let page_index = inner.current_page.load(Ordering::SeqCst);
            let generation = inner.load_generation.fetch_add(1, Ordering::SeqCst) + 1;

            match inner.store.fetch_page(page_index, PAGE_SIZE).await {
                Ok(page) => {
                    let contacts: Vec<Contact> = page
                        .content
                        .into_iter()
                        .map(|mut contact| {
                            // An absent URL resolves as the empty relative
                            // path, so it comes back as the bare base URL.
                            let raw = contact.photo_url.take().unwrap_or_default();
                            contact.photo_url = Some(inner.resolver.resolve(&raw));
                            contact
                        })
                        .collect();
                    if inner.claim_publication(generation) {
                        tracing::debug!(count = contacts.len(), "contacts fetched");
                        inner.contacts.send_replace(contacts);
                    } else {
                        tracing::debug!(generation, "dropping stale contact list response");
                    }
                }
                Err(err) => {
                    tracing::error!(error = %err, "failed to fetch contacts");
                }
            }
        })
    }

    /// Fetch one contact into the selected-contact holder.
    pub fn get_contact(&self, id: String) -> JoinHandle<()> {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            match inner.store.fetch_contact(&id).await {
                Ok(contact) => {
                    inner.selected_contact.send_replace(Some(contact));
                }
                Err(StoreError::Status { .. }) => {
                    inner
                        .error
                        .send_replace(Some("Failed to fetch contact details".to_string()));
                }
                Err(err) => {
                    inner
                        .error
                        .send_replace(Some(format!("An error occurred: {err}")));
                }
            }
        })
    }

    /// Submit a brand-new contact (`id` must be `None`).
    pub fn create_new_contact(&self, contact: Contact) -> JoinHandle<()> {
        self.submit(contact, "Failed to create contact")
    }

    /// Submit changes to an existing contact. Routes through the same store
    /// save as creation; the payload's id disambiguates server-side.
    pub fn update_contact(&self, contact: Contact) -> JoinHandle<()> {
        self.submit(contact, "Failed to update contact")
    }

    fn submit(&self, contact: Contact, failure_message: &'static str) -> JoinHandle<()> {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            match inner.store.save_contact(&contact).await {
                Ok(saved) => {
                    inner.operation_result.send_replace(Some(Ok(saved)));
                }
                Err(StoreError::Status { .. }) => {
                    inner
                        .operation_result
                        .send_replace(Some(Err(failure_message.to_string())));
                }
                Err(err) => {
                    inner
                        .operation_result
                        .send_replace(Some(Err(err.to_string())));
                }
            }
        })
    }

    /// Upload photo bytes for a saved contact; returns the raw response
    /// body. Fails before any network call when the id is absent.
    pub async fn upload_photo(
        &self,
        contact_id: Option<&str>,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<String, StoreError> {
        let id = contact_id.ok_or(StoreError::MissingId)?;
        self.inner.store.upload_photo(id, bytes, file_name).await
    }

    /// Delete a contact on the remote store.
    pub async fn delete_contact(&self, id: &str) -> Result<(), StoreError> {
        self.inner.store.delete_contact(id).await
    }
}
