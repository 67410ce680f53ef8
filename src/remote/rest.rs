//! REST client implementation using reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use url::Url;

use crate::config::Config;
use crate::model::{Contact, Page};
use crate::remote::{Connectivity, ContactStore, StoreError};

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// REST-backed contact store.
pub struct RestStore {
    client: reqwest::Client,
    /// Base URL with a trailing slash; `Config` normalizes it.
    base: String,
}

impl RestStore {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: config.base_url.clone(),
        }
    }

    fn contacts_url(&self) -> String {
        format!("{}contacts", self.base)
    }

    fn contact_url(&self, id: &str) -> String {
        format!("{}contacts/{}", self.base, urlencoding::encode(id))
    }
}

/// Map a non-2xx response to `StoreError::Status`, keeping the body text as
/// the message.
async fn ok_or_status(resp: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ContactStore for RestStore {
    #[tracing::instrument(skip(self))]
    async fn fetch_page(&self, page: usize, size: usize) -> Result<Page<Contact>, StoreError> {
        let resp = self
            .client
            .get(self.contacts_url())
            .query(&[("page", page), ("size", size)])
            .send()
            .await?;
        let page: Page<Contact> = ok_or_status(resp).await?.json().await?;
        if page.is_overfull() {
            tracing::warn!(
                got = page.content.len(),
                size = page.size,
                "server returned more rows than the requested page size"
            );
        }
        Ok(page)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_contact(&self, id: &str) -> Result<Contact, StoreError> {
        let resp = self.client.get(self.contact_url(id)).send().await?;
        let contact = ok_or_status(resp).await?.json().await?;
        Ok(contact)
    }

    #[tracing::instrument(skip(self, contact))]
    async fn save_contact(&self, contact: &Contact) -> Result<Contact, StoreError> {
        let resp = self
            .client
            .post(self.contacts_url())
            .json(contact)
            .send()
            .await?;
        let saved = ok_or_status(resp).await?.json().await?;
        Ok(saved)
    }

    #[tracing::instrument(skip(self, bytes))]
    async fn upload_photo(
        &self,
        id: &str,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<String, StoreError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("image/*")?;
        let form = Form::new().text("id", id.to_string()).part("file", part);
        let resp = self
            .client
            .put(format!("{}contacts/photo", self.base))
            .multipart(form)
            .send()
            .await?;
        let body = ok_or_status(resp).await?.text().await?;
        Ok(body)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_contact(&self, id: &str) -> Result<(), StoreError> {
        let resp = self.client.delete(self.contact_url(id)).send().await?;
        ok_or_status(resp).await?;
        Ok(())
    }
}

/// Reachability probe: a short-timeout TCP connect against the configured
/// host, checked before a list load touches the store.
pub struct NetProbe {
    addr: String,
}

impl NetProbe {
    pub fn from_base_url(base: &str) -> Result<Self, StoreError> {
        let url = Url::parse(base).map_err(|e| StoreError::Transport(e.to_string()))?;
        let host = url
            .host_str()
            .ok_or_else(|| StoreError::Transport(format!("base URL has no host: {base}")))?;
        let port = url.port_or_known_default().unwrap_or(80);
        Ok(Self {
            addr: format!("{host}:{port}"),
        })
    }
}

#[async_trait]
impl Connectivity for NetProbe {
    async fn is_reachable(&self) -> bool {
        matches!(
            tokio::time::timeout(PROBE_TIMEOUT, tokio::net::TcpStream::connect(&self.addr)).await,
            Ok(Ok(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_url_encodes_path_ids() {
        let config = Config::for_tests("https://contacts.example.net/");
        let store = RestStore::new(&config);
        assert_eq!(
            store.contact_url("a b/c"),
            "https://contacts.example.net/contacts/a%20b%2Fc"
        );
    }

    #[tokio::test]
    async fn test_probe_fails_on_closed_port() {
        // Port 9 on localhost is the discard port; nothing listens there in
        // the test environment, so the connect attempt must fail quickly.
        let probe = NetProbe::from_base_url("http://127.0.0.1:9/").unwrap();
        assert!(!probe.is_reachable().await);
    }
}
