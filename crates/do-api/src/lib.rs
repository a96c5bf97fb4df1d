//! Typed Rust client for the DigitalOcean v2 API.
//!
//! Covers the subset needed for managing VPN endpoint droplets:
//! droplets (create, get, list, delete).

mod types;

pub use types::*;

use types::{DropletEnvelope, DropletPage};

const BASE_URL: &str = "https://api.digitalocean.com/v2";
const PAGE_SIZE: u32 = 200;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("digitalocean api request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("digitalocean api {endpoint} returned {status}: {body}")]
    Api {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Client for the DigitalOcean Droplets REST API.
#[derive(Clone)]
pub struct DoClient {
    token: String,
    base_url: String,
    http: reqwest::Client,
}

impl DoClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, BASE_URL)
    }

    /// Point the client at a different API root (used against mock servers).
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn auth(&self) -> String {
        format!("Bearer {}", self.token)
    }

    async fn check(resp: reqwest::Response, endpoint: &'static str) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api { endpoint, status, body });
        }
        Ok(resp)
    }

    /// Like `check` but also treats 404 as success (for delete idempotency).
    async fn check_allow_404(resp: reqwest::Response, endpoint: &'static str) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() && status.as_u16() != 404 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api { endpoint, status, body });
        }
        Ok(resp)
    }

    // ── Droplets ─────────────────────────────────────────────────────

    pub async fn create_droplet(&self, req: &CreateDropletRequest) -> Result<Droplet> {
        let resp = self
            .http
            .post(self.url("/droplets"))
            .header("Authorization", self.auth())
            .json(req)
            .send()
            .await?;

        let envelope: DropletEnvelope = Self::check(resp, "create droplet").await?.json().await?;
        Ok(envelope.droplet)
    }

    pub async fn get_droplet(&self, droplet_id: u64) -> Result<Droplet> {
        let resp = self
            .http
            .get(self.url(&format!("/droplets/{droplet_id}")))
            .header("Authorization", self.auth())
            .send()
            .await?;

        let envelope: DropletEnvelope = Self::check(resp, "get droplet").await?.json().await?;
        Ok(envelope.droplet)
    }

    /// List every droplet on the account, optionally filtered by tag.
    ///
    /// Walks all result pages; a failure on any page fails the whole call.
    pub async fn list_droplets(&self, tag: Option<&str>) -> Result<Vec<Droplet>> {
        let mut droplets = Vec::new();
        let mut page: u32 = 1;

        loop {
            let mut query = vec![
                ("page", page.to_string()),
                ("per_page", PAGE_SIZE.to_string()),
            ];
            if let Some(tag) = tag {
                query.push(("tag_name", tag.to_string()));
            }

            let resp = self
                .http
                .get(self.url("/droplets"))
                .header("Authorization", self.auth())
                .query(&query)
                .send()
                .await?;

            let body: DropletPage = Self::check(resp, "list droplets").await?.json().await?;
            droplets.extend(body.droplets);

            let has_next = body
                .links
                .pages
                .and_then(|p| p.next)
                .is_some();
            if !has_next {
                break;
            }
            page += 1;
        }

        Ok(droplets)
    }

    pub async fn delete_droplet(&self, droplet_id: u64) -> Result<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/droplets/{droplet_id}")))
            .header("Authorization", self.auth())
            .send()
            .await?;

        Self::check_allow_404(resp, "delete droplet").await?;
        Ok(())
    }
}
