//! Shared HTTP plumbing for the registry clients.
//!
//! A [`Transport`] owns a blocking `reqwest` client plus the registry base
//! URL and optional bearer token. Every helper enforces the same contract:
//! a non-2xx response becomes a fatal [`TransportError`] carrying the request
//! URL and the response body verbatim.

use crate::errors::TransportError;
use anyhow::Result;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct Transport {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl Transport {
    pub fn new(base: Url, token: Option<String>) -> Result<Self> {
        Self::with_timeout(base, token, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base: Url, token: Option<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base, token })
    }

    /// Resolves a registry path like `datasets/{org}/{dataset}/graphs/`
    /// against the base URL. Absolute URLs (job URLs, service endpoints)
    /// pass through unchanged.
    pub fn join(&self, path: &str) -> Result<String> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(path.to_string());
        }
        Ok(self.base.join(path)?.to_string())
    }

    pub fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
            None => builder,
        }
    }

    /// Access to the underlying client for callers with their own header
    /// requirements (the query clients negotiate Accept themselves).
    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self.authorize(self.http.get(url)).send()?;
        read_json(url, resp)
    }

    pub fn post_json<T: DeserializeOwned>(&self, url: &str, body: &impl Serialize) -> Result<T> {
        let resp = self.authorize(self.http.post(url)).json(body).send()?;
        read_json(url, resp)
    }

    /// POST with an empty body, for endpoints like `{job_url}/start`.
    pub fn post_empty_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self.authorize(self.http.post(url)).send()?;
        read_json(url, resp)
    }

    pub fn patch_json<T: DeserializeOwned>(&self, url: &str, body: &impl Serialize) -> Result<T> {
        let resp = self.authorize(self.http.patch(url)).json(body).send()?;
        read_json(url, resp)
    }

    pub fn delete(&self, url: &str) -> Result<()> {
        let resp = self.authorize(self.http.delete(url)).send()?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().unwrap_or_default();
        Err(TransportError::new(url, status, body).into())
    }
}

fn read_json<T: DeserializeOwned>(url: &str, resp: Response) -> Result<T> {
    let status = resp.status();
    let body = resp.text()?;
    if !status.is_success() {
        return Err(TransportError::new(url, status, body).into());
    }
    Ok(serde_json::from_str(&body)?)
}
